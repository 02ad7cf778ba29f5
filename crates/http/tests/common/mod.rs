//! Helpers shared by the client integration tests

#![allow(dead_code)]

use serde_json::{Value, json};
use std::sync::{Arc, Mutex, Once};
use wallpaper_core::{Credential, CredentialStore};
use wallpaper_http::AdminClient;
use wallpaper_http::client::notify::{Notifier, Severity};
use wallpaper_http::client::session::MemoryNavigator;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = wallpaper_core::tracing::init_dev();
    });
}

/// Notifier that remembers every message it was given
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(Severity, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((severity, message.to_string()));
    }
}

/// A client wired to recording collaborators
pub struct Harness {
    pub client: AdminClient,
    pub store: CredentialStore,
    pub navigator: Arc<MemoryNavigator>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness(base_url: &str, current_path: &str) -> Harness {
    init_tracing();
    let store = CredentialStore::in_memory();
    let navigator = Arc::new(MemoryNavigator::new(current_path));
    let notifier = Arc::new(RecordingNotifier::default());
    let client = AdminClient::builder()
        .base_url(base_url)
        .store(store.clone())
        .navigator(navigator.clone())
        .notifier(notifier.clone())
        .build()
        .unwrap();

    Harness {
        client,
        store,
        navigator,
        notifier,
    }
}

/// Harness whose store already holds `token` and `refresh_token`
pub fn logged_in(base_url: &str, current_path: &str, token: &str, refresh_token: &str) -> Harness {
    let harness = harness(base_url, current_path);
    harness
        .store
        .save(&Credential::new(token, Some(refresh_token.to_string())))
        .unwrap();
    harness
}

pub fn ok(data: Value) -> Value {
    json!({ "code": 200, "message": "success", "data": data })
}

pub fn failure(code: i64, message: &str) -> Value {
    json!({ "code": code, "message": message, "data": null })
}
