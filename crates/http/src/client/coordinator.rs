//! Credential recovery after authentication failures
//!
//! The first authentication failure of a burst flips the coordinator into
//! the refreshing state and starts one refresh on a spawned task. Every
//! failure observed while that refresh is in flight joins the same queue.
//! When the refresh settles the queue is drained in arrival order: each
//! request is replayed with the new credential, or rejected with the
//! refresh error and the user is sent to the login page.

use super::ClientError;
use super::interceptor::{self, Verdict};
use super::notify::{self, Notifier, SESSION_EXPIRED_MESSAGE, Severity};
use super::request::ApiRequest;
use super::session::SessionGuard;
use super::transport::Exchange;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use wallpaper_core::{Credential, CredentialStore, Envelope};

/// Calls the coordinator needs from the network
#[async_trait]
pub trait RefreshTransport: Send + Sync {
    /// Exchange the refresh token of `expired` for a new credential
    ///
    /// The expired bearer is sent along; the backend authenticates the
    /// refresh endpoint like any other.
    async fn refresh(&self, expired: &Credential) -> Result<Credential, ClientError>;

    /// Send `request` again with `credential`
    async fn replay(
        &self,
        request: &ApiRequest,
        credential: &Credential,
    ) -> Result<Exchange, ClientError>;
}

type Responder = oneshot::Sender<Result<Envelope, ClientError>>;

struct PendingRequest {
    request: ApiRequest,
    responder: Responder,
}

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    pending: VecDeque<PendingRequest>,
}

/// Owner of the refresh flag and the pending-request queue
pub struct AuthCoordinator {
    store: CredentialStore,
    session: SessionGuard,
    notifier: Arc<dyn Notifier>,
    state: Mutex<RefreshState>,
}

impl AuthCoordinator {
    pub fn new(store: CredentialStore, session: SessionGuard, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            session,
            notifier,
            state: Mutex::new(RefreshState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_refreshing(&self) -> bool {
        self.state().refreshing
    }

    /// Requests waiting for the current refresh to settle
    pub fn pending_len(&self) -> usize {
        self.state().pending.len()
    }

    /// Queue `request` behind a credential refresh and wait for its outcome
    ///
    /// Starts the refresh if none is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RefreshFailed`] when the refresh fails, the
    /// replay's own error when the replay fails, and
    /// [`ClientError::AuthExpired`] if recovery ends without settling this
    /// request.
    pub async fn recover(
        self: &Arc<Self>,
        transport: Arc<dyn RefreshTransport>,
        request: ApiRequest,
    ) -> Result<Envelope, ClientError> {
        let (responder, outcome) = oneshot::channel();

        let start_refresh = {
            let mut state = self.state();
            state.pending.push_back(PendingRequest { request, responder });
            if state.refreshing {
                debug!(queued = state.pending.len(), "refresh in flight; request queued");
                false
            } else {
                state.refreshing = true;
                true
            }
        };

        if start_refresh {
            let coordinator = Arc::clone(self);
            tokio::spawn(async move {
                coordinator.run_refresh(transport).await;
            });
        }

        outcome.await.unwrap_or(Err(ClientError::AuthExpired))
    }

    async fn run_refresh(&self, transport: Arc<dyn RefreshTransport>) {
        info!("authentication expired; refreshing credential");

        let refreshed = match self.store.credential() {
            Ok(Some(expired)) if expired.refresh_token.is_some() => transport.refresh(&expired).await,
            Ok(_) => Err(ClientError::refresh_failed("no refresh token stored")),
            Err(error) => Err(ClientError::refresh_failed(error.to_string())),
        };

        let credential = refreshed.and_then(|credential| {
            // Keep the old refresh token if the backend did not rotate it.
            let credential = match credential.refresh_token {
                Some(_) => credential,
                None => Credential::new(credential.token, self.store.refresh_token()?),
            };
            self.store.save(&credential)?;
            Ok(credential)
        });

        match credential {
            Ok(credential) => {
                info!("credential refreshed; replaying queued requests");
                self.replay_pending(transport.as_ref(), &credential).await;
            }
            Err(error) => {
                warn!(%error, "credential refresh failed");
                self.fail_pending(&error);
            }
        }
    }

    async fn replay_pending(&self, transport: &dyn RefreshTransport, credential: &Credential) {
        loop {
            let next = {
                let mut state = self.state();
                let next = state.pending.pop_front();
                if next.is_none() {
                    state.refreshing = false;
                }
                next
            };
            let Some(PendingRequest { request, responder }) = next else {
                break;
            };

            let result = match transport.replay(&request, credential).await {
                Ok(exchange) => self.settle_replay(&exchange),
                Err(error) => {
                    notify::notify_failure(self.notifier.as_ref(), &error);
                    Err(error)
                }
            };
            if responder.send(result).is_err() {
                debug!(path = request.path(), "caller went away before its replay settled");
            }
        }
    }

    fn fail_pending(&self, error: &ClientError) {
        if let Err(clear_error) = self.store.clear() {
            warn!(error = %clear_error, "failed to clear stored credentials");
        }

        let pending = {
            let mut state = self.state();
            state.refreshing = false;
            std::mem::take(&mut state.pending)
        };

        let message = match error {
            ClientError::RefreshFailed { message } => message.clone(),
            other => other.to_string(),
        };
        for PendingRequest { responder, .. } in pending {
            let _ = responder.send(Err(ClientError::refresh_failed(message.clone())));
        }

        self.notifier.notify(Severity::Warning, SESSION_EXPIRED_MESSAGE);
        self.session.redirect_to_login();
    }

    /// Judge the response to a replayed request
    ///
    /// A second authentication failure is final; it never starts another
    /// refresh.
    pub(crate) fn settle_replay(&self, exchange: &Exchange) -> Result<Envelope, ClientError> {
        match interceptor::inspect(exchange) {
            Verdict::Success(envelope) => Ok(envelope),
            Verdict::AuthFailure { message } => {
                let error = ClientError::AuthenticationFailed(message);
                notify::notify_failure(self.notifier.as_ref(), &error);
                Err(error)
            }
            Verdict::Failure(error) => {
                notify::notify_failure(self.notifier.as_ref(), &error);
                Err(error)
            }
        }
    }
}

impl std::fmt::Debug for AuthCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("AuthCoordinator")
            .field("refreshing", &state.refreshing)
            .field("pending", &state.pending.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::notify::MockNotifier;
    use crate::client::session::MemoryNavigator;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    /// Refresh blocks until the test adds a permit
    struct HeldTransport {
        release: Semaphore,
        outcome: Result<Credential, String>,
        refreshes: AtomicUsize,
        replayed: Mutex<Vec<(String, String)>>,
    }

    impl HeldTransport {
        fn new(outcome: Result<Credential, String>) -> Arc<Self> {
            Arc::new(Self {
                release: Semaphore::new(0),
                outcome,
                refreshes: AtomicUsize::new(0),
                replayed: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl RefreshTransport for HeldTransport {
        async fn refresh(&self, expired: &Credential) -> Result<Credential, ClientError> {
            assert_eq!(expired.token, "stale");
            assert_eq!(expired.refresh_token.as_deref(), Some("refresh-1"));
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            self.release.acquire().await.unwrap().forget();
            self.outcome.clone().map_err(ClientError::refresh_failed)
        }

        async fn replay(
            &self,
            request: &ApiRequest,
            credential: &Credential,
        ) -> Result<Exchange, ClientError> {
            self.replayed
                .lock()
                .unwrap()
                .push((request.path().to_string(), credential.token.clone()));
            Ok(Exchange {
                status: StatusCode::OK,
                body: format!(r#"{{"code":200,"message":"ok","data":"{}"}}"#, request.path()),
            })
        }
    }

    fn coordinator(notifier: MockNotifier, navigator: Arc<MemoryNavigator>) -> Arc<AuthCoordinator> {
        let store = CredentialStore::in_memory();
        store
            .save(&Credential::new("stale", Some("refresh-1".into())))
            .unwrap();
        let session = SessionGuard::new(navigator, "/login");
        Arc::new(AuthCoordinator::new(store, session, Arc::new(notifier)))
    }

    async fn wait_for_queue(coordinator: &AuthCoordinator, len: usize) {
        while coordinator.pending_len() < len {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn one_refresh_serves_the_whole_burst_in_order() {
        let navigator = Arc::new(MemoryNavigator::new("/wallpaper"));
        let coordinator = coordinator(MockNotifier::new(), navigator.clone());
        let transport = HeldTransport::new(Ok(Credential::new("fresh", Some("refresh-2".into()))));

        let mut callers = Vec::new();
        for path in ["/wallpaper/1", "/wallpaper/2", "/wallpaper/3"] {
            let task_coordinator = coordinator.clone();
            let task_transport: Arc<dyn RefreshTransport> = transport.clone();
            callers.push(tokio::spawn(async move {
                task_coordinator
                    .recover(task_transport, ApiRequest::get(path))
                    .await
            }));
            wait_for_queue(&coordinator, callers.len()).await;
        }
        assert!(coordinator.is_refreshing());

        transport.release.add_permits(1);
        for (caller, path) in callers.into_iter().zip(["/wallpaper/1", "/wallpaper/2", "/wallpaper/3"]) {
            let envelope = caller.await.unwrap().unwrap();
            assert_eq!(envelope.data.unwrap(), path);
        }

        assert_eq!(transport.refreshes.load(Ordering::SeqCst), 1);
        let replayed = transport.replayed.lock().unwrap().clone();
        assert_eq!(
            replayed,
            vec![
                ("/wallpaper/1".to_string(), "fresh".to_string()),
                ("/wallpaper/2".to_string(), "fresh".to_string()),
                ("/wallpaper/3".to_string(), "fresh".to_string()),
            ]
        );
        assert!(!coordinator.is_refreshing());
        assert_eq!(
            coordinator.store.credential().unwrap().unwrap().token,
            "fresh"
        );
        assert!(navigator.history().is_empty());
    }

    #[tokio::test]
    async fn failed_refresh_rejects_everyone_and_redirects_once() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|severity, message| {
                *severity == Severity::Warning && message == SESSION_EXPIRED_MESSAGE
            })
            .times(1)
            .return_const(());
        let navigator = Arc::new(MemoryNavigator::new("/tag?page=3"));
        let coordinator = coordinator(notifier, navigator.clone());
        let transport = HeldTransport::new(Err("refresh token revoked".into()));

        let mut callers = Vec::new();
        for path in ["/tag/1", "/tag/2"] {
            let task_coordinator = coordinator.clone();
            let task_transport: Arc<dyn RefreshTransport> = transport.clone();
            callers.push(tokio::spawn(async move {
                task_coordinator
                    .recover(task_transport, ApiRequest::get(path))
                    .await
            }));
            wait_for_queue(&coordinator, callers.len()).await;
        }

        transport.release.add_permits(1);
        for caller in callers {
            let error = caller.await.unwrap().unwrap_err();
            assert!(
                matches!(&error, ClientError::RefreshFailed { message } if message == "refresh token revoked")
            );
        }

        assert!(transport.replayed.lock().unwrap().is_empty());
        assert_eq!(coordinator.store.credential().unwrap(), None);
        assert_eq!(
            navigator.history(),
            vec!["/login?redirect=%2Ftag%3Fpage%3D3"]
        );
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn missing_refresh_token_fails_without_calling_the_backend() {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(1).return_const(());
        let navigator = Arc::new(MemoryNavigator::new("/"));
        let session = SessionGuard::new(navigator.clone(), "/login");
        let coordinator = Arc::new(AuthCoordinator::new(
            CredentialStore::in_memory(),
            session,
            Arc::new(notifier),
        ));
        let transport = HeldTransport::new(Ok(Credential::new("unused", None)));

        let error = coordinator
            .recover(transport.clone(), ApiRequest::get("/user/info"))
            .await
            .unwrap_err();

        assert!(matches!(error, ClientError::RefreshFailed { .. }));
        assert_eq!(transport.refreshes.load(Ordering::SeqCst), 0);
        assert_eq!(navigator.history(), vec!["/login?redirect=%2F"]);
    }

    #[tokio::test]
    async fn unrotated_refresh_token_is_kept() {
        let navigator = Arc::new(MemoryNavigator::default());
        let coordinator = coordinator(MockNotifier::new(), navigator);
        let transport = HeldTransport::new(Ok(Credential::new("fresh", None)));
        transport.release.add_permits(1);

        coordinator
            .recover(transport.clone(), ApiRequest::get("/tag/all"))
            .await
            .unwrap();

        assert_eq!(
            coordinator.store.refresh_token().unwrap().as_deref(),
            Some("refresh-1")
        );
    }

    #[test]
    fn second_auth_failure_on_replay_is_final() {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(1).return_const(());
        let coordinator = coordinator(notifier, Arc::new(MemoryNavigator::default()));

        let result = coordinator.settle_replay(&Exchange {
            status: StatusCode::OK,
            body: r#"{"code":401,"message":"still expired"}"#.to_string(),
        });

        assert!(matches!(result, Err(ClientError::AuthenticationFailed(ref m)) if m == "still expired"));
        assert!(!coordinator.is_refreshing());
    }
}
