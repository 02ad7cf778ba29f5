//! Wallpaper catalog HTTP client

pub mod category;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod interceptor;
pub mod notify;
pub mod request;
pub mod session;
pub mod tag;
pub mod transport;
pub mod user;
pub mod wallpaper;

use self::config::ClientConfig;
use coordinator::AuthCoordinator;
use error::ClientError;
use interceptor::Verdict;
use notify::{Notifier, TracingNotifier};
use request::ApiRequest;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use session::{MemoryNavigator, Navigator, SessionGuard};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use transport::{Exchange, Transport};
use wallpaper_core::{CredentialStore, Envelope};

/// Wallpaper catalog API client
///
/// Cloning is cheap; clones share the credential store and the refresh
/// coordinator, so a burst of failures across clones still refreshes once.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<Transport>,
    store: CredentialStore,
    session: SessionGuard,
    notifier: Arc<dyn Notifier>,
    coordinator: Arc<AuthCoordinator>,
}

impl AdminClient {
    /// Create a new client with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> AdminClientBuilder {
        AdminClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.inner.transport.base_url()
    }

    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }

    pub fn session(&self) -> &SessionGuard {
        &self.inner.session
    }

    pub fn coordinator(&self) -> &Arc<AuthCoordinator> {
        &self.inner.coordinator
    }

    /// Send a request through the interceptors and return its envelope
    ///
    /// Authentication failures are handed to the coordinator and resolve
    /// once the credential refresh settles.
    ///
    /// # Errors
    ///
    /// Returns the classified failure; every failure except those of the
    /// logout call has already been notified.
    pub async fn send(&self, request: ApiRequest) -> Result<Envelope, ClientError> {
        let inner = &self.inner;
        let credential = inner.store.credential()?;

        let exchange = match inner.transport.dispatch(&request, credential.as_ref()).await {
            Ok(exchange) => exchange,
            Err(error) => {
                if !request.is_logout() {
                    notify::notify_failure(inner.notifier.as_ref(), &error);
                }
                return Err(error);
            }
        };

        if request.is_logout() {
            return logout_outcome(&exchange);
        }

        match interceptor::inspect(&exchange) {
            Verdict::Success(envelope) => Ok(envelope),
            Verdict::AuthFailure { message } => {
                debug!(path = request.path(), %message, "authentication failure");

                // A refresh finished while this request was in flight.
                let current = inner.store.credential()?;
                if let (Some(used), Some(current)) = (credential.as_ref(), current) {
                    if used.token != current.token && !inner.coordinator.is_refreshing() {
                        debug!(path = request.path(), "retrying with the refreshed credential");
                        return match inner.transport.dispatch(&request, Some(&current)).await {
                            Ok(exchange) => inner.coordinator.settle_replay(&exchange),
                            Err(error) => {
                                notify::notify_failure(inner.notifier.as_ref(), &error);
                                Err(error)
                            }
                        };
                    }
                }

                inner
                    .coordinator
                    .recover(inner.transport.clone(), request)
                    .await
            }
            Verdict::Failure(error) => {
                notify::notify_failure(inner.notifier.as_ref(), &error);
                Err(error)
            }
        }
    }

    /// Send a request and decode the envelope's `data`
    ///
    /// # Errors
    ///
    /// Returns any error from [`send`](Self::send), or a serialization
    /// error if `data` does not match `T`
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let envelope = self.send(request).await?;
        Ok(serde_json::from_value(
            envelope.data.unwrap_or(JsonValue::Null),
        )?)
    }

    /// `GET path`
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute)
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(ApiRequest::get(path)).await
    }

    /// `GET path` with the fields of `query` as parameters
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute)
    pub async fn get_with<T, Q>(&self, path: &str, query: &Q) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.execute(ApiRequest::get(path).query(query)?).await
    }

    /// `POST path` with a JSON body
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute)
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(ApiRequest::post(path).json(body)?).await
    }

    /// `PUT path` with a JSON body
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute)
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(ApiRequest::put(path).json(body)?).await
    }

    /// `DELETE path`
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute)
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(ApiRequest::delete(path)).await
    }
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("base_url", &self.base_url())
            .field("coordinator", &self.inner.coordinator)
            .finish_non_exhaustive()
    }
}

// Logout bypasses classification: its result is returned as received.
fn logout_outcome(exchange: &Exchange) -> Result<Envelope, ClientError> {
    if exchange.status.is_success() {
        exchange.envelope()
    } else {
        Err(ClientError::from_status(exchange.status, exchange.message()))
    }
}

/// Builder for [`AdminClient`]
#[derive(Default)]
pub struct AdminClientBuilder {
    base_url: Option<String>,
    timeout: Option<Option<Duration>>,
    user_agent: Option<String>,
    login_path: Option<String>,
    store: Option<CredentialStore>,
    navigator: Option<Arc<dyn Navigator>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl AdminClientBuilder {
    /// Set the base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(Some(timeout));
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the login entry point used for session-expired redirects
    #[must_use]
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = Some(path.into());
        self
    }

    /// Take every connection setting from `config`
    #[must_use]
    pub fn config(mut self, config: &ClientConfig) -> Self {
        self.base_url = Some(config.base_url.clone());
        self.timeout = Some(config.timeout());
        self.user_agent = Some(config.user_agent.clone());
        self.login_path = Some(config.login_path.clone());
        self
    }

    /// Use `store` for credentials instead of a fresh in-memory store
    #[must_use]
    pub fn store(mut self, store: CredentialStore) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was given or the HTTP client cannot
    /// be constructed
    pub fn build(self) -> Result<AdminClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        let defaults = ClientConfig::default();
        let timeout = self.timeout.unwrap_or_else(|| defaults.timeout());
        let user_agent = self.user_agent.unwrap_or(defaults.user_agent);
        let transport = Arc::new(Transport::new(base_url, timeout, &user_agent)?);

        let store = self.store.unwrap_or_else(CredentialStore::in_memory);
        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(MemoryNavigator::default()));
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier));
        let session = SessionGuard::new(
            navigator,
            self.login_path.unwrap_or(defaults.login_path),
        );
        let coordinator = Arc::new(AuthCoordinator::new(
            store.clone(),
            session.clone(),
            notifier.clone(),
        ));

        Ok(AdminClient {
            inner: Arc::new(ClientInner {
                transport,
                store,
                session,
                notifier,
                coordinator,
            }),
        })
    }
}
