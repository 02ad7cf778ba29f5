//! Navigation to the login entry point
//!
//! The pipeline never knows how the host application routes. It calls a
//! [`Navigator`] through a [`SessionGuard`], which builds the login target
//! and refuses to navigate when the user is already on the login page.

use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Default path of the login entry point
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Capability supplied by the host application
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Page the user is currently on, including any query string
    fn current_path(&self) -> String;

    /// Move the user to `target`
    fn navigate(&self, target: &str);
}

/// Navigator that only remembers where it was sent
///
/// Used by headless hosts such as the CLI.
#[derive(Debug)]
pub struct MemoryNavigator {
    state: Mutex<NavigationState>,
}

#[derive(Debug)]
struct NavigationState {
    current: String,
    history: Vec<String>,
}

impl MemoryNavigator {
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(NavigationState {
                current: initial_path.into(),
                history: Vec::new(),
            }),
        }
    }

    /// Every target passed to [`Navigator::navigate`], oldest first
    pub fn history(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .history
            .clone()
    }

    pub fn last_navigation(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .history
            .last()
            .cloned()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .clone()
    }

    fn navigate(&self, target: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.history.push(target.to_string());
        state.current = target.to_string();
    }
}

/// Guarded access to the login entry point
#[derive(Clone)]
pub struct SessionGuard {
    navigator: Arc<dyn Navigator>,
    login_path: String,
    // Serialises check-then-navigate so concurrent expiries redirect once.
    redirect_lock: Arc<Mutex<()>>,
}

impl SessionGuard {
    pub fn new(navigator: Arc<dyn Navigator>, login_path: impl Into<String>) -> Self {
        Self {
            navigator,
            login_path: login_path.into(),
            redirect_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Login target that returns the user to `from` afterwards
    pub fn login_url(&self, from: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(from.as_bytes()).collect();
        format!("{}?redirect={encoded}", self.login_path)
    }

    /// Whether `path` points at the login entry point
    pub fn is_login_path(&self, path: &str) -> bool {
        path.strip_prefix(self.login_path.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('?') || rest.starts_with('/'))
    }

    pub fn on_login_page(&self) -> bool {
        self.is_login_path(&self.navigator.current_path())
    }

    /// Send the user to the login page, remembering where they were
    ///
    /// Returns `false` without navigating when already on the login page.
    pub fn redirect_to_login(&self) -> bool {
        let _guard = self.redirect_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.navigator.current_path();
        if self.is_login_path(&current) {
            debug!("already on the login page; redirect suppressed");
            return false;
        }
        let target = self.login_url(&current);
        info!(target = %target, "redirecting to login");
        self.navigator.navigate(&target);
        true
    }

    /// Send the user to the login page after an explicit logout
    ///
    /// Returns `false` without navigating when already on the login page.
    pub fn leave_to_login(&self) -> bool {
        let _guard = self.redirect_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.on_login_page() {
            debug!("already on the login page; navigation suppressed");
            return false;
        }
        self.navigator.navigate(&self.login_path);
        true
    }
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn login_url_encodes_the_origin() {
        let guard = SessionGuard::new(Arc::new(MemoryNavigator::default()), "/login");
        assert_eq!(
            guard.login_url("/wallpaper?page=2"),
            "/login?redirect=%2Fwallpaper%3Fpage%3D2"
        );
    }

    #[test]
    fn login_path_matching() {
        let guard = SessionGuard::new(Arc::new(MemoryNavigator::default()), "/login");
        assert!(guard.is_login_path("/login"));
        assert!(guard.is_login_path("/login?redirect=%2F"));
        assert!(!guard.is_login_path("/loginhelp"));
        assert!(!guard.is_login_path("/tag"));
    }

    #[test]
    fn redirect_navigates_once_then_stays_put() {
        let navigator = Arc::new(MemoryNavigator::new("/category"));
        let guard = SessionGuard::new(navigator.clone(), "/login");

        assert!(guard.redirect_to_login());
        assert!(!guard.redirect_to_login());
        assert_eq!(navigator.history(), vec!["/login?redirect=%2Fcategory"]);
    }

    #[test]
    fn no_navigation_from_the_login_page() {
        let mut navigator = MockNavigator::new();
        navigator
            .expect_current_path()
            .return_const("/login?redirect=%2Ftag".to_string());
        navigator.expect_navigate().never();

        let guard = SessionGuard::new(Arc::new(navigator), "/login");
        assert!(!guard.redirect_to_login());
        assert!(!guard.leave_to_login());
    }

    #[test]
    fn logout_navigates_to_the_bare_login_path() {
        let mut navigator = MockNavigator::new();
        navigator
            .expect_current_path()
            .return_const("/wallpaper".to_string());
        navigator
            .expect_navigate()
            .with(eq("/login"))
            .times(1)
            .return_const(());

        let guard = SessionGuard::new(Arc::new(navigator), "/login");
        assert!(guard.leave_to_login());
    }
}
