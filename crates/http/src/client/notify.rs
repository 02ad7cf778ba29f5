//! User-facing notifications raised by the pipeline

use super::ClientError;
use tracing::{error, warn};

/// Shown when no response reached the client
pub const NETWORK_UNREACHABLE_MESSAGE: &str =
    "Network unreachable, please check your connection and try again";

/// Shown when the session could not be renewed
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired, please log in again";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Surface for messages meant for the person using the client
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}

/// Notifier that writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Warning => warn!(target: "wallpaper::notify", "{message}"),
            Severity::Error => error!(target: "wallpaper::notify", "{message}"),
        }
    }
}

/// Raise the notification that belongs to `error`
pub(crate) fn notify_failure(notifier: &dyn Notifier, error: &ClientError) {
    match error {
        ClientError::NetworkUnreachable { .. } => {
            notifier.notify(Severity::Error, NETWORK_UNREACHABLE_MESSAGE);
        }
        ClientError::RefreshFailed { .. } | ClientError::AuthExpired => {
            notifier.notify(Severity::Warning, SESSION_EXPIRED_MESSAGE);
        }
        other => notifier.notify(Severity::Error, &other.user_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn network_failures_get_their_own_message() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .with(eq(Severity::Error), eq(NETWORK_UNREACHABLE_MESSAGE))
            .times(1)
            .return_const(());

        notify_failure(
            &notifier,
            &ClientError::NetworkUnreachable {
                message: "connection refused".into(),
            },
        );
    }

    #[test]
    fn application_errors_show_the_backend_message() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .with(eq(Severity::Error), eq("tag already exists"))
            .times(1)
            .return_const(());

        notify_failure(&notifier, &ClientError::application(500, "tag already exists"));
    }
}
