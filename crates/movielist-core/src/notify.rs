use movielist_api::{ApiError, Disposition};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A user-facing message. Transient unless `persistent` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub persistent: bool,
    /// The session is gone and the user has to log in again
    pub redirect_to_login: bool,
}

impl Notification {
    fn transient(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            persistent: false,
            redirect_to_login: false,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::transient(NotificationLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::transient(NotificationLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::transient(NotificationLevel::Error, message)
    }
}

/// Notification for a failed backend call. `action` completes the sentence
/// "Could not ...".
pub fn notification_for_error(err: &ApiError, action: &str) -> Notification {
    let mut notification = Notification::error(format!("Could not {}: {}", action, err.user_message()));
    match err.disposition() {
        Disposition::RedirectToLogin => {
            notification.message.push_str(". Please log in again");
            notification.persistent = true;
            notification.redirect_to_login = true;
        }
        Disposition::Persistent => notification.persistent = true,
        Disposition::Toast | Disposition::Silent => {}
    }
    notification
}

/// Presents notifications to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success | NotificationLevel::Info => info!("{}", notification.message),
            NotificationLevel::Warning => warn!("{}", notification.message),
            NotificationLevel::Error => error!("{}", notification.message),
        }
    }
}

/// Report a failure that did not come from a direct user action.
/// Low-severity failures are only logged.
pub fn report_background_error(notifier: &dyn Notifier, err: &ApiError, action: &str) {
    if err.disposition() == Disposition::Silent {
        warn!(error = %err, "Could not {}", action);
        return;
    }
    notifier.notify(notification_for_error(err, action));
}
