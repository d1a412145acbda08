use reqwest::StatusCode;
use serde::Deserialize;

/// A backend failure, classified once at the HTTP boundary.
///
/// `Clone` so one failed request can be handed to every caller that was
/// waiting on it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication required: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    Authorization(String),

    #[error("Request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Authentication,
    Authorization,
    Validation,
    Server,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// How the user should learn about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Logged only
    Silent,
    /// Transient, auto-dismissing notification
    Toast,
    /// Notification that stays until dismissed
    Persistent,
    /// Session is gone; send the user back to login
    RedirectToLogin,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

const MAX_MESSAGE_LEN: usize = 200;

impl ApiError {
    /// Classify a non-success HTTP response.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = extract_message(status, body);
        match status.as_u16() {
            401 => ApiError::Authentication(message),
            403 => ApiError::Authorization(message),
            code @ 400..=499 => ApiError::Validation { status: code, message },
            code @ 500..=599 => ApiError::Server { status: code, message },
            code => ApiError::Unknown(format!("unexpected status {}: {}", code, message)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Authentication(_) => ErrorKind::Authentication,
            ApiError::Authorization(_) => ErrorKind::Authorization,
            ApiError::Validation { .. } => ErrorKind::Validation,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    pub fn severity(&self) -> Severity {
        match self.kind() {
            ErrorKind::Validation => Severity::Low,
            ErrorKind::Network | ErrorKind::Authorization => Severity::Medium,
            ErrorKind::Server => Severity::High,
            ErrorKind::Authentication | ErrorKind::Unknown => Severity::Critical,
        }
    }

    pub fn disposition(&self) -> Disposition {
        if self.kind() == ErrorKind::Authentication {
            return Disposition::RedirectToLogin;
        }
        match self.severity() {
            Severity::Low => Disposition::Silent,
            Severity::Medium | Severity::High => Disposition::Toast,
            Severity::Critical => Disposition::Persistent,
        }
    }

    /// Short message suitable for a notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Could not reach the server. Check your connection.".to_string(),
            ApiError::Authentication(_) => "Your session has expired. Please log in again.".to_string(),
            ApiError::Authorization(_) => "You are not allowed to do that.".to_string(),
            ApiError::Validation { message, .. } => message.clone(),
            ApiError::Server { .. } => "The server failed to process the request.".to_string(),
            ApiError::Unknown(_) => "Something went wrong.".to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return ApiError::from_status(status, "");
        }
        if err.is_timeout() || err.is_connect() || err.is_request() {
            ApiError::Network(err.to_string())
        } else if err.is_decode() || err.is_body() {
            ApiError::Unknown(format!("failed to decode response: {}", err))
        } else {
            ApiError::Unknown(err.to_string())
        }
    }
}

/// Prefer the backend's `detail`/`message` field, fall back to the raw body.
fn extract_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.detail.or(parsed.message) {
            return message;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string();
    }
    trimmed.chars().take(MAX_MESSAGE_LEN).collect()
}
