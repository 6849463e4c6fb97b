//! Error taxonomy for the discovery engine.
//!
//! Transport failures surface as [`FetchError`] inside the provider layer and
//! are converted into the user-facing [`DiscoveryError`] at every fetch
//! boundary. The screen never shows an error directly; it shows the single
//! [`StatusMessage`] derived from it.

use thiserror::Error;

/// Result type for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Low-level failure of an HTTP exchange.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The request never produced a response (DNS, connect, timeout).
    #[error("Request failed: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Errors surfaced to the user as a status message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    /// No valid session token is available.
    #[error("Sign-in required")]
    AuthRequired,

    /// Connectivity failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream 5xx or an unusable response.
    #[error("Server error: {0}")]
    Server(String),

    /// Upstream 4xx or an empty result.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed location payload. Resolved silently to the default coordinate.
    #[error("Invalid geometry: {0}")]
    Geometry(String),

    /// The selected entity is not part of the rendered list window.
    #[error("Entity {0} is not in the current list")]
    ScrollTargetMissing(String),
}

impl From<FetchError> for DiscoveryError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Status { status, .. } if status == 401 || status == 403 => {
                DiscoveryError::AuthRequired
            }
            FetchError::Status { status, url } if (400..500).contains(&status) => {
                DiscoveryError::NotFound(format!("HTTP {} from {}", status, url))
            }
            FetchError::Status { status, url } => {
                DiscoveryError::Server(format!("HTTP {} from {}", status, url))
            }
            FetchError::Transport(msg) => DiscoveryError::Network(msg),
            FetchError::Decode(msg) => DiscoveryError::Server(msg),
        }
    }
}

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// The single transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }
}

impl std::fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Text shown when a tapped marker has no card in the list window.
pub const NOT_IN_LIST_MESSAGE: &str = "Not in the current list. Search or load more to find it.";

impl DiscoveryError {
    /// The status message the user sees for this error.
    pub fn status_message(&self) -> StatusMessage {
        match self {
            DiscoveryError::AuthRequired => {
                StatusMessage::error("Your session has expired. Please sign in again.")
            }
            DiscoveryError::Network(_) => {
                StatusMessage::error("Network error. Check your connection.")
            }
            DiscoveryError::Server(_) => {
                StatusMessage::error("The server is unavailable. Try again later.")
            }
            DiscoveryError::NotFound(_) => StatusMessage::warning("No data for this selection."),
            DiscoveryError::Geometry(_) => {
                StatusMessage::info("Some locations could not be read and are shown approximately.")
            }
            DiscoveryError::ScrollTargetMissing(_) => StatusMessage::info(NOT_IN_LIST_MESSAGE),
        }
    }

    /// True when the user must be redirected to sign-in.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, DiscoveryError::AuthRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> FetchError {
        FetchError::Status {
            status: code,
            url: "http://api/listings".to_string(),
        }
    }

    #[test]
    fn test_unauthorized_maps_to_auth_required() {
        assert_eq!(DiscoveryError::from(status(401)), DiscoveryError::AuthRequired);
        assert_eq!(DiscoveryError::from(status(403)), DiscoveryError::AuthRequired);
    }

    #[test]
    fn test_client_error_maps_to_not_found() {
        assert!(matches!(
            DiscoveryError::from(status(404)),
            DiscoveryError::NotFound(_)
        ));
        assert!(matches!(
            DiscoveryError::from(status(422)),
            DiscoveryError::NotFound(_)
        ));
    }

    #[test]
    fn test_server_error_maps_to_server() {
        assert!(matches!(
            DiscoveryError::from(status(503)),
            DiscoveryError::Server(_)
        ));
    }

    #[test]
    fn test_transport_and_decode() {
        assert!(matches!(
            DiscoveryError::from(FetchError::Transport("dns".into())),
            DiscoveryError::Network(_)
        ));
        assert!(matches!(
            DiscoveryError::from(FetchError::Decode("eof".into())),
            DiscoveryError::Server(_)
        ));
    }

    #[test]
    fn test_status_messages() {
        assert!(DiscoveryError::Network("x".into())
            .status_message()
            .text
            .contains("Check your connection"));
        assert!(DiscoveryError::Server("x".into())
            .status_message()
            .text
            .contains("Try again later"));
        assert_eq!(
            DiscoveryError::NotFound("x".into()).status_message().level,
            StatusLevel::Warning
        );
        assert_eq!(
            DiscoveryError::ScrollTargetMissing("point:1".into())
                .status_message()
                .text,
            NOT_IN_LIST_MESSAGE
        );
    }

    #[test]
    fn test_requires_sign_in() {
        assert!(DiscoveryError::AuthRequired.requires_sign_in());
        assert!(!DiscoveryError::Network("x".into()).requires_sign_in());
    }
}
