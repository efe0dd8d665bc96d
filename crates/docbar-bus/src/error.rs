//! Error types for the docbar-bus crate.
//!
//! Every zbus failure is classified on the way in so callers can tell a dead
//! daemon from a daemon that answered with an error.

const SERVICE_UNKNOWN: &str = "org.freedesktop.DBus.Error.ServiceUnknown";
const NAME_HAS_NO_OWNER: &str = "org.freedesktop.DBus.Error.NameHasNoOwner";
const NO_REPLY: &str = "org.freedesktop.DBus.Error.NoReply";

/// Unified error type for bus operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// The bus itself failed (no session bus, broken socket, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Nobody owns the daemon's bus name
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The daemon replied with an error
    #[error("Daemon error {name}: {message}")]
    Daemon { name: String, message: String },

    /// The reply did not have any of the expected shapes
    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    #[error("Invalid document id: {0}")]
    InvalidDocumentId(String),

    #[error("Request timeout")]
    Timeout,
}

impl BusError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedReply(message.into())
    }

    /// Whether the cached connection should be dropped after this error.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::ServiceUnavailable(_) | Self::Timeout)
    }

    fn from_error_name(name: String, detail: Option<String>) -> Self {
        match name.as_str() {
            SERVICE_UNKNOWN | NAME_HAS_NO_OWNER => Self::ServiceUnavailable(detail.unwrap_or(name)),
            NO_REPLY => Self::Timeout,
            _ => Self::Daemon {
                name,
                message: detail.unwrap_or_default(),
            },
        }
    }
}

impl From<zbus::Error> for BusError {
    fn from(e: zbus::Error) -> Self {
        match e {
            zbus::Error::MethodError(name, detail, _) => {
                Self::from_error_name(name.to_string(), detail)
            }
            zbus::Error::FDO(fdo) => match *fdo {
                zbus::fdo::Error::ServiceUnknown(m) | zbus::fdo::Error::NameHasNoOwner(m) => {
                    Self::ServiceUnavailable(m)
                }
                zbus::fdo::Error::NoReply(_) | zbus::fdo::Error::Timeout(_) => Self::Timeout,
                other => Self::Transport(other.to_string()),
            },
            zbus::Error::InputOutput(io) => Self::Transport(io.to_string()),
            zbus::Error::Variant(v) => Self::MalformedReply(v.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, BusError>;
