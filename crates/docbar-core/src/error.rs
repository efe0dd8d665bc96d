use thiserror::Error;

use crate::locator::LocatorError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bus error: {0}")]
    Bus(#[from] docbar_bus::BusError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Locator error: {0}")]
    Locator(#[from] LocatorError),

    #[error("Search service stopped")]
    ServiceStopped,
}

impl Error {
    /// Whether the daemon connection should be dropped after this error.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Bus(e) if e.is_transport())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
