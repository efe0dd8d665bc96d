//! Locator normalization and display paths.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use thiserror::Error;

const SCHEME_SEPARATOR: &str = "://";
const FILE_PREFIX: &str = "file://";
const MAILBOX_PREFIX: &str = "mailbox://";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    #[error("Locator has no scheme: {0}")]
    MissingScheme(String),
}

/// Rewrite a daemon locator into the form the host opens.
///
/// `mailbox://` locators point at a message inside a local mailbox file; the
/// part after `?` selects the message and is dropped so the file itself is
/// opened. Every other scheme passes through unchanged.
///
/// # Errors
///
/// Returns [`LocatorError::MissingScheme`] if the locator has no `://`.
pub fn normalize(locator: &str) -> Result<String, LocatorError> {
    if let Some(payload) = locator.strip_prefix(MAILBOX_PREFIX) {
        let path = payload.split_once('?').map_or(payload, |(path, _)| path);
        return Ok(format!("{FILE_PREFIX}{path}"));
    }

    if !locator.contains(SCHEME_SEPARATOR) {
        return Err(LocatorError::MissingScheme(locator.to_string()));
    }

    Ok(locator.to_string())
}

/// True for `file://` locators.
#[must_use]
pub fn is_file(locator: &str) -> bool {
    locator.starts_with(FILE_PREFIX)
}

/// Local path of a `file://` locator.
#[must_use]
pub fn file_path(locator: &str) -> Option<&str> {
    locator.strip_prefix(FILE_PREFIX)
}

/// Text shown next to the caption.
///
/// The scheme is dropped; for local files a leading `home` directory is shown
/// as `~/`. Only a whole-prefix match is replaced.
#[must_use]
pub fn display_path(locator: &str, home: Option<&Path>) -> String {
    let Some(path) = file_path(locator) else {
        return locator
            .split_once(SCHEME_SEPARATOR)
            .map_or(locator, |(_, rest)| rest)
            .to_string();
    };

    let Some(home) = home
        .and_then(Path::to_str)
        .map(|h| h.trim_end_matches('/'))
        .filter(|h| !h.is_empty())
    else {
        return path.to_string();
    };

    match path.strip_prefix(home) {
        Some(rest) if rest.starts_with('/') => format!("~{rest}"),
        _ => path.to_string(),
    }
}

/// Last path segment of a locator, used when the caption is empty.
#[must_use]
pub fn file_name(locator: &str) -> &str {
    let path = locator
        .split_once(SCHEME_SEPARATOR)
        .map_or(locator, |(_, rest)| rest)
        .trim_end_matches('/');
    path.rsplit('/').next().unwrap_or(path)
}

/// The current user's home directory, if one can be determined.
#[must_use]
pub fn home_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}
