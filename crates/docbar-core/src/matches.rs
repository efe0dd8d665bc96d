//! Rendering of document hits into launcher matches.

use std::path::PathBuf;

use docbar_types::{Category, DocumentHit, HitMatch, MatchAction};

use crate::config::DisplayConfig;
use crate::locator;
use crate::snippet;

const GENERIC_TEXT_ICON: &str = "text-x-generic";
const UNKNOWN_ICON: &str = "unknown";

/// Turns [`DocumentHit`]s into [`HitMatch`]es using the display settings.
#[derive(Debug, Clone)]
pub struct MatchRenderer {
    home: Option<PathBuf>,
    snippet_max_chars: usize,
}

impl MatchRenderer {
    #[must_use]
    pub fn new(display: &DisplayConfig) -> Self {
        Self {
            home: if display.tilde_home {
                locator::home_dir()
            } else {
                None
            },
            snippet_max_chars: display.snippet_max_chars,
        }
    }

    /// Override the home directory used for `~/` display paths.
    #[must_use]
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    #[must_use]
    pub fn render(&self, hit: &DocumentHit) -> HitMatch {
        let shown_path = locator::display_path(&hit.locator, self.home.as_deref());
        let caption = if hit.caption.trim().is_empty() {
            locator::file_name(&hit.locator)
        } else {
            hit.caption.as_str()
        };

        let (category, verb, action) = match locator::file_path(&hit.locator) {
            Some(path) => (
                Category::Files,
                "Open",
                MatchAction::OpenFile {
                    path: path.to_string(),
                },
            ),
            None => (
                Category::Documents,
                "Show",
                MatchAction::OpenUrl {
                    url: hit.locator.clone(),
                    scheme: hit.scheme().unwrap_or_default().to_string(),
                },
            ),
        };

        HitMatch {
            id: hit.id,
            name: format!("{caption} ({shown_path})"),
            category,
            verb: verb.to_string(),
            action,
            icon: icon_name(&hit.mime_type),
            mime_type: hit.mime_type.clone(),
            language: hit.language.clone(),
            snippet: hit
                .extract
                .as_deref()
                .and_then(|extract| snippet::render(extract, self.snippet_max_chars)),
        }
    }
}

/// Freedesktop icon name for a content type.
#[must_use]
pub fn icon_name(mime_type: &str) -> String {
    let mime_type = mime_type.trim();
    match mime_type.split_once('/') {
        Some((major, minor)) if !major.is_empty() && !minor.is_empty() => {
            if mime_type == docbar_types::DEFAULT_MIME_TYPE {
                UNKNOWN_ICON.to_string()
            } else {
                mime_type.replace('/', "-")
            }
        }
        Some(("text", _)) => GENERIC_TEXT_ICON.to_string(),
        _ => UNKNOWN_ICON.to_string(),
    }
}
