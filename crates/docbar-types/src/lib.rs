//! Shared types for docbar components.
//!
//! This crate provides the types exchanged between docbar-bus, docbar-core
//! and the host launcher. All host-facing types are serializable so a host
//! can forward them over its own transport.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Content type assumed when the daemon does not report one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Identifier the indexing daemon assigns to a document.
pub type DocumentId = u32;

/// Deserialize a Vec that may be null or missing (both become empty vec)
fn deserialize_null_as_empty_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let opt: Option<Vec<T>> = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// One matched document, normalized from whichever wire shape the daemon used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentHit {
    /// Daemon identifier, absent when the hit came embedded in a query reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,

    /// Display name (the daemon's `caption`)
    pub caption: String,

    /// Normalized locator, e.g. `file:///home/alice/notes.txt`
    pub locator: String,

    pub mime_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modtime: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Raw extract as sent by the daemon, before tag stripping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<String>,
}

impl DocumentHit {
    #[must_use]
    pub fn new(caption: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            id: None,
            caption: caption.into(),
            locator: locator.into(),
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            language: None,
            modtime: None,
            size: None,
            extract: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: DocumentId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    #[must_use]
    pub fn with_extract(mut self, extract: impl Into<String>) -> Self {
        self.extract = Some(extract.into());
        self
    }

    /// Scheme part of the locator (`file`, `http`, ...), if it has one.
    #[must_use]
    pub fn scheme(&self) -> Option<&str> {
        self.locator.split_once("://").map(|(scheme, _)| scheme)
    }
}

/// Launcher category a match is listed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Files,
    Documents,
}

impl Category {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Files => "files",
            Category::Documents => "documents",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default action the host runs when a match is activated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchAction {
    /// Open a local file with its default application
    OpenFile { path: String },

    /// Hand the URL to whatever handles its scheme
    OpenUrl { url: String, scheme: String },
}

impl MatchAction {
    /// Target handed to the host's opener.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            MatchAction::OpenFile { path } => path,
            MatchAction::OpenUrl { url, .. } => url,
        }
    }
}

/// A document hit rendered for the launcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,

    /// "caption (~/path/to/file)"
    pub name: String,

    pub category: Category,

    pub verb: String,

    pub action: MatchAction,

    /// Freedesktop icon name derived from the content type
    pub icon: String,

    pub mime_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Tag-stripped, escaped extract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Finalized result set for one submitted query.
///
/// Emitted at most once per query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    /// Text of the query these matches answer
    pub query: String,

    /// Matches in reply arrival order
    #[serde(default, deserialize_with = "deserialize_null_as_empty_vec")]
    pub matches: Vec<HitMatch>,

    /// Number of replies the query waited for
    pub expected: usize,

    /// Replies that failed or could not be parsed
    #[serde(default)]
    pub failed: usize,

    /// Set when the reply deadline finalized the set early
    #[serde(default)]
    pub timed_out: bool,
}

impl Completion {
    #[must_use]
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            matches: Vec::new(),
            expected: 0,
            failed: 0,
            timed_out: false,
        }
    }

    /// True when every expected reply resolved to a match.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.timed_out && self.failed == 0 && self.matches.len() == self.expected
    }
}

/// Outcome of the plugin prerequisites check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Requirements {
    /// Everything is in place
    Ready,

    /// The plugin cannot work in this environment
    NotApplicable { reason: String },

    /// The plugin works once something is started
    NeedsActivation { reason: String },
}

impl Requirements {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Requirements::Ready)
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Requirements::Ready => None,
            Requirements::NotApplicable { reason } | Requirements::NeedsActivation { reason } => {
                Some(reason)
            }
        }
    }
}

/// Index statistics reported by the daemon
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub crawled_files: u32,
    pub documents: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_match() -> HitMatch {
        HitMatch {
            id: Some(7),
            name: "Report (~/report.pdf)".to_string(),
            category: Category::Files,
            verb: "Open".to_string(),
            action: MatchAction::OpenFile {
                path: "/home/alice/report.pdf".to_string(),
            },
            icon: "application-pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            language: None,
            snippet: None,
        }
    }

    #[test]
    fn test_document_hit_defaults_to_octet_stream() {
        let hit = DocumentHit::new("Notes", "file:///tmp/notes.txt");
        assert_eq!(hit.mime_type, DEFAULT_MIME_TYPE);
        assert!(hit.id.is_none());
        assert!(hit.extract.is_none());
    }

    #[test]
    fn test_document_hit_builders() {
        let hit = DocumentHit::new("Notes", "file:///tmp/notes.txt")
            .with_id(42)
            .with_mime_type("text/plain")
            .with_extract("<b>hello</b>");
        assert_eq!(hit.id, Some(42));
        assert_eq!(hit.mime_type, "text/plain");
        assert_eq!(hit.extract.as_deref(), Some("<b>hello</b>"));
    }

    #[test]
    fn test_document_hit_scheme() {
        assert_eq!(
            DocumentHit::new("a", "file:///tmp/a").scheme(),
            Some("file")
        );
        assert_eq!(
            DocumentHit::new("a", "https://example.org").scheme(),
            Some("https")
        );
        assert_eq!(DocumentHit::new("a", "/tmp/a").scheme(), None);
    }

    #[test]
    fn test_document_hit_serializes_camel_case_and_skips_none() {
        let hit = DocumentHit::new("Notes", "file:///tmp/notes.txt").with_id(3);
        let value = serde_json::to_value(&hit).unwrap();
        assert_eq!(value["mimeType"], DEFAULT_MIME_TYPE);
        assert_eq!(value["id"], 3);
        assert!(value.get("language").is_none());
        assert!(value.get("extract").is_none());
    }

    #[test]
    fn test_category_as_str() {
        assert_eq!(Category::Files.as_str(), "files");
        assert_eq!(Category::Documents.to_string(), "documents");
        assert_eq!(serde_json::to_value(Category::Files).unwrap(), "files");
    }

    #[test]
    fn test_match_action_tagged() {
        let action = MatchAction::OpenUrl {
            url: "https://example.org/a".to_string(),
            scheme: "https".to_string(),
        };
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["type"], "open_url");
        assert_eq!(value["scheme"], "https");
        assert_eq!(action.target(), "https://example.org/a");
    }

    #[test]
    fn test_completion_null_matches_become_empty() {
        let completion: Completion = serde_json::from_value(json!({
            "query": "rust",
            "matches": null,
            "expected": 0
        }))
        .unwrap();
        assert!(completion.matches.is_empty());
        assert!(completion.is_complete());
    }

    #[test]
    fn test_completion_is_complete() {
        let mut completion = Completion::empty("rust");
        completion.expected = 1;
        assert!(!completion.is_complete());

        completion.matches.push(sample_match());
        assert!(completion.is_complete());

        completion.timed_out = true;
        assert!(!completion.is_complete());
    }

    #[test]
    fn test_requirements_serialization() {
        let value = serde_json::to_value(Requirements::NeedsActivation {
            reason: "daemon not running".to_string(),
        })
        .unwrap();
        assert_eq!(value["status"], "needs_activation");
        assert_eq!(value["reason"], "daemon not running");

        let ready: Requirements = serde_json::from_value(json!({"status": "ready"})).unwrap();
        assert!(ready.is_ready());
        assert!(ready.reason().is_none());
    }

    #[test]
    fn test_requirements_reason() {
        let req = Requirements::NotApplicable {
            reason: "no bus".to_string(),
        };
        assert!(!req.is_ready());
        assert_eq!(req.reason(), Some("no bus"));
    }
}
