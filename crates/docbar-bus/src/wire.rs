//! Translation of daemon replies into [`DocumentHit`]s.
//!
//! The daemon has described documents three ways over its lifetime:
//!
//! - `GetDocumentInfo` returning a `(name, url, mime_type, language)` tuple
//! - `GetDocumentInfo` returning an `a(ss)` list of field/value pairs
//! - `Query` returning the same field lists embedded in the query reply
//!
//! All three end up as a [`HitRecord`], and [`HitRecord::into_hit`] is the only
//! place that knows the field names.

use docbar_types::{DEFAULT_MIME_TYPE, DocumentHit, DocumentId};

use crate::error::{BusError, Result};

const FIELD_CAPTION: &str = "caption";
const FIELD_URL: &str = "url";
const FIELD_TYPE: &str = "type";
const FIELD_LANGUAGE: &str = "language";
const FIELD_MODTIME: &str = "modtime";
const FIELD_SIZE: &str = "size";
const FIELD_EXTRACT: &str = "extract";

/// `a(ss)` field list as sent on the wire
pub type FieldList = Vec<(String, String)>;

/// One document description in any of the daemon's reply shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitRecord {
    /// Field/value pairs (`caption`, `url`, `type`, ...)
    Fields(FieldList),

    /// Positional tuple from the oldest interface
    Tuple {
        name: String,
        url: String,
        mime_type: String,
        language: String,
    },
}

impl HitRecord {
    /// Normalize into a [`DocumentHit`].
    ///
    /// The locator is copied as sent; scheme rewriting happens in docbar-core.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::MalformedReply`] if the record carries no url.
    pub fn into_hit(self, id: Option<DocumentId>) -> Result<DocumentHit> {
        let mut hit = match self {
            HitRecord::Tuple {
                name,
                url,
                mime_type,
                language,
            } => DocumentHit {
                id: None,
                caption: name,
                locator: url,
                mime_type,
                language: non_empty(language),
                modtime: None,
                size: None,
                extract: None,
            },
            HitRecord::Fields(fields) => from_fields(fields),
        };

        if hit.locator.is_empty() {
            return Err(BusError::malformed("record has no url"));
        }
        if hit.mime_type.is_empty() {
            hit.mime_type = DEFAULT_MIME_TYPE.to_string();
        }
        hit.id = id;
        Ok(hit)
    }
}

fn from_fields(fields: FieldList) -> DocumentHit {
    let mut hit = DocumentHit::new(String::new(), String::new());

    for (name, value) in fields {
        match name.as_str() {
            FIELD_CAPTION => hit.caption = value,
            FIELD_URL => hit.locator = value,
            FIELD_TYPE => hit.mime_type = value,
            FIELD_LANGUAGE => hit.language = non_empty(value),
            FIELD_MODTIME => hit.modtime = non_empty(value),
            FIELD_SIZE => hit.size = value.trim().parse().ok(),
            FIELD_EXTRACT => hit.extract = non_empty(value),
            _ => {}
        }
    }

    hit
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Parse an identifier from a `SimpleQuery` reply.
///
/// # Errors
///
/// Returns [`BusError::InvalidDocumentId`] if the string is not a `u32`.
pub fn parse_document_id(raw: &str) -> Result<DocumentId> {
    raw.trim()
        .parse()
        .map_err(|_| BusError::InvalidDocumentId(raw.to_string()))
}
