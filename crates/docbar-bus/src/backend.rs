//! The daemon interface as seen by docbar.

use async_trait::async_trait;
use docbar_types::{DocumentId, Statistics};

use crate::error::Result;
use crate::wire::HitRecord;

pub const DEFAULT_SERVICE: &str = "de.berlios.Pinot";
pub const DEFAULT_PATH: &str = "/de/berlios/Pinot";
pub const DEFAULT_INTERFACE: &str = "de.berlios.Pinot";

/// Where the daemon lives on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusNames {
    pub service: String,
    pub path: String,
    pub interface: String,
}

impl Default for BusNames {
    fn default() -> Self {
        Self {
            service: DEFAULT_SERVICE.to_string(),
            path: DEFAULT_PATH.to_string(),
            interface: DEFAULT_INTERFACE.to_string(),
        }
    }
}

/// Arguments of the `Query` method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub engine: String,
    pub scope: String,
    pub text: String,
    pub offset: u32,
    pub max: u32,
}

/// Reply of the `Query` method
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryReply {
    /// The daemon's estimate of the total match count, not the record count
    pub estimated_total: u32,
    pub records: Vec<HitRecord>,
}

/// Operations docbar needs from the indexing daemon.
///
/// Implemented over the session bus by [`crate::DaemonClient`]; tests supply
/// in-memory fakes.
#[async_trait]
pub trait IndexBackend: Send + Sync {
    /// `GetStatistics`, also used as the liveness probe.
    async fn statistics(&self) -> Result<Statistics>;

    /// `SimpleQuery`: identifiers of matching documents.
    async fn simple_query(&self, text: &str, max: u32) -> Result<Vec<String>>;

    /// `Query`: matching documents with their records embedded.
    async fn query(&self, request: &QueryRequest) -> Result<QueryReply>;

    /// `GetDocumentInfo` in either of its reply shapes.
    async fn document_info(&self, id: DocumentId) -> Result<HitRecord>;
}
