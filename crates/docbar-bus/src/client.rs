//! zbus client for the indexing daemon.
//!
//! Method calls go through a dynamic [`zbus::Proxy`] so the service, object
//! path and interface stay configurable.

use async_trait::async_trait;
use docbar_types::{DocumentId, Statistics};
use tracing::{debug, trace};
use zbus::{Connection, Proxy};

use crate::backend::{BusNames, IndexBackend, QueryReply, QueryRequest};
use crate::error::{BusError, Result};
use crate::wire::{FieldList, HitRecord};

const METHOD_GET_STATISTICS: &str = "GetStatistics";
const METHOD_SIMPLE_QUERY: &str = "SimpleQuery";
const METHOD_QUERY: &str = "Query";
const METHOD_GET_DOCUMENT_INFO: &str = "GetDocumentInfo";

/// Bus client for the indexing daemon
#[derive(Clone)]
pub struct DaemonClient {
    proxy: Proxy<'static>,
}

impl DaemonClient {
    /// Connect to the session bus and bind to the daemon's object.
    ///
    /// This does not talk to the daemon itself; a missing daemon shows up on
    /// the first method call.
    ///
    /// # Errors
    ///
    /// Returns `BusError::Transport` if the session bus is unreachable or a
    /// bus name is invalid.
    pub async fn connect(names: &BusNames) -> Result<Self> {
        let connection = Connection::session().await?;
        Self::with_connection(&connection, names).await
    }

    /// Bind to the daemon's object over an existing connection.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the bus names is invalid.
    pub async fn with_connection(connection: &Connection, names: &BusNames) -> Result<Self> {
        let proxy = Proxy::new(
            connection,
            names.service.clone(),
            names.path.clone(),
            names.interface.clone(),
        )
        .await?;

        debug!(
            "Bound to {} at {} ({})",
            names.service, names.path, names.interface
        );

        Ok(Self { proxy })
    }
}

#[async_trait]
impl IndexBackend for DaemonClient {
    async fn statistics(&self) -> Result<Statistics> {
        let (crawled_files, documents): (u32, u32) =
            self.proxy.call(METHOD_GET_STATISTICS, &()).await?;

        trace!("Statistics: {crawled_files} crawled, {documents} documents");
        Ok(Statistics {
            crawled_files,
            documents,
        })
    }

    async fn simple_query(&self, text: &str, max: u32) -> Result<Vec<String>> {
        let ids: Vec<String> = self.proxy.call(METHOD_SIMPLE_QUERY, &(text, max)).await?;
        debug!("SimpleQuery '{text}' returned {} ids", ids.len());
        Ok(ids)
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryReply> {
        let (estimated_total, records): (u32, Vec<FieldList>) = self
            .proxy
            .call(
                METHOD_QUERY,
                &(
                    request.engine.as_str(),
                    request.scope.as_str(),
                    request.text.as_str(),
                    request.offset,
                    request.max,
                ),
            )
            .await?;

        debug!(
            "Query '{}' returned {} records (estimated total {estimated_total})",
            request.text,
            records.len()
        );

        Ok(QueryReply {
            estimated_total,
            records: records.into_iter().map(HitRecord::Fields).collect(),
        })
    }

    async fn document_info(&self, id: DocumentId) -> Result<HitRecord> {
        let message = self.proxy.call_method(METHOD_GET_DOCUMENT_INFO, &id).await?;
        let body = message.body();

        if let Ok(fields) = body.deserialize::<FieldList>() {
            return Ok(HitRecord::Fields(fields));
        }

        let (name, url, mime_type, language) = body
            .deserialize::<(String, String, String, String)>()
            .map_err(|e| BusError::malformed(format!("GetDocumentInfo({id}): {e}")))?;

        Ok(HitRecord::Tuple {
            name,
            url,
            mime_type,
            language,
        })
    }
}
