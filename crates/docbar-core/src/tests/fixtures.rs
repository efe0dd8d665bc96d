//! Test fixtures and helpers

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use docbar_bus::{
    BusError, Connector, DocumentHit, DocumentId, HitRecord, IndexBackend, QueryReply,
    QueryRequest, Statistics,
};

use crate::config::{Config, WireShape};

/// How the fake daemon answers `GetDocumentInfo` for one id
#[derive(Debug, Clone)]
pub enum Reply {
    Record(HitRecord, Duration),
    Error(BusError, Duration),
    Never,
}

/// How the fake daemon answers `GetStatistics`
#[derive(Debug, Clone, Default)]
pub enum Probe {
    #[default]
    Answer,
    Fail(BusError),
    Never,
}

/// In-memory stand-in for the indexing daemon
#[derive(Debug, Default)]
pub struct FakeBackend {
    /// `SimpleQuery` identifiers per query text
    pub ids: HashMap<String, Vec<String>>,
    pub documents: HashMap<DocumentId, Reply>,
    /// `Query` records per query text
    pub records: HashMap<String, Vec<HitRecord>>,
    pub lookup_error: Option<BusError>,
    pub probe: Mutex<Probe>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(mut self, text: &str, ids: &[&str]) -> Self {
        self.ids
            .insert(text.to_string(), ids.iter().map(ToString::to_string).collect());
        self
    }

    pub fn with_document(mut self, id: DocumentId, reply: Reply) -> Self {
        self.documents.insert(id, reply);
        self
    }

    pub fn with_records(mut self, text: &str, records: Vec<HitRecord>) -> Self {
        self.records.insert(text.to_string(), records);
        self
    }

    pub fn with_lookup_error(mut self, error: BusError) -> Self {
        self.lookup_error = Some(error);
        self
    }

    pub fn with_probe_error(self, error: BusError) -> Self {
        self.set_probe(Probe::Fail(error));
        self
    }

    /// Change the `GetStatistics` answer of a backend already handed out
    pub fn set_probe(&self, probe: Probe) {
        *self.probe.lock().unwrap() = probe;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record_call(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl IndexBackend for FakeBackend {
    async fn statistics(&self) -> docbar_bus::Result<Statistics> {
        let probe = self.probe.lock().unwrap().clone();
        match probe {
            Probe::Answer => Ok(Statistics {
                crawled_files: 12,
                documents: 34,
            }),
            Probe::Fail(e) => Err(e),
            Probe::Never => std::future::pending().await,
        }
    }

    async fn simple_query(&self, text: &str, max: u32) -> docbar_bus::Result<Vec<String>> {
        self.record_call(format!("simple_query:{text}:{max}"));
        if let Some(e) = &self.lookup_error {
            return Err(e.clone());
        }
        Ok(self.ids.get(text).cloned().unwrap_or_default())
    }

    async fn query(&self, request: &QueryRequest) -> docbar_bus::Result<QueryReply> {
        self.record_call(format!(
            "query:{}:{}:{}:{}",
            request.engine, request.scope, request.text, request.max
        ));
        if let Some(e) = &self.lookup_error {
            return Err(e.clone());
        }
        let records = self.records.get(&request.text).cloned().unwrap_or_default();
        Ok(QueryReply {
            estimated_total: u32::try_from(records.len()).unwrap() * 10,
            records,
        })
    }

    async fn document_info(&self, id: DocumentId) -> docbar_bus::Result<HitRecord> {
        self.record_call(format!("document_info:{id}"));
        match self.documents.get(&id).cloned() {
            Some(Reply::Record(record, delay)) => {
                tokio::time::sleep(delay).await;
                Ok(record)
            }
            Some(Reply::Error(e, delay)) => {
                tokio::time::sleep(delay).await;
                Err(e)
            }
            Some(Reply::Never) => std::future::pending().await,
            None => Err(BusError::Daemon {
                name: "de.berlios.Pinot.Error".to_string(),
                message: format!("no document {id}"),
            }),
        }
    }
}

/// Hands out the same [`FakeBackend`] on every connect
pub struct FakeConnector {
    pub backend: Arc<FakeBackend>,
    pub connect_error: Option<BusError>,
    pub connects: Arc<AtomicUsize>,
}

impl FakeConnector {
    pub fn new(backend: FakeBackend) -> Self {
        Self {
            backend: Arc::new(backend),
            connect_error: None,
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(error: BusError) -> Self {
        Self {
            connect_error: Some(error),
            ..Self::new(FakeBackend::new())
        }
    }

    pub fn connects(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.connects)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self) -> docbar_bus::Result<Arc<dyn IndexBackend>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match &self.connect_error {
            Some(e) => Err(e.clone()),
            None => Ok(Arc::clone(&self.backend) as Arc<dyn IndexBackend>),
        }
    }
}

/// `a(ss)` record for a local file
pub fn file_record(caption: &str, path: &str) -> HitRecord {
    HitRecord::Fields(vec![
        ("caption".to_string(), caption.to_string()),
        ("url".to_string(), format!("file://{path}")),
        ("type".to_string(), "text/plain".to_string()),
    ])
}

/// Record that arrives after `millis`
pub fn after(millis: u64, record: HitRecord) -> Reply {
    Reply::Record(record, Duration::from_millis(millis))
}

pub fn hit(n: usize) -> DocumentHit {
    DocumentHit::new(format!("doc {n}"), format!("file:///tmp/doc{n}.txt"))
}

/// Defaults with `~/` shortening off so display paths do not depend on `$HOME`
pub fn test_config(shape: WireShape) -> Config {
    let mut config = Config::default();
    config.daemon.wire_shape = shape;
    config.display.tilde_home = false;
    config
}
