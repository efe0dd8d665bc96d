//! Session bus client for the document indexing daemon.
//!
//! This crate hides the daemon's bus interface behind the [`IndexBackend`]
//! trait so the rest of docbar never sees wire shapes or transport details.
//!
//! # Architecture
//!
//! - [`backend`]: the [`IndexBackend`] trait and request/reply types
//! - [`client`]: [`DaemonClient`], the zbus implementation of the backend
//! - [`connection`]: [`ConnectionManager`], cached connection with liveness probe
//! - [`wire`]: translation of the three reply shapes into [`DocumentHit`]
//! - [`error`]: [`BusError`] and the crate `Result` alias
//!
//! # Example
//!
//! ```no_run
//! use docbar_bus::{BusNames, ConnectionManager, SessionConnector};
//!
//! # async fn example() -> docbar_bus::Result<()> {
//! let connections = ConnectionManager::new(SessionConnector::new(BusNames::default()));
//! let backend = connections.ensure_connected().await?;
//!
//! for id in backend.simple_query("kernel scheduler", 10).await? {
//!     println!("hit: {id}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`DocumentHit`]: docbar_types::DocumentHit

pub mod backend;
pub mod client;
pub mod connection;
pub mod error;
pub mod wire;

pub use backend::{BusNames, IndexBackend, QueryReply, QueryRequest};
pub use client::DaemonClient;
pub use connection::{ConnectionManager, ConnectionState, Connector, SessionConnector};
pub use error::{BusError, Result};
pub use wire::{FieldList, HitRecord, parse_document_id};

pub use docbar_types::{DocumentHit, DocumentId, Statistics};
