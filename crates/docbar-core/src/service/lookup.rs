//! Bus lookups running outside the service loop.
//!
//! Each lookup is a spawned task that first obtains a live backend from the
//! shared [`ConnectionManager`], then makes its daemon calls. Results come
//! back to the service as [`LookupEvent`]s tagged with the query token, so the
//! loop never waits on the daemon. A failed connect is reported as a failed
//! lookup.

use std::sync::Arc;

use docbar_bus::{ConnectionManager, Connector, DocumentHit, QueryRequest, parse_document_id};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

use crate::aggregator::QueryToken;

pub(crate) enum LookupEvent {
    /// `SimpleQuery` answered; this many `Hit` events follow
    Identifiers {
        token: QueryToken,
        result: docbar_bus::Result<usize>,
    },

    /// `Query` answered with every record embedded
    Records {
        token: QueryToken,
        result: docbar_bus::Result<Vec<docbar_bus::Result<DocumentHit>>>,
    },

    /// One `GetDocumentInfo` reply
    Hit {
        token: QueryToken,
        result: docbar_bus::Result<DocumentHit>,
    },
}

fn send(events: &UnboundedSender<LookupEvent>, event: LookupEvent) {
    if events.send(event).is_err() {
        trace!("Search service gone, dropping lookup event");
    }
}

fn limit(max: u32) -> usize {
    usize::try_from(max).unwrap_or(usize::MAX)
}

/// `SimpleQuery`, then one `GetDocumentInfo` task per identifier.
pub(crate) fn spawn_identifier_lookup<C: Connector + 'static>(
    token: QueryToken,
    connections: Arc<ConnectionManager<C>>,
    text: String,
    max: u32,
    events: UnboundedSender<LookupEvent>,
) {
    tokio::spawn(async move {
        let lookup = match connections.ensure_connected().await {
            Ok(backend) => backend
                .simple_query(&text, max)
                .await
                .map(|ids| (backend, ids)),
            Err(e) => Err(e),
        };
        let (backend, mut ids) = match lookup {
            Ok(found) => found,
            Err(e) => {
                send(&events, LookupEvent::Identifiers { token, result: Err(e) });
                return;
            }
        };
        ids.truncate(limit(max));
        debug!("Query {token}: daemon returned {} identifiers", ids.len());

        // Count first so the aggregator is collecting before any hit lands
        send(
            &events,
            LookupEvent::Identifiers {
                token,
                result: Ok(ids.len()),
            },
        );

        for raw in ids {
            let id = match parse_document_id(&raw) {
                Ok(id) => id,
                Err(e) => {
                    send(&events, LookupEvent::Hit { token, result: Err(e) });
                    continue;
                }
            };

            let backend = Arc::clone(&backend);
            let events = events.clone();
            tokio::spawn(async move {
                let result = backend
                    .document_info(id)
                    .await
                    .and_then(|record| record.into_hit(Some(id)));
                send(&events, LookupEvent::Hit { token, result });
            });
        }
    });
}

/// `Query` with the records embedded in the reply.
pub(crate) fn spawn_embedded_lookup<C: Connector + 'static>(
    token: QueryToken,
    connections: Arc<ConnectionManager<C>>,
    request: QueryRequest,
    events: UnboundedSender<LookupEvent>,
) {
    tokio::spawn(async move {
        let reply = match connections.ensure_connected().await {
            Ok(backend) => backend.query(&request).await,
            Err(e) => Err(e),
        };
        let result = reply.map(|reply| {
            debug!(
                "Query {token}: daemon returned {} records ({} estimated)",
                reply.records.len(),
                reply.estimated_total
            );
            reply
                .records
                .into_iter()
                .take(limit(request.max))
                .map(|record| record.into_hit(None))
                .collect()
        });
        send(&events, LookupEvent::Records { token, result });
    });
}
