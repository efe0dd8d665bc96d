use std::path::Path;

use docbar_bus::{BusError, Connector};
use docbar_types::Requirements;
use tracing::{debug, info};

const NO_SESSION_BUS: &str = "session bus not available";
const DAEMON_NOT_RUNNING: &str = "document indexing daemon is not running";

/// Whether a session bus can be reached at all.
#[must_use]
pub fn session_bus_available() -> bool {
    if std::env::var_os("DBUS_SESSION_BUS_ADDRESS").is_some_and(|addr| !addr.is_empty()) {
        return true;
    }

    std::env::var_os("XDG_RUNTIME_DIR")
        .is_some_and(|dir| Path::new(&dir).join("bus").exists())
}

/// Check whether searching can work in this session.
///
/// Connects through `connector` and probes the daemon once.
pub async fn check_requirements<C: Connector>(connector: &C) -> Requirements {
    if !session_bus_available() {
        info!("No session bus found");
        return Requirements::NotApplicable {
            reason: NO_SESSION_BUS.to_string(),
        };
    }

    probe(connector).await
}

pub(crate) async fn probe<C: Connector>(connector: &C) -> Requirements {
    let result = match connector.connect().await {
        Ok(backend) => backend.statistics().await.map(|_| ()),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            debug!("Indexing daemon answered probe");
            Requirements::Ready
        }
        Err(BusError::ServiceUnavailable(name)) => {
            info!("Indexing daemon unavailable: {name}");
            Requirements::NeedsActivation {
                reason: DAEMON_NOT_RUNNING.to_string(),
            }
        }
        Err(e) => Requirements::NotApplicable {
            reason: e.to_string(),
        },
    }
}
