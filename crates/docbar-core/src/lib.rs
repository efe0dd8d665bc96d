pub mod aggregator;
pub mod config;
pub mod locator;
pub mod matches;
pub mod snippet;

mod error;
mod requirements;
mod service;

#[cfg(test)]
mod tests;

pub use aggregator::{Aggregator, Phase, QueryToken, ResultSet};
pub use error::{Error, Result};
pub use locator::LocatorError;
pub use matches::MatchRenderer;
pub use requirements::{check_requirements, session_bus_available};
pub use service::{SearchHandle, SearchService};

pub use docbar_types::*;
