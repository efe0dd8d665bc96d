mod dirs;
mod settings;
mod validation;

pub use dirs::Directories;
pub use settings::{Config, DaemonConfig, DisplayConfig, SearchConfig, WireShape};
pub use validation::warn_unknown_fields;
