// Appearance Forwarder - Forward NPC appearance overrides and their assets into one plugin
//
// This is the library crate containing the core business logic and data structures.
// The binary crate (main.rs) provides the command-line entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::{ConfigError, ConfigManager};
pub use models::{AssetPathSet, FormKey, ForwarderSettings, Mode, ModKey};
pub use services::{ForwardingService, LinkCache, LoadOrder, PatchPlugin};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
