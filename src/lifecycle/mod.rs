//! Application wiring: settings, the [`App`] orchestrator and tracing setup.

pub mod app;
pub mod config;
pub mod tracing;

pub use app::App;
pub use config::{AppConfig, ConfigError};
pub use self::tracing::setup_tracing;
