//! Shared tracing functionality for the wallpaper admin client
//!
//! Configuration types and subscriber initialisation used by the CLI and
//! by tests that want readable log output.

pub mod config;
pub mod init;

pub use config::InstrumentationConfig;
pub use init::{init_dev, init_tracing};
