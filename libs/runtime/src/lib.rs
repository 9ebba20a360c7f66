//! Runtime support for the Pantry server: layered configuration and
//! logging bootstrap shared by the binary and its tests.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{AppConfig, CliArgs, DatabaseConfig, LoggingConfig, Section, ServerConfig};
