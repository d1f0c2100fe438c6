//! Logger setup.
//!
//! Everything logs through the `log` facade; this module installs the
//! `env_logger` backend once, early in `main`.

mod init;

pub use init::{DEFAULT_FILTER, LoggingConfig, init_logging};
