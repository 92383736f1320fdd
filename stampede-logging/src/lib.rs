//! Logging setup for Stampede
//!
//! Everything logs through `tracing`; this crate only installs the global
//! subscriber, either a plain console one or one built from
//! [`LoggingConfig`].

mod init;

pub use init::{build_env_filter, init_logging_from_config, init_simple_tracing, LoggingGuard};
