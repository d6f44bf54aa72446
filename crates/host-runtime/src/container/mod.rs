//! # Host Container
//!
//! Startup configuration for the host.

pub mod config;

pub use config::{ConfigError, HostConfig};
