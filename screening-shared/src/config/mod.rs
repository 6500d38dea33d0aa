//! # Configuration
//!
//! Client configuration: API base URL, logging level, and where on-device
//! state is kept.

pub mod client;

pub use client::{ClientConfig, ConfigError};
