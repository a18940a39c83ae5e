//! # Configuration Module
//!
//! This module provides the configuration structure shared by the CLI and the library entry point.

pub mod config;

pub use config::{parse_channel_policy, parse_degenerate_policy, CompressConfig};
