//! # SleepScan Common Library
//!
//! Shared code for all SleepScan microservices including:
//! - Common error type
//! - TOML bootstrap configuration discovery and loading
//! - Logging configuration

pub mod config;
pub mod error;

pub use error::{Error, Result};
