//! Shared utilities for the trading assistant
//!
//! This crate provides common functionality used across the workspace:
//! tracing setup and environment-backed configuration helpers.

pub mod config;
pub mod logging;

pub use config::{EnvError, Environment};
pub use logging::{init_tracing, init_tracing_with_default};
