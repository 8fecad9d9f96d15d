//! # Configuration Module
//!
//! This module provides the explicit configuration values for image preparation and the critique client.

pub mod config;

pub use config::{CritiqueConfig, MAX_ATTEMPTS, MAX_OUTPUT_TOKENS, MAX_WIDTH, PrepareConfig};
