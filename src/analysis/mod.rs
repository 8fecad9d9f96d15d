//! # Analysis Module
//!
//! Deterministic golden-ratio proportion scoring.

pub mod proportion;

pub use proportion::{Dimensions, GOLDEN_RATIO, ProportionResult, TARGET_RATIO, analyze};
