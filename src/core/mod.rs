//! # Core Infrastructure Module
//!
//! Resource bookkeeping shared by the session controller and the presentation layer.

pub mod preview;

pub use preview::{InMemoryPreviews, PreviewHandle, PreviewRegistry};
