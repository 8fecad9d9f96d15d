//! # Critique Module
//!
//! Structured design critique from a remote multimodal model:
//! - `report`: the four-field report and its degraded fallback
//! - `request`: `generateContent` wire types and request construction
//! - `transport`: the HTTP seam (`CritiqueTransport`, `HttpTransport`)
//! - `client`: the retrying client that always resolves to one outcome

pub mod client;
pub mod report;
pub mod request;
pub mod transport;

pub use client::{CritiqueClient, CritiqueOutcome, CritiquePhase, backoff_delay};
pub use report::{CritiqueReport, EXHAUSTED_ADVISORY};
pub use transport::{CritiqueTransport, HttpTransport};
