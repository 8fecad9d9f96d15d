//! # Golden Harmony
//!
//! Scores how closely a design's proportions follow the golden ratio and asks
//! a remote multimodal model for a structured critique of the image.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `analysis`: Deterministic proportion analysis against φ
//! - `imaging`: Image sources and width-bounded PNG re-encoding
//! - `critique`: Request building, transport and the retrying critique client
//! - `core`: Preview resource bookkeeping
//! - `config`: Configuration management and validation
//! - `session`: High-level session orchestration
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use golden_harmony::{
//!     CritiqueClient, CritiqueConfig, ImagePreparer, ImageSource, InMemoryPreviews,
//!     SessionController,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! golden_harmony::logging::init_tracing()?;
//!
//! let client = CritiqueClient::new(CritiqueConfig::new("api-key"))?;
//! let session = SessionController::new(
//!     ImagePreparer::default(),
//!     client,
//!     Arc::new(InMemoryPreviews::new()),
//! );
//!
//! session.select_image(ImageSource::from_path("poster.png").await?);
//! session.set_dimensions(Some(190.0), Some(117.4));
//!
//! let score = session.start_scan().map(|result| result.score);
//! let critique = session.wait_for_critique().await;
//! println!("score {score:?}, verdict {:?}", critique.map(|c| c.verdict));
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod core;
pub mod critique;
pub mod error;
pub mod imaging;
pub mod logging;
pub mod session;

/// Re-export error types for convenience
pub use error::{HarmonyError, HarmonyResult, HasRecoverySuggestion, Retryable};

pub use analysis::{Dimensions, GOLDEN_RATIO, ProportionResult, TARGET_RATIO, analyze};
pub use config::{CritiqueConfig, PrepareConfig};
pub use core::preview::{InMemoryPreviews, PreviewHandle, PreviewRegistry};
pub use critique::{CritiqueClient, CritiqueOutcome, CritiqueReport, CritiqueTransport};
pub use imaging::{EncodedPayload, ImagePreparer, ImageSource};
pub use session::{CritiqueState, SessionController, SessionPhase, SessionState};
