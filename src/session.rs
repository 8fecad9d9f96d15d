//! # Scan Session Management
//!
//! High-level workflow controller for one harmony scan. Sequences image
//! selection, dimension capture, the deterministic proportion analysis and
//! the background critique, and exposes a single state aggregate to the
//! presentation layer.
//!
//! ## Phases
//!
//! ```text
//! Empty --select_image--> Loaded --start_scan--> Scanning --> Complete
//!   ^                                                            |
//!   +------------------------------ reset -----------------------+
//! ```
//!
//! - `Complete` carries its `ProportionResult`, so a completed session without
//!   a score cannot be represented.
//! - The critique refines `Complete` in place: `Pending` becomes `Ready` with
//!   either the model's report or the fallback report.
//!
//! ## Ordering and Staleness
//!
//! The proportion result is computed and published before any critique work
//! starts, and the critique inputs are captured by value when the scan starts.
//! Every session carries a generation number that changes on selection and
//! reset. A background critique only writes its outcome back if the
//! generation it was started under is still current; anything else is a
//! superseded response and is dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::analysis::{Dimensions, ProportionResult};
use crate::core::preview::{PreviewHandle, PreviewRegistry};
use crate::critique::{CritiqueClient, CritiqueOutcome, CritiqueReport};
use crate::error::{HarmonyError, HasRecoverySuggestion};
use crate::imaging::{ImagePreparer, ImageSource};

/// Critique progress inside a completed scan.
#[derive(Debug, Clone, PartialEq)]
pub enum CritiqueState {
    /// Preparation or the remote request is still in flight.
    Pending,
    /// Terminal report: the model's critique or the fallback.
    Ready(CritiqueReport),
}

/// Workflow phase of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    Empty,
    Loaded,
    Scanning,
    Complete {
        result: ProportionResult,
        critique: CritiqueState,
    },
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Loaded => "loaded",
            Self::Scanning => "scanning",
            Self::Complete { .. } => "complete",
        }
    }
}

/// The selected image together with the preview resource displaying it.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub source: ImageSource,
    pub preview: PreviewHandle,
}

/// Snapshot of the whole session.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Changes on every selection and reset.
    pub generation: u64,
    pub image: Option<LoadedImage>,
    /// User-supplied measurement, real-world units.
    pub height: Option<f64>,
    /// User-supplied measurement, real-world units.
    pub width: Option<f64>,
    /// Dimensions the scan actually used, resolved when the scan started.
    pub dimensions: Option<Dimensions>,
    pub phase: SessionPhase,
    /// User-facing advisory from the last critique, if it degraded.
    pub error: Option<String>,
    /// Classification of the last critique failure.
    pub failure: Option<&'static str>,
}

impl SessionState {
    fn empty(generation: u64) -> Self {
        Self {
            generation,
            image: None,
            height: None,
            width: None,
            dimensions: None,
            phase: SessionPhase::Empty,
            error: None,
            failure: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.phase, SessionPhase::Empty) && self.image.is_none()
    }

    pub fn proportion(&self) -> Option<&ProportionResult> {
        match &self.phase {
            SessionPhase::Complete { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn critique(&self) -> Option<&CritiqueReport> {
        match &self.phase {
            SessionPhase::Complete {
                critique: CritiqueState::Ready(report),
                ..
            } => Some(report),
            _ => None,
        }
    }

    /// True while a completed scan is still waiting on its critique.
    pub fn critique_pending(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::Complete {
                critique: CritiqueState::Pending,
                ..
            }
        )
    }
}

struct Shared {
    state: Mutex<SessionState>,
    updates: watch::Sender<SessionState>,
    previews: Arc<dyn PreviewRegistry>,
    preparer: ImagePreparer,
    client: CritiqueClient,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &SessionState) {
        self.updates.send_replace(state.clone());
    }

    /// Writes a critique outcome back if `generation` is still current.
    fn apply_outcome(&self, generation: u64, outcome: CritiqueOutcome) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            debug!(
                started = generation,
                current = state.generation,
                "discarding stale critique"
            );
            return false;
        }
        let SessionPhase::Complete { critique, .. } = &mut state.phase else {
            return false;
        };
        *critique = CritiqueState::Ready(outcome.report);
        state.error = outcome.error;
        state.failure = outcome.failure;
        info!(
            generation,
            attempts = outcome.attempts,
            degraded = state.error.is_some(),
            "critique resolved"
        );
        self.publish(&state);
        true
    }

    async fn run_critique(self: Arc<Self>, generation: u64, source: ImageSource, result: ProportionResult) {
        let outcome = match self.preparer.prepare(&source).await {
            Ok(payload) => self.client.critique(&payload, &result).await,
            Err(err) => {
                warn!(
                    category = err.category(),
                    error = %err,
                    suggestion = err.recovery_suggestion().unwrap_or("none"),
                    "image preparation failed"
                );
                CritiqueOutcome::degraded(&err, 0)
            }
        };
        self.apply_outcome(generation, outcome);
    }
}

/// Workflow controller for one user session.
///
/// `start_scan` spawns the critique onto the current Tokio runtime, so the
/// controller is meant to be driven from inside one.
pub struct SessionController {
    shared: Arc<Shared>,
}

impl SessionController {
    pub fn new(
        preparer: ImagePreparer,
        client: CritiqueClient,
        previews: Arc<dyn PreviewRegistry>,
    ) -> Self {
        let initial = SessionState::empty(0);
        let (updates, _) = watch::channel(initial.clone());
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(initial),
                updates,
                previews,
                preparer,
                client,
            }),
        }
    }

    /// Current session snapshot.
    pub fn state(&self) -> SessionState {
        self.shared.lock().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.updates.subscribe()
    }

    /// Starts a new session for `source`.
    ///
    /// Sources whose declared content type is not `image/*` are ignored and
    /// leave the state untouched. Selecting over an existing session replaces
    /// it and releases the previous preview.
    pub fn select_image(&self, source: ImageSource) -> bool {
        if !source.is_image() {
            debug!(content_type = source.content_type(), "ignoring non-image selection");
            return false;
        }

        let mut state = self.shared.lock();
        if let Some(previous) = state.image.take() {
            self.shared.previews.release(previous.preview);
        }
        let preview = self.shared.previews.acquire(&source);
        let generation = state.generation + 1;

        *state = SessionState::empty(generation);
        state.image = Some(LoadedImage { source, preview });
        state.phase = SessionPhase::Loaded;
        info!(generation, "image loaded");
        self.shared.publish(&state);
        true
    }

    /// Records optional real-world measurements for the loaded image.
    ///
    /// Only accepted while `Loaded`: once a scan starts its inputs are fixed.
    pub fn set_dimensions(&self, height: Option<f64>, width: Option<f64>) -> bool {
        let mut state = self.shared.lock();
        if !matches!(state.phase, SessionPhase::Loaded) {
            debug!(phase = state.phase.name(), "ignoring dimensions outside loaded phase");
            return false;
        }
        state.height = height;
        state.width = width;
        self.shared.publish(&state);
        true
    }

    /// Runs the proportion scan and starts the background critique.
    ///
    /// Returns the published result, or `None` when no image is loaded or a
    /// scan already ran for this session.
    pub fn start_scan(&self) -> Option<ProportionResult> {
        let (generation, source) = {
            let state = self.shared.lock();
            if !matches!(state.phase, SessionPhase::Loaded) {
                debug!(phase = state.phase.name(), "scan requested outside loaded phase");
                return None;
            }
            (state.generation, state.image.as_ref()?.source.clone())
        };

        let pixels = match source.pixel_dimensions() {
            Ok(pixels) => Some(pixels),
            Err(err) => {
                warn!(error = %err, "could not read pixel extent");
                None
            }
        };

        let mut state = self.shared.lock();
        if state.generation != generation || !matches!(state.phase, SessionPhase::Loaded) {
            debug!(generation, "session changed before scan started");
            return None;
        }
        state.phase = SessionPhase::Scanning;
        self.shared.publish(&state);

        let dimensions = Dimensions::resolve(state.height, state.width, pixels);
        let result = dimensions.analyze();

        state.dimensions = Some(dimensions);
        state.phase = SessionPhase::Complete {
            result,
            critique: CritiqueState::Pending,
        };
        info!(
            generation,
            ratio = result.ratio,
            variance = result.variance,
            score = result.score,
            "proportion scan complete"
        );
        self.shared.publish(&state);
        drop(state);

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let shared = Arc::clone(&self.shared);
                runtime.spawn(shared.run_critique(generation, source, result));
            }
            Err(_) => {
                let err = HarmonyError::processing("critique", "no tokio runtime available");
                warn!(error = %err, "critique not started");
                self.shared
                    .apply_outcome(generation, CritiqueOutcome::degraded(&err, 0));
            }
        }

        Some(result)
    }

    /// Discards the session and returns to `Empty`, releasing the preview.
    ///
    /// An in-flight critique is not aborted; its result is dropped when it arrives.
    pub fn reset(&self) {
        let mut state = self.shared.lock();
        if let Some(image) = state.image.take() {
            self.shared.previews.release(image.preview);
        }
        let generation = state.generation + 1;
        *state = SessionState::empty(generation);
        info!(generation, "session reset");
        self.shared.publish(&state);
    }

    /// Waits until the current scan's critique resolves.
    ///
    /// Returns `None` when there is no completed scan, or the session was
    /// reset or replaced while waiting.
    pub async fn wait_for_critique(&self) -> Option<CritiqueReport> {
        let mut updates = self.subscribe();
        let generation = updates.borrow().generation;
        let settled = updates
            .wait_for(|s| s.generation != generation || !s.critique_pending())
            .await
            .ok()?;
        if settled.generation != generation {
            return None;
        }
        settled.critique().cloned()
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(image) = self.shared.lock().image.take() {
            self.shared.previews.release(image.preview);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CritiqueConfig;
    use crate::core::preview::InMemoryPreviews;
    use crate::critique::request::{GenerateContentRequest, GenerateContentResponse};
    use crate::critique::CritiqueTransport;
    use crate::error::HarmonyResult;

    struct NeverCalled;

    #[async_trait::async_trait]
    impl CritiqueTransport for NeverCalled {
        async fn generate(&self, _: &GenerateContentRequest) -> HarmonyResult<GenerateContentResponse> {
            Err(HarmonyError::network("unexpected call"))
        }
    }

    fn controller(previews: Arc<InMemoryPreviews>) -> SessionController {
        let client = CritiqueClient::with_transport(
            CritiqueConfig::new("test-key").with_max_attempts(1),
            Arc::new(NeverCalled),
        )
        .unwrap();
        SessionController::new(ImagePreparer::default(), client, previews)
    }

    #[test]
    fn test_non_image_is_ignored() {
        let previews = Arc::new(InMemoryPreviews::new());
        let session = controller(previews.clone());

        assert!(!session.select_image(ImageSource::new("application/pdf", vec![1, 2, 3])));
        let state = session.state();
        assert!(state.is_empty());
        assert_eq!(state.generation, 0);
        assert_eq!(previews.live_count(), 0);
    }

    #[test]
    fn test_dimensions_require_loaded_image() {
        let session = controller(Arc::new(InMemoryPreviews::new()));
        assert!(!session.set_dimensions(Some(1.0), Some(2.0)));
        assert!(session.state().height.is_none());
    }

    #[test]
    fn test_scan_without_image_is_ignored() {
        let session = controller(Arc::new(InMemoryPreviews::new()));
        assert!(session.start_scan().is_none());
        assert!(session.state().is_empty());
    }

    #[test]
    fn test_scan_outside_runtime_degrades_critique() {
        let previews = Arc::new(InMemoryPreviews::new());
        let session = controller(previews);
        session.select_image(ImageSource::new("image/png", b"not decodable".to_vec()));
        session.set_dimensions(Some(100.0), Some(161.8));

        let result = session.start_scan().unwrap();
        assert_eq!(result.score, 100);

        let state = session.state();
        assert_eq!(state.critique(), Some(&CritiqueReport::fallback()));
        assert_eq!(state.failure, Some("processing"));
        assert!(state.error.is_some());
    }

    #[test]
    fn test_drop_releases_preview() {
        let previews = Arc::new(InMemoryPreviews::new());
        let session = controller(previews.clone());
        session.select_image(ImageSource::new("image/png", vec![0]));
        assert_eq!(previews.live_count(), 1);
        drop(session);
        assert_eq!(previews.live_count(), 0);
    }
}
