//! # Resilient Critique Client
//!
//! Sends the prepared image and the proportion result to the generative
//! endpoint and always resolves to exactly one [`CritiqueOutcome`].
//!
//! ## Attempt State Machine
//!
//! ```text
//! Idle -> Requesting -> Success
//!             |
//!             +-> Retrying -> Requesting        (attempt < max_attempts)
//!             +-> ExhaustedFailure              (attempt == max_attempts)
//! ```
//!
//! Each attempt is one POST followed by text extraction and schema parsing.
//! Any classified failure waits `2^retry * base_delay` (1s, 2s, 4s, 8s with
//! defaults) before the next request. The wait is awaited inline, so at most
//! one pending delay exists per critique.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::analysis::ProportionResult;
use crate::config::CritiqueConfig;
use crate::critique::report::{CritiqueReport, EXHAUSTED_ADVISORY};
use crate::critique::request::{GenerateContentRequest, build_request};
use crate::critique::transport::{CritiqueTransport, HttpTransport};
use crate::error::{HarmonyError, HarmonyResult, Retryable};
use crate::imaging::EncodedPayload;

/// Phases of one critique invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CritiquePhase {
    Idle,
    Requesting,
    Retrying,
    Success,
    ExhaustedFailure,
}

impl CritiquePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::ExhaustedFailure)
    }
}

/// Terminal result of one critique invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CritiqueOutcome {
    /// Parsed report, or [`CritiqueReport::fallback`] on failure.
    pub report: CritiqueReport,
    /// User-facing advisory; `None` on success.
    pub error: Option<String>,
    /// Category of the last classified failure (see `HarmonyError::category`).
    pub failure: Option<&'static str>,
    /// Requests issued, `1..=max_attempts`; 0 when no request could be built.
    pub attempts: u32,
}

impl CritiqueOutcome {
    fn success(report: CritiqueReport, attempts: u32) -> Self {
        Self {
            report,
            error: None,
            failure: None,
            attempts,
        }
    }

    /// Degraded outcome carrying the fallback report and fixed advisory.
    pub fn degraded(cause: &HarmonyError, attempts: u32) -> Self {
        Self {
            report: CritiqueReport::fallback(),
            error: Some(EXHAUSTED_ADVISORY.to_string()),
            failure: Some(cause.category()),
            attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn phase(&self) -> CritiquePhase {
        if self.is_success() {
            CritiquePhase::Success
        } else {
            CritiquePhase::ExhaustedFailure
        }
    }
}

/// Delay before retry number `retry` (0-based): `2^retry * base`.
pub fn backoff_delay(retry: u32, base: Duration) -> Duration {
    base.saturating_mul(2u32.saturating_pow(retry))
}

/// Retrying client for the remote critique endpoint.
#[derive(Clone)]
pub struct CritiqueClient {
    transport: Arc<dyn CritiqueTransport>,
    max_attempts: u32,
    base_delay: Duration,
    max_output_tokens: u32,
}

impl std::fmt::Debug for CritiqueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CritiqueClient")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish_non_exhaustive()
    }
}

impl CritiqueClient {
    /// Client talking HTTPS to the configured endpoint.
    pub fn new(config: CritiqueConfig) -> HarmonyResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Client over an arbitrary transport; used for mocks and alternative backends.
    pub fn with_transport(
        config: CritiqueConfig,
        transport: Arc<dyn CritiqueTransport>,
    ) -> HarmonyResult<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            max_attempts: config.max_attempts,
            base_delay: config.base_delay,
            max_output_tokens: config.max_output_tokens,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Requests a critique, retrying classified failures with exponential backoff.
    ///
    /// Never returns an error: exhaustion yields the fallback report plus an advisory.
    pub async fn critique(&self, payload: &EncodedPayload, stats: &ProportionResult) -> CritiqueOutcome {
        let request = build_request(payload, stats, self.max_output_tokens);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(attempt, phase = ?CritiquePhase::Requesting, "requesting critique");

            let err = match self.attempt_once(&request).await {
                Ok(report) => {
                    info!(attempts = attempt, "critique received");
                    return CritiqueOutcome::success(report, attempt);
                }
                Err(err) => err,
            };

            if attempt >= self.max_attempts || !err.is_retryable() {
                warn!(
                    attempts = attempt,
                    category = err.category(),
                    error = %err,
                    phase = ?CritiquePhase::ExhaustedFailure,
                    "critique failed, using fallback report"
                );
                return CritiqueOutcome::degraded(&err, attempt);
            }

            let delay = backoff_delay(attempt - 1, self.base_delay);
            warn!(
                attempt,
                category = err.category(),
                error = %err,
                delay_ms = delay.as_millis() as u64,
                phase = ?CritiquePhase::Retrying,
                "critique attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn attempt_once(&self, request: &GenerateContentRequest) -> HarmonyResult<CritiqueReport> {
        let response = self.transport.generate(request).await?;
        let text = response.first_text()?;
        CritiqueReport::parse(text)
    }
}
