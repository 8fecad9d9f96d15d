//! # Error Handling System
//!
//! Error types for the harmony scanner, featuring a single hierarchical error
//! enum, classification traits and rich error context.
//!
//! ## Architecture
//!
//! - **Error Types**: `HarmonyError` variants carry the failing operation plus an `ErrorContext`
//! - **Error Traits**: `Retryable` and `HasRecoverySuggestion`
//! - **Error Context**: what was being done, and a recovery suggestion
//! - **Error Chaining**: underlying I/O and network errors are kept as `source()`
//!
//! ## Critique Failure Taxonomy
//!
//! The critique round-trip classifies every failure into one of four buckets,
//! all of which the critique client retries with backoff:
//!
//! - `Transport`: the endpoint answered with a non-success status
//! - `EmptyResponse`: the response carried no model text
//! - `SchemaParse`: model text was present but did not match the report schema
//! - `Network`: the request never produced a status (connect, timeout, body read)
//!
//! ## Usage
//!
//! ```rust
//! use golden_harmony::error::{HarmonyError, Retryable};
//!
//! let error = HarmonyError::transport(503, "overloaded")
//!     .with_context("requesting design critique")
//!     .with_recovery_suggestion("Wait for the backoff delay and retry");
//!
//! assert!(error.is_retryable());
//! assert_eq!(error.category(), "transport");
//! ```

use std::{error::Error as StdError, fmt};

/// Extra detail attached to an error after construction
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// What the caller was doing; appended to the message in parentheses
    pub context: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }
}

/// Base error type for the harmony scanner
#[derive(Debug)]
pub enum HarmonyError {
    /// Configuration validation errors
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// The supplied image could not be decoded
    ImageDecode {
        reason: String,
        context: ErrorContext,
    },
    /// Resize or encode failures after a successful decode
    Processing {
        operation: String,
        reason: String,
        context: ErrorContext,
    },
    /// The critique endpoint answered with a non-success status
    Transport {
        status: u16,
        body: String,
        context: ErrorContext,
    },
    /// The critique response carried no candidate text
    EmptyResponse {
        reason: String,
        context: ErrorContext,
    },
    /// Candidate text (or the response envelope) did not match the expected schema
    SchemaParse {
        reason: String,
        context: ErrorContext,
    },
    /// The request failed before any HTTP status was received
    Network {
        operation: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
        context: ErrorContext,
    },
    /// Timeout errors
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },
    /// I/O errors
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
        context: ErrorContext,
    },
}

impl HarmonyError {
    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an image decode error
    pub fn image_decode(reason: impl Into<String>) -> Self {
        Self::ImageDecode {
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a processing error
    pub fn processing(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Processing {
            operation: operation.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a transport (non-success status) error
    pub fn transport(status: u16, body: impl Into<String>) -> Self {
        Self::Transport {
            status,
            body: body.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an empty response error
    pub fn empty_response(reason: impl Into<String>) -> Self {
        Self::EmptyResponse {
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a schema parse error
    pub fn schema_parse(reason: impl Into<String>) -> Self {
        Self::SchemaParse {
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a network error
    pub fn network(operation: impl Into<String>) -> Self {
        Self::Network {
            operation: operation.into(),
            source: None,
            context: ErrorContext::new(),
        }
    }

    /// Create a network error that wraps the underlying failure
    pub fn network_with_source(
        operation: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            operation: operation.into(),
            source: Some(Box::new(source)),
            context: ErrorContext::new(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration_ms,
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Attach the filesystem path to an I/O error; other variants are returned unchanged
    pub fn with_path(mut self, new_path: impl Into<String>) -> Self {
        if let Self::Io { path, .. } = &mut self {
            *path = Some(new_path.into());
        }
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::ImageDecode { context, .. } => context,
            Self::Processing { context, .. } => context,
            Self::Transport { context, .. } => context,
            Self::EmptyResponse { context, .. } => context,
            Self::SchemaParse { context, .. } => context,
            Self::Network { context, .. } => context,
            Self::Timeout { context, .. } => context,
            Self::Io { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::ImageDecode { context, .. } => context,
            Self::Processing { context, .. } => context,
            Self::Transport { context, .. } => context,
            Self::EmptyResponse { context, .. } => context,
            Self::SchemaParse { context, .. } => context,
            Self::Network { context, .. } => context,
            Self::Timeout { context, .. } => context,
            Self::Io { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::ImageDecode { .. } => "image_decode",
            Self::Processing { .. } => "processing",
            Self::Transport { .. } => "transport",
            Self::EmptyResponse { .. } => "empty_response",
            Self::SchemaParse { .. } => "schema_parse",
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::Io { .. } => "io",
        }
    }
}

impl fmt::Display for HarmonyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarmonyError::Config {
                field,
                value,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Configuration error in '{}': {} (value: {})",
                    field, reason, value
                )
            }
            HarmonyError::ImageDecode { reason, .. } => {
                write!(f, "Image could not be decoded: {}", reason)
            }
            HarmonyError::Processing {
                operation, reason, ..
            } => {
                write!(f, "Processing failed during {}: {}", operation, reason)
            }
            HarmonyError::Transport { status, body, .. } => {
                if body.is_empty() {
                    write!(f, "Critique endpoint returned status {}", status)
                } else {
                    write!(f, "Critique endpoint returned status {}: {}", status, body)
                }
            }
            HarmonyError::EmptyResponse { reason, .. } => {
                write!(f, "Critique response was empty: {}", reason)
            }
            HarmonyError::SchemaParse { reason, .. } => {
                write!(f, "Critique response did not match schema: {}", reason)
            }
            HarmonyError::Network {
                operation, source, ..
            } => {
                if let Some(source) = source {
                    write!(f, "Network error during {}: {}", operation, source)
                } else {
                    write!(f, "Network error during {}", operation)
                }
            }
            HarmonyError::Timeout {
                operation,
                duration_ms,
                ..
            } => {
                write!(f, "Timeout during {} after {}ms", operation, duration_ms)
            }
            HarmonyError::Io {
                operation,
                path,
                source,
                ..
            } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "I/O error during {} on '{}': {}",
                        operation, path, source
                    )
                } else {
                    write!(f, "I/O error during {}: {}", operation, source)
                }
            }
        }?;
        if let Some(context) = &self.context().context {
            write!(f, " ({})", context)?;
        }
        Ok(())
    }
}

impl StdError for HarmonyError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Network {
                source: Some(source),
                ..
            } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type HarmonyResult<T> = Result<T, HarmonyError>;

/// Trait for errors that can be retried
pub trait Retryable {
    /// Check if this error can be retried
    fn is_retryable(&self) -> bool;
}

impl Retryable for HarmonyError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::EmptyResponse { .. }
                | Self::SchemaParse { .. }
                | Self::Network { .. }
                | Self::Timeout { .. }
        )
    }
}

/// Trait for errors that provide recovery suggestions
pub trait HasRecoverySuggestion {
    /// Get recovery suggestion for this error
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for HarmonyError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

/// Error conversion implementations
impl From<std::io::Error> for HarmonyError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<serde_json::Error> for HarmonyError {
    fn from(error: serde_json::Error) -> Self {
        Self::schema_parse(error.to_string())
    }
}

// Images are always decoded from memory, so reader I/O errors mean truncated data.
impl From<image::ImageError> for HarmonyError {
    fn from(error: image::ImageError) -> Self {
        Self::image_decode(error.to_string())
    }
}

impl From<reqwest::Error> for HarmonyError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::network_with_source("critique request (timed out)", error);
        }
        match error.status() {
            Some(status) => Self::transport(status.as_u16(), error.to_string()),
            None => Self::network_with_source("critique request", error),
        }
    }
}

impl From<harmony_scale::cpu::ScaleError> for HarmonyError {
    fn from(error: harmony_scale::cpu::ScaleError) -> Self {
        Self::processing("resize", error.to_string())
    }
}
