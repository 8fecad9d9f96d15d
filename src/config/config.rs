//! # Configuration Module
//!
//! Configuration structures and validation for the image preparer and the
//! critique client. Every value is passed in explicitly by the caller; nothing
//! in this crate reads credentials or settings from the process environment.
//!
//! ## Critique Parameters
//!
//! | Parameter | Type | Default | Description |
//! |-----------|------|---------|-------------|
//! | `api_key` | `String` | empty | Credential sent as the `key` query parameter |
//! | `endpoint` | `String` | Gemini v1beta models URL | Base URL, the model path is appended |
//! | `model` | `String` | `gemini-2.5-flash` | Model identifier |
//! | `max_attempts` | `u32` | 5 | Total requests per critique (1-10) |
//! | `base_delay` | `Duration` | 1s | Backoff unit, doubled per retry |
//! | `max_output_tokens` | `u32` | 1000 | Output token cap sent in `generationConfig` |
//! | `request_timeout` | `Duration` | 60s | Per-request HTTP timeout |
//!
//! ## Preparation Parameters
//!
//! | Parameter | Type | Default | Description |
//! |-----------|------|---------|-------------|
//! | `max_width` | `u32` | 1024 | Upload width bound in pixels |
//! | `decode_timeout` | `Duration` | 10s | Fail-fast bound on decode + encode |
//!
//! ## Examples
//!
//! ```rust
//! use golden_harmony::config::config::CritiqueConfig;
//! use std::time::Duration;
//!
//! let config = CritiqueConfig::new("test-key")
//!     .with_model("gemini-2.5-pro")
//!     .with_base_delay(Duration::from_millis(250));
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.max_attempts, 5);
//! ```

use std::time::Duration;

use crate::error::{HarmonyError, HarmonyResult};

/// Upload width bound applied by the image preparer.
pub const MAX_WIDTH: u32 = 1024;

/// Total critique requests issued before falling back.
pub const MAX_ATTEMPTS: u32 = 5;

/// Output token cap declared in the generation config.
pub const MAX_OUTPUT_TOKENS: u32 = 1000;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Configuration for the remote critique client.
///
/// The API key is injected here and nowhere else, so tests can construct a
/// client against a mock transport with a dummy credential.
#[derive(Debug, Clone)]
pub struct CritiqueConfig {
    /// Credential passed as the `key` query parameter.
    pub api_key: String,

    /// Base URL of the generative models API, without a trailing slash.
    pub endpoint: String,

    /// Model identifier appended to the endpoint.
    pub model: String,

    /// Total number of requests issued for one critique, including the first.
    pub max_attempts: u32,

    /// Delay before the first retry; each further retry doubles it.
    pub base_delay: Duration,

    /// Value of `generationConfig.maxOutputTokens`.
    pub max_output_tokens: u32,

    /// Timeout applied to each individual HTTP request.
    pub request_timeout: Duration,
}

impl Default for CritiqueConfig {
    /// Default values match the production endpoint with an empty credential.
    ///
    /// ```rust
    /// use golden_harmony::config::config::CritiqueConfig;
    ///
    /// let config = CritiqueConfig::default();
    /// assert_eq!(config.max_attempts, 5);
    /// assert!(config.validate().is_err()); // api_key is empty
    /// ```
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_attempts: MAX_ATTEMPTS,
            base_delay: Duration::from_millis(1000),
            max_output_tokens: MAX_OUTPUT_TOKENS,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl CritiqueConfig {
    /// Creates a default configuration carrying the given credential.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Overrides the endpoint base URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// `generateContent` URL for the configured model. The credential is sent
    /// separately as the `key` query parameter.
    pub fn generate_url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint, self.model)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> HarmonyResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(HarmonyError::config("api_key", "", "must not be empty")
                .with_recovery_suggestion("Pass the API credential to CritiqueConfig::new"));
        }
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(HarmonyError::config(
                "endpoint",
                &self.endpoint,
                "must be an http(s) URL",
            ));
        }
        if self.model.trim().is_empty() {
            return Err(HarmonyError::config("model", "", "must not be empty"));
        }
        if !(1..=10).contains(&self.max_attempts) {
            return Err(HarmonyError::config(
                "max_attempts",
                self.max_attempts.to_string(),
                "must be between 1 and 10",
            ));
        }
        if self.max_output_tokens == 0 {
            return Err(HarmonyError::config(
                "max_output_tokens",
                "0",
                "must be greater than 0",
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(HarmonyError::config(
                "request_timeout",
                "0s",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Configuration for the upload-preparation step.
#[derive(Debug, Clone, Copy)]
pub struct PrepareConfig {
    /// Images wider than this are downscaled to exactly this width.
    pub max_width: u32,

    /// Upper bound on decode, resize and encode; exceeded means `Timeout`.
    pub decode_timeout: Duration,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            max_width: MAX_WIDTH,
            decode_timeout: Duration::from_secs(10),
        }
    }
}

impl PrepareConfig {
    pub fn validate(&self) -> HarmonyResult<()> {
        if self.max_width == 0 {
            return Err(HarmonyError::config("max_width", "0", "must be greater than 0"));
        }
        if self.decode_timeout.is_zero() {
            return Err(HarmonyError::config(
                "decode_timeout",
                "0s",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CritiqueConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.base_delay, Duration::from_secs(1));
        assert_eq!(config.max_output_tokens, 1000);
    }

    #[test]
    fn test_config_validation() {
        let mut config = CritiqueConfig::new("secret");

        // Valid config should pass
        assert!(config.validate().is_ok());

        // Missing credential
        config.api_key = "  ".to_string();
        assert!(config.validate().is_err());
        config.api_key = "secret".to_string(); // Reset

        // Attempts out of range
        config.max_attempts = 0;
        assert!(config.validate().is_err());
        config.max_attempts = 11;
        assert!(config.validate().is_err());
        config.max_attempts = 5; // Reset

        // Not a URL
        config.endpoint = "ftp://example".to_string();
        assert!(config.validate().is_err());
        config.endpoint = DEFAULT_ENDPOINT.to_string(); // Reset

        // Valid again
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generate_url_excludes_key() {
        let config = CritiqueConfig::new("abc123")
            .with_endpoint("http://localhost:8080/v1beta/models/")
            .with_model("test-model");
        assert_eq!(
            config.generate_url(),
            "http://localhost:8080/v1beta/models/test-model:generateContent"
        );
        assert!(!config.generate_url().contains("abc123"));
    }

    #[test]
    fn test_prepare_config_validation() {
        let mut config = PrepareConfig::default();
        assert_eq!(config.max_width, 1024);
        assert!(config.validate().is_ok());

        config.max_width = 0;
        assert!(config.validate().is_err());
        config.max_width = 1024;

        config.decode_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
