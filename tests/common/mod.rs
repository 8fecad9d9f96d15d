//! Common test utilities shared by the integration tests.
//!
//! Provides synthetic images and a scripted critique transport so the retry
//! loop and the session workflow can run without a network.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use golden_harmony::critique::request::{GenerateContentRequest, GenerateContentResponse};
use golden_harmony::{CritiqueTransport, HarmonyError, HarmonyResult, ImageSource};
use image::{ImageFormat, Rgba, RgbaImage};
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// A well-formed critique body.
pub const VALID_REPORT: &str = r#"{
    "composition": "Strong vertical anchor on the left third.",
    "geometry": "Frame sits close to a golden rectangle.",
    "styling": "Restrained palette, generous margins.",
    "verdict": "Harmonious."
}"#;

/// PNG bytes of a `width` x `height` gradient.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("encode test png");
    out.into_inner()
}

pub fn png_source(width: u32, height: u32) -> ImageSource {
    ImageSource::new("image/png", png_bytes(width, height)).with_name("test.png")
}

/// One scripted transport reply.
pub enum Reply {
    Text(String),
    Error(fn() -> HarmonyError),
}

impl Reply {
    pub fn valid() -> Self {
        Self::Text(VALID_REPORT.to_string())
    }

    pub fn server_error() -> Self {
        Self::Error(|| HarmonyError::transport(503, "overloaded"))
    }
}

/// Transport that replays a script and records when each call arrived.
///
/// Once the script is exhausted every further call fails with a 500.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Instant>>,
    requests: Mutex<Vec<GenerateContentRequest>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        })
    }

    /// Like `new`, but each call first takes a permit from `gate`.
    pub fn gated(script: impl IntoIterator<Item = Reply>, gate: Arc<Semaphore>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            gate: Some(gate),
            ..Self::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Gaps between consecutive calls, in whole milliseconds.
    pub fn gaps_ms(&self) -> Vec<u128> {
        let calls = self.calls.lock().unwrap();
        calls
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).as_millis())
            .collect()
    }

    pub fn last_request(&self) -> Option<GenerateContentRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CritiqueTransport for ScriptedTransport {
    async fn generate(&self, request: &GenerateContentRequest) -> HarmonyResult<GenerateContentResponse> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        self.calls.lock().unwrap().push(Instant::now());
        self.requests.lock().unwrap().push(request.clone());

        let reply = self.script.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Text(text)) => Ok(GenerateContentResponse::from_text(text)),
            Some(Reply::Error(make)) => Err(make()),
            None => Err(HarmonyError::transport(500, "script exhausted")),
        }
    }
}
