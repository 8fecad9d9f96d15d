//! # Upload Preparation Pipeline
//!
//! Converts an arbitrary caller-supplied image into a bounded, transport-ready
//! PNG payload:
//!
//! 1. **Decode** the encoded bytes into an RGBA8 bitmap
//! 2. **Plan** a width-bounded, aspect-preserving canvas (`harmony_scale::presets`)
//! 3. **Resize** with SIMD convolution when the plan is not an identity (`harmony_scale::cpu`)
//! 4. **Encode** losslessly as PNG and return the raw bytes, never a data URI
//!
//! Decoding and encoding are CPU bound, so the whole pipeline runs on tokio's
//! blocking pool under a timeout: a pathological image fails with `Timeout`
//! instead of stalling the session forever.

use base64::{Engine as _, engine::general_purpose};
use fast_image_resize::Resizer;
use harmony_scale::presets::{Size, build_plan};
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use tracing::debug;

use crate::config::PrepareConfig;
use crate::error::{HarmonyError, HarmonyResult};
use crate::imaging::source::ImageSource;

pub const PNG_MIME: &str = "image/png";

/// Bounded, encoded image ready for transmission. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    bytes: Vec<u8>,
    mime_type: &'static str,
    width: u32,
    height: u32,
}

impl EncodedPayload {
    /// Raw encoded bytes without any transport framing.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        self.mime_type
    }

    /// Pixel extent of the encoded image `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Standard base64 of the payload bytes, as carried in `inlineData.data`.
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// Decodes, bounds and re-encodes caller images for upload.
#[derive(Debug, Clone, Default)]
pub struct ImagePreparer {
    config: PrepareConfig,
}

impl ImagePreparer {
    pub fn new(config: PrepareConfig) -> HarmonyResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PrepareConfig {
        &self.config
    }

    /// Prepares `source` for upload.
    ///
    /// # Errors
    ///
    /// - `ImageDecode` when the bytes are not a decodable image
    /// - `Timeout` when decode + encode exceeds `decode_timeout`
    /// - `Processing` when resizing or PNG encoding fails
    pub async fn prepare(&self, source: &ImageSource) -> HarmonyResult<EncodedPayload> {
        let bytes = source.shared_bytes();
        let max_width = self.config.max_width;
        let limit = self.config.decode_timeout;

        let task = tokio::task::spawn_blocking(move || encode_bounded(&bytes, max_width));
        let joined = tokio::time::timeout(limit, task)
            .await
            .map_err(|_| {
                HarmonyError::timeout("image decode", limit.as_millis() as u64)
                    .with_recovery_suggestion("Try a smaller or simpler image")
            })?;

        let payload = joined.map_err(|e| HarmonyError::image_decode(format!("decoder task failed: {e}")))??;
        debug!(
            width = payload.width,
            height = payload.height,
            bytes = payload.bytes.len(),
            "prepared upload payload"
        );
        Ok(payload)
    }
}

/// Synchronous core of [`ImagePreparer::prepare`].
pub fn encode_bounded(encoded: &[u8], max_width: u32) -> HarmonyResult<EncodedPayload> {
    let rgba = image::load_from_memory(encoded)?.into_rgba8();
    let (w, h) = rgba.dimensions();
    let plan = build_plan(Size { w, h }, max_width);

    let pixels = if plan.is_identity() {
        rgba.into_raw()
    } else {
        let mut dst = vec![0u8; plan.output_len()];
        harmony_scale::cpu::scale_rgba_cpu(&mut Resizer::new(), rgba.as_raw(), &plan, &mut dst)?;
        dst
    };

    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            &pixels,
            plan.out.w,
            plan.out.h,
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| HarmonyError::processing("png encode", e.to_string()))?;

    Ok(EncodedPayload {
        bytes: out,
        mime_type: PNG_MIME,
        width: plan.out.w,
        height: plan.out.h,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(w, h, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 90, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_wide_image_is_bounded() {
        let payload = encode_bounded(&png_bytes(2048, 1000), 1024).unwrap();
        assert_eq!(payload.dimensions(), (1024, 500));
        assert_eq!(payload.mime_type(), "image/png");

        let decoded = image::load_from_memory(payload.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1024, 500));
    }

    #[test]
    fn test_narrow_image_keeps_size() {
        let payload = encode_bounded(&png_bytes(300, 200), 1024).unwrap();
        assert_eq!(payload.dimensions(), (300, 200));
    }

    #[test]
    fn test_payload_is_raw_png_not_data_uri() {
        let payload = encode_bounded(&png_bytes(4, 4), 1024).unwrap();
        assert_eq!(&payload.bytes()[..4], &[0x89, b'P', b'N', b'G']);
        assert!(!payload.to_base64().starts_with("data:"));
    }

    #[test]
    fn test_undecodable_bytes_fail_fast() {
        let err = encode_bounded(b"GIF89a but not really", 1024).unwrap_err();
        assert_eq!(err.category(), "image_decode");
    }
}
