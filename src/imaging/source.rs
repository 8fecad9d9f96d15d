//! Caller-supplied image input.
//!
//! The presentation layer hands over encoded bytes plus the content type it
//! was told about (file picker, drag and drop, HTTP upload). Decoding happens
//! later, inside [`crate::imaging::ImagePreparer`].

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use crate::error::{HarmonyError, HarmonyResult};

/// Encoded image bytes with their declared content type.
///
/// Bytes are reference counted so the session, the background critique task
/// and the preview registry share one buffer.
#[derive(Debug, Clone)]
pub struct ImageSource {
    name: Option<String>,
    content_type: String,
    bytes: Arc<Vec<u8>>,
}

impl ImageSource {
    pub fn new(content_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: None,
            content_type: content_type.into(),
            bytes: Arc::new(bytes.into()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Reads a file and guesses its content type from the extension.
    ///
    /// Unknown extensions are declared as `application/octet-stream`, which the
    /// session controller rejects as a non-image.
    pub async fn from_path(path: impl AsRef<Path>) -> HarmonyResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| HarmonyError::io("read image", e).with_path(path.display().to_string()))?;
        let content_type = image::ImageFormat::from_path(path)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream");

        let mut source = Self::new(content_type, bytes);
        if let Some(name) = path.file_name() {
            source = source.with_name(name.to_string_lossy());
        }
        Ok(source)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn shared_bytes(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True when the declared content type is an `image/*` type.
    pub fn is_image(&self) -> bool {
        matches!(
            self.content_type.split_once('/'),
            Some((top, sub)) if top.trim().eq_ignore_ascii_case("image") && !sub.trim().is_empty()
        )
    }

    /// Reads the pixel extent `(width, height)` from the image header without
    /// decoding the full bitmap.
    pub fn pixel_dimensions(&self) -> HarmonyResult<(u32, u32)> {
        let reader = image::ImageReader::new(Cursor::new(self.bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| HarmonyError::io("sniff image format", e))?;
        Ok(reader.into_dimensions()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_content_types() {
        assert!(ImageSource::new("image/png", vec![]).is_image());
        assert!(ImageSource::new("IMAGE/JPEG", vec![]).is_image());
        assert!(!ImageSource::new("text/plain", vec![]).is_image());
        assert!(!ImageSource::new("image", vec![]).is_image());
        assert!(!ImageSource::new("", vec![]).is_image());
    }

    #[test]
    fn test_garbage_has_no_dimensions() {
        let source = ImageSource::new("image/png", b"definitely not a png".to_vec());
        assert!(source.pixel_dimensions().is_err());
    }

    #[test]
    fn test_clones_share_bytes() {
        let source = ImageSource::new("image/png", vec![1, 2, 3]).with_name("a.png");
        let copy = source.clone();
        assert!(Arc::ptr_eq(&source.shared_bytes(), &copy.shared_bytes()));
        assert_eq!(copy.name(), Some("a.png"));
        assert_eq!(copy.len(), 3);
    }
}
