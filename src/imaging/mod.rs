//! # Imaging Module
//!
//! Caller-supplied image sources and the upload-preparation pipeline that
//! turns them into bounded PNG payloads.

pub mod prepare;
pub mod source;

pub use prepare::{EncodedPayload, ImagePreparer};
pub use source::ImageSource;
