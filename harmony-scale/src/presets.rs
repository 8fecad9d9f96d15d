// SPDX-License-Identifier: MIT
//! # Scale Plan Computation
//!
//! Computes the output canvas for a width-bounded, aspect-preserving downscale.
//!
//! - `scale = min(1, max_width / width)`, so images are never upscaled
//! - Both output sides are rounded to the nearest pixel and clamped to at least 1px
//! - A plan whose output equals its input is an identity plan and needs no resampling

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

/// Complete scaling plan computed from input parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScalePlan {
    /// Original input dimensions
    pub input: Size,
    /// Width bound used for planning
    pub max_width: u32,
    /// Uniform scale factor applied to both axes (always `<= 1.0`)
    pub scale: f64,
    /// Final computed output dimensions
    pub out: Size,
}

impl ScalePlan {
    /// True when the output canvas equals the input and no resampling is required.
    pub fn is_identity(&self) -> bool {
        self.input == self.out
    }

    /// Number of bytes an RGBA8 output buffer must hold for this plan.
    pub fn output_len(&self) -> usize {
        (self.out.w as usize) * (self.out.h as usize) * 4
    }
}

/// Compute a scaling plan that bounds the output width to `max_width`.
///
/// # Arguments
/// * `input` - Source image dimensions
/// * `max_width` - Largest permitted output width in pixels
///
/// # Performance
/// O(1) computation with minimal floating-point operations
pub fn build_plan(input: Size, max_width: u32) -> ScalePlan {
    let scale = width_scale(input.w, max_width);
    let (w, h) = if scale >= 1.0 {
        (input.w, input.h)
    } else {
        (
            ((input.w as f64 * scale).round() as u32).max(1),
            ((input.h as f64 * scale).round() as u32).max(1),
        )
    };
    ScalePlan {
        input,
        max_width,
        scale,
        out: Size { w, h },
    }
}

/// `min(1, max_width / width)`; a zero-width input yields 1.0 so callers never divide by zero.
fn width_scale(width: u32, max_width: u32) -> f64 {
    if width == 0 {
        return 1.0;
    }
    (max_width as f64 / width as f64).min(1.0)
}
