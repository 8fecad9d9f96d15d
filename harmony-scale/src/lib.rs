// SPDX-License-Identifier: MIT
//! # harmony-scale: Upload-Bounded Image Scaling
//!
//! This crate computes and executes the downscale step that keeps an image
//! payload small enough to send to a remote multimodal model. It is not a
//! general resizing library: the only supported operation is "clamp the width
//! to a maximum, keep the aspect ratio, never upscale".
//!
//! ## Key Components
//!
//! - [`presets`]: Scale plan computation for a maximum output width
//! - [`cpu`]: RGBA8 scaling using SIMD acceleration from `fast_image_resize`
//!
//! ## Usage Example
//!
//! ```rust
//! use harmony_scale::{cpu::scale_rgba_cpu, presets::{build_plan, Size}};
//!
//! let input = Size { w: 2048, h: 1024 };
//! let plan = build_plan(input, 1024);
//! assert_eq!((plan.out.w, plan.out.h), (1024, 512));
//!
//! let src = vec![255u8; (input.w * input.h * 4) as usize];
//! let mut dst = vec![0u8; plan.output_len()];
//! let mut resizer = fast_image_resize::Resizer::new();
//! scale_rgba_cpu(&mut resizer, &src, &plan, &mut dst).unwrap();
//! ```

pub mod cpu;
pub mod presets;
