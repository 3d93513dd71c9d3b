//! retouch-filters: built-in pixel kernels for the retouch edit engine.
//!
//! Managed kernels implement [`retouch_core::Filter`] — small pure
//! per-pixel transforms, some with cached derived state (tone-curve
//! LUTs, vignette falloff masks, sparkle layers) invalidated by the
//! parameters that feed them. Unmanaged bakers implement
//! [`retouch_core::BakedEdit`] for crop / rotate / freehand mask blur.
//!
//! [`BuiltinFilters`] wires every managed kind to its kernel for the
//! chain's lazy slot construction.

pub mod background_tone;
pub mod bake;
pub mod builtins;
pub mod color_controls;
pub mod denoise;
pub mod gamma_lab;
pub mod glitter;
mod pixel;
pub mod sketch;
pub mod tone_curve;
pub mod vignette;

pub use background_tone::BackgroundTone;
pub use bake::{Crop, MaskBlur, Rotate};
pub use builtins::BuiltinFilters;
pub use color_controls::ColorControls;
pub use denoise::Denoise;
pub use gamma_lab::GammaLab;
pub use glitter::Glitter;
pub use sketch::Sketch;
pub use tone_curve::ToneCurve;
pub use vignette::Vignette;
