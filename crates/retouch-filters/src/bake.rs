//! Unmanaged edit bakers: crop, rotate, and freehand mask blur.
//!
//! Each implements [`BakedEdit`]: it produces a new image directly
//! from the currently displayed one. The result cannot be re-derived
//! from parameters, so committing it pushes a new baseline for all
//! later managed replays.

use image::{GrayImage, Rgba, RgbaImage, imageops};
use retouch_core::BakedEdit;

use crate::pixel::{channel, gaussian_blur_rgba, lerp, unit};

/// Crop to a pixel rectangle.
#[derive(Debug, Clone, Copy)]
pub struct Crop {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels; must be nonzero and fit in the image.
    pub width: u32,
    /// Height in pixels; must be nonzero and fit in the image.
    pub height: u32,
}

impl BakedEdit for Crop {
    fn label(&self) -> &'static str {
        "crop"
    }

    fn produce_image(&self, current: &RgbaImage) -> Option<RgbaImage> {
        if self.width == 0
            || self.height == 0
            || self.x.checked_add(self.width)? > current.width()
            || self.y.checked_add(self.height)? > current.height()
        {
            return None;
        }
        Some(imageops::crop_imm(current, self.x, self.y, self.width, self.height).to_image())
    }
}

/// Rotate by quarter turns, clockwise.
#[derive(Debug, Clone, Copy)]
pub struct Rotate {
    /// Number of clockwise quarter turns; taken modulo 4.
    pub quarter_turns: u32,
}

impl BakedEdit for Rotate {
    fn label(&self) -> &'static str {
        "rotate"
    }

    fn produce_image(&self, current: &RgbaImage) -> Option<RgbaImage> {
        Some(match self.quarter_turns % 4 {
            1 => imageops::rotate90(current),
            2 => imageops::rotate180(current),
            3 => imageops::rotate270(current),
            _ => current.clone(),
        })
    }
}

/// Freehand mask blur: Gaussian-blur the image, then blend it in only
/// where the user painted the mask.
#[derive(Debug, Clone)]
pub struct MaskBlur {
    /// Per-pixel blend weight (255 = fully blurred). Must match the
    /// current image's dimensions.
    pub mask: GrayImage,
    /// Gaussian sigma of the blur pass.
    pub sigma: f32,
}

impl BakedEdit for MaskBlur {
    fn label(&self) -> &'static str {
        "mask_blur"
    }

    fn produce_image(&self, current: &RgbaImage) -> Option<RgbaImage> {
        if self.mask.dimensions() != current.dimensions() || self.sigma <= 0.0 {
            return None;
        }

        let blurred = gaussian_blur_rgba(current, self.sigma);
        Some(RgbaImage::from_fn(
            current.width(),
            current.height(),
            |x, y| {
                let a = *current.get_pixel(x, y);
                let b = *blurred.get_pixel(x, y);
                let t = unit(self.mask.get_pixel(x, y).0[0]);
                Rgba([
                    channel(lerp(unit(a.0[0]), unit(b.0[0]), t)),
                    channel(lerp(unit(a.0[1]), unit(b.0[1]), t)),
                    channel(lerp(unit(a.0[2]), unit(b.0[2]), t)),
                    a.0[3],
                ])
            },
        ))
    }
}
