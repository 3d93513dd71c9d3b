//! Sparkle overlay with deterministic placement.
//!
//! Sparkle positions are derived from a SipHash of each grid cell, so
//! the same density over the same dimensions always places the same
//! sparkles — replaying the chain after undo/redo reproduces the exact
//! pixels. The placement layer is cached; `brightness` only scales it
//! at apply time.

use std::hash::Hasher;

use image::{Rgba, RgbaImage};
use retouch_core::{AnalysisInputs, Filter, FilterError, FilterKind, ParamValue, Params};
use siphasher::sip::SipHasher13;

use crate::pixel::{channel, unit};

/// Parameter name: fraction of grid cells that sparkle, `0.0..=1.0`,
/// default `0.0` (off).
pub const DENSITY: &str = "density";
/// Parameter name: additive sparkle brightness, `0.0..=1.0`,
/// default `0.8`.
pub const BRIGHTNESS: &str = "brightness";

/// Sparkles are placed on a fixed grid of this cell size (pixels).
const CELL: u32 = 8;

/// Fixed hash keys: placement must be stable across sessions.
const KEY0: u64 = 0x517c_c1b7_2722_0a95;
const KEY1: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Debug)]
struct SparkleLayer {
    width: u32,
    height: u32,
    /// Additive per-pixel weight in `0.0..=1.0`.
    weights: Vec<f32>,
}

/// Glitter filter.
#[derive(Debug)]
pub struct Glitter {
    density: f32,
    brightness: f32,
    layer: Option<SparkleLayer>,
}

impl Default for Glitter {
    fn default() -> Self {
        Self {
            density: 0.0,
            brightness: 0.8,
            layer: None,
        }
    }
}

fn cell_hash(cell_x: u32, cell_y: u32) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(KEY0, KEY1);
    hasher.write_u32(cell_x);
    hasher.write_u32(cell_y);
    hasher.finish()
}

impl Glitter {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn build_layer(&self, width: u32, height: u32) -> SparkleLayer {
        let mut weights = vec![0.0_f32; width as usize * height as usize];
        let cells_x = width.div_ceil(CELL);
        let cells_y = height.div_ceil(CELL);

        for cell_y in 0..cells_y {
            for cell_x in 0..cells_x {
                let hash = cell_hash(cell_x, cell_y);
                #[allow(clippy::cast_precision_loss)]
                let roll = (hash & 0xFFFF) as f32 / f32::from(u16::MAX);
                if roll >= self.density {
                    continue;
                }
                // Position within the cell from higher hash bits.
                let offset_x = ((hash >> 16) % u64::from(CELL)) as u32;
                let offset_y = ((hash >> 24) % u64::from(CELL)) as u32;
                let sx = cell_x * CELL + offset_x;
                let sy = cell_y * CELL + offset_y;
                if sx >= width || sy >= height {
                    continue;
                }
                // Small plus-shaped sparkle: bright core, dim arms.
                stamp(&mut weights, width, height, sx, sy, 1.0);
                for (dx, dy) in [(-1_i64, 0_i64), (1, 0), (0, -1), (0, 1)] {
                    let ax = i64::from(sx) + dx;
                    let ay = i64::from(sy) + dy;
                    if ax >= 0 && ay >= 0 {
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        stamp(&mut weights, width, height, ax as u32, ay as u32, 0.4);
                    }
                }
            }
        }
        SparkleLayer {
            width,
            height,
            weights,
        }
    }
}

fn stamp(weights: &mut [f32], width: u32, height: u32, x: u32, y: u32, value: f32) {
    if x < width && y < height {
        let index = y as usize * width as usize + x as usize;
        weights[index] = weights[index].max(value);
    }
}

impl Filter for Glitter {
    fn kind(&self) -> FilterKind {
        FilterKind::Glitter
    }

    fn set_parameter(&mut self, name: &str, value: ParamValue) -> bool {
        let Some(v) = value.as_float() else {
            return false;
        };
        match name {
            DENSITY => {
                self.density = v.clamp(0.0, 1.0);
                self.layer = None;
            }
            // Brightness only scales the cached layer at apply time.
            BRIGHTNESS => self.brightness = v.clamp(0.0, 1.0),
            _ => return false,
        }
        true
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        match name {
            DENSITY => Some(ParamValue::Float(self.density)),
            BRIGHTNESS => Some(ParamValue::Float(self.brightness)),
            _ => None,
        }
    }

    fn params(&self) -> Params {
        let mut params = Params::new();
        params.insert(DENSITY.into(), ParamValue::Float(self.density));
        params.insert(BRIGHTNESS.into(), ParamValue::Float(self.brightness));
        params
    }

    fn apply(
        &mut self,
        input: &RgbaImage,
        _analysis: &AnalysisInputs,
    ) -> Result<RgbaImage, FilterError> {
        if self.density <= 0.0 {
            return Ok(input.clone());
        }

        let needs_rebuild = self
            .layer
            .as_ref()
            .is_none_or(|l| l.width != input.width() || l.height != input.height());
        if needs_rebuild {
            self.layer = Some(self.build_layer(input.width(), input.height()));
        }
        let Some(layer) = self.layer.as_ref() else {
            return Ok(input.clone());
        };

        let brightness = self.brightness;
        let w = input.width() as usize;
        Ok(RgbaImage::from_fn(input.width(), input.height(), |x, y| {
            let px = *input.get_pixel(x, y);
            let add = layer.weights[y as usize * w + x as usize] * brightness;
            Rgba([
                channel(unit(px.0[0]) + add),
                channel(unit(px.0[1]) + add),
                channel(unit(px.0[2]) + add),
                px.0[3],
            ])
        }))
    }
}
