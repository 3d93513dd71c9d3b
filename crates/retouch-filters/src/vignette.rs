//! Radial edge darkening with a cached falloff mask.
//!
//! The falloff weights depend only on the image dimensions and the
//! `radius`/`softness` parameters, so they are cached across applies
//! and across `strength` changes — dragging the strength slider
//! re-uses the mask and only re-blends.

use image::{Rgba, RgbaImage};
use retouch_core::{AnalysisInputs, Filter, FilterError, FilterKind, ParamValue, Params};

use crate::pixel::{channel, smoothstep, unit};

/// Parameter name: where darkening starts, as a fraction of the
/// half-diagonal, `0.0..=1.5`, default `0.7`.
pub const RADIUS: &str = "radius";
/// Parameter name: width of the falloff band, default `0.5`.
pub const SOFTNESS: &str = "softness";
/// Parameter name: maximum darkening at the corners, `0.0..=1.0`,
/// default `0.0` (off).
pub const STRENGTH: &str = "strength";

#[derive(Debug)]
struct FalloffMask {
    width: u32,
    height: u32,
    /// Per-pixel falloff weight in `0.0..=1.0` (1 = fully darkened).
    weights: Vec<f32>,
}

/// Vignette filter.
#[derive(Debug)]
pub struct Vignette {
    radius: f32,
    softness: f32,
    strength: f32,
    mask: Option<FalloffMask>,
}

impl Default for Vignette {
    fn default() -> Self {
        Self {
            radius: 0.7,
            softness: 0.5,
            strength: 0.0,
            mask: None,
        }
    }
}

impl Vignette {
    fn build_mask(&self, width: u32, height: u32) -> FalloffMask {
        let cx = f64::from(width) / 2.0;
        let cy = f64::from(height) / 2.0;
        let half_diagonal = cx.hypot(cy).max(1.0);

        let mut weights = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let dx = f64::from(x) + 0.5 - cx;
                let dy = f64::from(y) + 0.5 - cy;
                #[allow(clippy::cast_possible_truncation)]
                let dist = (dx.hypot(dy) / half_diagonal) as f32;
                weights.push(smoothstep(self.radius, self.radius + self.softness, dist));
            }
        }
        FalloffMask {
            width,
            height,
            weights,
        }
    }
}

impl Filter for Vignette {
    fn kind(&self) -> FilterKind {
        FilterKind::Vignette
    }

    fn set_parameter(&mut self, name: &str, value: ParamValue) -> bool {
        let Some(v) = value.as_float() else {
            return false;
        };
        match name {
            RADIUS => {
                self.radius = v.clamp(0.0, 1.5);
                self.mask = None;
            }
            SOFTNESS => {
                self.softness = v.clamp(0.01, 1.5);
                self.mask = None;
            }
            // Strength only scales the cached weights at apply time.
            STRENGTH => self.strength = v.clamp(0.0, 1.0),
            _ => return false,
        }
        true
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        match name {
            RADIUS => Some(ParamValue::Float(self.radius)),
            SOFTNESS => Some(ParamValue::Float(self.softness)),
            STRENGTH => Some(ParamValue::Float(self.strength)),
            _ => None,
        }
    }

    fn params(&self) -> Params {
        let mut params = Params::new();
        params.insert(RADIUS.into(), ParamValue::Float(self.radius));
        params.insert(SOFTNESS.into(), ParamValue::Float(self.softness));
        params.insert(STRENGTH.into(), ParamValue::Float(self.strength));
        params
    }

    fn apply(
        &mut self,
        input: &RgbaImage,
        _analysis: &AnalysisInputs,
    ) -> Result<RgbaImage, FilterError> {
        if self.strength <= 0.0 {
            return Ok(input.clone());
        }

        let needs_rebuild = self
            .mask
            .as_ref()
            .is_none_or(|m| m.width != input.width() || m.height != input.height());
        if needs_rebuild {
            self.mask = Some(self.build_mask(input.width(), input.height()));
        }
        let Some(mask) = self.mask.as_ref() else {
            return Ok(input.clone());
        };

        let strength = self.strength;
        let w = input.width() as usize;
        Ok(RgbaImage::from_fn(input.width(), input.height(), |x, y| {
            let px = *input.get_pixel(x, y);
            let weight = mask.weights[y as usize * w + x as usize];
            let factor = strength.mul_add(-weight, 1.0);
            Rgba([
                channel(unit(px.0[0]) * factor),
                channel(unit(px.0[1]) * factor),
                channel(unit(px.0[2]) * factor),
                px.0[3],
            ])
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn white(size: u32) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn zero_strength_is_identity() {
        let img = white(16);
        let mut filter = Vignette::default();
        assert_eq!(filter.apply(&img, &AnalysisInputs::default()).unwrap(), img);
    }

    #[test]
    fn corners_darken_more_than_the_center() {
        let img = white(32);
        let mut filter = Vignette::default();
        filter.set_parameter(STRENGTH, ParamValue::Float(0.8));
        filter.set_parameter(RADIUS, ParamValue::Float(0.3));

        let out = filter.apply(&img, &AnalysisInputs::default()).unwrap();
        let center = out.get_pixel(16, 16).0[0];
        let corner = out.get_pixel(0, 0).0[0];
        assert!(
            corner < center,
            "expected corner ({corner}) darker than center ({center})",
        );
    }

    #[test]
    fn mask_survives_strength_changes_but_not_radius_changes() {
        let img = white(16);
        let mut filter = Vignette::default();
        filter.set_parameter(STRENGTH, ParamValue::Float(0.5));
        filter.apply(&img, &AnalysisInputs::default()).unwrap();
        assert!(filter.mask.is_some());

        filter.set_parameter(STRENGTH, ParamValue::Float(0.9));
        assert!(filter.mask.is_some());

        filter.set_parameter(RADIUS, ParamValue::Float(0.2));
        assert!(filter.mask.is_none());
    }

    #[test]
    fn mask_rebuilds_when_dimensions_change() {
        let mut filter = Vignette::default();
        filter.set_parameter(STRENGTH, ParamValue::Float(0.5));

        filter
            .apply(&white(16), &AnalysisInputs::default())
            .unwrap();
        let out = filter
            .apply(&white(8), &AnalysisInputs::default())
            .unwrap();
        assert_eq!((out.width(), out.height()), (8, 8));
    }
}
