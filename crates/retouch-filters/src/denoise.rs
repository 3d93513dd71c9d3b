//! Smoothing denoise: Gaussian blur blended back by strength.

use image::{Rgba, RgbaImage};
use retouch_core::{AnalysisInputs, Filter, FilterError, FilterKind, ParamValue, Params};

use crate::pixel::{channel, gaussian_blur_rgba, lerp, unit};

/// Parameter name: blend toward the smoothed image, `0.0..=1.0`,
/// default `0.0` (off).
pub const STRENGTH: &str = "strength";
/// Parameter name: Gaussian sigma of the smoothing pass, default `1.5`.
pub const SIGMA: &str = "sigma";

/// Denoise filter. The blur is recomputed per apply (its input changes
/// with every replay), so there is nothing worth caching here.
#[derive(Debug)]
pub struct Denoise {
    strength: f32,
    sigma: f32,
}

impl Default for Denoise {
    fn default() -> Self {
        Self {
            strength: 0.0,
            sigma: 1.5,
        }
    }
}

impl Filter for Denoise {
    fn kind(&self) -> FilterKind {
        FilterKind::Denoise
    }

    fn set_parameter(&mut self, name: &str, value: ParamValue) -> bool {
        let Some(v) = value.as_float() else {
            return false;
        };
        match name {
            STRENGTH => self.strength = v.clamp(0.0, 1.0),
            SIGMA => self.sigma = v.clamp(0.0, 10.0),
            _ => return false,
        }
        true
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        match name {
            STRENGTH => Some(ParamValue::Float(self.strength)),
            SIGMA => Some(ParamValue::Float(self.sigma)),
            _ => None,
        }
    }

    fn params(&self) -> Params {
        let mut params = Params::new();
        params.insert(STRENGTH.into(), ParamValue::Float(self.strength));
        params.insert(SIGMA.into(), ParamValue::Float(self.sigma));
        params
    }

    fn apply(
        &mut self,
        input: &RgbaImage,
        _analysis: &AnalysisInputs,
    ) -> Result<RgbaImage, FilterError> {
        if self.strength <= 0.0 || self.sigma <= 0.0 {
            return Ok(input.clone());
        }

        let blurred = gaussian_blur_rgba(input, self.sigma);
        let strength = self.strength;
        Ok(RgbaImage::from_fn(input.width(), input.height(), |x, y| {
            let a = *input.get_pixel(x, y);
            let b = *blurred.get_pixel(x, y);
            Rgba([
                channel(lerp(unit(a.0[0]), unit(b.0[0]), strength)),
                channel(lerp(unit(a.0[1]), unit(b.0[1]), strength)),
                channel(lerp(unit(a.0[2]), unit(b.0[2]), strength)),
                a.0[3],
            ])
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn noisy_image() -> RgbaImage {
        RgbaImage::from_fn(8, 8, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn zero_strength_is_identity() {
        let img = noisy_image();
        let mut filter = Denoise::default();
        assert_eq!(filter.apply(&img, &AnalysisInputs::default()).unwrap(), img);
    }

    #[test]
    fn full_strength_flattens_checkerboard_noise() {
        let img = noisy_image();
        let mut filter = Denoise::default();
        filter.set_parameter(STRENGTH, ParamValue::Float(1.0));
        filter.set_parameter(SIGMA, ParamValue::Float(2.0));

        let out = filter.apply(&img, &AnalysisInputs::default()).unwrap();
        // Center pixels pull toward mid-gray.
        let center = out.get_pixel(4, 4).0[0];
        assert!(
            (64..=192).contains(&center),
            "expected smoothed value near mid-gray, got {center}",
        );
    }

    #[test]
    fn alpha_is_preserved() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 128]));
        let mut filter = Denoise::default();
        filter.set_parameter(STRENGTH, ParamValue::Float(0.8));
        let out = filter.apply(&img, &AnalysisInputs::default()).unwrap();
        assert_eq!(out.get_pixel(1, 1).0[3], 128);
    }
}
