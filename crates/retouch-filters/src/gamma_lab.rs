//! Gamma and lightness adjustment with scene-adaptive lift.
//!
//! Consults the average-luminance analysis input: dark scenes get a
//! small automatic lift toward mid-gray, bright scenes a small pull
//! down. While the measurement is pending the filter uses the neutral
//! default ([`retouch_core::DEFAULT_AVERAGE_LUMINANCE`]) rather than
//! blocking. The transfer curve is a 256-entry LUT cached against the
//! parameters *and* the luminance it was built for.

use image::{Rgba, RgbaImage};
use retouch_core::{AnalysisInputs, Filter, FilterError, FilterKind, ParamValue, Params};

/// Parameter name: gamma exponent, `0.2..=5.0`, default `1.0`.
pub const GAMMA: &str = "gamma";
/// Parameter name: additive lightness, `-1.0..=1.0`, default `0.0`.
pub const LIGHTNESS: &str = "lightness";

/// How strongly the measured average luminance pulls exposure toward
/// mid-gray.
const ADAPTIVE_WEIGHT: f32 = 0.25;

/// Gamma/lightness filter.
#[derive(Debug)]
pub struct GammaLab {
    gamma: f32,
    lightness: f32,
    /// Cached transfer LUT and the average luminance it assumed.
    lut: Option<(f32, [u8; 256])>,
}

impl Default for GammaLab {
    fn default() -> Self {
        Self {
            gamma: 1.0,
            lightness: 0.0,
            lut: None,
        }
    }
}

impl GammaLab {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn build_lut(&self, average_luminance: f32) -> [u8; 256] {
        let inv_gamma = 1.0 / self.gamma.max(0.05);
        let lift = self
            .lightness
            .mul_add(0.5, (0.5 - average_luminance) * ADAPTIVE_WEIGHT);

        let mut lut = [0_u8; 256];
        for (i, entry) in lut.iter_mut().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let v = i as f32 / 255.0;
            let out = (v.powf(inv_gamma) + lift).clamp(0.0, 1.0);
            *entry = (out * 255.0).round() as u8;
        }
        lut
    }
}

impl Filter for GammaLab {
    fn kind(&self) -> FilterKind {
        FilterKind::GammaLab
    }

    fn set_parameter(&mut self, name: &str, value: ParamValue) -> bool {
        let Some(v) = value.as_float() else {
            return false;
        };
        match name {
            GAMMA => self.gamma = v.clamp(0.2, 5.0),
            LIGHTNESS => self.lightness = v.clamp(-1.0, 1.0),
            _ => return false,
        }
        self.lut = None;
        true
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        match name {
            GAMMA => Some(ParamValue::Float(self.gamma)),
            LIGHTNESS => Some(ParamValue::Float(self.lightness)),
            _ => None,
        }
    }

    fn params(&self) -> Params {
        let mut params = Params::new();
        params.insert(GAMMA.into(), ParamValue::Float(self.gamma));
        params.insert(LIGHTNESS.into(), ParamValue::Float(self.lightness));
        params
    }

    fn apply(
        &mut self,
        input: &RgbaImage,
        analysis: &AnalysisInputs,
    ) -> Result<RgbaImage, FilterError> {
        let average = analysis.average_luminance_or_default();
        let lut = if let Some((built_for, lut)) = self.lut
            && (built_for - average).abs() <= f32::EPSILON
        {
            lut
        } else {
            let built = self.build_lut(average);
            self.lut = Some((average, built));
            built
        };

        Ok(RgbaImage::from_fn(input.width(), input.height(), |x, y| {
            let px = *input.get_pixel(x, y);
            Rgba([
                lut[usize::from(px.0[0])],
                lut[usize::from(px.0[1])],
                lut[usize::from(px.0[2])],
                px.0[3],
            ])
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn mid_gray() -> RgbaImage {
        RgbaImage::from_pixel(4, 4, Rgba([128, 128, 128, 255]))
    }

    #[test]
    fn neutral_parameters_with_balanced_scene_are_identity() {
        let img = mid_gray();
        let mut filter = GammaLab::default();
        let analysis = AnalysisInputs {
            average_luminance: Some(0.5),
            ..AnalysisInputs::default()
        };
        assert_eq!(filter.apply(&img, &analysis).unwrap(), img);
    }

    #[test]
    fn missing_luminance_falls_back_to_the_neutral_default() {
        let img = mid_gray();
        let mut filter = GammaLab::default();
        let out = filter.apply(&img, &AnalysisInputs::default()).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn dark_scenes_get_lifted() {
        let img = mid_gray();
        let mut filter = GammaLab::default();
        let analysis = AnalysisInputs {
            average_luminance: Some(0.1),
            ..AnalysisInputs::default()
        };
        let out = filter.apply(&img, &analysis).unwrap();
        assert!(out.get_pixel(0, 0).0[0] > 128);
    }

    #[test]
    fn higher_gamma_brightens_midtones() {
        let img = mid_gray();
        let mut filter = GammaLab::default();
        filter.set_parameter(GAMMA, ParamValue::Float(2.0));
        let analysis = AnalysisInputs {
            average_luminance: Some(0.5),
            ..AnalysisInputs::default()
        };
        let out = filter.apply(&img, &analysis).unwrap();
        assert!(out.get_pixel(0, 0).0[0] > 128);
    }

    #[test]
    fn lut_is_rebuilt_when_the_measured_luminance_changes() {
        let img = mid_gray();
        let mut filter = GammaLab::default();

        let balanced = AnalysisInputs {
            average_luminance: Some(0.5),
            ..AnalysisInputs::default()
        };
        let dark = AnalysisInputs {
            average_luminance: Some(0.1),
            ..AnalysisInputs::default()
        };

        let neutral = filter.apply(&img, &balanced).unwrap();
        let lifted = filter.apply(&img, &dark).unwrap();
        assert_ne!(neutral, lifted);
    }
}
