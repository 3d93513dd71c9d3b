//! Outline / sketch stylization: luminance edges drawn dark on white,
//! blended over the photo by intensity.

use image::{Rgba, RgbaImage};
use retouch_core::{AnalysisInputs, Filter, FilterError, FilterKind, ParamValue, Params};

use crate::pixel::{channel, lerp, luminance, unit};

/// Parameter name: blend toward the sketch rendition, `0.0..=1.0`,
/// default `0.0` (off).
pub const INTENSITY: &str = "intensity";
/// Parameter name: edge gain before clamping, default `2.0`.
pub const EDGE_GAIN: &str = "edge_gain";

/// Sketch filter.
#[derive(Debug)]
pub struct Sketch {
    intensity: f32,
    edge_gain: f32,
}

impl Default for Sketch {
    fn default() -> Self {
        Self {
            intensity: 0.0,
            edge_gain: 2.0,
        }
    }
}

/// 3x3 Sobel gradient magnitude of the luminance plane, normalized to
/// `0.0..=1.0`. Border pixels get zero gradient.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
fn sobel_magnitude(input: &RgbaImage) -> Vec<f32> {
    let (w, h) = (input.width() as usize, input.height() as usize);
    let mut luma = vec![0.0_f32; w * h];
    for (x, y, px) in input.enumerate_pixels() {
        luma[y as usize * w + x as usize] = luminance(*px);
    }

    let mut magnitude = vec![0.0_f32; w * h];
    if w < 3 || h < 3 {
        return magnitude;
    }
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let at = |dx: i32, dy: i32| -> f32 {
                let xi = (x as i32 + dx) as usize;
                let yi = (y as i32 + dy) as usize;
                luma[yi * w + xi]
            };
            let gx = (at(1, -1) + 2.0 * at(1, 0) + at(1, 1))
                - (at(-1, -1) + 2.0 * at(-1, 0) + at(-1, 1));
            let gy = (at(-1, 1) + 2.0 * at(0, 1) + at(1, 1))
                - (at(-1, -1) + 2.0 * at(0, -1) + at(1, -1));
            // Max magnitude of the 3x3 Sobel on a unit plane is 4*sqrt(2).
            magnitude[y * w + x] = gx.hypot(gy) / (4.0 * std::f32::consts::SQRT_2);
        }
    }
    magnitude
}

impl Filter for Sketch {
    fn kind(&self) -> FilterKind {
        FilterKind::Sketch
    }

    fn set_parameter(&mut self, name: &str, value: ParamValue) -> bool {
        let Some(v) = value.as_float() else {
            return false;
        };
        match name {
            INTENSITY => self.intensity = v.clamp(0.0, 1.0),
            EDGE_GAIN => self.edge_gain = v.clamp(0.1, 10.0),
            _ => return false,
        }
        true
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        match name {
            INTENSITY => Some(ParamValue::Float(self.intensity)),
            EDGE_GAIN => Some(ParamValue::Float(self.edge_gain)),
            _ => None,
        }
    }

    fn params(&self) -> Params {
        let mut params = Params::new();
        params.insert(INTENSITY.into(), ParamValue::Float(self.intensity));
        params.insert(EDGE_GAIN.into(), ParamValue::Float(self.edge_gain));
        params
    }

    fn apply(
        &mut self,
        input: &RgbaImage,
        _analysis: &AnalysisInputs,
    ) -> Result<RgbaImage, FilterError> {
        if self.intensity <= 0.0 {
            return Ok(input.clone());
        }

        let magnitude = sobel_magnitude(input);
        let w = input.width() as usize;
        let (intensity, gain) = (self.intensity, self.edge_gain);
        Ok(RgbaImage::from_fn(input.width(), input.height(), |x, y| {
            let px = *input.get_pixel(x, y);
            let edge = (magnitude[y as usize * w + x as usize] * gain).clamp(0.0, 1.0);
            // Pencil look: edges dark on a white page.
            let sketch = 1.0 - edge;
            Rgba([
                channel(lerp(unit(px.0[0]), sketch, intensity)),
                channel(lerp(unit(px.0[1]), sketch, intensity)),
                channel(lerp(unit(px.0[2]), sketch, intensity)),
                px.0[3],
            ])
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn vertical_edge_image() -> RgbaImage {
        RgbaImage::from_fn(10, 10, |x, _| {
            if x < 5 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn zero_intensity_is_identity() {
        let img = vertical_edge_image();
        let mut filter = Sketch::default();
        assert_eq!(filter.apply(&img, &AnalysisInputs::default()).unwrap(), img);
    }

    #[test]
    fn full_intensity_darkens_edges_and_whitens_flat_areas() {
        let img = vertical_edge_image();
        let mut filter = Sketch::default();
        filter.set_parameter(INTENSITY, ParamValue::Float(1.0));

        let out = filter.apply(&img, &AnalysisInputs::default()).unwrap();
        // Flat region far from the boundary renders as the white page.
        assert_eq!(out.get_pixel(2, 5).0[0], 255);
        // The boundary renders darker than the page.
        assert!(out.get_pixel(5, 5).0[0] < 255);
    }

    #[test]
    fn tiny_images_pass_through_without_edges() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([40, 40, 40, 255]));
        let mut filter = Sketch::default();
        filter.set_parameter(INTENSITY, ParamValue::Float(1.0));
        let out = filter.apply(&img, &AnalysisInputs::default()).unwrap();
        // No computable gradient: everything is page-white.
        assert_eq!(out.get_pixel(0, 0).0[0], 255);
    }
}
