//! Brightness / contrast / saturation adjustment.

use image::RgbaImage;
use retouch_core::{AnalysisInputs, Filter, FilterError, FilterKind, ParamValue, Params};

use crate::pixel::{lerp, map_rgb};

/// Parameter name: additive brightness, `-1.0..=1.0`, default `0.0`.
pub const BRIGHTNESS: &str = "brightness";
/// Parameter name: contrast around mid-gray, `-1.0..=1.0`, default `0.0`.
pub const CONTRAST: &str = "contrast";
/// Parameter name: saturation, `0.0..=2.0`, default `1.0` (identity).
pub const SATURATION: &str = "saturation";

/// The basic color-controls filter. Stateless per pixel; no caches.
#[derive(Debug)]
pub struct ColorControls {
    brightness: f32,
    contrast: f32,
    saturation: f32,
}

impl Default for ColorControls {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 0.0,
            saturation: 1.0,
        }
    }
}

impl Filter for ColorControls {
    fn kind(&self) -> FilterKind {
        FilterKind::ColorControls
    }

    fn set_parameter(&mut self, name: &str, value: ParamValue) -> bool {
        let Some(v) = value.as_float() else {
            return false;
        };
        match name {
            BRIGHTNESS => self.brightness = v.clamp(-1.0, 1.0),
            CONTRAST => self.contrast = v.clamp(-1.0, 1.0),
            SATURATION => self.saturation = v.clamp(0.0, 2.0),
            _ => return false,
        }
        true
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        match name {
            BRIGHTNESS => Some(ParamValue::Float(self.brightness)),
            CONTRAST => Some(ParamValue::Float(self.contrast)),
            SATURATION => Some(ParamValue::Float(self.saturation)),
            _ => None,
        }
    }

    fn params(&self) -> Params {
        let mut params = Params::new();
        params.insert(BRIGHTNESS.into(), ParamValue::Float(self.brightness));
        params.insert(CONTRAST.into(), ParamValue::Float(self.contrast));
        params.insert(SATURATION.into(), ParamValue::Float(self.saturation));
        params
    }

    fn apply(
        &mut self,
        input: &RgbaImage,
        _analysis: &AnalysisInputs,
    ) -> Result<RgbaImage, FilterError> {
        let slope = 1.0 + self.contrast;
        let (brightness, saturation) = (self.brightness, self.saturation);
        Ok(map_rgb(input, |r, g, b| {
            // Brightness, then contrast around mid-gray.
            let adjust = |v: f32| (v + brightness - 0.5).mul_add(slope, 0.5);
            let (r, g, b) = (adjust(r), adjust(g), adjust(b));
            // Saturation: mix each channel with the pixel's luma.
            let luma = 0.2126_f32.mul_add(r, 0.7152_f32.mul_add(g, 0.0722 * b));
            (
                lerp(luma, r, saturation),
                lerp(luma, g, saturation),
                lerp(luma, b, saturation),
            )
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn apply(filter: &mut ColorControls, img: &RgbaImage) -> RgbaImage {
        filter.apply(img, &AnalysisInputs::default()).unwrap()
    }

    #[test]
    fn defaults_are_identity() {
        let img = RgbaImage::from_fn(4, 4, |x, y| {
            image::Rgba([(x * 40) as u8, (y * 40) as u8, 128, 255])
        });
        let mut filter = ColorControls::default();
        assert_eq!(apply(&mut filter, &img), img);
    }

    #[test]
    fn positive_brightness_raises_every_channel() {
        let img = RgbaImage::from_pixel(2, 2, image::Rgba([100, 100, 100, 255]));
        let mut filter = ColorControls::default();
        assert!(filter.set_parameter(BRIGHTNESS, ParamValue::Float(0.2)));
        let out = apply(&mut filter, &img);
        assert_eq!(out.get_pixel(0, 0).0[0], 151);
    }

    #[test]
    fn zero_saturation_produces_gray() {
        let img = RgbaImage::from_pixel(2, 2, image::Rgba([200, 50, 80, 255]));
        let mut filter = ColorControls::default();
        filter.set_parameter(SATURATION, ParamValue::Float(0.0));
        let out = apply(&mut filter, &img);
        let px = out.get_pixel(0, 0).0;
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let mut filter = ColorControls::default();
        assert!(!filter.set_parameter("hue", ParamValue::Float(0.5)));
        assert!(!filter.set_parameter(BRIGHTNESS, ParamValue::Bool(true)));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut filter = ColorControls::default();
        filter.set_parameter(SATURATION, ParamValue::Float(9.0));
        assert_eq!(filter.parameter(SATURATION), Some(ParamValue::Float(2.0)));
    }
}
