//! Per-channel tone curve.
//!
//! Each channel is shaped by a piecewise-linear curve over `(input,
//! output)` control points in unit space. The three 256-entry lookup
//! tables are the expensive derived state: they are built on first
//! apply and kept until a curve parameter changes.

use image::{Rgba, RgbaImage};
use retouch_core::{AnalysisInputs, Filter, FilterError, FilterKind, ParamValue, Params};

/// Parameter name: red channel control points.
pub const RED: &str = "red";
/// Parameter name: green channel control points.
pub const GREEN: &str = "green";
/// Parameter name: blue channel control points.
pub const BLUE: &str = "blue";

/// Tone curve filter with cached lookup tables.
#[derive(Debug, Default)]
pub struct ToneCurve {
    red: Vec<(f32, f32)>,
    green: Vec<(f32, f32)>,
    blue: Vec<(f32, f32)>,
    /// R/G/B lookup tables; `None` after any curve changed.
    luts: Option<[[u8; 256]; 3]>,
}

/// Build a 256-entry lookup table from control points.
///
/// Points are sorted by input coordinate; values between points are
/// linearly interpolated, values outside the outermost points are
/// clamped to them. No points (or a single point at the origin-less
/// default) yields the identity table.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn build_lut(points: &[(f32, f32)]) -> [u8; 256] {
    let mut sorted: Vec<(f32, f32)> = points
        .iter()
        .map(|&(x, y)| (x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)))
        .collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut lut = [0_u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let x = i as f32 / 255.0;
        let y = match sorted.len() {
            0 => x,
            1 => sorted[0].1,
            _ => interpolate(&sorted, x),
        };
        *entry = (y.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    lut
}

fn interpolate(sorted: &[(f32, f32)], x: f32) -> f32 {
    let first = sorted[0];
    let last = sorted[sorted.len() - 1];
    if x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }
    for pair in sorted.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if x <= x1 {
            if (x1 - x0).abs() < f32::EPSILON {
                return y1;
            }
            let t = (x - x0) / (x1 - x0);
            return (y1 - y0).mul_add(t, y0);
        }
    }
    last.1
}

impl Filter for ToneCurve {
    fn kind(&self) -> FilterKind {
        FilterKind::ToneCurve
    }

    fn set_parameter(&mut self, name: &str, value: ParamValue) -> bool {
        let Some(points) = value.as_curve() else {
            return false;
        };
        match name {
            RED => self.red = points.to_vec(),
            GREEN => self.green = points.to_vec(),
            BLUE => self.blue = points.to_vec(),
            _ => return false,
        }
        self.luts = None;
        true
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        match name {
            RED => Some(ParamValue::Curve(self.red.clone())),
            GREEN => Some(ParamValue::Curve(self.green.clone())),
            BLUE => Some(ParamValue::Curve(self.blue.clone())),
            _ => None,
        }
    }

    fn params(&self) -> Params {
        let mut params = Params::new();
        params.insert(RED.into(), ParamValue::Curve(self.red.clone()));
        params.insert(GREEN.into(), ParamValue::Curve(self.green.clone()));
        params.insert(BLUE.into(), ParamValue::Curve(self.blue.clone()));
        params
    }

    fn apply(
        &mut self,
        input: &RgbaImage,
        _analysis: &AnalysisInputs,
    ) -> Result<RgbaImage, FilterError> {
        let luts = if let Some(luts) = self.luts {
            luts
        } else {
            let built = [
                build_lut(&self.red),
                build_lut(&self.green),
                build_lut(&self.blue),
            ];
            self.luts = Some(built);
            built
        };

        Ok(RgbaImage::from_fn(input.width(), input.height(), |x, y| {
            let px = *input.get_pixel(x, y);
            Rgba([
                luts[0][usize::from(px.0[0])],
                luts[1][usize::from(px.0[1])],
                luts[2][usize::from(px.0[2])],
                px.0[3],
            ])
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_curve_is_identity() {
        let lut = build_lut(&[]);
        for (i, &v) in lut.iter().enumerate() {
            assert_eq!(usize::from(v), i);
        }
    }

    #[test]
    fn linear_curve_matches_identity() {
        let lut = build_lut(&[(0.0, 0.0), (1.0, 1.0)]);
        for (i, &v) in lut.iter().enumerate() {
            assert_eq!(usize::from(v), i);
        }
    }

    #[test]
    fn inverted_curve_flips_values() {
        let lut = build_lut(&[(0.0, 1.0), (1.0, 0.0)]);
        assert_eq!(lut[0], 255);
        assert_eq!(lut[255], 0);
    }

    #[test]
    fn unsorted_points_are_sorted_before_building() {
        let lut = build_lut(&[(1.0, 1.0), (0.0, 0.0), (0.5, 0.25)]);
        assert_eq!(lut[0], 0);
        assert_eq!(lut[255], 255);
        // Midpoint pulled down by the (0.5, 0.25) control point.
        assert!(lut[128] < 128);
    }

    #[test]
    fn changing_a_curve_invalidates_the_lut_cache() {
        let mut filter = ToneCurve::default();
        let img = RgbaImage::from_pixel(2, 2, Rgba([100, 100, 100, 255]));

        let identity = filter.apply(&img, &AnalysisInputs::default()).unwrap();
        assert_eq!(identity, img);
        assert!(filter.luts.is_some());

        filter.set_parameter(RED, ParamValue::Curve(vec![(0.0, 1.0), (1.0, 0.0)]));
        assert!(filter.luts.is_none());

        let flipped = filter.apply(&img, &AnalysisInputs::default()).unwrap();
        assert_eq!(flipped.get_pixel(0, 0).0[0], 155);
        assert_eq!(flipped.get_pixel(0, 0).0[1], 100);
    }

    #[test]
    fn non_curve_value_is_rejected() {
        let mut filter = ToneCurve::default();
        assert!(!filter.set_parameter(RED, ParamValue::Float(1.0)));
    }
}
