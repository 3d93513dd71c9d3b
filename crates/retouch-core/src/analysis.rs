//! Asynchronously-populated side inputs consumed by some filters.
//!
//! Face regions, the depth map, and the average luminance are produced
//! by background analyzers outside this crate. A replay never waits
//! for them: each filter either falls back to a documented default
//! (e.g. [`AnalysisInputs::average_luminance_or_default`]) or refuses
//! to run ([`crate::FilterError::MissingAnalysis`]) when a required
//! input has not arrived yet.

use image::GrayImage;

/// Fallback used when no average-luminance measurement is available:
/// mid-gray, which makes luminance-adaptive filters behave neutrally.
pub const DEFAULT_AVERAGE_LUMINANCE: f32 = 0.5;

/// An axis-aligned pixel region, e.g. a detected face bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Region {
    /// Whether the pixel at `(x, y)` lies inside this region.
    #[must_use]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

/// Read-only snapshot of all analysis side inputs.
///
/// Each field is `None` until its analyzer has produced a value. The
/// snapshot is taken once per replay, so a single replay sees a
/// consistent view even while analyzers keep running.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInputs {
    /// Detected face bounding boxes, in source-image coordinates.
    pub face_regions: Option<Vec<Region>>,
    /// Per-pixel depth estimate (nearer = brighter).
    pub depth_map: Option<GrayImage>,
    /// Mean luminance of the source image in `0.0..=1.0`.
    pub average_luminance: Option<f32>,
}

impl AnalysisInputs {
    /// Average luminance, or [`DEFAULT_AVERAGE_LUMINANCE`] while the
    /// measurement is still pending.
    #[must_use]
    pub fn average_luminance_or_default(&self) -> f32 {
        self.average_luminance.unwrap_or(DEFAULT_AVERAGE_LUMINANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_contains_is_half_open() {
        let region = Region {
            x: 10,
            y: 10,
            width: 5,
            height: 5,
        };
        assert!(region.contains(10, 10));
        assert!(region.contains(14, 14));
        assert!(!region.contains(15, 10));
        assert!(!region.contains(10, 15));
        assert!(!region.contains(9, 10));
    }

    #[test]
    fn luminance_defaults_to_mid_gray() {
        let inputs = AnalysisInputs::default();
        assert!((inputs.average_luminance_or_default() - 0.5).abs() < f32::EPSILON);

        let inputs = AnalysisInputs {
            average_luminance: Some(0.8),
            ..AnalysisInputs::default()
        };
        assert!((inputs.average_luminance_or_default() - 0.8).abs() < f32::EPSILON);
    }
}
