//! Shared, background-populated analysis side inputs.
//!
//! Detectors (face finder, depth estimator, luminance meter) run on
//! their own cadence and write here; the orchestrator takes a
//! [`AnalysisInputs`] snapshot once per replay and never waits for a
//! pending value.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use image::{GrayImage, RgbaImage};
use retouch_core::{AnalysisInputs, Region};
use tracing::debug;

/// Cheaply cloneable handle to the shared analysis state.
#[derive(Debug, Clone, Default)]
pub struct AnalysisHub {
    inner: Arc<Mutex<AnalysisInputs>>,
}

impl AnalysisHub {
    /// Create an empty hub: every input starts unavailable.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AnalysisInputs> {
        // A panicked detector thread must not take previews down with
        // it; the last written inputs are still usable.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Consistent snapshot of all inputs, taken once per replay.
    #[must_use]
    pub fn snapshot(&self) -> AnalysisInputs {
        self.lock().clone()
    }

    /// Publish detected face regions.
    pub fn set_face_regions(&self, regions: Vec<Region>) {
        debug!(count = regions.len(), "face regions updated");
        self.lock().face_regions = Some(regions);
    }

    /// Publish a depth estimate.
    pub fn set_depth_map(&self, map: GrayImage) {
        self.lock().depth_map = Some(map);
    }

    /// Publish a measured average luminance in `0.0..=1.0`.
    pub fn set_average_luminance(&self, luminance: f32) {
        self.lock().average_luminance = Some(luminance.clamp(0.0, 1.0));
    }

    /// Measure the average luminance of `image` on a background thread
    /// and publish it when done.
    pub fn spawn_average_luminance(&self, image: RgbaImage) -> thread::JoinHandle<()> {
        let hub = self.clone();
        thread::spawn(move || {
            let luminance = average_luminance(&image);
            hub.set_average_luminance(luminance);
            debug!(luminance, "average luminance measured");
        })
    }
}

/// Mean Rec. 709 luminance over all pixels, in `0.0..=1.0`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn average_luminance(image: &RgbaImage) -> f32 {
    let pixels = u64::from(image.width()) * u64::from(image.height());
    if pixels == 0 {
        return 0.0;
    }
    let mut sum = 0.0_f64;
    for px in image.pixels() {
        let r = f64::from(px.0[0]) / 255.0;
        let g = f64::from(px.0[1]) / 255.0;
        let b = f64::from(px.0[2]) / 255.0;
        sum += 0.2126 * r + 0.7152 * g + 0.0722 * b;
    }
    #[allow(clippy::cast_precision_loss)]
    let avg = sum / pixels as f64;
    avg as f32
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_of_a_fresh_hub_has_nothing() {
        let hub = AnalysisHub::new();
        let snapshot = hub.snapshot();
        assert!(snapshot.face_regions.is_none());
        assert!(snapshot.depth_map.is_none());
        assert!(snapshot.average_luminance.is_none());
    }

    #[test]
    fn published_values_appear_in_later_snapshots() {
        let hub = AnalysisHub::new();
        hub.set_average_luminance(0.3);
        hub.set_face_regions(vec![Region {
            x: 1,
            y: 2,
            width: 3,
            height: 4,
        }]);

        let snapshot = hub.snapshot();
        assert_eq!(snapshot.average_luminance, Some(0.3));
        assert_eq!(snapshot.face_regions.map(|r| r.len()), Some(1));
    }

    #[test]
    fn average_luminance_of_white_is_one() {
        let img = RgbaImage::from_pixel(4, 4, image::Rgba([255, 255, 255, 255]));
        assert!((average_luminance(&img) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn average_luminance_of_empty_image_is_zero() {
        let img = RgbaImage::new(0, 0);
        assert!(average_luminance(&img).abs() < f32::EPSILON);
    }

    #[test]
    fn background_measurement_lands_in_the_hub() {
        let hub = AnalysisHub::new();
        let img = RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 0, 255]));
        hub.spawn_average_luminance(img).join().unwrap();
        assert_eq!(hub.snapshot().average_luminance, Some(0.0));
    }
}
