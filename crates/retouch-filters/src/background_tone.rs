//! Background tone-down: darkens and tints everything outside the
//! detected face regions.
//!
//! Hard requirement on the face-detection analysis input — without it
//! there is no foreground/background split, so the filter refuses to
//! run and the whole replay is aborted rather than guessing.

use image::{Rgba, RgbaImage};
use retouch_core::{AnalysisInputs, Filter, FilterError, FilterKind, ParamValue, Params, Region};

use crate::pixel::{channel, lerp, unit};

/// Parameter name: blend toward the background tone, `0.0..=1.0`,
/// default `0.0` (off).
pub const AMOUNT: &str = "amount";
/// Parameter name: the tone color blended into the background,
/// default near-black.
pub const TONE: &str = "tone";

/// Background tone filter.
#[derive(Debug)]
pub struct BackgroundTone {
    amount: f32,
    tone: [f32; 4],
}

impl Default for BackgroundTone {
    fn default() -> Self {
        Self {
            amount: 0.0,
            tone: [0.05, 0.05, 0.08, 1.0],
        }
    }
}

fn in_any_region(regions: &[Region], x: u32, y: u32) -> bool {
    regions.iter().any(|r| r.contains(x, y))
}

impl Filter for BackgroundTone {
    fn kind(&self) -> FilterKind {
        FilterKind::BackgroundTone
    }

    fn set_parameter(&mut self, name: &str, value: ParamValue) -> bool {
        match (name, value) {
            (AMOUNT, ParamValue::Float(v)) => {
                self.amount = v.clamp(0.0, 1.0);
                true
            }
            (TONE, ParamValue::Color(c)) => {
                self.tone = c.map(|ch| ch.clamp(0.0, 1.0));
                true
            }
            _ => false,
        }
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        match name {
            AMOUNT => Some(ParamValue::Float(self.amount)),
            TONE => Some(ParamValue::Color(self.tone)),
            _ => None,
        }
    }

    fn params(&self) -> Params {
        let mut params = Params::new();
        params.insert(AMOUNT.into(), ParamValue::Float(self.amount));
        params.insert(TONE.into(), ParamValue::Color(self.tone));
        params
    }

    fn apply(
        &mut self,
        input: &RgbaImage,
        analysis: &AnalysisInputs,
    ) -> Result<RgbaImage, FilterError> {
        if self.amount <= 0.0 {
            return Ok(input.clone());
        }

        let regions = analysis
            .face_regions
            .as_deref()
            .ok_or(FilterError::MissingAnalysis {
                input: "face_regions",
            })?;

        let (amount, tone) = (self.amount, self.tone);
        Ok(RgbaImage::from_fn(input.width(), input.height(), |x, y| {
            let px = *input.get_pixel(x, y);
            if in_any_region(regions, x, y) {
                return px;
            }
            Rgba([
                channel(lerp(unit(px.0[0]), tone[0], amount)),
                channel(lerp(unit(px.0[1]), tone[1], amount)),
                channel(lerp(unit(px.0[2]), tone[2], amount)),
                px.0[3],
            ])
        }))
    }
}
