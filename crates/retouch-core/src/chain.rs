//! The managed filter chain: at most one live instance per kind,
//! replayed in a fixed declared order.
//!
//! Slots are created lazily on first touch and then mutated in place
//! for the rest of the session, so a filter's internal caches persist
//! across edits of *other* kinds. Replay iterates [`REPLAY_ORDER`] —
//! never the slot map's insertion history — so composing the same
//! parameters over the same baseline always produces the same pixels.

use std::collections::BTreeMap;

use image::RgbaImage;

use crate::analysis::AnalysisInputs;
use crate::filter::{Filter, FilterError, FilterFactory};
use crate::kind::FilterKind;
use crate::params::{ParamValue, Params};

/// The deterministic replay order for managed filters.
///
/// Declared once; independent of the order in which slots were first
/// touched. Color work runs before stylization, and analysis-dependent
/// filters run last so they see the fully adjusted image.
pub const REPLAY_ORDER: [FilterKind; 8] = [
    FilterKind::ColorControls,
    FilterKind::ToneCurve,
    FilterKind::Denoise,
    FilterKind::Sketch,
    FilterKind::Vignette,
    FilterKind::Glitter,
    FilterKind::GammaLab,
    FilterKind::BackgroundTone,
];

/// Why a chain operation failed.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The kind has no managed implementation (the `Unmanaged`
    /// sentinel, or a factory that does not know it).
    #[error("no managed filter available for kind `{0}`")]
    NoSuchFilter(FilterKind),

    /// A filter refused to produce output during replay. The pending
    /// commit must be aborted and the previous image kept on screen.
    #[error("filter `{kind}` failed during replay")]
    ReplayFailed {
        /// The filter that failed.
        kind: FilterKind,
        /// The filter's own account of the failure.
        #[source]
        source: FilterError,
    },
}

/// Ordered, keyed collection of managed filter instances.
pub struct FilterChain {
    slots: BTreeMap<FilterKind, Box<dyn Filter>>,
    factory: Box<dyn FilterFactory>,
}

impl FilterChain {
    /// Create an empty chain; slots are built by `factory` on demand.
    #[must_use]
    pub fn new(factory: Box<dyn FilterFactory>) -> Self {
        Self {
            slots: BTreeMap::new(),
            factory,
        }
    }

    fn ensure_slot(&mut self, kind: FilterKind) -> Result<&mut Box<dyn Filter>, ChainError> {
        if !self.slots.contains_key(&kind) {
            let filter = self
                .factory
                .build(kind)
                .ok_or(ChainError::NoSuchFilter(kind))?;
            self.slots.insert(kind, filter);
        }
        // Just inserted or already present.
        self.slots
            .get_mut(&kind)
            .ok_or(ChainError::NoSuchFilter(kind))
    }

    /// Apply `mutation` to the slot for `kind`, building it first if
    /// this kind has never been touched. No image work happens here.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::NoSuchFilter`] when `kind` has no managed
    /// implementation.
    pub fn mutate<F>(&mut self, kind: FilterKind, mutation: F) -> Result<(), ChainError>
    where
        F: FnOnce(&mut dyn Filter),
    {
        let slot = self.ensure_slot(kind)?;
        mutation(slot.as_mut());
        Ok(())
    }

    /// Set a single named parameter on the slot for `kind`.
    ///
    /// Returns `false` when the filter does not recognize `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::NoSuchFilter`] when `kind` has no managed
    /// implementation.
    pub fn set_parameter(
        &mut self,
        kind: FilterKind,
        name: &str,
        value: ParamValue,
    ) -> Result<bool, ChainError> {
        let slot = self.ensure_slot(kind)?;
        Ok(slot.set_parameter(name, value))
    }

    /// Current parameter snapshot for `kind`, building the slot (at
    /// factory defaults) if it has never been touched.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::NoSuchFilter`] when `kind` has no managed
    /// implementation.
    pub fn params(&mut self, kind: FilterKind) -> Result<Params, ChainError> {
        let slot = self.ensure_slot(kind)?;
        Ok(slot.params())
    }

    /// Restore a parameter snapshot into the slot for `kind` without
    /// committing anything. Returns the names of unrecognized keys
    /// (restored snapshots from a different schema lose only those).
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::NoSuchFilter`] when `kind` has no managed
    /// implementation.
    pub fn restore(&mut self, kind: FilterKind, params: &Params) -> Result<Vec<String>, ChainError> {
        let slot = self.ensure_slot(kind)?;
        Ok(slot.restore(params))
    }

    /// Replay every active filter over `baseline` in [`REPLAY_ORDER`],
    /// feeding each filter's output to the next, and return the final
    /// image.
    ///
    /// Kinds that were never touched are skipped. Deterministic given
    /// the same baseline, parameters, and analysis snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::ReplayFailed`] naming the first filter
    /// that refused to produce output; the partial result is dropped.
    pub fn replay_all(
        &mut self,
        baseline: &RgbaImage,
        analysis: &AnalysisInputs,
    ) -> Result<RgbaImage, ChainError> {
        let mut current = baseline.clone();
        for kind in REPLAY_ORDER {
            if let Some(slot) = self.slots.get_mut(&kind) {
                current = slot
                    .apply(&current, analysis)
                    .map_err(|source| ChainError::ReplayFailed { kind, source })?;
            }
        }
        Ok(current)
    }

    /// Kinds that currently own a slot, in replay order.
    pub fn active_kinds(&self) -> impl Iterator<Item = FilterKind> + '_ {
        REPLAY_ORDER
            .into_iter()
            .filter(|kind| self.slots.contains_key(kind))
    }

    /// Drop every slot. Used when a brand-new image is loaded: the new
    /// session starts from factory defaults.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("active", &self.active_kinds().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Test filter that adds a constant to the red channel, recording
    /// nothing but its `amount` parameter.
    struct RedShift {
        kind: FilterKind,
        amount: f32,
        fail: bool,
    }

    impl Filter for RedShift {
        fn kind(&self) -> FilterKind {
            self.kind
        }

        fn set_parameter(&mut self, name: &str, value: ParamValue) -> bool {
            match (name, value) {
                ("amount", ParamValue::Float(v)) => {
                    self.amount = v;
                    true
                }
                ("fail", ParamValue::Bool(v)) => {
                    self.fail = v;
                    true
                }
                _ => false,
            }
        }

        fn parameter(&self, name: &str) -> Option<ParamValue> {
            match name {
                "amount" => Some(ParamValue::Float(self.amount)),
                "fail" => Some(ParamValue::Bool(self.fail)),
                _ => None,
            }
        }

        fn params(&self) -> Params {
            let mut params = Params::new();
            params.insert("amount".into(), ParamValue::Float(self.amount));
            params.insert("fail".into(), ParamValue::Bool(self.fail));
            params
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        fn apply(
            &mut self,
            input: &RgbaImage,
            _analysis: &AnalysisInputs,
        ) -> Result<RgbaImage, FilterError> {
            if self.fail {
                return Err(FilterError::MissingAnalysis {
                    input: "face_regions",
                });
            }
            let shift = (self.amount * 255.0) as i32;
            Ok(RgbaImage::from_fn(input.width(), input.height(), |x, y| {
                let mut px = *input.get_pixel(x, y);
                px.0[0] = (i32::from(px.0[0]) + shift).clamp(0, 255) as u8;
                px
            }))
        }
    }

    struct RedShiftFactory;

    impl FilterFactory for RedShiftFactory {
        fn build(&self, kind: FilterKind) -> Option<Box<dyn Filter>> {
            kind.is_managed().then(|| {
                Box::new(RedShift {
                    kind,
                    amount: 0.0,
                    fail: false,
                }) as Box<dyn Filter>
            })
        }
    }

    fn chain() -> FilterChain {
        FilterChain::new(Box::new(RedShiftFactory))
    }

    fn gray_image() -> RgbaImage {
        RgbaImage::from_pixel(4, 4, image::Rgba([100, 100, 100, 255]))
    }

    #[test]
    fn untouched_chain_replays_to_the_baseline() {
        let mut chain = chain();
        let baseline = gray_image();
        let out = chain.replay_all(&baseline, &AnalysisInputs::default()).unwrap();
        assert_eq!(out, baseline);
    }

    #[test]
    fn unmanaged_kind_has_no_slot() {
        let mut chain = chain();
        let result = chain.mutate(FilterKind::Unmanaged, |_| {});
        assert!(matches!(
            result,
            Err(ChainError::NoSuchFilter(FilterKind::Unmanaged)),
        ));
    }

    #[test]
    fn replay_is_deterministic() {
        let mut chain = chain();
        chain
            .set_parameter(FilterKind::ColorControls, "amount", ParamValue::Float(0.2))
            .unwrap();
        chain
            .set_parameter(FilterKind::Vignette, "amount", ParamValue::Float(0.1))
            .unwrap();

        let baseline = gray_image();
        let first = chain.replay_all(&baseline, &AnalysisInputs::default()).unwrap();
        let second = chain.replay_all(&baseline, &AnalysisInputs::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn replay_feeds_each_output_into_the_next_filter() {
        let mut chain = chain();
        chain
            .set_parameter(FilterKind::ColorControls, "amount", ParamValue::Float(0.2))
            .unwrap();
        chain
            .set_parameter(FilterKind::Vignette, "amount", ParamValue::Float(0.2))
            .unwrap();

        let out = chain
            .replay_all(&gray_image(), &AnalysisInputs::default())
            .unwrap();
        // Two +0.2 shifts compose: 100 + 51 + 51.
        assert_eq!(out.get_pixel(0, 0).0[0], 202);
    }

    #[test]
    fn replay_failure_names_the_failing_kind() {
        let mut chain = chain();
        chain
            .set_parameter(FilterKind::Sketch, "fail", ParamValue::Bool(true))
            .unwrap();

        let result = chain.replay_all(&gray_image(), &AnalysisInputs::default());
        assert!(matches!(
            result,
            Err(ChainError::ReplayFailed {
                kind: FilterKind::Sketch,
                ..
            }),
        ));
    }

    #[test]
    fn restoring_a_snapshot_and_replaying_reproduces_past_pixels() {
        let mut chain = chain();
        let baseline = gray_image();

        chain
            .set_parameter(FilterKind::ColorControls, "amount", ParamValue::Float(0.3))
            .unwrap();
        let past_params = chain.params(FilterKind::ColorControls).unwrap();
        let past_pixels = chain.replay_all(&baseline, &AnalysisInputs::default()).unwrap();

        chain
            .set_parameter(FilterKind::ColorControls, "amount", ParamValue::Float(0.9))
            .unwrap();
        let ignored = chain
            .restore(FilterKind::ColorControls, &past_params)
            .unwrap();
        assert!(ignored.is_empty());

        let replayed = chain.replay_all(&baseline, &AnalysisInputs::default()).unwrap();
        assert_eq!(replayed, past_pixels);
    }

    #[test]
    fn active_kinds_follow_replay_order_not_touch_order() {
        let mut chain = chain();
        chain.mutate(FilterKind::Vignette, |_| {}).unwrap();
        chain.mutate(FilterKind::ColorControls, |_| {}).unwrap();

        let active: Vec<FilterKind> = chain.active_kinds().collect();
        assert_eq!(active, [FilterKind::ColorControls, FilterKind::Vignette]);
    }
}
