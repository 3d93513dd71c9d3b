//! The capability contracts the engine consumes: managed filters and
//! unmanaged edit bakers.
//!
//! The engine never looks inside a pixel kernel. A managed filter is
//! anything that exposes named parameters and a deterministic
//! `apply(input) -> output` transform; an unmanaged edit is anything
//! that can bake a new image from the currently displayed one.

use image::RgbaImage;

use crate::analysis::AnalysisInputs;
use crate::kind::FilterKind;
use crate::params::{ParamValue, Params};

/// Why a filter refused to produce output.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// A required analysis side input has not been produced yet.
    #[error("required analysis input `{input}` is not available")]
    MissingAnalysis {
        /// Name of the missing side input (e.g. `face_regions`).
        input: &'static str,
    },
}

/// A managed, replayable filter.
///
/// Implementations may be stateful: expensive derived data (lookup
/// tables, falloff masks) can be cached across [`Filter::apply`] calls
/// as long as [`Filter::set_parameter`] invalidates anything the
/// changed parameter feeds into. Given equal parameters, equal input,
/// and equal analysis inputs, `apply` must be deterministic — replay
/// determinism is what makes undo/redo reproduce past pixels exactly.
pub trait Filter: Send {
    /// Which [`FilterKind`] this filter implements.
    fn kind(&self) -> FilterKind;

    /// Set one parameter, invalidating dependent caches.
    ///
    /// Returns `false` when `name` is not a parameter of this filter
    /// (the value is discarded). Unknown names are tolerated rather
    /// than fatal so snapshots from a newer schema restore their
    /// recognized subset.
    fn set_parameter(&mut self, name: &str, value: ParamValue) -> bool;

    /// Current value of one parameter, `None` for unknown names.
    fn parameter(&self, name: &str) -> Option<ParamValue>;

    /// Full snapshot of all parameters.
    fn params(&self) -> Params;

    /// Transform `input`, consulting `analysis` where relevant.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] when a precondition is unmet, e.g. a
    /// required analysis input is missing.
    fn apply(
        &mut self,
        input: &RgbaImage,
        analysis: &AnalysisInputs,
    ) -> Result<RgbaImage, FilterError>;

    /// Restore a parameter snapshot, returning the names of any keys
    /// this filter did not recognize (schema drift between versions).
    /// Recognized parameters are applied; unknown ones are skipped.
    fn restore(&mut self, params: &Params) -> Vec<String> {
        let mut ignored = Vec::new();
        for (name, value) in params {
            if !self.set_parameter(name, value.clone()) {
                ignored.push(name.clone());
            }
        }
        ignored
    }
}

/// Lazily constructs the filter instance for a kind.
///
/// The chain calls this exactly once per kind, the first time that
/// kind is touched; the instance then lives in its slot for the rest
/// of the session so its internal caches survive edits of other kinds.
pub trait FilterFactory: Send {
    /// Build a fresh filter with default parameters, or `None` when
    /// `kind` has no managed implementation (the `Unmanaged` sentinel).
    fn build(&self, kind: FilterKind) -> Option<Box<dyn Filter>>;
}

/// An unmanaged edit: produces a new image directly from the currently
/// displayed one (crop, rotate, freehand mask blur, text stamp).
///
/// The result is baked — it cannot be re-derived from parameters, so
/// committing it pushes a new baseline for all later managed replays.
pub trait BakedEdit {
    /// Short description for logging ("crop", "rotate", ...).
    fn label(&self) -> &'static str;

    /// Produce the baked image, or `None` when the edit cannot be
    /// applied to `current` (e.g. crop rectangle out of bounds).
    fn produce_image(&self, current: &RgbaImage) -> Option<RgbaImage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal filter with a single `level` parameter.
    struct LevelFilter {
        level: f32,
    }

    impl Filter for LevelFilter {
        fn kind(&self) -> FilterKind {
            FilterKind::ColorControls
        }

        fn set_parameter(&mut self, name: &str, value: ParamValue) -> bool {
            match (name, value.as_float()) {
                ("level", Some(v)) => {
                    self.level = v;
                    true
                }
                _ => false,
            }
        }

        fn parameter(&self, name: &str) -> Option<ParamValue> {
            (name == "level").then(|| ParamValue::Float(self.level))
        }

        fn params(&self) -> Params {
            let mut params = Params::new();
            params.insert("level".into(), ParamValue::Float(self.level));
            params
        }

        fn apply(
            &mut self,
            input: &RgbaImage,
            _analysis: &AnalysisInputs,
        ) -> Result<RgbaImage, FilterError> {
            Ok(input.clone())
        }
    }

    #[test]
    fn restore_applies_known_keys_and_reports_unknown_ones() {
        let mut filter = LevelFilter { level: 0.0 };
        let mut snapshot = Params::new();
        snapshot.insert("level".into(), ParamValue::Float(0.7));
        snapshot.insert("shimmer".into(), ParamValue::Float(1.0));

        let ignored = filter.restore(&snapshot);
        assert_eq!(ignored, vec!["shimmer".to_string()]);
        assert_eq!(filter.parameter("level"), Some(ParamValue::Float(0.7)));
    }
}
