//! The built-in filter factory: one constructor per managed kind.

use retouch_core::{Filter, FilterFactory, FilterKind};
use tracing::debug;

use crate::background_tone::BackgroundTone;
use crate::color_controls::ColorControls;
use crate::denoise::Denoise;
use crate::gamma_lab::GammaLab;
use crate::glitter::Glitter;
use crate::sketch::Sketch;
use crate::tone_curve::ToneCurve;
use crate::vignette::Vignette;

/// Builds the built-in kernel for every managed [`FilterKind`].
///
/// Construction happens lazily, once per kind per session — the chain
/// keeps the instance alive so its caches persist.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFilters;

impl FilterFactory for BuiltinFilters {
    fn build(&self, kind: FilterKind) -> Option<Box<dyn Filter>> {
        let filter: Box<dyn Filter> = match kind {
            FilterKind::ColorControls => Box::new(ColorControls::default()),
            FilterKind::ToneCurve => Box::new(ToneCurve::default()),
            FilterKind::Denoise => Box::new(Denoise::default()),
            FilterKind::Sketch => Box::new(Sketch::default()),
            FilterKind::Vignette => Box::new(Vignette::default()),
            FilterKind::Glitter => Box::new(Glitter::default()),
            FilterKind::GammaLab => Box::new(GammaLab::default()),
            FilterKind::BackgroundTone => Box::new(BackgroundTone::default()),
            FilterKind::Unmanaged => return None,
        };
        debug!(%kind, "built managed filter slot");
        Some(filter)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use retouch_core::REPLAY_ORDER;

    #[test]
    fn every_managed_kind_has_a_builtin() {
        for kind in REPLAY_ORDER {
            let filter = BuiltinFilters.build(kind).unwrap();
            assert_eq!(filter.kind(), kind);
        }
    }

    #[test]
    fn the_sentinel_has_no_builtin() {
        assert!(BuiltinFilters.build(FilterKind::Unmanaged).is_none());
    }
}
