//! The closed set of filter kinds known to the edit engine.

use serde::{Deserialize, Serialize};

/// Identifies which filter a history entry or chain slot refers to.
///
/// Managed kinds are replayable from parameters against a baseline
/// image. [`FilterKind::Unmanaged`] is the sentinel for edits baked
/// directly into pixels (crop, rotate, mask blur); it participates in
/// history but never owns a chain slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    /// Brightness / contrast / saturation.
    ColorControls,
    /// Per-channel tone curve.
    ToneCurve,
    /// Smoothing denoise.
    Denoise,
    /// Outline / sketch stylization.
    Sketch,
    /// Radial edge darkening.
    Vignette,
    /// Sparkle overlay.
    Glitter,
    /// Gamma and lightness adjustment.
    GammaLab,
    /// Background tone-down outside detected faces.
    BackgroundTone,
    /// Sentinel for pixel-baked edits; never coalesces, never replays.
    Unmanaged,
}

impl FilterKind {
    /// Whether this kind is replayable from parameters.
    #[must_use]
    pub const fn is_managed(self) -> bool {
        !matches!(self, Self::Unmanaged)
    }

    /// Coalescing equality: two consecutive history commits merge into
    /// one entry only when their kinds coalesce.
    ///
    /// Equal managed kinds coalesce. `Unmanaged` never coalesces — not
    /// even with itself — so every baked edit is its own undo step.
    #[must_use]
    pub const fn coalesces_with(self, other: Self) -> bool {
        self.is_managed() && (self as u8) == (other as u8)
    }

    /// Stable lowercase name, used for logging and CLI edit scripts.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ColorControls => "color_controls",
            Self::ToneCurve => "tone_curve",
            Self::Denoise => "denoise",
            Self::Sketch => "sketch",
            Self::Vignette => "vignette",
            Self::Glitter => "glitter",
            Self::GammaLab => "gamma_lab",
            Self::BackgroundTone => "background_tone",
            Self::Unmanaged => "unmanaged",
        }
    }

    /// Inverse of [`FilterKind::name`] for the managed kinds.
    ///
    /// `"unmanaged"` is not accepted: baked edits are applied through
    /// the baking contract, never addressed by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "color_controls" => Some(Self::ColorControls),
            "tone_curve" => Some(Self::ToneCurve),
            "denoise" => Some(Self::Denoise),
            "sketch" => Some(Self::Sketch),
            "vignette" => Some(Self::Vignette),
            "glitter" => Some(Self::Glitter),
            "gamma_lab" => Some(Self::GammaLab),
            "background_tone" => Some(Self::BackgroundTone),
            _ => None,
        }
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managed_kinds_coalesce_with_themselves() {
        assert!(FilterKind::ColorControls.coalesces_with(FilterKind::ColorControls));
        assert!(FilterKind::Vignette.coalesces_with(FilterKind::Vignette));
    }

    #[test]
    fn different_kinds_never_coalesce() {
        assert!(!FilterKind::ColorControls.coalesces_with(FilterKind::Vignette));
    }

    #[test]
    fn unmanaged_never_coalesces_even_with_itself() {
        assert!(!FilterKind::Unmanaged.coalesces_with(FilterKind::Unmanaged));
        assert!(!FilterKind::Unmanaged.coalesces_with(FilterKind::ColorControls));
    }

    #[test]
    fn name_roundtrip_for_managed_kinds() {
        for kind in [
            FilterKind::ColorControls,
            FilterKind::ToneCurve,
            FilterKind::Denoise,
            FilterKind::Sketch,
            FilterKind::Vignette,
            FilterKind::Glitter,
            FilterKind::GammaLab,
            FilterKind::BackgroundTone,
        ] {
            assert_eq!(FilterKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn unmanaged_is_not_addressable_by_name() {
        assert_eq!(FilterKind::from_name("unmanaged"), None);
    }
}
