//! One history step: which filter was touched and its parameter
//! snapshots around the step.

use serde::{Deserialize, Serialize};

use crate::kind::FilterKind;
use crate::params::Params;

/// Immutable-after-write description of one history step.
///
/// For a managed edit, `before` is the parameter snapshot captured the
/// first time this kind was touched since the last commit of a
/// different kind, and `after` is the snapshot at commit time. Within
/// a coalescing run `before` is written once and `after` is
/// overwritten on every edit.
///
/// Unmanaged steps carry empty snapshots — their effect lives entirely
/// in the baked image, recorded separately as a baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    /// The filter kind this step touched.
    pub kind: FilterKind,
    /// Parameters before the first edit of the run.
    pub before: Params,
    /// Parameters as of the latest edit of the run.
    pub after: Params,
}

impl FilterState {
    /// A managed, replayable step.
    #[must_use]
    pub const fn managed(kind: FilterKind, before: Params, after: Params) -> Self {
        Self {
            kind,
            before,
            after,
        }
    }

    /// A pixel-baked step. Carries no parameters.
    #[must_use]
    pub fn unmanaged() -> Self {
        Self {
            kind: FilterKind::Unmanaged,
            before: Params::new(),
            after: Params::new(),
        }
    }

    /// Whether this step is pixel-baked rather than replayable.
    #[must_use]
    pub const fn is_unmanaged(&self) -> bool {
        matches!(self.kind, FilterKind::Unmanaged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn unmanaged_state_has_empty_snapshots() {
        let state = FilterState::unmanaged();
        assert!(state.is_unmanaged());
        assert!(state.before.is_empty());
        assert!(state.after.is_empty());
    }

    #[test]
    fn managed_state_keeps_both_snapshots() {
        let mut before = Params::new();
        before.insert("brightness".into(), ParamValue::Float(0.0));
        let mut after = Params::new();
        after.insert("brightness".into(), ParamValue::Float(0.4));

        let state = FilterState::managed(FilterKind::ColorControls, before.clone(), after.clone());
        assert!(!state.is_unmanaged());
        assert_eq!(state.before, before);
        assert_eq!(state.after, after);
    }
}
