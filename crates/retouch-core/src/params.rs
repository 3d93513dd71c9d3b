//! Parameter values and snapshots for managed filters.
//!
//! Every managed filter exposes its state as named parameters. History
//! entries store two full parameter snapshots (before/after), so the
//! value type is a small closed enum and snapshots are ordered maps —
//! [`BTreeMap`] iteration order is deterministic, which keeps snapshot
//! comparison and replay behavior stable across runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single filter parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Scalar parameter (sliders: brightness, radius, strength, ...).
    Float(f32),
    /// Toggle parameter.
    Bool(bool),
    /// RGBA color, each channel in `0.0..=1.0`.
    Color([f32; 4]),
    /// Curve control points as `(input, output)` pairs in `0.0..=1.0`.
    Curve(Vec<(f32, f32)>),
}

impl ParamValue {
    /// Returns the scalar value if this is a [`ParamValue::Float`].
    #[must_use]
    pub const fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the toggle value if this is a [`ParamValue::Bool`].
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the color if this is a [`ParamValue::Color`].
    #[must_use]
    pub const fn as_color(&self) -> Option<[f32; 4]> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Returns the control points if this is a [`ParamValue::Curve`].
    #[must_use]
    pub fn as_curve(&self) -> Option<&[(f32, f32)]> {
        match self {
            Self::Curve(points) => Some(points),
            _ => None,
        }
    }
}

/// A full parameter snapshot: parameter name to value.
///
/// Captured by the orchestrator before the first edit of a coalescing
/// run (`beforeParams`) and at every commit (`afterParams`).
pub type Params = BTreeMap<String, ParamValue>;
