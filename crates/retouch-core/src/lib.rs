//! retouch-core: non-destructive edit history and filter-replay model
//! (sans-IO).
//!
//! Models a photo editor's edit timeline as composable pieces:
//!
//! - [`Filter`] / [`FilterFactory`] / [`BakedEdit`] — the capability
//!   contracts for pixel kernels and pixel-baked edits,
//! - [`FilterChain`] — at most one live filter instance per
//!   [`FilterKind`], replayed over a baseline image in the fixed
//!   [`REPLAY_ORDER`],
//! - [`FilterState`] — one history step's before/after parameter
//!   snapshots,
//! - [`HistoryManager`] — the timeline: entries, cursor, rendered
//!   images, and the baseline stack that lets managed replays skip
//!   past expensive pixel-baked operations.
//!
//! This crate has **no I/O dependencies** — it operates on in-memory
//! pixel buffers and returns structured data. Threading, publishing,
//! and file handling live in `retouch-engine` and the `retouch` CLI.

pub mod analysis;
pub mod chain;
pub mod filter;
pub mod history;
pub mod kind;
pub mod params;
pub mod state;

pub use analysis::{AnalysisInputs, DEFAULT_AVERAGE_LUMINANCE, Region};
pub use chain::{ChainError, FilterChain, REPLAY_ORDER};
pub use filter::{BakedEdit, Filter, FilterError, FilterFactory};
pub use history::{HistoryManager, NoHistory};
pub use kind::FilterKind;
pub use params::{ParamValue, Params};
pub use state::FilterState;

/// Re-export `RgbaImage` so downstream crates can reference pixel
/// buffers without depending on `image` directly.
pub use image::RgbaImage;

/// Re-export `GrayImage` for masks and depth maps.
pub use image::GrayImage;
