//! The edit timeline: entries, cursor, rendered images, and the
//! baseline stack.
//!
//! The manager is a plain state machine over cursor positions. It
//! never performs image work itself — commits hand it already-rendered
//! images, and undo/redo hand back the parameter snapshots the caller
//! needs to re-render. This keeps every transition cheap and keeps the
//! structural invariants easy to state:
//!
//! - `rendered.len() == entries.len() + 1` (index 0 is the pristine
//!   load; `rendered[cursor]` is the image currently shown),
//! - `cursor <= entries.len()`,
//! - the baseline stack bottom is always the pristine load, and one
//!   extra baseline exists per unmanaged entry at or before the
//!   cursor.
//!
//! These hold after every operation, including failed ones.

use image::RgbaImage;

use crate::kind::FilterKind;
use crate::state::FilterState;

/// Undo/redo invoked with no history in that direction.
///
/// Callers are expected to gate on [`HistoryManager::undo_able`] /
/// [`HistoryManager::redo_able`]; misuse is still a safe no-op.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("no history entry in that direction")]
pub struct NoHistory;

/// A baseline pushed past the pristine load by an unmanaged edit.
#[derive(Debug, Clone)]
struct Baseline {
    /// The baked image managed replays run against from here on.
    image: RgbaImage,
    /// Index of the unmanaged entry that produced it, used to pop
    /// exactly the discarded baselines on branch-discard.
    entry_index: usize,
}

/// Owns the history timeline for one loaded image.
#[derive(Debug)]
pub struct HistoryManager {
    entries: Vec<FilterState>,
    /// `rendered[0]` is the pristine load; `rendered[i + 1]` is the
    /// image after `entries[i]`.
    rendered: Vec<RgbaImage>,
    cursor: usize,
    /// Baselines beyond the pristine load, oldest first.
    baselines: Vec<Baseline>,
}

impl HistoryManager {
    /// Create a fresh timeline seeded with the loaded image.
    #[must_use]
    pub fn new(image: RgbaImage) -> Self {
        Self {
            entries: Vec::new(),
            rendered: vec![image],
            cursor: 0,
            baselines: Vec::new(),
        }
    }

    /// Clear everything and reseed with a newly loaded image.
    pub fn reset(&mut self, image: RgbaImage) {
        self.entries.clear();
        self.rendered.clear();
        self.rendered.push(image);
        self.cursor = 0;
        self.baselines.clear();
    }

    /// Record one edit step and its rendered result.
    ///
    /// Unmanaged steps always append and push `image` as the new
    /// baseline. A managed step whose kind coalesces with the entry
    /// just before the cursor overwrites that entry in place (its
    /// `before` snapshot is kept, `after` and the rendered image are
    /// replaced) — this is what keeps a slider drag at one undo step.
    /// Otherwise the step appends; if the cursor is mid-history, the
    /// redo tail and the baselines it owns are discarded first
    /// (linear-undo branch-discard).
    pub fn commit(&mut self, state: FilterState, image: RgbaImage) {
        if state.is_unmanaged() {
            self.discard_redo_tail();
            self.baselines.push(Baseline {
                image: image.clone(),
                entry_index: self.entries.len(),
            });
            self.entries.push(state);
            self.rendered.push(image);
            self.cursor += 1;
            return;
        }

        let coalesces = self.cursor > 0
            && self.entries[self.cursor - 1]
                .kind
                .coalesces_with(state.kind);
        if coalesces {
            // Keep the run's original `before`; only the latest
            // `after` and pixels survive.
            self.entries[self.cursor - 1].after = state.after;
            self.rendered[self.cursor] = image;
            return;
        }

        self.discard_redo_tail();
        self.entries.push(state);
        self.rendered.push(image);
        self.cursor += 1;
    }

    /// Drop all entries strictly after the cursor, their rendered
    /// images, and any baselines produced by the dropped entries.
    fn discard_redo_tail(&mut self) {
        if self.cursor == self.entries.len() {
            return;
        }
        self.entries.truncate(self.cursor);
        self.rendered.truncate(self.cursor + 1);
        self.baselines.retain(|b| b.entry_index < self.cursor);
    }

    /// Step the cursor back and return the entry being undone, so the
    /// caller can restore its `before` snapshot into the chain.
    ///
    /// Undoing an unmanaged entry pops its baseline: subsequent
    /// replays run against the previous baseline again.
    ///
    /// # Errors
    ///
    /// Returns [`NoHistory`] when there is nothing to undo.
    pub fn undo(&mut self) -> Result<FilterState, NoHistory> {
        if !self.undo_able() {
            return Err(NoHistory);
        }
        self.cursor -= 1;
        let entry = self.entries[self.cursor].clone();
        if entry.is_unmanaged() {
            self.baselines.pop();
        }
        Ok(entry)
    }

    /// Step the cursor forward and return the entry being redone, so
    /// the caller can restore its `after` snapshot into the chain.
    ///
    /// Redoing an unmanaged entry pushes its baked image back onto the
    /// baseline stack.
    ///
    /// # Errors
    ///
    /// Returns [`NoHistory`] when there is nothing to redo.
    pub fn redo(&mut self) -> Result<FilterState, NoHistory> {
        if !self.redo_able() {
            return Err(NoHistory);
        }
        let entry = self.entries[self.cursor].clone();
        self.cursor += 1;
        if entry.is_unmanaged() {
            self.baselines.push(Baseline {
                image: self.rendered[self.cursor].clone(),
                entry_index: self.cursor - 1,
            });
        }
        Ok(entry)
    }

    /// Whether an undo step exists.
    #[must_use]
    pub const fn undo_able(&self) -> bool {
        self.cursor > 0
    }

    /// Whether a redo step exists.
    #[must_use]
    pub fn redo_able(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Whether any history exists at all (enables "reset to original").
    #[must_use]
    pub fn reset_available(&self) -> bool {
        !self.entries.is_empty()
    }

    /// The image currently shown: `rendered[cursor]`.
    #[must_use]
    pub fn current_rendered(&self) -> &RgbaImage {
        &self.rendered[self.cursor]
    }

    /// The source image managed replays currently run against: the
    /// newest surviving baked image, or the pristine load.
    #[must_use]
    pub fn baseline(&self) -> &RgbaImage {
        self.baselines
            .last()
            .map_or(&self.rendered[0], |b| &b.image)
    }

    /// Kind of the entry just before the cursor, if any. The
    /// orchestrator uses this to decide whether the next edit starts a
    /// new coalescing run.
    #[must_use]
    pub fn last_committed_kind(&self) -> Option<FilterKind> {
        (self.cursor > 0).then(|| self.entries[self.cursor - 1].kind)
    }

    /// Number of history entries (committed steps, undone or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the timeline has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current cursor position, `0..=len()`.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Depth of the baseline stack including the pristine load.
    #[must_use]
    pub fn baseline_depth(&self) -> usize {
        self.baselines.len() + 1
    }

    /// The entry at `index`, for inspection (UI timeline, logging).
    #[must_use]
    pub fn entry(&self, index: usize) -> Option<&FilterState> {
        self.entries.get(index)
    }
}
