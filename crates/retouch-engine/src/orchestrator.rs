//! The edit orchestrator: the one place where chain, history, and
//! analysis meet.
//!
//! Every public method is a complete edit transaction — mutate,
//! re-render, commit, publish — and either fully lands or leaves all
//! state (chain parameters included) exactly as it was. The worker
//! serializes calls; the orchestrator itself assumes single-threaded
//! use.

use image::RgbaImage;
use retouch_core::{
    BakedEdit, ChainError, FilterChain, FilterFactory, FilterKind, FilterState, HistoryManager,
    NoHistory, ParamValue, Params,
};
use tracing::{debug, warn};

use crate::analysis_hub::AnalysisHub;

/// Why an edit transaction failed. Every variant leaves the previous
/// image on screen and the history untouched.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// The chain could not build or replay a filter.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Undo/redo past the end of the timeline.
    #[error(transparent)]
    History(#[from] NoHistory),

    /// The target filter does not recognize the parameter name.
    #[error("filter `{kind}` has no parameter named `{name}`")]
    UnknownParameter {
        /// The filter that rejected the name.
        kind: FilterKind,
        /// The rejected parameter name.
        name: String,
    },

    /// A baked edit could not be applied to the current image.
    #[error("baked edit `{label}` could not be applied")]
    BakeFailed {
        /// The baker's label.
        label: &'static str,
    },
}

/// What the UI needs after each transaction: the image to show and
/// which history controls to enable.
#[derive(Debug, Clone)]
pub struct PreviewState {
    /// The image to display.
    pub image: RgbaImage,
    /// Whether an undo step exists.
    pub undo_able: bool,
    /// Whether a redo step exists.
    pub redo_able: bool,
    /// Whether any history exists (enables "reset to original").
    pub reset_available: bool,
}

/// Drives one editing session over one loaded image.
#[derive(Debug)]
pub struct EditOrchestrator {
    chain: FilterChain,
    history: HistoryManager,
    analysis: AnalysisHub,
    /// The most recently published pixels. Tracks
    /// `history.current_rendered()` except while recording, when live
    /// frames pass through without touching history.
    current: RgbaImage,
    recording: bool,
}

impl EditOrchestrator {
    /// Start a session on `image` with filters built by `factory`.
    #[must_use]
    pub fn new(image: RgbaImage, factory: Box<dyn FilterFactory>, analysis: AnalysisHub) -> Self {
        Self {
            chain: FilterChain::new(factory),
            history: HistoryManager::new(image.clone()),
            analysis,
            current: image,
            recording: false,
        }
    }

    /// Set one parameter on a managed filter, re-render, and commit.
    ///
    /// The `before` snapshot is captured prior to the mutation; the
    /// history decides whether this starts a new entry or coalesces
    /// into the previous one. While recording, the chain is mutated and
    /// replayed but nothing is committed.
    ///
    /// # Errors
    ///
    /// [`EditError::UnknownParameter`] when the filter rejects `name`,
    /// [`EditError::Chain`] when the slot cannot be built or the replay
    /// fails. On replay failure the parameter change is rolled back, so
    /// the failed edit has no effect at all.
    pub fn set_parameter(
        &mut self,
        kind: FilterKind,
        name: &str,
        value: ParamValue,
    ) -> Result<PreviewState, EditError> {
        let before = self.chain.params(kind)?;
        if !self.chain.set_parameter(kind, name, value)? {
            return Err(EditError::UnknownParameter {
                kind,
                name: name.to_owned(),
            });
        }

        let baseline = self.history.baseline().clone();
        let analysis = self.analysis.snapshot();
        let image = match self.chain.replay_all(&baseline, &analysis) {
            Ok(image) => image,
            Err(err) => {
                warn!(%kind, name, error = %err, "replay failed, rolling back parameter");
                let _ = self.chain.restore(kind, &before)?;
                return Err(err.into());
            }
        };

        if self.recording {
            debug!(%kind, name, "parameter applied without commit (recording)");
        } else {
            let after = self.chain.params(kind)?;
            self.history
                .commit(FilterState::managed(kind, before, after), image.clone());
            debug!(
                %kind,
                name,
                cursor = self.history.cursor(),
                entries = self.history.len(),
                "edit committed",
            );
        }

        self.current = image;
        Ok(self.preview_state())
    }

    /// Apply a baked (unmanaged) edit to the currently committed image
    /// and commit it as a new baseline.
    ///
    /// # Errors
    ///
    /// [`EditError::BakeFailed`] when the baker refuses the current
    /// image; nothing is committed.
    pub fn apply_unmanaged_edit(&mut self, edit: &dyn BakedEdit) -> Result<PreviewState, EditError> {
        let produced = edit
            .produce_image(self.history.current_rendered())
            .ok_or(EditError::BakeFailed {
                label: edit.label(),
            })?;

        self.history
            .commit(FilterState::unmanaged(), produced.clone());
        debug!(
            label = edit.label(),
            baseline_depth = self.history.baseline_depth(),
            "baked edit committed",
        );
        self.current = produced;
        Ok(self.preview_state())
    }

    /// Undo one step: restore the undone entry's `before` snapshot into
    /// the chain (managed entries only) and re-render from the
    /// surviving baseline.
    ///
    /// # Errors
    ///
    /// [`EditError::History`] when nothing can be undone,
    /// [`EditError::Chain`] when the re-render fails.
    pub fn undo(&mut self) -> Result<PreviewState, EditError> {
        let entry = self.history.undo()?;
        if !entry.is_unmanaged() {
            self.restore_snapshot(entry.kind, &entry.before)?;
        }
        self.rerender()?;
        debug!(cursor = self.history.cursor(), "undo applied");
        Ok(self.preview_state())
    }

    /// Redo one step: restore the redone entry's `after` snapshot into
    /// the chain (managed entries only) and re-render.
    ///
    /// # Errors
    ///
    /// [`EditError::History`] when nothing can be redone,
    /// [`EditError::Chain`] when the re-render fails.
    pub fn redo(&mut self) -> Result<PreviewState, EditError> {
        let entry = self.history.redo()?;
        if !entry.is_unmanaged() {
            self.restore_snapshot(entry.kind, &entry.after)?;
        }
        self.rerender()?;
        debug!(cursor = self.history.cursor(), "redo applied");
        Ok(self.preview_state())
    }

    /// Restore a parameter snapshot without committing. Unknown keys
    /// (snapshots written by a different parameter schema) are dropped
    /// with a warning; every recognized key still lands.
    fn restore_snapshot(&mut self, kind: FilterKind, params: &Params) -> Result<(), EditError> {
        let ignored = self.chain.restore(kind, params)?;
        if !ignored.is_empty() {
            warn!(%kind, ?ignored, "snapshot restore skipped unknown parameters");
        }
        Ok(())
    }

    /// Replay the chain over the current baseline and publish the
    /// result.
    fn rerender(&mut self) -> Result<(), EditError> {
        let baseline = self.history.baseline().clone();
        let analysis = self.analysis.snapshot();
        self.current = self.chain.replay_all(&baseline, &analysis)?;
        Ok(())
    }

    /// Run one live frame through the chain without touching history.
    /// The replay uses `frame` itself as the baseline.
    ///
    /// # Errors
    ///
    /// [`EditError::Chain`] when the replay fails; the previous image
    /// stays published.
    pub fn process_frame(&mut self, frame: &RgbaImage) -> Result<PreviewState, EditError> {
        let analysis = self.analysis.snapshot();
        self.current = self.chain.replay_all(frame, &analysis)?;
        Ok(self.preview_state())
    }

    /// Toggle recording mode. Entering leaves the timeline untouched;
    /// leaving republishes the committed image, and the next edit
    /// resumes committing from the same cursor.
    pub fn set_recording(&mut self, recording: bool) -> PreviewState {
        if self.recording && !recording {
            self.current = self.history.current_rendered().clone();
        }
        self.recording = recording;
        debug!(recording, "recording mode changed");
        self.preview_state()
    }

    /// Discard the whole session and start over on `image`: history
    /// reseeded, all filter slots dropped.
    pub fn reset(&mut self, image: RgbaImage) -> PreviewState {
        self.history.reset(image.clone());
        self.chain.clear();
        self.current = image;
        self.recording = false;
        debug!("session reset");
        self.preview_state()
    }

    /// Snapshot of what the UI should show right now.
    #[must_use]
    pub fn preview_state(&self) -> PreviewState {
        PreviewState {
            image: self.current.clone(),
            undo_able: self.history.undo_able(),
            redo_able: self.history.redo_able(),
            reset_available: self.history.reset_available(),
        }
    }

    /// Whether live frames currently bypass history.
    #[must_use]
    pub const fn recording(&self) -> bool {
        self.recording
    }

    /// Read access to the timeline, for UI listings and tests.
    #[must_use]
    pub const fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Current parameters of one managed filter.
    ///
    /// # Errors
    ///
    /// [`EditError::Chain`] when `kind` has no managed implementation.
    pub fn params(&mut self, kind: FilterKind) -> Result<Params, EditError> {
        Ok(self.chain.params(kind)?)
    }
}
