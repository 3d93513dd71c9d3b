//! The serialized edit worker.
//!
//! All edits funnel through one background thread that owns the
//! orchestrator, so chain and history never need locks. Commands queue
//! up while a render is in flight; before executing, the worker drains
//! the queue and drops any command a later one supersedes — repeated
//! sets of the same parameter keep only the newest value, stacked live
//! frames keep only the newest frame. Undo, redo, bakes, and sets of
//! *different* parameters are never dropped.

use std::sync::{Mutex, mpsc};
use std::thread;

use image::RgbaImage;
use retouch_core::{BakedEdit, FilterKind, ParamValue};
use tracing::{debug, error};

use crate::orchestrator::{EditError, EditOrchestrator, PreviewState};

/// One unit of work for the edit thread.
pub enum EditCommand {
    /// Set a managed filter parameter.
    SetParameter {
        /// Target filter.
        kind: FilterKind,
        /// Parameter name.
        name: String,
        /// New value.
        value: ParamValue,
    },
    /// Apply a baked edit to the committed image.
    Bake(Box<dyn BakedEdit + Send>),
    /// Step the timeline back.
    Undo,
    /// Step the timeline forward.
    Redo,
    /// Discard the session and start over on a new image.
    Reset(RgbaImage),
    /// Enter or leave recording mode.
    SetRecording(bool),
    /// Run one live frame through the chain.
    Frame(RgbaImage),
    /// Stop the worker thread.
    Shutdown,
}

impl std::fmt::Debug for EditCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SetParameter { kind, name, .. } => f
                .debug_struct("SetParameter")
                .field("kind", kind)
                .field("name", name)
                .finish_non_exhaustive(),
            Self::Bake(edit) => f.debug_tuple("Bake").field(&edit.label()).finish(),
            Self::Undo => f.write_str("Undo"),
            Self::Redo => f.write_str("Redo"),
            Self::Reset(_) => f.write_str("Reset"),
            Self::SetRecording(on) => f.debug_tuple("SetRecording").field(on).finish(),
            Self::Frame(_) => f.write_str("Frame"),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Result of one executed command, tagged with a monotonically
/// increasing sequence number so consumers can discard stale previews.
#[derive(Debug)]
pub struct PreviewUpdate {
    /// Execution order of this update; later numbers supersede earlier.
    pub sequence: u64,
    /// The transaction's outcome.
    pub result: Result<PreviewState, EditError>,
}

/// The worker has stopped and can no longer accept commands.
#[derive(Debug, thiserror::Error)]
#[error("edit worker is no longer running")]
pub struct WorkerStopped;

/// Handle to the background edit thread. Dropping it shuts the thread
/// down and joins it.
#[derive(Debug)]
pub struct EditWorker {
    commands: mpsc::Sender<EditCommand>,
    previews: Mutex<mpsc::Receiver<PreviewUpdate>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl EditWorker {
    /// Move `orchestrator` onto a new thread and start serving
    /// commands.
    #[must_use]
    pub fn spawn(orchestrator: EditOrchestrator) -> Self {
        let (command_tx, command_rx) = mpsc::channel();
        let (preview_tx, preview_rx) = mpsc::channel();
        let handle = thread::spawn(move || run(orchestrator, &command_rx, &preview_tx));
        Self {
            commands: command_tx,
            previews: Mutex::new(preview_rx),
            handle: Some(handle),
        }
    }

    /// Queue a command for the edit thread.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerStopped`] once the thread has exited.
    pub fn send(&self, command: EditCommand) -> Result<(), WorkerStopped> {
        self.commands.send(command).map_err(|_| WorkerStopped)
    }

    /// Take the newest pending preview, discarding older ones. Returns
    /// `None` when no update is waiting.
    pub fn try_latest_preview(&self) -> Option<PreviewUpdate> {
        let previews = match self.previews.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut latest = previews.try_recv().ok()?;
        while let Ok(newer) = previews.try_recv() {
            latest = newer;
        }
        Some(latest)
    }

    /// Block until the next preview arrives, in execution order.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerStopped`] once the thread has exited with no
    /// updates left.
    pub fn recv_preview(&self) -> Result<PreviewUpdate, WorkerStopped> {
        let previews = match self.previews.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        previews.recv().map_err(|_| WorkerStopped)
    }

    /// Block until the next preview arrives or `timeout` passes with
    /// the worker idle. Returns `None` on timeout or shutdown.
    pub fn recv_preview_timeout(&self, timeout: std::time::Duration) -> Option<PreviewUpdate> {
        let previews = match self.previews.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        previews.recv_timeout(timeout).ok()
    }
}

impl Drop for EditWorker {
    fn drop(&mut self) {
        let _ = self.commands.send(EditCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("edit worker thread panicked");
            }
        }
    }
}

fn run(
    mut orchestrator: EditOrchestrator,
    commands: &mpsc::Receiver<EditCommand>,
    previews: &mpsc::Sender<PreviewUpdate>,
) {
    let mut sequence = 0_u64;
    while let Ok(first) = commands.recv() {
        // Drain everything queued while the previous render ran, then
        // skip commands a later queued one supersedes.
        let mut batch = vec![first];
        while let Ok(next) = commands.try_recv() {
            batch.push(next);
        }
        let keep: Vec<bool> = (0..batch.len())
            .map(|i| !superseded(&batch, i))
            .collect();

        for (command, keep) in batch.into_iter().zip(keep) {
            if !keep {
                debug!(?command, "dropping superseded command");
                continue;
            }
            if matches!(command, EditCommand::Shutdown) {
                debug!("edit worker shutting down");
                return;
            }
            sequence += 1;
            let result = execute(&mut orchestrator, command);
            if previews.send(PreviewUpdate { sequence, result }).is_err() {
                return;
            }
        }
    }
}

/// Whether a later command in `batch` makes `batch[index]` pointless.
fn superseded(batch: &[EditCommand], index: usize) -> bool {
    let later = &batch[index + 1..];
    match &batch[index] {
        EditCommand::SetParameter { kind, name, .. } => later.iter().any(|c| {
            matches!(
                c,
                EditCommand::SetParameter {
                    kind: later_kind,
                    name: later_name,
                    ..
                } if later_kind == kind && later_name == name,
            )
        }),
        EditCommand::Frame(_) => later
            .iter()
            .any(|c| matches!(c, EditCommand::Frame(_))),
        _ => false,
    }
}

fn execute(
    orchestrator: &mut EditOrchestrator,
    command: EditCommand,
) -> Result<PreviewState, EditError> {
    match command {
        EditCommand::SetParameter { kind, name, value } => {
            orchestrator.set_parameter(kind, &name, value)
        }
        EditCommand::Bake(edit) => orchestrator.apply_unmanaged_edit(edit.as_ref()),
        EditCommand::Undo => orchestrator.undo(),
        EditCommand::Redo => orchestrator.redo(),
        EditCommand::Reset(image) => Ok(orchestrator.reset(image)),
        EditCommand::SetRecording(on) => Ok(orchestrator.set_recording(on)),
        EditCommand::Frame(frame) => orchestrator.process_frame(&frame),
        // Handled by the loop before execution.
        EditCommand::Shutdown => Ok(orchestrator.preview_state()),
    }
}
