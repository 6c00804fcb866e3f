//! Segmented recording state machine

use crate::config::RecordingConfig;
use crate::encoder::{Encoder, SegmentWriter};
use crate::RecordingError;
use segment_store::SegmentStore;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

/// Handle describing the currently open segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHandle {
    pub path: PathBuf,
    pub started_at: Instant,
}

enum Session {
    Idle,
    Recording {
        writer: Box<dyn SegmentWriter>,
        path: PathBuf,
        started_at: Instant,
    },
}

struct Slot {
    session: Session,
    /// Bumped on every transition; a pending rotation only acts if the
    /// generation it captured is still current.
    generation: u64,
}

/// Drives the record/stop state machine and fixed-duration rotation.
///
/// Exactly one segment is open at a time; all transitions happen behind
/// one lock, so the encoder sees a single writer. Cloning shares the
/// underlying session.
#[derive(Clone)]
pub struct RecordingController {
    encoder: Arc<dyn Encoder>,
    store: Arc<SegmentStore>,
    config: RecordingConfig,
    shared: Arc<Mutex<Slot>>,
}

impl RecordingController {
    pub fn new(
        encoder: Arc<dyn Encoder>,
        store: Arc<SegmentStore>,
        config: RecordingConfig,
    ) -> Self {
        Self {
            encoder,
            store,
            config,
            shared: Arc::new(Mutex::new(Slot {
                session: Session::Idle,
                generation: 0,
            })),
        }
    }

    /// Begin recording. No-op returning the live handle when already
    /// recording. Must be called from within a tokio runtime (the
    /// rotation timer is a spawned task).
    pub fn start(&self) -> Result<SegmentHandle, RecordingError> {
        let mut slot = self.slot()?;
        if let Session::Recording { path, started_at, .. } = &slot.session {
            debug!("start ignored: already recording");
            return Ok(SegmentHandle {
                path: path.clone(),
                started_at: *started_at,
            });
        }

        let handle = self.open_segment(&mut slot)?;
        self.arm_rotation(slot.generation);
        info!(path = %handle.path.display(), "recording started");
        Ok(handle)
    }

    /// Stop recording and finalize the open segment before returning.
    /// No-op when idle.
    pub fn stop(&self) -> Result<(), RecordingError> {
        let mut slot = self.slot()?;
        slot.generation += 1;

        match std::mem::replace(&mut slot.session, Session::Idle) {
            Session::Idle => {
                debug!("stop ignored: not recording");
            }
            Session::Recording { writer, path, .. } => {
                self.finalize(writer, &path);
                info!("recording stopped");
            }
        }
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        self.slot()
            .map(|slot| matches!(slot.session, Session::Recording { .. }))
            .unwrap_or(false)
    }

    /// Handle for the segment currently being written, if any
    pub fn current_segment(&self) -> Option<SegmentHandle> {
        let slot = self.slot().ok()?;
        match &slot.session {
            Session::Recording { path, started_at, .. } => Some(SegmentHandle {
                path: path.clone(),
                started_at: *started_at,
            }),
            Session::Idle => None,
        }
    }

    fn slot(&self) -> Result<MutexGuard<'_, Slot>, RecordingError> {
        self.shared.lock().map_err(|_| RecordingError::StatePoisoned)
    }

    fn open_segment(&self, slot: &mut Slot) -> Result<SegmentHandle, RecordingError> {
        let path = self.store.allocate_path()?;
        let writer = self.encoder.open(&path)?;
        let started_at = Instant::now();
        slot.generation += 1;
        slot.session = Session::Recording {
            writer,
            path: path.clone(),
            started_at,
        };
        Ok(SegmentHandle { path, started_at })
    }

    fn arm_rotation(&self, generation: u64) {
        let controller = self.clone();
        let duration = self.config.segment_duration();
        tokio::spawn(async move {
            sleep(duration).await;
            controller.rotate(generation);
        });
    }

    /// Rotation timer body: finalize the elapsed segment and immediately
    /// open the next one. A generation mismatch means the session changed
    /// in the interim (user stop, or a newer segment); the rotation then
    /// completes without restarting.
    fn rotate(&self, generation: u64) {
        let mut slot = match self.slot() {
            Ok(slot) => slot,
            Err(e) => {
                error!("rotation aborted: {e}");
                return;
            }
        };
        if slot.generation != generation {
            debug!("rotation cancelled: session changed");
            return;
        }

        if let Session::Recording { writer, path, .. } =
            std::mem::replace(&mut slot.session, Session::Idle)
        {
            self.finalize(writer, &path);
            match self.open_segment(&mut slot) {
                Ok(handle) => {
                    self.arm_rotation(slot.generation);
                    debug!(path = %handle.path.display(), "segment rotated");
                }
                Err(e) => {
                    error!("failed to open next segment, recording stopped: {e}");
                }
            }
        }
    }

    /// Close a writer; completed segments go to the store for retention
    /// processing, failed ones are discarded.
    fn finalize(&self, writer: Box<dyn SegmentWriter>, path: &Path) {
        match writer.close() {
            Ok(size_bytes) => {
                debug!(path = %path.display(), size_bytes, "segment closed");
                if let Err(e) = self.store.finalize(path) {
                    warn!(path = %path.display(), "segment store finalize failed: {e}");
                }
            }
            Err(e) => {
                error!(path = %path.display(), "segment discarded: finalize failed: {e}");
            }
        }
    }
}
