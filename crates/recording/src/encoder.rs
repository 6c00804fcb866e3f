//! Encoder/writer seam for the platform media pipeline

use crate::RecordingError;
use std::fs::File;
use std::path::{Path, PathBuf};

/// One open segment file being written
pub trait SegmentWriter: Send {
    /// Finalize the file. Returns the finalized size in bytes.
    fn close(self: Box<Self>) -> Result<u64, RecordingError>;
}

/// Opens writers against allocated segment paths
pub trait Encoder: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn SegmentWriter>, RecordingError>;
}

/// File-backed encoder.
///
/// Creates and syncs the container file; the platform media pipeline muxes
/// video and audio samples into the same target out-of-process.
pub struct FileEncoder;

impl Encoder for FileEncoder {
    fn open(&self, path: &Path) -> Result<Box<dyn SegmentWriter>, RecordingError> {
        let file = File::create(path)
            .map_err(|e| RecordingError::Encoder(format!("open {}: {e}", path.display())))?;
        Ok(Box::new(FileWriter {
            file,
            path: path.to_path_buf(),
        }))
    }
}

struct FileWriter {
    file: File,
    path: PathBuf,
}

impl SegmentWriter for FileWriter {
    fn close(self: Box<Self>) -> Result<u64, RecordingError> {
        self.file
            .sync_all()
            .map_err(|e| RecordingError::Finalize(format!("sync {}: {e}", self.path.display())))?;
        let meta = std::fs::metadata(&self.path)
            .map_err(|e| RecordingError::Finalize(format!("stat {}: {e}", self.path.display())))?;
        Ok(meta.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_encoder_creates_and_finalizes() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("00-00-00.mp4");

        let writer = FileEncoder.open(&path).expect("opened");
        assert!(path.exists());

        let size = writer.close().expect("closed");
        assert_eq!(size, 0);
    }

    #[test]
    fn open_fails_for_missing_parent() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("no-such-folder").join("00-00-00.mp4");

        assert!(matches!(
            FileEncoder.open(&path),
            Err(RecordingError::Encoder(_))
        ));
    }
}
