//! Output file for one attachment, written under a temp name first.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::temp_path;

/// A `<name>.part` file that becomes `<name>` on `finalize`.
///
/// Dropping it before `finalize` removes the temp file, so a failed copy never
/// leaves a partial file behind.
pub struct PartFile {
    file: Option<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
    finalized: bool,
}

impl PartFile {
    /// Create (or truncate) the temp file for `final_path`.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        let temp_path = temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        Ok(PartFile {
            file: Some(file),
            temp_path,
            final_path: final_path.to_path_buf(),
            finalized: false,
        })
    }

    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        match self.file.as_mut() {
            Some(f) => f.write_all(data),
            None => Err(io::Error::new(io::ErrorKind::Other, "output already closed")),
        }
    }

    /// Flush and fsync, then close. The descriptor is released even when this fails.
    pub fn close(&mut self) -> io::Result<()> {
        if let Some(mut f) = self.file.take() {
            f.flush()?;
            f.sync_all()?;
        }
        Ok(())
    }

    /// Path of the temp file.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Rename the temp file onto the final path, replacing any existing file.
    pub fn finalize(mut self) -> io::Result<()> {
        drop(self.file.take());
        std::fs::rename(&self.temp_path, &self.final_path)?;
        self.finalized = true;
        Ok(())
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if !self.finalized {
            drop(self.file.take());
            if let Err(e) = std::fs::remove_file(&self.temp_path) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::debug!(path = %self.temp_path.display(), "could not remove temp file: {}", e);
                }
            }
        }
    }
}
