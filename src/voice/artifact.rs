//! Transient audio files produced by synthesis and consumed by playback

use std::io::Write;
use std::path::Path;

use tempfile::TempPath;

use crate::Result;

/// A uniquely named MP3 file that lives for at most one cycle
///
/// Dropping the artifact deletes the file; [`AudioArtifact::discard`] does the
/// same explicitly and logs instead of failing.
#[derive(Debug)]
pub struct AudioArtifact {
    path: TempPath,
    len: usize,
}

impl AudioArtifact {
    /// Write `audio` to a new `nisse_*.mp3` file in `dir` (system temp dir when `None`)
    ///
    /// A failed write removes the partial file before returning.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be created or written
    pub fn write(audio: &[u8], dir: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("nisse_").suffix(".mp3");

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(audio)?;
        file.flush()?;

        Ok(Self {
            path: file.into_temp_path(),
            len: audio.len(),
        })
    }

    /// Location of the audio file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the audio payload in bytes
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the payload was empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Delete the file; failures (e.g. already removed) are not reported
    pub fn discard(self) {
        let shown = self.path.display().to_string();
        match self.path.close() {
            Ok(()) => tracing::debug!(path = %shown, "removed audio file"),
            Err(e) => tracing::debug!(path = %shown, error = %e, "audio file already gone"),
        }
    }
}
