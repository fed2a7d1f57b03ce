use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::process::Command;

use super::ScanError;

/// Transcoder invocation settings.
#[derive(Debug, Clone)]
pub struct Transcoder {
    pub executable: PathBuf,
    pub bitrate: String,
}

impl Transcoder {
    pub fn new(executable: PathBuf, bitrate: String) -> Self {
        Self {
            executable,
            bitrate,
        }
    }

    /// Resolves the executable on `PATH` (or as given, when it is a path).
    pub fn resolve(&self) -> Result<PathBuf, ScanError> {
        which::which(&self.executable)
            .map_err(|_| ScanError::TranscoderMissing(self.executable.clone()))
    }

    /// Converts `source` into an MP3 at `target`, carrying tags over as ID3v2.3.
    /// An existing `target` is overwritten. Dropping the returned future kills
    /// the running transcoder.
    pub async fn to_mp3(&self, source: &Path, target: &Path) -> Result<(), ScanError> {
        let executable = self.resolve()?;

        let status = Command::new(executable)
            .args(["-nostdin", "-y"])
            .arg("-i")
            .arg(source)
            .args(["-ab", self.bitrate.as_str()])
            .args(["-map_metadata", "0"])
            .args(["-id3v2_version", "3"])
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| ScanError::Io(source.to_path_buf(), e))?;

        if status.success() {
            Ok(())
        } else {
            Err(ScanError::TranscodeFailed(source.to_path_buf()))
        }
    }
}
