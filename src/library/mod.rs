//! Local album directories: scanning, tag reading and transcoding.

use std::{fmt, io, path::PathBuf};

mod model;
mod scan;
mod tags;
mod transcode;

pub use model::{Album, Track, TrackTags, UNKNOWN_ARTIST, UNTITLED, UNTITLED_ALBUM};
pub use scan::{ScanSettings, scan_dir};
pub use tags::read_tags;
pub use transcode::Transcoder;

#[derive(Debug)]
pub enum ScanError {
    NotFound(PathBuf),
    NotADirectory(PathBuf),
    Walk(walkdir::Error),
    Io(PathBuf, io::Error),
    TranscoderMissing(PathBuf),
    TranscodeFailed(PathBuf),
}

impl From<walkdir::Error> for ScanError {
    fn from(err: walkdir::Error) -> Self {
        ScanError::Walk(err)
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::NotFound(p) => write!(f, "{} does not exist", p.display()),
            ScanError::NotADirectory(p) => write!(f, "{} is not a directory", p.display()),
            ScanError::Walk(e) => write!(f, "{}", e),
            ScanError::Io(p, e) => write!(f, "{}: {}", p.display(), e),
            ScanError::TranscoderMissing(p) => {
                write!(f, "transcoder {} not found", p.display())
            }
            ScanError::TranscodeFailed(p) => write!(f, "failed to convert {}", p.display()),
        }
    }
}

impl std::error::Error for ScanError {}
