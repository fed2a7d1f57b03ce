use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use indicatif::{ProgressBar, ProgressStyle};
use walkdir::WalkDir;

use crate::{info, utils, warning};

use super::{
    ScanError,
    model::{Album, Track},
    tags::read_tags,
    transcode::Transcoder,
};

/// How [`scan_dir`] treats a directory.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Extensions (lowercase, no dot) that are converted to MP3.
    pub convert_formats: Vec<String>,
    pub transcoder: Transcoder,
    /// When false, convertible files are read from their own tags and not
    /// transcoded. Used for previews.
    pub transcode: bool,
}

impl ScanSettings {
    pub fn new(recursive: bool, convert_formats: Vec<String>, transcoder: Transcoder) -> Self {
        Self {
            recursive,
            convert_formats,
            transcoder,
            transcode: true,
        }
    }
}

/// Scans `dir` into an album.
///
/// MP3 files become tracks directly; files with a convertible extension are
/// transcoded into `work_dir` first. Subdirectories are only walked when
/// `settings.recursive` is set, and only the top level is searched for a
/// cover image. The returned tracks are sorted.
///
/// # Errors
///
/// Fails when `dir` is missing or not a directory, when the walk hits an I/O
/// error, or when any transcode fails.
pub async fn scan_dir(
    dir: &Path,
    settings: &ScanSettings,
    work_dir: &Path,
) -> Result<Album, ScanError> {
    if !dir.exists() {
        return Err(ScanError::NotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }

    let dir_name = dir
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default();
    let mp3 = vec!["mp3".to_string()];

    let mut walker = WalkDir::new(dir).min_depth(1).sort_by_file_name();
    if !settings.recursive {
        walker = walker.max_depth(1);
    }

    let mut tracks: Vec<Track> = Vec::new();
    let mut cover: Option<PathBuf> = None;

    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        if utils::has_extension(path, &mp3) {
            tracks.push(Track::from_tags(path.to_path_buf(), read_tags(path)));
        } else if utils::has_extension(path, &settings.convert_formats) {
            if settings.transcode {
                tracks.push(convert(path, &settings.transcoder, work_dir).await?);
            } else {
                tracks.push(Track::from_tags(path.to_path_buf(), read_tags(path)));
            }
        } else if entry.depth() == 1 && cover.is_none() {
            let name = entry.file_name().to_string_lossy();
            if utils::is_cover_name(&name, &dir_name) {
                info!("Found cover image {}", name);
                cover = Some(path.to_path_buf());
            }
        }
    }

    tracks.sort();

    Ok(Album {
        root: dir.to_path_buf(),
        tracks,
        cover,
    })
}

async fn convert(source: &Path, transcoder: &Transcoder, work_dir: &Path) -> Result<Track, ScanError> {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let target = tempfile::Builder::new()
        .prefix("track-")
        .suffix(".mp3")
        .tempfile_in(work_dir)
        .and_then(|f| f.into_temp_path().keep().map_err(|e| e.error))
        .map_err(|e| ScanError::Io(work_dir.to_path_buf(), e))?;

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Converting {}", name));
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let result = transcoder.to_mp3(source, &target).await;
    pb.finish_and_clear();

    if let Err(e) = result {
        warning!("Convertation of {} failed!", name);
        return Err(e);
    }

    let mut track = Track::from_tags(target.clone(), read_tags(&target));
    track.original_path = source.to_path_buf();
    Ok(track)
}
