use std::path::Path;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::library::Track;

pub const COVER_NAMES: [&str; 3] = ["cover", "jacket", "folder"];
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Hex SHA-256 of `"<login> <password>"`, used to tie a cached token to the
/// credentials that produced it.
pub fn credentials_hash(login: &str, password: &str) -> String {
    let hash = Sha256::digest(format!("{} {}", login, password).as_bytes());
    format!("{:x}", hash)
}

/// Lowercase extension of `path` without the dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Whether the extension of `path` is one of `extensions`.
///
/// # Arguments
///
/// * `path` - File to check, compared case-insensitively
/// * `extensions` - Lowercase extensions without the dot
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    extension_of(path)
        .map(|ext| extensions.iter().any(|e| e == &ext))
        .unwrap_or(false)
}

/// Whether `file_name` names a playlist cover for a directory called
/// `dir_name`: `cover`, `jacket`, `folder` or the directory name itself,
/// with a `.jpg`, `.jpeg` or `.png` extension. Case-insensitive.
pub fn is_cover_name(file_name: &str, dir_name: &str) -> bool {
    let file_name = file_name.to_lowercase();
    let dir_name = dir_name.to_lowercase();

    let Some((stem, ext)) = file_name.rsplit_once('.') else {
        return false;
    };

    IMAGE_EXTENSIONS.contains(&ext)
        && (COVER_NAMES.contains(&stem) || (!dir_name.is_empty() && stem == dir_name))
}

/// Renders a JSON scalar the way it has to travel in a form field: strings
/// without quotes, everything else in its JSON form.
pub fn form_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Playlist title for an album, taken from its last track.
pub fn playlist_title(tracks: &[Track]) -> Option<String> {
    tracks
        .last()
        .map(|t| format!("{} - {}", t.album_artist, t.album))
}

/// Playlist description listing tracks that could not be uploaded. Empty
/// when nothing is missing.
pub fn missing_tracks_description(missing: &[Track]) -> String {
    if missing.is_empty() {
        return String::new();
    }

    let mut desc = String::from("Missing tracks:\n");
    for track in missing {
        desc.push_str(&format!("{} - {}\n", track.artist, track.title));
    }
    desc
}

/// Normalizes a directory argument the way a user means it: trailing
/// separators and `.` components are dropped.
pub fn normalize_dir(dir: &Path) -> std::path::PathBuf {
    dir.components().collect()
}
