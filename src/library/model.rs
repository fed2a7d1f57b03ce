use std::{cmp::Ordering, fmt, path::PathBuf};

pub const UNKNOWN_ARTIST: &str = "Unknown artist";
pub const UNTITLED: &str = "Untitled";
pub const UNTITLED_ALBUM: &str = "Untitled album";

/// Tag fields as read from a file, before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub disc_num: Option<u32>,
    pub track_num: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Track {
    /// File that gets uploaded; a transcoded copy for converted sources.
    pub path: PathBuf,
    /// File the track was found as.
    pub original_path: PathBuf,
    pub artist: String,
    pub title: String,
    pub album: String,
    pub album_artist: String,
    pub disc_num: u32,
    pub track_num: u32,
}

impl Track {
    pub fn from_tags(path: PathBuf, tags: TrackTags) -> Self {
        let artist = non_empty(tags.artist).unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
        let album_artist = non_empty(tags.album_artist).unwrap_or_else(|| artist.clone());

        Track {
            original_path: path.clone(),
            path,
            title: non_empty(tags.title).unwrap_or_else(|| UNTITLED.to_string()),
            album: non_empty(tags.album).unwrap_or_else(|| UNTITLED_ALBUM.to_string()),
            artist,
            album_artist,
            disc_num: tags.disc_num.unwrap_or(0),
            track_num: tags.track_num.unwrap_or(0),
        }
    }

    /// File name of the original file without its extension.
    pub fn file_stem(&self) -> String {
        self.original_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Ord for Track {
    fn cmp(&self, other: &Self) -> Ordering {
        self.album
            .cmp(&other.album)
            .then(self.disc_num.cmp(&other.disc_num))
            .then(self.track_num.cmp(&other.track_num))
            .then_with(|| self.artist.cmp(&other.artist))
            .then_with(|| self.title.cmp(&other.title))
            .then_with(|| self.file_stem().cmp(&other.file_stem()))
            .then_with(|| self.original_path.cmp(&other.original_path))
    }
}

impl PartialOrd for Track {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Track {}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} [{} - {}] {{{} - {}}}",
            self.artist, self.title, self.album_artist, self.album, self.disc_num, self.track_num
        )
    }
}

/// Tracks of one scanned directory plus its cover image, if any.
#[derive(Debug, Clone)]
pub struct Album {
    /// Directory the album was scanned from.
    pub root: PathBuf,
    pub tracks: Vec<Track>,
    pub cover: Option<PathBuf>,
}

impl Album {
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
