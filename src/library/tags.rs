use std::path::Path;

use lofty::prelude::{Accessor, ItemKey, TaggedFileExt};

use super::model::TrackTags;

/// Reads the tag fields of `path`.
///
/// Uses the primary tag of the file and falls back to the first tag found.
/// Files that cannot be parsed, or carry no tag at all, produce empty
/// fields so the track defaults take over.
pub fn read_tags(path: &Path) -> TrackTags {
    let Ok(tagged) = lofty::read_from_path(path) else {
        return TrackTags::default();
    };

    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        return TrackTags::default();
    };

    TrackTags {
        artist: tag.artist().map(|v| v.to_string()),
        title: tag.title().map(|v| v.to_string()),
        album: tag.album().map(|v| v.to_string()),
        album_artist: tag
            .get_string(&ItemKey::AlbumArtist)
            .map(|v| v.to_string()),
        disc_num: tag.disk(),
        track_num: tag.track(),
    }
}
