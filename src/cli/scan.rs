use std::path::PathBuf;

use tabled::Table;

use crate::{
    Res, config, info,
    library::{ScanSettings, Transcoder, scan_dir},
    types::TrackTableRow,
    utils, warning,
};

/// Prints the album each directory would become, without transcoding or
/// uploading anything.
pub async fn scan(dirs: Vec<PathBuf>, recursive: bool) -> Res<()> {
    let work_dir = tempfile::Builder::new().prefix("vkup-").tempdir()?;
    let mut settings = ScanSettings::new(
        recursive,
        config::convert_formats(),
        Transcoder::new(config::ffmpeg(), config::bitrate()),
    );
    settings.transcode = false;

    for dir in dirs {
        let dir = utils::normalize_dir(&dir);

        let album = match scan_dir(&dir, &settings, work_dir.path()).await {
            Ok(album) => album,
            Err(e) => {
                warning!("{}", e);
                continue;
            }
        };

        if album.is_empty() {
            warning!("{} does not have audio files.", dir.display());
            continue;
        }

        if let Some(title) = utils::playlist_title(&album.tracks) {
            info!("{}: playlist \"{}\"", dir.display(), title);
        }
        match &album.cover {
            Some(cover) => info!("Cover: {}", cover.display()),
            None => info!("Cover: none"),
        }

        let rows: Vec<TrackTableRow> = album
            .tracks
            .iter()
            .map(|t| TrackTableRow {
                disc: t.disc_num,
                track: t.track_num,
                artist: t.artist.clone(),
                title: t.title.clone(),
                album: t.album.clone(),
                file: t
                    .original_path
                    .strip_prefix(&album.root)
                    .unwrap_or(t.original_path.as_path())
                    .display()
                    .to_string(),
            })
            .collect();

        println!("{}", Table::new(rows));
    }

    Ok(())
}
