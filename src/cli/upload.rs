use std::path::PathBuf;

use crate::{
    Res, config, info,
    library::{ScanSettings, Transcoder, scan_dir},
    success, utils,
    vk::{
        GroupId,
        playlist::{self, UploadOptions},
    },
    warning,
};

use super::auth::authorize;

#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub dirs: Vec<PathBuf>,
    pub group: Option<i64>,
    pub credentials: Option<PathBuf>,
    pub token: Option<PathBuf>,
    pub recursive: bool,
    pub hidden: bool,
    pub open: bool,
}

/// Uploads every directory in `request.dirs` as its own playlist.
///
/// Directories that cannot be scanned are reported and skipped. Upload
/// failures stop the run. Transcoded files live in a temporary directory
/// that is removed when this returns.
pub async fn upload(request: UploadRequest) -> Res<()> {
    let options = UploadOptions {
        group: request.group.map(GroupId::from_arg).transpose()?.flatten(),
        hidden: request.hidden,
    };

    let (client, token, _) = authorize(request.credentials, request.token).await?;

    let work_dir = tempfile::Builder::new().prefix("vkup-").tempdir()?;
    let settings = ScanSettings::new(
        request.recursive,
        config::convert_formats(),
        Transcoder::new(config::ffmpeg(), config::bitrate()),
    );

    for dir in &request.dirs {
        let dir = utils::normalize_dir(dir);
        info!("Processing {}", dir.display());

        let album = match scan_dir(&dir, &settings, work_dir.path()).await {
            Ok(album) => album,
            Err(e) => {
                warning!("{}", e);
                warning!("Processing of {} failed!", dir.display());
                continue;
            }
        };

        if album.is_empty() {
            warning!("{} does not have audio files.", dir.display());
            continue;
        }

        let report = playlist::upload_album(&client, &token, &album, options).await?;
        let Some(created) = report.playlist else {
            continue;
        };

        success!("Playlist {} created: {}", report.title, created.url());
        if !report.missing.is_empty() {
            warning!(
                "{} of {} tracks are missing from {}",
                report.missing.len(),
                report.missing.len() + report.uploaded,
                report.title
            );
        }

        if request.open && webbrowser::open(&created.url()).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                created.url()
            );
        }
    }

    Ok(())
}
