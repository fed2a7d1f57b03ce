use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    info,
    library::{Album, Track},
    types::{SavePlaylistResponse, Token, UploadServer, UploadedCover},
    utils, warning,
};

use super::{ApiError, GroupId, PLAYLIST_API_VERSION, VkClient, audio};

#[derive(Debug, Clone, Copy, Default)]
pub struct UploadOptions {
    pub group: Option<GroupId>,
    /// Hide the playlist from search.
    pub hidden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaylistRef {
    pub owner_id: i64,
    pub id: i64,
}

impl PlaylistRef {
    pub fn url(&self) -> String {
        format!(
            "https://vk.com/music/playlist/{}_{}",
            self.owner_id, self.id
        )
    }
}

#[derive(Debug, Clone)]
pub struct UploadReport {
    /// `None` when no track could be uploaded and no playlist was created.
    pub playlist: Option<PlaylistRef>,
    pub title: String,
    pub uploaded: usize,
    pub missing: Vec<Track>,
}

/// Creates a playlist owned by `owner_id` holding `audio_ids` in the given
/// order.
pub async fn save_playlist(
    client: &VkClient,
    token: &Token,
    owner_id: i64,
    title: &str,
    description: &str,
    audio_ids: &[String],
    hidden: bool,
) -> Result<PlaylistRef, ApiError> {
    let response: SavePlaylistResponse = client
        .call_as(
            "execute.savePlaylist",
            &token.access_token,
            PLAYLIST_API_VERSION,
            &[
                ("dialog_id", "0".to_string()),
                ("playlist_id", "0".to_string()),
                ("title", title.to_string()),
                ("description", description.to_string()),
                ("audio_ids_to_add", audio_ids.join(",")),
                ("no_discover", u8::from(hidden).to_string()),
                ("owner_id", owner_id.to_string()),
                ("func_v", "6".to_string()),
                ("save_cover", "0".to_string()),
            ],
        )
        .await?;

    Ok(PlaylistRef {
        owner_id,
        id: response.playlist.id,
    })
}

/// Uploads `cover` and sets it as the playlist's cover photo.
pub async fn set_cover(
    client: &VkClient,
    token: &Token,
    playlist: &PlaylistRef,
    cover: &Path,
) -> Result<(), ApiError> {
    let access_token = token.access_token.as_str();

    let server: UploadServer = client
        .call_as(
            "photos.getAudioPlaylistCoverUploadServer",
            access_token,
            PLAYLIST_API_VERSION,
            &[
                ("playlist_id", playlist.id.to_string()),
                ("owner_id", playlist.owner_id.to_string()),
            ],
        )
        .await?;

    let uploaded: UploadedCover = client.upload_as(&server.upload_url, cover, "photo").await?;

    client
        .call(
            "audio.setPlaylistCoverPhoto",
            access_token,
            PLAYLIST_API_VERSION,
            &[("hash", uploaded.hash), ("photo", uploaded.photo)],
        )
        .await?;

    Ok(())
}

/// Uploads every track of `album` and gathers them into a new playlist.
///
/// The playlist is titled after the album artist and album of the last
/// track. Tracks removed by their copyright holder are skipped and listed in
/// the playlist description. The album cover, when there is one, is set after
/// the playlist exists.
///
/// # Errors
///
/// Any API failure other than a copyright removal aborts the album.
pub async fn upload_album(
    client: &VkClient,
    token: &Token,
    album: &Album,
    options: UploadOptions,
) -> Result<UploadReport, ApiError> {
    let owner_id = options
        .group
        .map(|g| g.owner_id())
        .unwrap_or(token.user_id);
    let title = utils::playlist_title(&album.tracks).unwrap_or_default();

    let pb = ProgressBar::new(album.tracks.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:40.blue} {pos}/{len} {msg}") {
        pb.set_style(style);
    }

    let mut audio_ids: Vec<String> = Vec::new();
    let mut missing: Vec<Track> = Vec::new();

    for track in &album.tracks {
        pb.suspend(|| info!("Uploading {}", track));
        pb.set_message(track.title.clone());

        match audio::upload_track(client, token, track, options.group).await {
            Ok(Some(id)) => audio_ids.push(id),
            Ok(None) => {
                pb.suspend(|| warning!("{} was removed by copyright holder!", track));
                missing.push(track.clone());
            }
            Err(e) => {
                pb.abandon();
                return Err(e);
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let uploaded = audio_ids.len();
    if audio_ids.is_empty() {
        warning!("No track of {} could be uploaded, skipping playlist", title);
        return Ok(UploadReport {
            playlist: None,
            title,
            uploaded,
            missing,
        });
    }

    // Added audios end up in reverse order, so hand them over reversed.
    audio_ids.reverse();
    let description = utils::missing_tracks_description(&missing);

    info!("Creating playlist {}", title);
    let playlist = save_playlist(
        client,
        token,
        owner_id,
        &title,
        &description,
        &audio_ids,
        options.hidden,
    )
    .await?;

    if let Some(cover) = &album.cover {
        info!("Uploading cover...");
        set_cover(client, token, &playlist, cover).await?;
    }

    Ok(UploadReport {
        playlist: Some(playlist),
        title,
        uploaded,
        missing,
    })
}
