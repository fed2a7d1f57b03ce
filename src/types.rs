use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

/// VK account login and password, as stored in the credentials file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

/// Access token together with the id of the user it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub user_id: i64,
}

/// Token cache file contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    /// Hash of the credentials the token was obtained with.
    pub hash: String,
    pub token: Token,
    /// Unix timestamp of acquisition; 0 when the cache predates the field.
    #[serde(default)]
    pub obtained_at: i64,
}

/// Answer of the password-grant endpoint, either a token or an error.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthResponse {
    pub access_token: Option<String>,
    pub user_id: Option<i64>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// `error` member of a failed method call.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error_code: i64,
    #[serde(default)]
    pub error_msg: String,
}

/// Part of `account.getProfileInfo` used to validate a token.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileInfo {
    pub id: i64,
}

/// Upload server handed out for audio files and playlist covers.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadServer {
    pub upload_url: String,
}

/// Upload server answer for an audio file. `server` is passed back to
/// `audio.save` as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedAudio {
    pub server: Value,
    pub audio: String,
    pub hash: String,
}

/// Audio record created by `audio.save`.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedAudio {
    pub id: i64,
    pub owner_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavePlaylistResponse {
    pub playlist: PlaylistInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistInfo {
    pub id: i64,
}

/// Upload server answer for a cover image, passed on to
/// `audio.setPlaylistCoverPhoto`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedCover {
    pub hash: String,
    pub photo: String,
}

/// One row of the `scan` preview table.
#[derive(Tabled)]
pub struct TrackTableRow {
    pub disc: u32,
    pub track: u32,
    pub artist: String,
    pub title: String,
    pub album: String,
    pub file: String,
}
