//! Configuration management for vkup.
//!
//! Values come from environment variables, optionally loaded from a `.env`
//! file in the local data directory. Most settings have defaults; the
//! application credentials for the password grant do not.
//!
//! The lookup order is:
//! 1. Command-line flags (only for the credentials and token paths)
//! 2. Environment variables
//! 3. `.env` file in the local data directory
//! 4. Built-in defaults

use std::{env, io::ErrorKind, path::PathBuf, str::FromStr, time::Duration};

pub const DEFAULT_API_URL: &str = "https://api.vk.com/method/";
pub const DEFAULT_OAUTH_URL: &str = "https://oauth.vk.com/token";
pub const DEFAULT_USER_AGENT: &str =
    "VKAndroidApp/6.30-7444 (Android 7.1.1; SDK 25; arm64-v8a; Xiaomi MI8; ru; 1920x1080)";
pub const DEFAULT_FFMPEG: &str = "ffmpeg";
pub const DEFAULT_BITRATE: &str = "320k";
pub const DEFAULT_CONVERT_FORMATS: &str = "flac";
pub const DEFAULT_CAPTCHA_WAIT_SECS: u64 = 120;
pub const DEFAULT_CAPTCHA_MAX_WAITS: u32 = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Loads environment variables from `<data_local_dir>/vkup/.env`.
///
/// Creates the directory if needed. A missing `.env` file is fine; a file
/// that exists but cannot be parsed is reported as an error.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/vkup/.env`
/// - macOS: `~/Library/Application Support/vkup/.env`
/// - Windows: `%LOCALAPPDATA%/vkup/.env`
pub async fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    match dotenv::from_path(&path) {
        Ok(()) => Ok(()),
        Err(dotenv::Error::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!("{}: {}", path.display(), e)),
    }
}

/// Returns the application data directory, `<data_local_dir>/vkup`.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("vkup");
    path
}

/// Base URL of the VK method endpoint. Method names are appended directly,
/// so the value keeps its trailing slash.
pub fn vk_api_url() -> String {
    env::var("VK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// Password-grant token endpoint.
pub fn vk_oauth_url() -> String {
    env::var("VK_OAUTH_URL").unwrap_or_else(|_| DEFAULT_OAUTH_URL.to_string())
}

/// Client id used for the password grant. Only needed when a new token
/// has to be obtained.
pub fn vk_client_id() -> Option<String> {
    env::var("VK_CLIENT_ID").ok().filter(|v| !v.is_empty())
}

/// Client secret used for the password grant.
pub fn vk_client_secret() -> Option<String> {
    env::var("VK_CLIENT_SECRET").ok().filter(|v| !v.is_empty())
}

/// User-Agent sent with every request. Defaults to the VK Android client,
/// which the audio methods require.
pub fn user_agent() -> String {
    env::var("VKUP_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string())
}

/// Credentials file path. An explicit command-line path wins over
/// `VKUP_CREDENTIALS_FILE`, which wins over the data directory default.
pub fn credentials_file(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| env::var_os("VKUP_CREDENTIALS_FILE").map(PathBuf::from))
        .unwrap_or_else(|| data_dir().join("creds.json"))
}

/// Token cache path, resolved like [`credentials_file`].
pub fn token_file(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| env::var_os("VKUP_TOKEN_FILE").map(PathBuf::from))
        .unwrap_or_else(|| data_dir().join("token.json"))
}

/// Account login and password from the environment, when both are set.
pub fn env_credentials() -> Option<(String, String)> {
    match (env::var("VK_LOGIN"), env::var("VK_PASSWORD")) {
        (Ok(login), Ok(password)) => Some((login, password)),
        _ => None,
    }
}

/// Transcoder executable, either a bare name looked up on `PATH` or a path.
pub fn ffmpeg() -> PathBuf {
    env::var_os("VKUP_FFMPEG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FFMPEG))
}

/// Bitrate passed to the transcoder, in ffmpeg notation (`320k`).
pub fn bitrate() -> String {
    env::var("VKUP_BITRATE").unwrap_or_else(|_| DEFAULT_BITRATE.to_string())
}

/// Extensions transcoded to MP3 before upload, lowercase and without dots.
pub fn convert_formats() -> Vec<String> {
    let raw = env::var("VKUP_CONVERT_FORMATS").unwrap_or_else(|_| DEFAULT_CONVERT_FORMATS.into());
    parse_extension_list(&raw)
}

/// How long a call sleeps after a CAPTCHA error before it is reissued.
pub fn captcha_wait() -> Duration {
    Duration::from_secs(env_or("VKUP_CAPTCHA_WAIT", DEFAULT_CAPTCHA_WAIT_SECS))
}

/// CAPTCHA waits allowed per call before it fails.
pub fn captcha_max_waits() -> u32 {
    env_or("VKUP_CAPTCHA_MAX_WAITS", DEFAULT_CAPTCHA_MAX_WAITS)
}

/// Upper bound for a single request, connecting and transferring included.
/// A request that runs longer fails with a timeout and is retried.
pub fn request_timeout() -> Duration {
    Duration::from_secs(env_or("VKUP_TIMEOUT", DEFAULT_TIMEOUT_SECS))
}

/// Splits a comma separated extension list such as `".FLAC, wav"` into
/// `["flac", "wav"]`.
pub fn parse_extension_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
