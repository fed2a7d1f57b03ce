//! # VK Module
//!
//! Client for the parts of the VK API that vkup needs: the password-grant
//! token endpoint, account lookup, audio upload and playlist management.
//!
//! Every outbound request goes through [`VkClient::post_with_retry`], which
//! retries connection failures with a bounded exponential backoff. Method
//! calls additionally go through [`VkClient::call`], which understands the
//! API's error envelope and waits out CAPTCHA challenges before reissuing the
//! same call.
//!
//! ## Submodules
//!
//! - [`auth`] - token acquisition and validation
//! - [`audio`] - single track upload
//! - [`playlist`] - playlist creation, cover upload and the album pipeline

use std::{
    error::Error as _,
    fmt, io,
    path::{Path, PathBuf},
    time::Duration,
};

use reqwest::{
    Client, RequestBuilder, Response,
    header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT},
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::sleep;

use crate::{config, types::ErrorBody, utils, warning};

pub mod audio;
pub mod auth;
pub mod playlist;

pub const API_VERSION: &str = "5.130";
pub const PLAYLIST_API_VERSION: &str = "5.149";

pub const CAPTCHA_NEEDED: i64 = 14;
pub const COPYRIGHT_REMOVED: i64 = 270;

pub const CONNECT_RETRIES: u32 = 10;
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
pub const MAX_BACKOFF: Duration = Duration::from_secs(32);

#[derive(Debug)]
pub enum ApiError {
    Http(reqwest::Error),
    Io(PathBuf, io::Error),
    /// Error object returned by a method call.
    Vk { code: i64, message: String },
    OAuth(String),
    Upload(String),
    Malformed(String),
    CaptchaLimit(String),
    Config(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Malformed(err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Http(e) => write!(f, "request failed: {}", e),
            ApiError::Io(p, e) => write!(f, "{}: {}", p.display(), e),
            ApiError::Vk { code, message } => write!(f, "API error {}: {}", code, message),
            ApiError::OAuth(msg) => write!(f, "authorization failed: {}", msg),
            ApiError::Upload(msg) => write!(f, "upload failed: {}", msg),
            ApiError::Malformed(msg) => write!(f, "unexpected response: {}", msg),
            ApiError::CaptchaLimit(method) => {
                write!(f, "{} kept asking for a captcha, giving up", method)
            }
            ApiError::Config(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Group the uploads go to. Stores the positive group id; the owner id the
/// API expects for group content is its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupId(i64);

impl GroupId {
    /// Accepts either sign. Returns `None` for zero and for `i64::MIN`,
    /// which has no positive counterpart.
    pub fn new(raw: i64) -> Option<Self> {
        match raw.checked_abs() {
            Some(0) | None => None,
            Some(id) => Some(GroupId(id)),
        }
    }

    /// Interprets a `--group` argument.
    ///
    /// # Returns
    ///
    /// `Ok(None)` for zero, which means "upload to the user's own page".
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] for an id that cannot name a group.
    pub fn from_arg(raw: i64) -> Result<Option<Self>, ApiError> {
        if raw == 0 {
            return Ok(None);
        }
        GroupId::new(raw)
            .map(Some)
            .ok_or_else(|| ApiError::Config(format!("invalid group id {}", raw)))
    }

    pub fn id(&self) -> i64 {
        self.0
    }

    pub fn owner_id(&self) -> i64 {
        -self.0
    }
}

/// Endpoint and resilience settings of a [`VkClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Method endpoint base, with trailing slash.
    pub api_url: String,
    pub user_agent: String,
    /// Limit for a single request, connecting and transferring included.
    pub timeout: Duration,
    pub connect_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub captcha_wait: Duration,
    pub captcha_max_waits: u32,
}

impl ClientSettings {
    /// Builds the settings from the environment, see [`config`].
    pub fn from_env() -> Self {
        Self {
            api_url: config::vk_api_url(),
            user_agent: config::user_agent(),
            timeout: config::request_timeout(),
            connect_retries: CONNECT_RETRIES,
            initial_backoff: INITIAL_BACKOFF,
            max_backoff: MAX_BACKOFF,
            captcha_wait: config::captcha_wait(),
            captcha_max_waits: config::captcha_max_waits(),
        }
    }
}

/// HTTP client for the VK API and its upload servers.
///
/// Every request carries the configured User-Agent and the Android client
/// marker header, and goes through [`post_with_retry`](Self::post_with_retry).
pub struct VkClient {
    http: Client,
    settings: ClientSettings,
}

impl VkClient {
    /// Creates a client with the default headers and request timeout set.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] when the user agent is not a valid header
    /// value, or [`ApiError::Http`] when the TLS backend fails to initialize.
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&settings.user_agent)
            .map_err(|e| ApiError::Config(format!("invalid user agent: {}", e)))?;
        headers.insert(USER_AGENT, agent);
        headers.insert(
            HeaderName::from_static("x-vk-android-client"),
            HeaderValue::from_static("new"),
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Sends the request built by `build`, retrying connection failures.
    ///
    /// Refused, reset and dropped connections count as connection failures,
    /// as does a request running into the client timeout.
    ///
    /// The delay starts at `initial_backoff` and doubles after every failed
    /// attempt, capped at `max_backoff`. After `connect_retries` retries the
    /// last error is returned. Any other error, and any HTTP response
    /// regardless of status, is returned as-is.
    pub async fn post_with_retry<F>(&self, build: F) -> Result<Response, reqwest::Error>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut retries = self.settings.connect_retries;
        let mut delay = self.settings.initial_backoff;

        loop {
            match build(&self.http).send().await {
                Ok(response) => return Ok(response),
                Err(err) if is_transient(&err) && retries > 0 => {
                    warning!(
                        "Connection error, retrying in {} seconds!",
                        delay.as_secs()
                    );
                    sleep(delay).await;
                    delay = (delay * 2).min(self.settings.max_backoff);
                    retries -= 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Calls API `method` and returns the `response` member of the answer.
    ///
    /// A CAPTCHA error (code 14) makes the call wait `captcha_wait` and
    /// reissue the identical request, at most `captcha_max_waits` times.
    pub async fn call(
        &self,
        method: &str,
        access_token: &str,
        version: &str,
        params: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.settings.api_url, method);
        let mut form: Vec<(&str, String)> = vec![
            ("access_token", access_token.to_string()),
            ("v", version.to_string()),
        ];
        form.extend(params.iter().cloned());

        let mut waits = 0;
        loop {
            let body: Value = self
                .post_with_retry(|http| http.post(&url).form(&form))
                .await?
                .json()
                .await?;

            match parse_response(body) {
                Err(ApiError::Vk { code, .. }) if code == CAPTCHA_NEEDED => {
                    if waits >= self.settings.captcha_max_waits {
                        return Err(ApiError::CaptchaLimit(method.to_string()));
                    }
                    waits += 1;
                    warning!(
                        "Captcha needed, waiting {} secs...",
                        self.settings.captcha_wait.as_secs()
                    );
                    sleep(self.settings.captcha_wait).await;
                }
                other => return other,
            }
        }
    }

    /// [`call`](Self::call) with the response deserialized into `T`.
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        method: &str,
        access_token: &str,
        version: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let value = self.call(method, access_token, version, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Posts `path` as multipart field `field` to an upload server URL and
    /// returns the JSON answer.
    pub async fn upload_file(&self, url: &str, path: &Path, field: &str) -> Result<Value, ApiError> {
        let bytes = async_fs::read(path)
            .await
            .map_err(|e| ApiError::Io(path.to_path_buf(), e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| field.to_string());

        let body: Value = self
            .post_with_retry(|http| {
                let part = Part::bytes(bytes.clone()).file_name(file_name.clone());
                http.post(url)
                    .multipart(Form::new().part(field.to_string(), part))
            })
            .await?
            .json()
            .await?;

        if let Some(error) = body.get("error") {
            return Err(ApiError::Upload(utils::form_value(error)));
        }
        Ok(body)
    }

    /// [`upload_file`](Self::upload_file) with the answer deserialized into `T`.
    pub async fn upload_as<T: DeserializeOwned>(
        &self,
        url: &str,
        path: &Path,
        field: &str,
    ) -> Result<T, ApiError> {
        let value = self.upload_file(url, path, field).await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Splits an API answer into its `response` member or an [`ApiError::Vk`].
pub fn parse_response(body: Value) -> Result<Value, ApiError> {
    if let Some(error) = body.get("error") {
        let error: ErrorBody = serde_json::from_value(error.clone())?;
        return Err(ApiError::Vk {
            code: error.error_code,
            message: error.error_msg,
        });
    }

    match body {
        Value::Object(mut map) => map
            .remove("response")
            .ok_or_else(|| ApiError::Malformed("missing `response` member".to_string())),
        other => Err(ApiError::Malformed(other.to_string())),
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    if err.is_connect() || err.is_timeout() {
        return true;
    }
    if !err.is_request() {
        return false;
    }

    // The peer closing or resetting the connection surfaces as a request
    // error; find the cause further down the chain.
    let mut source = err.source();
    while let Some(cause) = source {
        let dropped = cause
            .downcast_ref::<hyper::Error>()
            .is_some_and(|e| e.is_incomplete_message() || e.is_closed() || e.is_canceled())
            || cause
                .downcast_ref::<io::Error>()
                .is_some_and(|e| is_dropped_connection(e.kind()));
        if dropped {
            return true;
        }
        source = cause.source();
    }
    false
}

fn is_dropped_connection(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}
