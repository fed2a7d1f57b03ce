use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::Utc;

use crate::{
    info,
    types::{Credentials, StoredToken, Token},
    utils,
    vk::{
        ApiError, VkClient,
        auth::{self, OAuthSettings},
    },
    warning,
};

/// What has to happen with the cached token before it can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Missing,
    CredentialsChanged,
    NeedsCheck,
}

pub struct TokenManager {
    path: PathBuf,
    stored: Option<StoredToken>,
}

impl TokenManager {
    pub fn new(path: PathBuf) -> Self {
        TokenManager { path, stored: None }
    }

    /// Loads the token cache at `path`. A missing file gives an empty
    /// manager; an unreadable or corrupt one is an error. Caches without an
    /// acquisition time load with `obtained_at` set to 0.
    pub async fn load(path: PathBuf) -> Result<Self, String> {
        let content = match async_fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::new(path)),
            Err(e) => return Err(format!("{}: {}", path.display(), e)),
        };
        let stored: StoredToken =
            serde_json::from_str(&content).map_err(|e| format!("{}: {}", path.display(), e))?;
        Ok(Self {
            path,
            stored: Some(stored),
        })
    }

    /// Writes the current token to the cache file as pretty JSON, creating
    /// parent directories as needed. Does nothing when no token is held.
    ///
    /// # Errors
    ///
    /// Returns the I/O or serialization error as a message.
    pub async fn persist(&self) -> Result<(), String> {
        let Some(stored) = &self.stored else {
            return Ok(());
        };

        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(stored).map_err(|e| e.to_string())?;
        async_fs::write(&self.path, json)
            .await
            .map_err(|e| e.to_string())
    }

    /// Classifies the cached token against `credentials`. A token that
    /// matches still has to be validated against the API.
    pub fn status(&self, credentials: &Credentials) -> TokenStatus {
        match &self.stored {
            None => TokenStatus::Missing,
            Some(stored) if stored.hash != credentials_hash(credentials) => {
                TokenStatus::CredentialsChanged
            }
            Some(_) => TokenStatus::NeedsCheck,
        }
    }

    /// Returns a token that works for `credentials`.
    ///
    /// The cached token is reused when it was obtained with the same
    /// credentials and still validates. Otherwise a new token is obtained
    /// and written to the cache file straight away.
    pub async fn get_valid_token(
        &mut self,
        client: &VkClient,
        oauth: &OAuthSettings,
        credentials: &Credentials,
    ) -> Result<Token, ApiError> {
        match self.status(credentials) {
            TokenStatus::Missing => info!("Getting new token..."),
            TokenStatus::CredentialsChanged => info!("Credentials changed, getting new token..."),
            TokenStatus::NeedsCheck => {
                info!("Loading token from file...");
                if let Some(stored) = self.stored.as_mut() {
                    if let Some(user_id) =
                        auth::check_token(client, &stored.token.access_token).await?
                    {
                        stored.token.user_id = user_id;
                        return Ok(stored.token.clone());
                    }
                }
                warning!("Token check failed, getting new token...");
            }
        }

        let token = auth::obtain_token(client, oauth, credentials).await?;
        self.stored = Some(StoredToken {
            hash: credentials_hash(credentials),
            token: token.clone(),
            obtained_at: Utc::now().timestamp(),
        });
        if let Err(e) = self.persist().await {
            warning!("Failed to save token to {}: {}", self.path.display(), e);
        }

        Ok(token)
    }

    pub fn current(&self) -> Option<&StoredToken> {
        self.stored.as_ref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn credentials_hash(credentials: &Credentials) -> String {
    utils::credentials_hash(&credentials.login, &credentials.password)
}
