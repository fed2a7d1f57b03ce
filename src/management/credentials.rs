use std::{io::ErrorKind, path::Path};

use crate::{config, types::Credentials};

/// Loads the account credentials.
///
/// Reads the JSON credentials file at `path`. When it does not exist the
/// `VK_LOGIN` / `VK_PASSWORD` environment variables are used instead.
pub async fn load_credentials(path: &Path) -> Result<Credentials, String> {
    match async_fs::read_to_string(path).await {
        Ok(content) => {
            serde_json::from_str(&content).map_err(|e| format!("{}: {}", path.display(), e))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => config::env_credentials()
            .map(|(login, password)| Credentials { login, password })
            .ok_or_else(|| "Credentials file does not exist.".to_string()),
        Err(e) => Err(format!("{}: {}", path.display(), e)),
    }
}
