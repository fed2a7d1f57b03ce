use std::path::PathBuf;

use chrono::{Local, TimeZone};

use crate::{
    Res, config, info,
    management::{TokenManager, load_credentials},
    success,
    types::Token,
    vk::{ClientSettings, VkClient, auth::OAuthSettings},
};

/// Loads credentials and the token cache, and returns a client together with
/// a token that passed validation.
pub async fn authorize(
    credentials: Option<PathBuf>,
    token: Option<PathBuf>,
) -> Res<(VkClient, Token, TokenManager)> {
    let credentials = load_credentials(&config::credentials_file(credentials)).await?;
    let client = VkClient::new(ClientSettings::from_env())?;
    let mut manager = TokenManager::load(config::token_file(token)).await?;

    let token = manager
        .get_valid_token(&client, &OAuthSettings::from_env(), &credentials)
        .await?;
    success!("Token acquired.");

    Ok((client, token, manager))
}

pub async fn auth(credentials: Option<PathBuf>, token: Option<PathBuf>) -> Res<()> {
    let (_, token, manager) = authorize(credentials, token).await?;

    info!("User id: {}", token.user_id);
    if let Some(stored) = manager.current().filter(|s| s.obtained_at > 0) {
        if let Some(at) = Local.timestamp_opt(stored.obtained_at, 0).single() {
            info!("Obtained at: {}", at.format("%Y-%m-%d %H:%M:%S"));
        }
    }
    info!("Token file: {}", manager.path().display());

    Ok(())
}
