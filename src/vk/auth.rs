use crate::{
    config,
    types::{Credentials, OAuthResponse, ProfileInfo, Token},
};

use super::{API_VERSION, ApiError, VkClient};

/// Password-grant endpoint and application credentials.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl OAuthSettings {
    pub fn from_env() -> Self {
        Self {
            url: config::vk_oauth_url(),
            client_id: config::vk_client_id(),
            client_secret: config::vk_client_secret(),
        }
    }
}

/// Exchanges a login and password for an access token.
///
/// The token is validated right away and carries the id of the account it
/// belongs to.
///
/// # Errors
///
/// - `ApiError::Config` when the client id or secret is not configured
/// - `ApiError::OAuth` when the endpoint rejects the credentials or the new
///   token does not pass validation
/// - `ApiError::Malformed` when the answer has no token
/// - `ApiError::Http` on transport failures
pub async fn obtain_token(
    client: &VkClient,
    oauth: &OAuthSettings,
    credentials: &Credentials,
) -> Result<Token, ApiError> {
    let client_id = oauth
        .client_id
        .as_deref()
        .ok_or_else(|| ApiError::Config("VK_CLIENT_ID must be set".to_string()))?;
    let client_secret = oauth
        .client_secret
        .as_deref()
        .ok_or_else(|| ApiError::Config("VK_CLIENT_SECRET must be set".to_string()))?;

    let form = [
        ("grant_type", "password"),
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("username", credentials.login.as_str()),
        ("password", credentials.password.as_str()),
        ("scope", "all"),
        ("2fa_supported", "1"),
    ];

    let body: OAuthResponse = client
        .post_with_retry(|http| http.post(&oauth.url).form(&form))
        .await?
        .json()
        .await?;

    if let Some(error) = body.error {
        let description = body.error_description.unwrap_or_default();
        return Err(ApiError::OAuth(format!("{} {}", error, description).trim().to_string()));
    }

    let access_token = body
        .access_token
        .ok_or_else(|| ApiError::Malformed("token response without access_token".to_string()))?;

    match check_token(client, &access_token).await? {
        Some(user_id) => Ok(Token {
            access_token,
            user_id,
        }),
        None => Err(ApiError::OAuth(
            "Token check failed while acquiring new token".to_string(),
        )),
    }
}

/// Validates `access_token` with `account.getProfileInfo`.
///
/// Returns the account id for a working token and `None` when the API
/// rejects it. Transport failures are errors, not a verdict on the token.
pub async fn check_token(client: &VkClient, access_token: &str) -> Result<Option<i64>, ApiError> {
    match client
        .call_as::<ProfileInfo>("account.getProfileInfo", access_token, API_VERSION, &[])
        .await
    {
        Ok(profile) => Ok(Some(profile.id)),
        Err(ApiError::Vk { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}
