use crate::{
    library::Track,
    types::{SavedAudio, Token, UploadServer, UploadedAudio},
    utils, warning,
};

use super::{API_VERSION, ApiError, COPYRIGHT_REMOVED, GroupId, VkClient};

/// Uploads one track and returns its `{owner}_{id}` audio id.
///
/// With a group the audio is first saved to the user, copied into the group
/// and the user copy removed again; the returned id then points at the
/// group's copy.
///
/// Returns `Ok(None)` when the audio was rejected because the copyright
/// holder removed it. Every other failure is an error.
pub async fn upload_track(
    client: &VkClient,
    token: &Token,
    track: &Track,
    group: Option<GroupId>,
) -> Result<Option<String>, ApiError> {
    let access_token = token.access_token.as_str();

    let server: UploadServer = client
        .call_as("audio.getUploadServer", access_token, API_VERSION, &[])
        .await?;

    let uploaded: UploadedAudio = client
        .upload_as(&server.upload_url, &track.path, "file")
        .await?;

    let saved: SavedAudio = match client
        .call_as(
            "audio.save",
            access_token,
            API_VERSION,
            &[
                ("server", utils::form_value(&uploaded.server)),
                ("audio", uploaded.audio),
                ("hash", uploaded.hash),
            ],
        )
        .await
    {
        Ok(saved) => saved,
        Err(ApiError::Vk { code, .. }) if code == COPYRIGHT_REMOVED => return Ok(None),
        Err(e) => return Err(e),
    };

    let Some(group) = group else {
        return Ok(Some(format!("{}_{}", saved.owner_id, saved.id)));
    };

    let new_id: i64 = client
        .call_as(
            "audio.add",
            access_token,
            API_VERSION,
            &[
                ("owner_id", saved.owner_id.to_string()),
                ("audio_id", saved.id.to_string()),
                ("group_id", group.id().to_string()),
            ],
        )
        .await?;

    let code = format!(
        "API.audio.delete({{audio_id:{},owner_id:{}}});",
        saved.id, saved.owner_id
    );
    if let Err(e) = client
        .call("execute", access_token, API_VERSION, &[("code", code)])
        .await
    {
        warning!("Could not remove the user copy of {}: {}", track, e);
    }

    Ok(Some(format!("{}_{}", group.owner_id(), new_id)))
}
