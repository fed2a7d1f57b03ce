mod common;

use std::{
    fs,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use serde_json::json;
use tempfile::tempdir;
use tokio::net::TcpListener;
use vkup::{
    library::{Album, Track, TrackTags},
    types::{ProfileInfo, Token},
    vk::{
        API_VERSION, ApiError, GroupId, VkClient, audio,
        auth::check_token,
        parse_response,
        playlist::{UploadOptions, upload_album},
    },
};

use common::{MockVk, api_error, test_settings};

fn token() -> Token {
    Token {
        access_token: "tok".to_string(),
        user_id: 42,
    }
}

fn fake_track(dir: &Path, file: &str, title: &str, track_num: u32) -> Track {
    let path = dir.join(file);
    fs::write(&path, b"not a real mp3").unwrap();
    Track::from_tags(
        path,
        TrackTags {
            artist: Some("Artist".to_string()),
            title: Some(title.to_string()),
            album: Some("Album".to_string()),
            album_artist: Some("Album Artist".to_string()),
            disc_num: Some(1),
            track_num: Some(track_num),
        },
    )
}

fn expect_audio_upload(mock: &MockVk) {
    mock.respond(
        "audio.getUploadServer",
        json!({"response": {"upload_url": format!("{}/upload/audio", mock.base())}}),
    );
    mock.respond(
        "upload/audio",
        json!({"server": 123, "audio": "audio-blob", "hash": "audio-hash"}),
    );
}

#[test]
fn test_parse_response() {
    let value = parse_response(json!({"response": {"id": 1}})).unwrap();
    assert_eq!(value, json!({"id": 1}));

    match parse_response(api_error(100)) {
        Err(ApiError::Vk { code, message }) => {
            assert_eq!(code, 100);
            assert_eq!(message, "error 100");
        }
        other => panic!("unexpected result: {:?}", other),
    }

    assert!(matches!(
        parse_response(json!({"something": "else"})),
        Err(ApiError::Malformed(_))
    ));
}

#[test]
fn test_group_id() {
    let group = GroupId::new(77).unwrap();
    assert_eq!(group.id(), 77);
    assert_eq!(group.owner_id(), -77);

    assert_eq!(GroupId::new(-77), Some(group));
    assert_eq!(GroupId::new(0), None);
    assert_eq!(GroupId::new(i64::MIN), None);
}

#[test]
fn test_group_id_from_arg() {
    assert_eq!(GroupId::from_arg(0).unwrap(), None);
    assert_eq!(GroupId::from_arg(-77).unwrap(), GroupId::new(77));
    assert!(matches!(
        GroupId::from_arg(i64::MIN),
        Err(ApiError::Config(_))
    ));
}

#[tokio::test]
async fn test_call_sends_token_and_version() {
    let mock = MockVk::start().await;
    mock.respond("account.getProfileInfo", json!({"response": {"id": 42}}));

    let client = mock.client();
    let profile: ProfileInfo = client
        .call_as(
            "account.getProfileInfo",
            "tok",
            API_VERSION,
            &[("extra", "1".to_string())],
        )
        .await
        .unwrap();
    assert_eq!(profile.id, 42);

    let calls = mock.calls("account.getProfileInfo");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["access_token"], "tok");
    assert_eq!(calls[0]["v"], "5.130");
    assert_eq!(calls[0]["extra"], "1");
}

#[tokio::test]
async fn test_call_waits_out_captcha() {
    let mock = MockVk::start().await;
    mock.respond("audio.get", api_error(14));
    mock.respond("audio.get", json!({"response": [1, 2, 3]}));

    let value = mock.client().call("audio.get", "tok", API_VERSION, &[]).await.unwrap();
    assert_eq!(value, json!([1, 2, 3]));
    assert_eq!(mock.calls("audio.get").len(), 2);
}

#[tokio::test]
async fn test_call_gives_up_after_captcha_limit() {
    let mock = MockVk::start().await;
    mock.respond("audio.get", api_error(14));

    let result = mock.client().call("audio.get", "tok", API_VERSION, &[]).await;
    assert!(matches!(result, Err(ApiError::CaptchaLimit(_))));
    // One initial attempt plus one per allowed wait.
    assert_eq!(mock.calls("audio.get").len(), 4);
}

#[tokio::test]
async fn test_call_surfaces_api_errors() {
    let mock = MockVk::start().await;
    mock.respond("audio.get", api_error(15));

    let result = mock.client().call("audio.get", "tok", API_VERSION, &[]).await;
    assert!(matches!(result, Err(ApiError::Vk { code: 15, .. })));
    assert_eq!(mock.calls("audio.get").len(), 1);
}

#[tokio::test]
async fn test_connection_errors_are_retried_then_returned() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = VkClient::new(test_settings(format!("http://{}/method/", addr))).unwrap();

    match client.call("audio.get", "tok", API_VERSION, &[]).await {
        Err(ApiError::Http(e)) => assert!(e.is_connect()),
        other => panic!("unexpected result: {:?}", other),
    }
}

/// Accepts connections on a local port and hands each socket to `handle`,
/// counting the connections seen.
async fn raw_server<F>(handle: F) -> (String, Arc<AtomicUsize>)
where
    F: Fn(tokio::net::TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            handle(socket);
        }
    });

    (format!("http://{}/method/", addr), accepted)
}

#[tokio::test]
async fn test_dropped_connections_are_retried() {
    let (url, accepted) = raw_server(drop).await;
    let client = VkClient::new(test_settings(url)).unwrap();

    let result = client.call("audio.get", "tok", API_VERSION, &[]).await;
    assert!(matches!(result, Err(ApiError::Http(_))));
    // One attempt plus two retries.
    assert_eq!(accepted.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_stalled_requests_time_out_and_are_retried() {
    let held = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sockets = held.clone();
    let (url, accepted) = raw_server(move |socket| sockets.lock().unwrap().push(socket)).await;

    let mut settings = test_settings(url);
    settings.timeout = Duration::from_millis(200);
    let client = VkClient::new(settings).unwrap();

    match client.call("audio.get", "tok", API_VERSION, &[]).await {
        Err(ApiError::Http(e)) => assert!(e.is_timeout()),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(accepted.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_check_token() {
    let mock = MockVk::start().await;
    mock.respond("account.getProfileInfo", json!({"response": {"id": 42}}));
    mock.respond("account.getProfileInfo", api_error(5));

    let client = mock.client();
    assert_eq!(check_token(&client, "tok").await.unwrap(), Some(42));
    assert_eq!(check_token(&client, "tok").await.unwrap(), None);
}

#[tokio::test]
async fn test_upload_file_reports_server_errors() {
    let mock = MockVk::start().await;
    mock.respond("upload/audio", json!({"error": "file too big"}));

    let dir = tempdir().unwrap();
    let path = dir.path().join("a.mp3");
    fs::write(&path, b"data").unwrap();

    let result = mock
        .client()
        .upload_file(&format!("{}/upload/audio", mock.base()), &path, "file")
        .await;
    match result {
        Err(ApiError::Upload(msg)) => assert_eq!(msg, "file too big"),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_ne!(mock.calls("upload/audio")[0]["size"], "0");
}

#[tokio::test]
async fn test_upload_file_missing_file() {
    let mock = MockVk::start().await;
    let result = mock
        .client()
        .upload_file(
            &format!("{}/upload/audio", mock.base()),
            Path::new("/definitely/not/here.mp3"),
            "file",
        )
        .await;
    assert!(matches!(result, Err(ApiError::Io(_, _))));
    assert!(mock.calls("upload/audio").is_empty());
}

#[tokio::test]
async fn test_upload_track_to_user() {
    let mock = MockVk::start().await;
    expect_audio_upload(&mock);
    mock.respond("audio.save", json!({"response": {"id": 5, "owner_id": 42}}));

    let dir = tempdir().unwrap();
    let track = fake_track(dir.path(), "01.mp3", "One", 1);

    let id = audio::upload_track(&mock.client(), &token(), &track, None)
        .await
        .unwrap();
    assert_eq!(id.as_deref(), Some("42_5"));

    let save = &mock.calls("audio.save")[0];
    assert_eq!(save["server"], "123");
    assert_eq!(save["audio"], "audio-blob");
    assert_eq!(save["hash"], "audio-hash");
    assert!(mock.calls("audio.add").is_empty());
}

#[tokio::test]
async fn test_upload_track_removed_by_copyright_holder() {
    let mock = MockVk::start().await;
    expect_audio_upload(&mock);
    mock.respond("audio.save", api_error(270));

    let dir = tempdir().unwrap();
    let track = fake_track(dir.path(), "01.mp3", "One", 1);

    let id = audio::upload_track(&mock.client(), &token(), &track, None)
        .await
        .unwrap();
    assert_eq!(id, None);
}

#[tokio::test]
async fn test_upload_track_save_error_aborts() {
    let mock = MockVk::start().await;
    expect_audio_upload(&mock);
    mock.respond("audio.save", api_error(10));

    let dir = tempdir().unwrap();
    let track = fake_track(dir.path(), "01.mp3", "One", 1);

    let result = audio::upload_track(&mock.client(), &token(), &track, None).await;
    assert!(matches!(result, Err(ApiError::Vk { code: 10, .. })));
}

#[tokio::test]
async fn test_upload_track_to_group() {
    let mock = MockVk::start().await;
    expect_audio_upload(&mock);
    mock.respond("audio.save", json!({"response": {"id": 5, "owner_id": 42}}));
    mock.respond("audio.add", json!({"response": 99}));
    mock.respond("execute", json!({"response": 1}));

    let dir = tempdir().unwrap();
    let track = fake_track(dir.path(), "01.mp3", "One", 1);

    let id = audio::upload_track(&mock.client(), &token(), &track, GroupId::new(77))
        .await
        .unwrap();
    assert_eq!(id.as_deref(), Some("-77_99"));

    let add = &mock.calls("audio.add")[0];
    assert_eq!(add["owner_id"], "42");
    assert_eq!(add["audio_id"], "5");
    assert_eq!(add["group_id"], "77");

    let execute = &mock.calls("execute")[0];
    assert_eq!(
        execute["code"],
        "API.audio.delete({audio_id:5,owner_id:42});"
    );
}

fn album_of(tracks: Vec<Track>, cover: Option<std::path::PathBuf>) -> Album {
    Album {
        root: std::path::PathBuf::from("album"),
        tracks,
        cover,
    }
}

#[tokio::test]
async fn test_upload_album_creates_playlist_with_cover() {
    let mock = MockVk::start().await;
    expect_audio_upload(&mock);
    mock.respond("audio.save", json!({"response": {"id": 1, "owner_id": 42}}));
    mock.respond("audio.save", json!({"response": {"id": 2, "owner_id": 42}}));
    mock.respond(
        "execute.savePlaylist",
        json!({"response": {"playlist": {"id": 555, "owner_id": 42}}}),
    );
    mock.respond(
        "photos.getAudioPlaylistCoverUploadServer",
        json!({"response": {"upload_url": format!("{}/upload/photo", mock.base())}}),
    );
    mock.respond("upload/photo", json!({"hash": "cover-hash", "photo": "cover-photo"}));
    mock.respond("audio.setPlaylistCoverPhoto", json!({"response": 1}));

    let dir = tempdir().unwrap();
    let cover = dir.path().join("cover.jpg");
    fs::write(&cover, b"jpeg").unwrap();
    let album = album_of(
        vec![
            fake_track(dir.path(), "01.mp3", "One", 1),
            fake_track(dir.path(), "02.mp3", "Two", 2),
        ],
        Some(cover),
    );

    let options = UploadOptions {
        group: None,
        hidden: true,
    };
    let report = upload_album(&mock.client(), &token(), &album, options)
        .await
        .unwrap();

    let playlist = report.playlist.unwrap();
    assert_eq!(playlist.id, 555);
    assert_eq!(playlist.owner_id, 42);
    assert_eq!(report.title, "Album Artist - Album");
    assert_eq!(report.uploaded, 2);
    assert!(report.missing.is_empty());

    let save = &mock.calls("execute.savePlaylist")[0];
    assert_eq!(save["v"], "5.149");
    assert_eq!(save["title"], "Album Artist - Album");
    assert_eq!(save["description"], "");
    assert_eq!(save["audio_ids_to_add"], "42_2,42_1");
    assert_eq!(save["no_discover"], "1");
    assert_eq!(save["owner_id"], "42");
    assert_eq!(save["dialog_id"], "0");
    assert_eq!(save["playlist_id"], "0");
    assert_eq!(save["func_v"], "6");
    assert_eq!(save["save_cover"], "0");

    let server = &mock.calls("photos.getAudioPlaylistCoverUploadServer")[0];
    assert_eq!(server["playlist_id"], "555");
    assert_eq!(server["owner_id"], "42");

    let set = &mock.calls("audio.setPlaylistCoverPhoto")[0];
    assert_eq!(set["hash"], "cover-hash");
    assert_eq!(set["photo"], "cover-photo");
}

#[tokio::test]
async fn test_upload_album_lists_missing_tracks() {
    let mock = MockVk::start().await;
    expect_audio_upload(&mock);
    mock.respond("audio.save", json!({"response": {"id": 1, "owner_id": 42}}));
    mock.respond("audio.save", api_error(270));
    mock.respond(
        "execute.savePlaylist",
        json!({"response": {"playlist": {"id": 8}}}),
    );

    let dir = tempdir().unwrap();
    let album = album_of(
        vec![
            fake_track(dir.path(), "01.mp3", "One", 1),
            fake_track(dir.path(), "02.mp3", "Two", 2),
        ],
        None,
    );

    let options = UploadOptions {
        group: GroupId::new(77),
        hidden: false,
    };
    let report = upload_album(&mock.client(), &token(), &album, options)
        .await
        .unwrap();

    assert_eq!(report.uploaded, 1);
    assert_eq!(report.missing.len(), 1);
    assert_eq!(report.missing[0].title, "Two");
    assert_eq!(report.playlist.unwrap().owner_id, -77);

    let save = &mock.calls("execute.savePlaylist")[0];
    assert_eq!(save["description"], "Missing tracks:\nArtist - Two\n");
    assert_eq!(save["no_discover"], "0");
    assert_eq!(save["owner_id"], "-77");
    assert!(mock.calls("photos.getAudioPlaylistCoverUploadServer").is_empty());
}

#[tokio::test]
async fn test_upload_album_without_uploads_skips_playlist() {
    let mock = MockVk::start().await;
    expect_audio_upload(&mock);
    mock.respond("audio.save", api_error(270));

    let dir = tempdir().unwrap();
    let album = album_of(vec![fake_track(dir.path(), "01.mp3", "One", 1)], None);

    let report = upload_album(&mock.client(), &token(), &album, UploadOptions::default())
        .await
        .unwrap();

    assert!(report.playlist.is_none());
    assert_eq!(report.missing.len(), 1);
    assert!(mock.calls("execute.savePlaylist").is_empty());
}

#[tokio::test]
async fn test_upload_album_stops_on_error() {
    let mock = MockVk::start().await;
    mock.respond("audio.getUploadServer", api_error(201));

    let dir = tempdir().unwrap();
    let album = album_of(
        vec![
            fake_track(dir.path(), "01.mp3", "One", 1),
            fake_track(dir.path(), "02.mp3", "Two", 2),
        ],
        None,
    );

    let result = upload_album(&mock.client(), &token(), &album, UploadOptions::default()).await;
    assert!(matches!(result, Err(ApiError::Vk { code: 201, .. })));
    assert_eq!(mock.calls("audio.getUploadServer").len(), 1);
    assert!(mock.calls("execute.savePlaylist").is_empty());
}
