#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Form, Json, Router,
    body::Bytes,
    extract::{Path, State},
    routing::post,
};
use serde_json::{Value, json};
use vkup::vk::{ClientSettings, VkClient};

#[derive(Default)]
struct MockState {
    responses: HashMap<String, VecDeque<Value>>,
    calls: Vec<(String, HashMap<String, String>)>,
}

/// In-process stand-in for the VK endpoints.
///
/// Method answers are queued per method name; the last queued answer keeps
/// being returned once the queue is down to one entry.
#[derive(Clone, Default)]
pub struct MockVk {
    state: Arc<Mutex<MockState>>,
    pub addr: Option<SocketAddr>,
}

impl MockVk {
    pub async fn start() -> Self {
        let mut mock = MockVk::default();

        let app = Router::new()
            .route("/method/{name}", post(method))
            .route("/token", post(oauth))
            .route("/upload/{kind}", post(upload))
            .with_state(mock.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        mock.addr = Some(addr);
        mock
    }

    pub fn base(&self) -> String {
        format!("http://{}", self.addr.unwrap())
    }

    pub fn respond(&self, name: &str, value: Value) -> &Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .entry(name.to_string())
            .or_default()
            .push_back(value);
        self
    }

    pub fn calls(&self, name: &str) -> Vec<HashMap<String, String>> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, params)| params.clone())
            .collect()
    }

    pub fn client(&self) -> VkClient {
        VkClient::new(test_settings(format!("{}/method/", self.base()))).unwrap()
    }

    fn answer(&self, name: &str, params: HashMap<String, String>) -> Value {
        let mut state = self.state.lock().unwrap();
        state.calls.push((name.to_string(), params));

        match state.responses.get_mut(name) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if queue.len() == 1 => queue[0].clone(),
            _ => json!({"error": {"error_code": 3, "error_msg": "Unknown method passed"}}),
        }
    }
}

pub fn test_settings(api_url: String) -> ClientSettings {
    ClientSettings {
        api_url,
        user_agent: "vkup-tests".to_string(),
        timeout: Duration::from_secs(5),
        connect_retries: 2,
        initial_backoff: Duration::ZERO,
        max_backoff: Duration::ZERO,
        captcha_wait: Duration::ZERO,
        captcha_max_waits: 3,
    }
}

pub fn api_error(code: i64) -> Value {
    json!({"error": {"error_code": code, "error_msg": format!("error {}", code)}})
}

async fn method(
    State(mock): State<MockVk>,
    Path(name): Path<String>,
    Form(params): Form<HashMap<String, String>>,
) -> Json<Value> {
    Json(mock.answer(&name, params))
}

async fn oauth(
    State(mock): State<MockVk>,
    Form(params): Form<HashMap<String, String>>,
) -> Json<Value> {
    Json(mock.answer("oauth", params))
}

async fn upload(State(mock): State<MockVk>, Path(kind): Path<String>, body: Bytes) -> Json<Value> {
    let mut params = HashMap::new();
    params.insert("size".to_string(), body.len().to_string());
    Json(mock.answer(&format!("upload/{}", kind), params))
}
