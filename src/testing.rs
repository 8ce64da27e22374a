//! Scripted transport for unit tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::api::{ApiRequest, ApiResponse, Endpoints, Transport, TransportError};
use crate::models::{VideoId, VideoRecord};

type Responder =
    Box<dyn Fn(usize, &ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync>;

/// Records every request and answers with `responder(call_index, request)`.
/// Individual calls can be held open until their gate is notified.
pub struct MockTransport {
    responder: Responder,
    gates: Mutex<HashMap<usize, Arc<Notify>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new(
        responder: impl Fn(usize, &ApiRequest) -> Result<ApiResponse, TransportError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            gates: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(status: u16, body: Value) -> Self {
        Self::new(move |_, _| Ok(ApiResponse::json(status, &body)))
    }

    pub fn unreachable() -> Self {
        Self::new(|_, _| Err(TransportError::Connection("connection refused".into())))
    }

    /// Holds call number `index` until the returned gate is notified.
    pub fn hold(&self, index: usize) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(index, gate.clone());
        gate
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() - 1
        };
        let gate = self.gates.lock().unwrap().remove(&index);
        if let Some(gate) = gate {
            gate.notified().await;
        }
        (self.responder)(index, &request)
    }
}

pub fn endpoints() -> Arc<Endpoints> {
    Arc::new(Endpoints::direct(
        "http://upload.test/upload",
        "http://catalog.test/videos",
        "http://admin.test/admin/videos",
    ))
}

pub fn record(id: &str, views: u64) -> VideoRecord {
    VideoRecord {
        id: VideoId::new(id),
        title: format!("title {id}"),
        description: format!("about {id}"),
        genre: None,
        duration: Some(10.0),
        video_url: format!("/static_videos/{id}.mp4"),
        views,
        timestamp: None,
    }
}

pub fn record_json(id: &str, views: u64) -> Value {
    json!({
        "_id": id,
        "title": format!("title {id}"),
        "description": format!("about {id}"),
        "duration": 10.0,
        "video_url": format!("/static_videos/{id}.mp4"),
        "views": views,
    })
}
