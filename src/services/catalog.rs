//! The client-side copy of the catalog and the fetch path that fills it.
//!
//! [`CatalogCache`] is shared by every component that mutates the list. It
//! never hands out mutable access: writers build a new list and swap it in,
//! readers take an immutable snapshot. [`CatalogFetcher`] refreshes the cache
//! from the catalog service and ignores any response that was overtaken by a
//! newer refresh.

use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::api::shared::field_text;
use crate::api::{ApiRequest, Endpoints, Transport};
use crate::error::ClientError;
use crate::models::{VideoId, VideoRecord};

pub const UNEXPECTED_SHAPE: &str =
    "Received unexpected data format. Expected an object with a 'videos' array.";

#[derive(Debug, Default)]
pub struct CatalogCache {
    videos: RwLock<Arc<Vec<VideoRecord>>>,
    closed: AtomicBool,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<Vec<VideoRecord>> {
        self.videos
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, id: &VideoId) -> Option<VideoRecord> {
        self.snapshot().iter().find(|v| &v.id == id).cloned()
    }

    /// Swaps in a whole new list. Returns `false` once the cache is closed.
    pub fn replace(&self, videos: Vec<VideoRecord>) -> bool {
        self.update(|_| Some(videos))
    }

    /// Builds a replacement list from the current one under the write lock.
    /// `f` returning `None` leaves the list untouched.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&[VideoRecord]) -> Option<Vec<VideoRecord>>,
    {
        if self.is_closed() {
            log::debug!("Catalog cache closed, dropping update");
            return false;
        }
        let mut videos = self.videos.write().unwrap_or_else(PoisonError::into_inner);
        match f(&videos) {
            Some(next) => {
                *videos = Arc::new(next);
                true
            }
            None => false,
        }
    }

    /// Replaces the record with the same id, keeping list order.
    pub fn put(&self, video: VideoRecord) -> bool {
        self.update(|videos| {
            videos.iter().any(|v| v.id == video.id).then(|| {
                videos
                    .iter()
                    .map(|v| if v.id == video.id { video.clone() } else { v.clone() })
                    .collect()
            })
        })
    }

    pub fn remove(&self, id: &VideoId) -> bool {
        self.update(|videos| {
            videos
                .iter()
                .any(|v| &v.id == id)
                .then(|| videos.iter().filter(|v| &v.id != id).cloned().collect())
        })
    }

    /// Detaches the cache from its view. Late completions are discarded.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Renames the identity and locator fields used by older catalog revisions.
fn normalize_fields(mut fields: Map<String, Value>) -> Map<String, Value> {
    if let Some(id) = fields.remove("_id") {
        if !id.is_null() {
            fields.insert("id".to_string(), id);
        }
    }
    if let Some(url) = fields.remove("video_access_url") {
        let missing = fields.get("video_url").map_or(true, Value::is_null);
        if missing {
            fields.insert("video_url".to_string(), url);
        }
    }
    fields
}

pub fn normalize_record(value: Value) -> Result<VideoRecord, ClientError> {
    match value {
        Value::Object(fields) => serde_json::from_value(Value::Object(normalize_fields(fields)))
            .map_err(|e| ClientError::Shape(format!("Malformed video record: {}", e))),
        other => Err(ClientError::Shape(format!(
            "Malformed video record: expected an object, got {}",
            other
        ))),
    }
}

/// Accepts `{videos: [...]}` or a bare `[...]`; anything else, or any
/// malformed entry, is a shape error.
pub fn normalize_catalog(payload: Value) -> Result<Vec<VideoRecord>, ClientError> {
    let items = match payload {
        Value::Object(mut fields) => match fields.remove("videos") {
            Some(Value::Array(items)) => items,
            _ => return Err(ClientError::Shape(UNEXPECTED_SHAPE.to_string())),
        },
        Value::Array(items) => {
            log::warn!("Catalog returned a bare array instead of an object with 'videos'");
            items
        }
        other => {
            log::warn!("Unexpected catalog payload: {}", other);
            return Err(ClientError::Shape(UNEXPECTED_SHAPE.to_string()));
        }
    };
    items.into_iter().map(normalize_record).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Loading,
    Failed(String),
    Ready,
}

#[derive(Debug)]
pub enum RefreshOutcome {
    /// The cache now holds this many records.
    Loaded(usize),
    /// The cache was emptied and the state records the reason.
    Failed(ClientError),
    /// A newer refresh was issued meanwhile, or the cache was closed.
    Superseded,
}

pub struct CatalogFetcher<T> {
    transport: Arc<T>,
    endpoints: Arc<Endpoints>,
    cache: Arc<CatalogCache>,
    latest: AtomicU64,
    state: RwLock<FetchState>,
}

impl<T: Transport> CatalogFetcher<T> {
    pub fn new(transport: Arc<T>, endpoints: Arc<Endpoints>, cache: Arc<CatalogCache>) -> Self {
        Self {
            transport,
            endpoints,
            cache,
            latest: AtomicU64::new(0),
            state: RwLock::new(FetchState::Loading),
        }
    }

    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.cache
    }

    pub fn state(&self) -> FetchState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn videos(&self) -> Arc<Vec<VideoRecord>> {
        self.cache.snapshot()
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = FetchState::Loading;

        let result = self.fetch().await;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if self.latest.load(Ordering::SeqCst) != token || self.cache.is_closed() {
            log::debug!("Discarding catalog response for superseded request {}", token);
            return RefreshOutcome::Superseded;
        }
        match result {
            Ok(videos) => {
                let count = videos.len();
                self.cache.replace(videos);
                *state = FetchState::Ready;
                log::info!("Loaded {} videos from catalog", count);
                RefreshOutcome::Loaded(count)
            }
            Err(err) => {
                log::error!("Error fetching videos: {}", err);
                self.cache.replace(Vec::new());
                *state = FetchState::Failed(err.to_string());
                RefreshOutcome::Failed(err)
            }
        }
    }

    async fn fetch(&self) -> Result<Vec<VideoRecord>, ClientError> {
        let response = self
            .transport
            .send(ApiRequest::get(self.endpoints.list_videos()))
            .await?;

        if !response.is_success() {
            let message = field_text(response.json_value().as_ref(), "error").unwrap_or_else(|| {
                format!(
                    "Failed to fetch videos: {} {}",
                    response.status,
                    response.reason.as_deref().unwrap_or("")
                )
                .trim_end()
                .to_string()
            });
            return Err(ClientError::Request {
                status: response.status,
                message,
            });
        }

        let payload = response.json_value().unwrap_or(Value::Null);
        normalize_catalog(payload)
    }
}
