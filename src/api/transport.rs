//! The seam between the client components and the network.
//!
//! Components describe a request as plain data ([`ApiRequest`]) and hand it
//! to a [`Transport`]. A transport either produces an [`ApiResponse`] (any
//! status) or a [`TransportError`] when no response arrived at all.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::models::VideoFile;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(UploadForm),
}

/// Multipart fields sent to the upload service.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadForm {
    pub file: VideoFile,
    pub title: String,
    pub description: String,
    pub genre: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn get(url: String) -> Self {
        Self {
            method: Method::GET,
            url,
            body: RequestBody::Empty,
        }
    }

    pub fn post(url: String, body: RequestBody) -> Self {
        Self {
            method: Method::POST,
            url,
            body,
        }
    }

    pub fn put_json(url: String, body: Value) -> Self {
        Self {
            method: Method::PUT,
            url,
            body: RequestBody::Json(body),
        }
    }

    pub fn delete(url: String) -> Self {
        Self {
            method: Method::DELETE,
            url,
            body: RequestBody::Empty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub reason: Option<String>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason: None,
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body as JSON, or `None` when it is empty or not JSON.
    pub fn json_value(&self) -> Option<Value> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("connection failed: {0}")]
    Connection(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}
