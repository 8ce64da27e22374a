//! Turns a validated form into exactly one request and maps the answer.

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::api::shared::{field_text, request_error};
use crate::api::{ApiRequest, Endpoints, RequestBody, Transport, UploadForm};
use crate::config::UploadConfig;
use crate::error::ClientError;
use crate::models::{FileCandidate, MetadataCandidate, UploadCandidate};
use crate::services::validation::{
    validate_candidate, validate_file, validate_metadata, ValidationErrors,
};

pub type CompletionHook = Box<dyn Fn(&Value) + Send + Sync>;

/// A form the pipeline knows how to validate, send and clear.
pub trait Submission {
    fn validate(&self, limits: &UploadConfig) -> Result<(), ValidationErrors>;
    fn request(&self, endpoints: &Endpoints) -> ApiRequest;
    fn reset(&mut self);
    fn success_text(&self) -> &'static str;
    fn failure_text(&self) -> &'static str;
}

impl Submission for MetadataCandidate {
    fn validate(&self, _limits: &UploadConfig) -> Result<(), ValidationErrors> {
        validate_metadata(self)
    }

    fn request(&self, endpoints: &Endpoints) -> ApiRequest {
        let body = serde_json::json!({
            "title": self.title,
            "description": self.description,
            "genre": self.genre,
            "duration": self.duration,
            "video_url": self.video_url,
        });
        ApiRequest::post(endpoints.admin_videos(), RequestBody::Json(body))
    }

    fn reset(&mut self) {
        MetadataCandidate::reset(self)
    }

    fn success_text(&self) -> &'static str {
        "Video added successfully!"
    }

    fn failure_text(&self) -> &'static str {
        "Failed to add video."
    }
}

impl Submission for FileCandidate {
    fn validate(&self, limits: &UploadConfig) -> Result<(), ValidationErrors> {
        validate_file(self, limits)
    }

    // Only called after validate, which guarantees a file.
    fn request(&self, endpoints: &Endpoints) -> ApiRequest {
        let form = self.file.clone().map(|file| UploadForm {
            file,
            title: self.title.clone(),
            description: self.description.clone(),
            genre: self.genre.clone(),
        });
        let body = form.map_or(RequestBody::Empty, RequestBody::Multipart);
        ApiRequest::post(endpoints.upload(), body)
    }

    fn reset(&mut self) {
        FileCandidate::reset(self)
    }

    fn success_text(&self) -> &'static str {
        "Video uploaded successfully!"
    }

    fn failure_text(&self) -> &'static str {
        "Failed to upload video."
    }
}

impl Submission for UploadCandidate {
    fn validate(&self, limits: &UploadConfig) -> Result<(), ValidationErrors> {
        validate_candidate(self, limits)
    }

    fn request(&self, endpoints: &Endpoints) -> ApiRequest {
        match self {
            UploadCandidate::Metadata(c) => c.request(endpoints),
            UploadCandidate::File(c) => c.request(endpoints),
        }
    }

    fn reset(&mut self) {
        UploadCandidate::reset(self)
    }

    fn success_text(&self) -> &'static str {
        match self {
            UploadCandidate::Metadata(c) => c.success_text(),
            UploadCandidate::File(c) => c.success_text(),
        }
    }

    fn failure_text(&self) -> &'static str {
        match self {
            UploadCandidate::Metadata(c) => c.failure_text(),
            UploadCandidate::File(c) => c.failure_text(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Submitted {
    /// Server `message`, or a generic success text.
    pub message: String,
    pub body: Value,
}

/// Clears the in-flight flag when the submission finishes or is dropped.
pub(crate) struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SubmissionPipeline<T> {
    transport: Arc<T>,
    endpoints: Arc<Endpoints>,
    limits: UploadConfig,
    in_flight: AtomicBool,
    on_success: Option<CompletionHook>,
}

impl<T: Transport> SubmissionPipeline<T> {
    pub fn new(transport: Arc<T>, endpoints: Arc<Endpoints>, limits: UploadConfig) -> Self {
        Self {
            transport,
            endpoints,
            limits,
            in_flight: AtomicBool::new(false),
            on_success: None,
        }
    }

    /// Called with the parsed response body after every successful submission.
    pub fn on_success(mut self, hook: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    pub fn limits(&self) -> &UploadConfig {
        &self.limits
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Validates and sends `candidate`. The candidate is cleared only after
    /// the server confirms success; on any failure it is left as it was.
    pub async fn submit<S: Submission + ?Sized>(
        &self,
        candidate: &mut S,
    ) -> Result<Submitted, ClientError> {
        let _guard = InFlight::acquire(&self.in_flight).ok_or(ClientError::Busy)?;
        candidate.validate(&self.limits)?;

        let request = candidate.request(&self.endpoints);
        log::info!("Submitting to {}", request.url);
        let response = self.transport.send(request).await.map_err(|e| {
            log::error!("Submission failed: {}", e);
            ClientError::Transport(e)
        })?;

        if !response.is_success() {
            let err = request_error(&response, candidate.failure_text());
            log::warn!("Submission rejected with status {}: {}", response.status, err);
            return Err(err);
        }

        let body = response.json_value().unwrap_or(Value::Null);
        let message = field_text(Some(&body), "message")
            .unwrap_or_else(|| candidate.success_text().to_string());
        candidate.reset();
        if let Some(hook) = &self.on_success {
            hook(&body);
        }
        Ok(Submitted { message, body })
    }
}
