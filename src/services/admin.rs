use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::api::shared::request_error;
use crate::api::{ApiRequest, Endpoints, Transport};
use crate::config::UploadConfig;
use crate::error::ClientError;
use crate::models::{MetadataCandidate, VideoEdit, VideoId, VideoRecord};
use crate::services::catalog::{normalize_record, CatalogFetcher, RefreshOutcome};
use crate::services::submission::{InFlight, SubmissionPipeline, Submitted};
use crate::services::validation::validate_edit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Confirmation was refused; nothing was sent.
    Cancelled,
}

/// Add, edit and delete against the admin service, keeping the shared
/// catalog cache in step with each acknowledged change.
pub struct AdminController<T> {
    transport: Arc<T>,
    endpoints: Arc<Endpoints>,
    pipeline: SubmissionPipeline<T>,
    fetcher: Arc<CatalogFetcher<T>>,
    saving: AtomicBool,
}

impl<T: Transport> AdminController<T> {
    pub fn new(
        transport: Arc<T>,
        endpoints: Arc<Endpoints>,
        limits: UploadConfig,
        fetcher: Arc<CatalogFetcher<T>>,
    ) -> Self {
        Self {
            pipeline: SubmissionPipeline::new(transport.clone(), endpoints.clone(), limits),
            transport,
            endpoints,
            fetcher,
            saving: AtomicBool::new(false),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.pipeline.is_submitting()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Creates an entry by reference, then reloads the catalog since the
    /// server assigns the id and timestamp.
    pub async fn add(&self, candidate: &mut MetadataCandidate) -> Result<Submitted, ClientError> {
        let submitted = self.pipeline.submit(candidate).await?;
        if let RefreshOutcome::Failed(err) = self.fetcher.refresh().await {
            log::warn!("Catalog refresh after add failed: {}", err);
        }
        Ok(submitted)
    }

    /// Saves `edit` and replaces the record in place. Only one edit is
    /// in flight at a time; a second one is refused with `Busy`.
    pub async fn edit(&self, id: &VideoId, edit: &VideoEdit) -> Result<VideoRecord, ClientError> {
        let _guard = InFlight::acquire(&self.saving).ok_or(ClientError::Busy)?;
        validate_edit(edit)?;

        let body = serde_json::to_value(edit).map_err(|e| ClientError::Shape(e.to_string()))?;
        let response = self
            .transport
            .send(ApiRequest::put_json(self.endpoints.admin_video(id), body))
            .await
            .map_err(|e| {
                log::error!("Update of {} failed: {}", id, e);
                ClientError::Transport(e)
            })?;
        if !response.is_success() {
            return Err(request_error(&response, "Failed to update video."));
        }

        let cache = self.fetcher.cache();
        let returned = response
            .json_value()
            .and_then(|mut body| body.get_mut("video").map(Value::take))
            .filter(|video| !video.is_null());
        let updated = match returned {
            Some(video) => normalize_record(video)?,
            None => {
                // No record echoed back: apply the submitted fields locally.
                let mut video = cache.get(id).ok_or_else(|| {
                    ClientError::Shape(format!("Update response for {} did not include the video", id))
                })?;
                video.title = edit.title.clone();
                video.description = edit.description.clone();
                video.genre = Some(edit.genre.clone()).filter(|g| !g.trim().is_empty());
                video
            }
        };
        cache.put(updated.clone());
        log::info!("Updated video {}", id);
        Ok(updated)
    }

    /// Deletes `id` if `confirm` agrees. The cached list is filtered only
    /// after the server acknowledges the delete.
    pub async fn delete<F>(&self, id: &VideoId, confirm: F) -> Result<DeleteOutcome, ClientError>
    where
        F: FnOnce(&VideoId) -> bool,
    {
        if !confirm(id) {
            return Ok(DeleteOutcome::Cancelled);
        }

        let response = self
            .transport
            .send(ApiRequest::delete(self.endpoints.admin_video(id)))
            .await
            .map_err(|e| {
                log::error!("Delete of {} failed: {}", id, e);
                ClientError::Transport(e)
            })?;
        if !response.is_success() {
            return Err(request_error(&response, "Failed to delete video."));
        }

        self.fetcher.cache().remove(id);
        log::info!("Deleted video {}", id);
        Ok(DeleteOutcome::Deleted)
    }
}
