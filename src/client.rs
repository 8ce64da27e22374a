use std::sync::Arc;

use crate::api::{Endpoints, HttpTransport, Transport, TransportError};
use crate::config::{AppConfig, UploadConfig};
use crate::error::ClientError;
use crate::models::{FileCandidate, VideoFile};
use crate::services::validation::{select_file, Violation};
use crate::services::{
    AdminController, CatalogCache, CatalogFetcher, RefreshOutcome, SubmissionPipeline, Submitted,
    ViewTracker,
};

/// One upload form, one catalog view and one admin panel sharing a transport
/// and a catalog cache.
pub struct CatalogClient<T = HttpTransport> {
    uploads: SubmissionPipeline<T>,
    catalog: Arc<CatalogFetcher<T>>,
    views: ViewTracker<T>,
    admin: AdminController<T>,
}

impl CatalogClient<HttpTransport> {
    pub fn from_config(config: &AppConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&config.http)?;
        Ok(Self::new(
            transport,
            Endpoints::from_config(&config.services),
            config.upload.clone(),
        ))
    }
}

impl<T: Transport> CatalogClient<T> {
    pub fn new(transport: T, endpoints: Endpoints, limits: UploadConfig) -> Self {
        let transport = Arc::new(transport);
        let endpoints = Arc::new(endpoints);
        let cache = Arc::new(CatalogCache::new());
        let catalog = Arc::new(CatalogFetcher::new(
            transport.clone(),
            endpoints.clone(),
            cache.clone(),
        ));

        Self {
            uploads: SubmissionPipeline::new(transport.clone(), endpoints.clone(), limits.clone()),
            views: ViewTracker::new(transport.clone(), endpoints.clone(), cache),
            admin: AdminController::new(transport, endpoints, limits, catalog.clone()),
            catalog,
        }
    }

    pub fn catalog(&self) -> &CatalogFetcher<T> {
        &self.catalog
    }

    pub fn views(&self) -> &ViewTracker<T> {
        &self.views
    }

    pub fn admin(&self) -> &AdminController<T> {
        &self.admin
    }

    pub fn uploads(&self) -> &SubmissionPipeline<T> {
        &self.uploads
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        self.catalog.refresh().await
    }

    pub fn select_file(&self, candidate: &mut FileCandidate, file: VideoFile) -> Result<(), Violation> {
        select_file(candidate, file, self.uploads.limits())
    }

    /// Uploads the candidate and reloads the catalog on success.
    pub async fn upload(&self, candidate: &mut FileCandidate) -> Result<Submitted, ClientError> {
        let submitted = self.uploads.submit(candidate).await?;
        if let RefreshOutcome::Failed(err) = self.catalog.refresh().await {
            log::warn!("Catalog refresh after upload failed: {}", err);
        }
        Ok(submitted)
    }

    /// Discards every completion that arrives after this point.
    pub fn close(&self) {
        self.catalog.cache().close();
    }
}
