// src/services/mod.rs
pub mod admin;
pub mod catalog;
pub mod submission;
pub mod validation;
pub mod view_tracker;

pub use admin::{AdminController, DeleteOutcome};
pub use catalog::{CatalogCache, CatalogFetcher, FetchState, RefreshOutcome};
pub use submission::{SubmissionPipeline, Submitted};
pub use validation::{ValidationErrors, Violation};
pub use view_tracker::{PlayOutcome, ViewTracker};
