//! Local checks on form input. Nothing in here performs I/O.

use std::fmt;

use crate::config::{UploadConfig, MIB};
use crate::models::{FileCandidate, MetadataCandidate, UploadCandidate, VideoEdit, VideoFile};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Violation {
    #[error("Title is required.")]
    MissingTitle,
    #[error("Description is required.")]
    MissingDescription,
    #[error("Video URL is required.")]
    MissingVideoUrl,
    #[error("Duration must be greater than 0.")]
    NonPositiveDuration,
    #[error("Please select a video file.")]
    MissingFile,
    #[error("Invalid file type. Please upload MP4, MOV, MKV or AVI.")]
    UnsupportedMediaType { media_type: String },
    #[error("File is too large. Maximum size is {}MB.", megabytes(.max))]
    FileTooLarge { size: u64, max: u64 },
}

/// Every rule an input broke, in check order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(Vec<Violation>);

impl ValidationErrors {
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    pub fn contains(&self, violation: &Violation) -> bool {
        self.0.contains(violation)
    }

    fn check(violations: Vec<Violation>) -> Result<(), Self> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self(violations))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<Violation> for ValidationErrors {
    fn from(violation: Violation) -> Self {
        Self(vec![violation])
    }
}

fn megabytes(bytes: &u64) -> f64 {
    *bytes as f64 / MIB as f64
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Type first, size second; the first failure wins.
pub fn check_file(file: &VideoFile, limits: &UploadConfig) -> Result<(), Violation> {
    if !limits.allows(&file.media_type) {
        return Err(Violation::UnsupportedMediaType {
            media_type: file.media_type.clone(),
        });
    }
    if file.size() > limits.max_file_size {
        return Err(Violation::FileTooLarge {
            size: file.size(),
            max: limits.max_file_size,
        });
    }
    Ok(())
}

/// Puts `file` into the candidate if it passes [`check_file`]. A rejected
/// file leaves the candidate with no file selected.
pub fn select_file(
    candidate: &mut FileCandidate,
    file: VideoFile,
    limits: &UploadConfig,
) -> Result<(), Violation> {
    match check_file(&file, limits) {
        Ok(()) => {
            candidate.file = Some(file);
            Ok(())
        }
        Err(violation) => {
            log::debug!("Rejected {}: {}", file.name, violation);
            candidate.file = None;
            Err(violation)
        }
    }
}

pub fn validate_metadata(candidate: &MetadataCandidate) -> Result<(), ValidationErrors> {
    let mut violations = Vec::new();
    if blank(&candidate.title) {
        violations.push(Violation::MissingTitle);
    }
    if blank(&candidate.description) {
        violations.push(Violation::MissingDescription);
    }
    if blank(&candidate.video_url) {
        violations.push(Violation::MissingVideoUrl);
    }
    // NaN fails this too
    if !(candidate.duration > 0.0) {
        violations.push(Violation::NonPositiveDuration);
    }
    ValidationErrors::check(violations)
}

pub fn validate_file(
    candidate: &FileCandidate,
    limits: &UploadConfig,
) -> Result<(), ValidationErrors> {
    let mut violations = Vec::new();
    if blank(&candidate.title) {
        violations.push(Violation::MissingTitle);
    }
    if blank(&candidate.description) {
        violations.push(Violation::MissingDescription);
    }
    match &candidate.file {
        None => violations.push(Violation::MissingFile),
        Some(file) => {
            if let Err(violation) = check_file(file, limits) {
                violations.push(violation);
            }
        }
    }
    ValidationErrors::check(violations)
}

pub fn validate_candidate(
    candidate: &UploadCandidate,
    limits: &UploadConfig,
) -> Result<(), ValidationErrors> {
    match candidate {
        UploadCandidate::Metadata(c) => validate_metadata(c),
        UploadCandidate::File(c) => validate_file(c, limits),
    }
}

pub fn validate_edit(edit: &VideoEdit) -> Result<(), ValidationErrors> {
    let mut violations = Vec::new();
    if blank(&edit.title) {
        violations.push(Violation::MissingTitle);
    }
    if blank(&edit.description) {
        violations.push(Violation::MissingDescription);
    }
    ValidationErrors::check(violations)
}
