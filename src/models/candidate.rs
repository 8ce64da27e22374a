use serde::Serialize;
use std::path::Path;

/// A video file picked for upload, held fully in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl VideoFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Reads a file from disk, declaring its media type from the extension.
    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        Ok(Self::new(name, media_type_for(path), bytes))
    }
}

pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

/// Catalog entry created by reference to an already hosted video.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataCandidate {
    pub title: String,
    pub description: String,
    pub genre: String,
    pub duration: f64,
    pub video_url: String,
}

/// Catalog entry created by uploading the video bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileCandidate {
    pub title: String,
    pub description: String,
    pub genre: String,
    pub file: Option<VideoFile>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadCandidate {
    Metadata(MetadataCandidate),
    File(FileCandidate),
}

impl MetadataCandidate {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl FileCandidate {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl UploadCandidate {
    pub fn reset(&mut self) {
        match self {
            UploadCandidate::Metadata(c) => c.reset(),
            UploadCandidate::File(c) => c.reset(),
        }
    }
}

impl From<MetadataCandidate> for UploadCandidate {
    fn from(c: MetadataCandidate) -> Self {
        UploadCandidate::Metadata(c)
    }
}

impl From<FileCandidate> for UploadCandidate {
    fn from(c: FileCandidate) -> Self {
        UploadCandidate::File(c)
    }
}

/// The admin-editable subset of a video record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoEdit {
    pub title: String,
    pub description: String,
    pub genre: String,
}

impl From<&super::VideoRecord> for VideoEdit {
    fn from(video: &super::VideoRecord) -> Self {
        Self {
            title: video.title.clone(),
            description: video.description.clone(),
            genre: video.genre.clone().unwrap_or_default(),
        }
    }
}
