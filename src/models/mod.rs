mod candidate;
mod video;

pub use candidate::{
    media_type_for, FileCandidate, MetadataCandidate, UploadCandidate, VideoEdit, VideoFile,
};
pub use video::{VideoId, VideoRecord};
