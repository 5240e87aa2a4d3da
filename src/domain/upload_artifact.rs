use super::{AudioFormat, StoragePath};

/// An uploaded recording for the lifetime of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadArtifact {
    pub original_filename: String,
    pub format: AudioFormat,
    pub storage_path: StoragePath,
}

impl UploadArtifact {
    pub fn new(original_filename: String, format: AudioFormat) -> Self {
        Self {
            original_filename,
            format,
            storage_path: StoragePath::for_upload(format),
        }
    }
}
