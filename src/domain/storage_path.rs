use std::fmt;

use uuid::Uuid;

use super::AudioFormat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath(String);

impl StoragePath {
    /// Fresh collision-free name for a staged upload, independent of the client's filename.
    pub fn for_upload(format: AudioFormat) -> Self {
        Self(format!("{}{}", Uuid::new_v4(), format.extension()))
    }

    pub fn from_raw(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
