use std::path::Path;

/// Audio containers accepted by the upload endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Wav,
    M4a,
    Mp3,
    Webm,
}

impl AudioFormat {
    pub const SUPPORTED_EXTENSIONS: [&'static str; 4] = [".wav", ".m4a", ".mp3", ".webm"];

    /// Matches the filename's last extension, ignoring case.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename).extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "m4a" => Some(Self::M4a),
            "mp3" => Some(Self::Mp3),
            "webm" => Some(Self::Webm),
            _ => None,
        }
    }

    /// Lower-case extension including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => ".wav",
            Self::M4a => ".m4a",
            Self::Mp3 => ".mp3",
            Self::Webm => ".webm",
        }
    }
}
