mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    EmrSettings, LlmSettings, LoggingSettings, ServerSettings, Settings, SettingsError,
    UploadSettings,
};
