use std::fmt;
use std::str::FromStr;

/// Whisper checkpoint size a caller may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelSize {
    #[default]
    Base,
    Small,
}

impl ModelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Base => "base",
            ModelSize::Small => "small",
        }
    }
}

impl FromStr for ModelSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(ModelSize::Base),
            "small" => Ok(ModelSize::Small),
            other => Err(format!(
                "model_size must be 'base' or 'small', got '{}'",
                other
            )),
        }
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
