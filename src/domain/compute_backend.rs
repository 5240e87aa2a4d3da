use std::fmt;

/// Compute mode used to run the speech-recognition model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComputeBackend {
    Accelerated,
    Generic,
}

/// Numeric precision paired with a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    Float16,
    Float32,
}

impl ComputeBackend {
    pub fn precision(&self) -> Precision {
        match self {
            ComputeBackend::Accelerated => Precision::Float16,
            ComputeBackend::Generic => Precision::Float32,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeBackend::Accelerated => "accelerated",
            ComputeBackend::Generic => "generic",
        }
    }
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Float16 => "float16",
            Precision::Float32 => "float32",
        }
    }
}

impl fmt::Display for ComputeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
