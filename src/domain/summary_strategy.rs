use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SummaryStrategy {
    #[default]
    RuleBased,
    Llm,
}

impl SummaryStrategy {
    /// `"llm"` selects the generative strategy; anything else is extractive.
    pub fn from_method(method: &str) -> Self {
        match method {
            "llm" => Self::Llm,
            _ => Self::RuleBased,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryStrategy::RuleBased => "rule-based",
            SummaryStrategy::Llm => "llm",
        }
    }
}

impl fmt::Display for SummaryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
