/// Configuration for tracing initialization.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
    pub level: Option<String>,
}

impl TracingConfig {
    pub fn new(environment: impl Into<String>, json_format: bool, level: Option<String>) -> Self {
        Self {
            environment: environment.into(),
            json_format: json_format || log_format_is_json(),
            level,
        }
    }
}

fn log_format_is_json() -> bool {
    std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
