use thiserror::Error;

/// Reasons a single position fix could not become a sample.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("timestamp {0} ms cannot be represented")]
    InvalidTimestamp(i64),
    #[error("position unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecorderError {
    #[error("no position-sampling capability on this host")]
    CapabilityUnavailable,
    #[error("recorder service is no longer running")]
    ServiceClosed,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected `key = value`")]
    MalformedLine { line: usize },
    #[error("line {line}: invalid value `{value}` for `{key}`")]
    InvalidValue { line: usize, key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteListError {
    #[error("no route with id {0}")]
    UnknownRoute(String),
}

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model endpoint answered with status {0}")]
    Status(u16),
    #[error("empty response from model")]
    EmptyResponse,
    #[error("malformed model payload: {0}")]
    Json(#[from] serde_json::Error),
}
