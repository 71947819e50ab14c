use thiserror::Error;

#[derive(Error, Debug)]
pub enum WxError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Unexpected response shape: {0}")]
    MissingField(&'static str),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("MCP protocol error: {0}")]
    ProtocolError(String),

    #[error("LLM API error: {0}")]
    Llm(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WxError>;
