use thiserror::Error;

/// Failures talking to the chat service.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("server answered HTTP {0}")]
    Status(u16),
    /// 2xx reply whose body names a failure status, e.g. `"INTERNAL_SERVER_ERROR"`.
    #[error("server rejected the request: {0}")]
    Rejected(String),
    #[error("invalid server url: {0}")]
    Url(#[from] url::ParseError),
    #[error("login rejected for {0}")]
    LoginRejected(String),
    #[error("{0}")]
    InvalidArgument(&'static str),
}

#[derive(Debug, Error)]
pub enum ChatError {
    /// Outgoing message was empty after trimming. No request is made.
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("no contact selected")]
    NoActiveContact,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("no config dir")]
    NoConfigDir,
}
