use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("invalid blob key '{0}'")]
    InvalidKey(String),

    /// The body being uploaded failed mid-stream.
    #[error("reading upload body: {0}")]
    Body(#[source] std::io::Error),

    #[error("writing blob '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("source {url} unavailable: {reason}")]
    SourceUnavailable { url: String, reason: String },

    #[error("destination {key} unavailable: {reason}")]
    DestinationUnavailable { key: String, reason: String },
}
