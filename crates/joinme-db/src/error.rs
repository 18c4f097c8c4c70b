use thiserror::Error;

/// Everything the keyed store can fail with. Callers decide whether to retry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    #[error("store connection lock poisoned")]
    LockPoisoned,

    #[error("corrupt record at {pk}/{sk}: {source}")]
    Corrupt {
        pk: String,
        sk: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid key segment: {0}")]
    Key(#[from] joinme_types::keys::SegmentError),
}
