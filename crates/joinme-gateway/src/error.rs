use thiserror::Error;
use uuid::Uuid;

use joinme_db::StoreError;
use joinme_relay::RelayError;
use joinme_types::ids::UserId;

use crate::custom_id::CustomIdError;
use crate::platform::PlatformError;

const GENERIC_FAILURE: &str = "❌ Something went wrong. Please try again later.";

/// Everything a single event's pipeline can fail with.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("relay: {0}")]
    Relay(#[from] RelayError),

    #[error("platform: {0}")]
    Platform(#[from] PlatformError),

    /// Carries the user-facing description of what was missing.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("pending interaction {0} expired or missing")]
    Expired(Uuid),

    #[error("user {0} acted on someone else's record")]
    Forbidden(UserId),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unroutable {0}")]
    Unroutable(String),

    #[error("interaction outside of a guild")]
    MissingGuild,

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<CustomIdError> for FlowError {
    fn from(e: CustomIdError) -> Self {
        Self::Unroutable(e.to_string())
    }
}

impl FlowError {
    /// Expected outcomes are answered with a specific message and are not
    /// logged as errors.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Expired(_)
                | Self::Forbidden(_)
                | Self::InvalidInput(_)
                | Self::Unroutable(_)
                | Self::MissingGuild
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(what) => format!("❌ {what}"),
            Self::Expired(_) => {
                "⌛ This registration has expired. Use **Register Message** on the message again."
                    .to_string()
            }
            Self::Forbidden(_) => "🚫 That belongs to someone else.".to_string(),
            Self::InvalidInput(reason) => format!("⚠️ {reason}"),
            Self::Unroutable(what) => format!("⚠️ Unrecognized {what}"),
            Self::MissingGuild => "⚠️ This only works inside a server.".to_string(),
            Self::Store(_) | Self::Relay(_) | Self::Platform(_) | Self::Join(_) => {
                GENERIC_FAILURE.to_string()
            }
        }
    }
}
