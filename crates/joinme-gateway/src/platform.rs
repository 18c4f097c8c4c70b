use async_trait::async_trait;
use thiserror::Error;

use joinme_types::api::{
    ChannelInfo, CommandDefinition, InteractionResponse, OutgoingMessage, SourceMessage,
};
use joinme_types::events::Interaction;
use joinme_types::ids::{ChannelId, MessageId};
use joinme_types::models::ContinuationHandle;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Direct answer to an interaction. Each interaction can be answered once.
    async fn respond(
        &self,
        interaction: &Interaction,
        response: InteractionResponse,
    ) -> Result<(), PlatformError>;

    /// Extra message after the interaction was already answered.
    async fn follow_up(
        &self,
        interaction: &Interaction,
        message: OutgoingMessage,
    ) -> Result<(), PlatformError>;

    /// Replaces the first reply of the interaction the handle was taken from.
    async fn edit_original(
        &self,
        handle: &ContinuationHandle,
        message: OutgoingMessage,
    ) -> Result<(), PlatformError>;

    async fn fetch_message(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
    ) -> Result<Option<SourceMessage>, PlatformError>;

    async fn channel(&self, channel_id: &ChannelId) -> Result<Option<ChannelInfo>, PlatformError>;

    async fn send_message(
        &self,
        channel_id: &ChannelId,
        message: OutgoingMessage,
    ) -> Result<(), PlatformError>;

    async fn register_commands(&self, commands: &[CommandDefinition]) -> Result<(), PlatformError>;
}
