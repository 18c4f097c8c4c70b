use async_trait::async_trait;

use joinme_types::api::{CommandDefinition, InteractionResponse, OutgoingMessage};
use joinme_types::events::{CommandCall, CommandKind, Interaction};

use crate::context::HandlerContext;
use crate::error::FlowError;

use super::CommandHandler;

pub struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition {
            kind: CommandKind::Slash,
            name: "ping".to_string(),
            description: "Replies with Pong!".to_string(),
            options: Vec::new(),
        }
    }

    async fn invoke(
        &self,
        ctx: &HandlerContext,
        interaction: &Interaction,
        _call: &CommandCall,
    ) -> Result<(), FlowError> {
        ctx.platform
            .respond(
                interaction,
                InteractionResponse::Reply(OutgoingMessage::content("🏓 Pong!").ephemeral()),
            )
            .await?;
        Ok(())
    }
}
