use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use joinme_types::api::{CommandDefinition, InteractionResponse, OutgoingMessage};
use joinme_types::events::{CommandCall, CommandKind, Interaction};
use joinme_types::models::PendingInteraction;

use crate::context::HandlerContext;
use crate::error::FlowError;
use crate::view;

use super::{CommandHandler, guild_scope};

/// Context-menu entry point of the registration flow.
pub struct RegisterMessage;

#[async_trait]
impl CommandHandler for RegisterMessage {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition {
            kind: CommandKind::MessageContextMenu,
            name: "Register Message".to_string(),
            description: String::new(),
            options: Vec::new(),
        }
    }

    async fn invoke(
        &self,
        ctx: &HandlerContext,
        interaction: &Interaction,
        call: &CommandCall,
    ) -> Result<(), FlowError> {
        guild_scope(interaction)?;
        let message_id = call.target_message_id.clone().ok_or_else(|| {
            FlowError::InvalidInput("Use this command on a message.".to_string())
        })?;

        let pending = PendingInteraction {
            id: Uuid::new_v4(),
            user_id: interaction.user_id.clone(),
            continuation: interaction.continuation(),
            expires_at: Utc::now() + ctx.settings.pending_ttl,
        };
        let pending_id = pending.id;
        let user_id = interaction.user_id.clone();

        let activities = ctx
            .with_index(move |index| {
                index.put_pending(&pending)?;
                index.query_activities(&user_id)
            })
            .await?;
        let names: Vec<String> = activities.into_iter().map(|a| a.activity_name).collect();
        debug!(
            "Starting registration of message {} with {} known activities (pending {})",
            message_id,
            names.len(),
            pending_id
        );

        let components = view::activity_picker(&message_id, &names, pending_id)?;
        ctx.platform
            .respond(
                interaction,
                InteractionResponse::Reply(OutgoingMessage::components(components).ephemeral()),
            )
            .await?;
        Ok(())
    }
}
