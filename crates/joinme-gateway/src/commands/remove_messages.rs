use async_trait::async_trait;
use tracing::info;

use joinme_types::api::{
    CommandDefinition, InteractionResponse, OptionDefinition, OutgoingMessage,
};
use joinme_types::events::{CommandCall, CommandKind, CommandOption, Interaction};

use crate::context::HandlerContext;
use crate::error::FlowError;

use super::autocomplete::{SilenceFilter, registered_activities};
use super::{CommandHandler, guild_scope, optional_activity};

pub struct RemoveMessages;

#[async_trait]
impl CommandHandler for RemoveMessages {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition {
            kind: CommandKind::Slash,
            name: "remove-messages".to_string(),
            description: "Removes all of your messages in this channel".to_string(),
            options: vec![
                OptionDefinition::string("activity", "Only remove messages for this activity")
                    .autocomplete(),
            ],
        }
    }

    async fn invoke(
        &self,
        ctx: &HandlerContext,
        interaction: &Interaction,
        call: &CommandCall,
    ) -> Result<(), FlowError> {
        let (guild_id, channel_id) = guild_scope(interaction)?;
        let activity = optional_activity(call)?;
        let user_id = interaction.user_id.clone();

        let removed = ctx
            .with_index(move |index| {
                index.delete_many(&guild_id, &user_id, activity.as_deref(), Some(&channel_id))
            })
            .await?;
        info!("User {} removed {} message(s)", interaction.user_id, removed);

        let text = match removed {
            0 => "🤔 You have no messages to remove in this channel.".to_string(),
            1 => "🗑️ Removed 1 message.".to_string(),
            n => format!("🗑️ Removed {n} messages."),
        };

        ctx.platform
            .respond(
                interaction,
                InteractionResponse::Reply(OutgoingMessage::content(text).ephemeral()),
            )
            .await?;
        Ok(())
    }

    async fn autocomplete(
        &self,
        ctx: &HandlerContext,
        interaction: &Interaction,
        focused: &CommandOption,
    ) -> Result<Vec<String>, FlowError> {
        registered_activities(ctx, interaction, &focused.value, SilenceFilter::Any).await
    }
}
