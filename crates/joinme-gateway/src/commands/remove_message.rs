use async_trait::async_trait;
use tracing::info;

use joinme_types::api::{
    CommandDefinition, InteractionResponse, OptionDefinition, OutgoingMessage,
};
use joinme_types::events::{CommandCall, CommandKind, CommandOption, Interaction};
use joinme_types::models::MessageKey;

use crate::context::HandlerContext;
use crate::error::FlowError;

use super::autocomplete::{SilenceFilter, registered_activities};
use super::{CommandHandler, guild_scope, required_activity};

pub struct RemoveMessage;

#[async_trait]
impl CommandHandler for RemoveMessage {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition {
            kind: CommandKind::Slash,
            name: "remove-message".to_string(),
            description: "Removes your message for an activity in this channel".to_string(),
            options: vec![
                OptionDefinition::string("activity", "The activity the message is registered for")
                    .required()
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
        let key = MessageKey {
            guild_id,
            user_id: interaction.user_id.clone(),
            activity_name: required_activity(call)?,
            channel_id,
        };
        let activity_name = key.activity_name.clone();

        let existed = ctx
            .with_index(move |index| {
                let existed = index.get(&key)?.is_some();
                index.delete_one(&key)?;
                Ok(existed)
            })
            .await?;

        if !existed {
            return Err(FlowError::NotFound(format!(
                "No message is registered for `{activity_name}` in this channel."
            )));
        }
        info!("User {} removed message for {}", interaction.user_id, activity_name);

        ctx.platform
            .respond(
                interaction,
                InteractionResponse::Reply(
                    OutgoingMessage::content(format!("🗑️ Removed your message for `{activity_name}`."))
                        .ephemeral(),
                ),
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
