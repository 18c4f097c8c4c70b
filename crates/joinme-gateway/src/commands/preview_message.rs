use async_trait::async_trait;

use joinme_types::api::{CommandDefinition, InteractionResponse, OptionDefinition};
use joinme_types::events::{CommandCall, CommandKind, CommandOption, Interaction};
use joinme_types::models::MessageKey;

use crate::context::HandlerContext;
use crate::error::FlowError;
use crate::view;

use super::autocomplete::{SilenceFilter, registered_activities};
use super::{CommandHandler, guild_scope, required_activity};

pub struct PreviewMessage;

#[async_trait]
impl CommandHandler for PreviewMessage {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition {
            kind: CommandKind::Slash,
            name: "preview-message".to_string(),
            description: "Shows the message that will be sent when you start an activity"
                .to_string(),
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

        preview(ctx, interaction, key).await
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

/// Replies privately with exactly what would be delivered for `key`. Shared
/// with the Preview button.
pub(crate) async fn preview(
    ctx: &HandlerContext,
    interaction: &Interaction,
    key: MessageKey,
) -> Result<(), FlowError> {
    let activity_name = key.activity_name.clone();
    let message = ctx
        .with_index(move |index| index.get(&key))
        .await?
        .ok_or_else(|| {
            FlowError::NotFound(format!(
                "No message is registered for `{activity_name}` in this channel."
            ))
        })?;

    ctx.platform
        .respond(
            interaction,
            InteractionResponse::Reply(view::delivery_message(&message).ephemeral()),
        )
        .await?;
    Ok(())
}
