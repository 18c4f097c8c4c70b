use async_trait::async_trait;

use joinme_types::api::{
    CommandDefinition, InteractionResponse, OptionDefinition, OutgoingMessage,
};
use joinme_types::events::{CommandCall, CommandKind, CommandOption, Interaction};

use crate::context::HandlerContext;
use crate::error::FlowError;
use crate::view::ListView;

use super::autocomplete::{SilenceFilter, registered_activities};
use super::{CommandHandler, guild_scope, optional_activity};

pub struct ListMessages;

#[async_trait]
impl CommandHandler for ListMessages {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition {
            kind: CommandKind::Slash,
            name: "list-messages".to_string(),
            description: "Lists your messages registered in this channel".to_string(),
            options: vec![
                OptionDefinition::string("activity", "Only list messages for this activity")
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

        let query_activity = activity.clone();
        let messages = ctx
            .with_index(move |index| {
                index.query(&guild_id, &user_id, Some(&channel_id), query_activity.as_deref())
            })
            .await?;

        let reply = if messages.is_empty() {
            let scope = match &activity {
                Some(activity) => format!(" for `{activity}`"),
                None => String::new(),
            };
            OutgoingMessage::content(format!(
                "🤔 You have no messages registered{scope} in this channel."
            ))
        } else {
            let view = ListView::from_messages("## 📋 Your messages in this channel", &messages);
            OutgoingMessage::components(view.render())
        };

        ctx.platform
            .respond(interaction, InteractionResponse::Reply(reply.ephemeral()))
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
