use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

use joinme_types::api::{
    CommandDefinition, InteractionResponse, OptionDefinition, OutgoingMessage,
};
use joinme_types::events::{CommandCall, CommandKind, CommandOption, Interaction};

use crate::context::HandlerContext;
use crate::error::FlowError;

use super::autocomplete::{SilenceFilter, registered_activities};
use super::{CommandHandler, guild_scope, optional_activity};

const SILENCE_FOR_CHOICES: [&str; 4] = ["1 hour", "3 hours", "1 day", "1 week"];

/// Silences the user's messages in the current channel, optionally for one
/// activity and optionally for a limited time.
pub struct Silence;

/// Reverses [`Silence`].
pub struct Unsilence;

fn silence_duration(choice: &str) -> Option<TimeDelta> {
    match choice {
        "1 hour" => Some(TimeDelta::hours(1)),
        "3 hours" => Some(TimeDelta::hours(3)),
        "1 day" => Some(TimeDelta::days(1)),
        "1 week" => Some(TimeDelta::weeks(1)),
        _ => None,
    }
}

/// Stand-in for "until unsilenced": the last second of year 9999.
fn forever() -> DateTime<Utc> {
    DateTime::from_timestamp(253_402_300_799, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Sets `silenced_until` on every matching registration in the channel and
/// returns the names of the activities touched.
async fn set_silenced_until(
    ctx: &HandlerContext,
    interaction: &Interaction,
    activity: Option<String>,
    until: Option<DateTime<Utc>>,
) -> Result<Vec<String>, FlowError> {
    let (guild_id, channel_id) = guild_scope(interaction)?;
    let user_id = interaction.user_id.clone();

    ctx.with_index(move |index| {
        let messages = index.query(&guild_id, &user_id, Some(&channel_id), activity.as_deref())?;
        let mut names = Vec::with_capacity(messages.len());
        for mut message in messages {
            message.silenced_until = until;
            index.put(&message)?;
            names.push(message.activity_name);
        }
        Ok(names)
    })
    .await
}

#[async_trait]
impl CommandHandler for Silence {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition {
            kind: CommandKind::Slash,
            name: "silence".to_string(),
            description: "Silences your messages that would be sent in this channel".to_string(),
            options: vec![
                OptionDefinition::string("activity", "Only silence this activity").autocomplete(),
                OptionDefinition::string("for", "How long to silence for (default: until unsilenced)")
                    .choices(&SILENCE_FOR_CHOICES),
            ],
        }
    }

    async fn invoke(
        &self,
        ctx: &HandlerContext,
        interaction: &Interaction,
        call: &CommandCall,
    ) -> Result<(), FlowError> {
        let activity = optional_activity(call)?;
        let until = match call.option("for") {
            Some(choice) => {
                let duration = silence_duration(choice).ok_or_else(|| {
                    FlowError::InvalidInput(format!(
                        "`{choice}` is not a valid duration. Choose one of: {}.",
                        SILENCE_FOR_CHOICES.join(", ")
                    ))
                })?;
                Utc::now() + duration
            }
            None => forever(),
        };

        let names = set_silenced_until(ctx, interaction, activity, Some(until)).await?;
        info!("User {} silenced {} message(s) until {}", interaction.user_id, names.len(), until);

        let text = if names.is_empty() {
            "🤔 No registered messages found, so none silenced.".to_string()
        } else {
            let until_text = if until == forever() {
                "until you unsilence it".to_string()
            } else {
                format!("until {}", until.format("%A, %B %d, %Y at %H:%M UTC"))
            };
            let lines: Vec<String> = names
                .iter()
                .map(|name| format!("- `{name}` {until_text}"))
                .collect();
            format!("### 🤫 The following activities were silenced\n{}", lines.join("\n"))
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
        registered_activities(ctx, interaction, &focused.value, SilenceFilter::Unsilenced).await
    }
}

#[async_trait]
impl CommandHandler for Unsilence {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition {
            kind: CommandKind::Slash,
            name: "unsilence".to_string(),
            description: "Unsilences your messages that would be sent in this channel".to_string(),
            options: vec![
                OptionDefinition::string("activity", "Only unsilence this activity").autocomplete(),
            ],
        }
    }

    async fn invoke(
        &self,
        ctx: &HandlerContext,
        interaction: &Interaction,
        call: &CommandCall,
    ) -> Result<(), FlowError> {
        let activity = optional_activity(call)?;
        let names = set_silenced_until(ctx, interaction, activity, None).await?;
        info!("User {} unsilenced {} message(s)", interaction.user_id, names.len());

        let text = if names.is_empty() {
            "🤔 No registered messages found, so none unsilenced.".to_string()
        } else {
            let lines: Vec<String> = names.iter().map(|name| format!("- `{name}`")).collect();
            format!("### 🌞 The following activities were unsilenced\n{}", lines.join("\n"))
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
        registered_activities(ctx, interaction, &focused.value, SilenceFilter::Silenced).await
    }
}
