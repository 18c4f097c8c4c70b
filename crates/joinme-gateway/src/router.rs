//! Interaction Router: decides which handler an inbound interaction belongs
//! to, runs it, and turns any failure into a visible answer.

use std::sync::Arc;

use tracing::{Instrument, debug, error, info, info_span, warn};

use joinme_types::api::{Choice, Component, InteractionResponse, OutgoingMessage};
use joinme_types::events::{CommandCall, CommandOption, Interaction, InteractionKind, ModalField};
use joinme_types::models::MessageKey;

use crate::commands::{self, CommandRegistry};
use crate::context::HandlerContext;
use crate::custom_id::FlowStep;
use crate::error::FlowError;
use crate::flow;
use crate::view::ListView;

const MAX_CHOICE_LEN: usize = 100;

#[derive(Clone)]
pub struct InteractionRouter {
    ctx: HandlerContext,
    commands: Arc<CommandRegistry>,
}

impl InteractionRouter {
    pub fn new(ctx: HandlerContext, commands: Arc<CommandRegistry>) -> Self {
        Self { ctx, commands }
    }

    pub fn context(&self) -> &HandlerContext {
        &self.ctx
    }

    /// Handles one interaction to completion. Never fails: errors are logged
    /// and reported back to the user.
    pub async fn handle(&self, interaction: Interaction) {
        let span = info_span!(
            "interaction",
            id = %interaction.id,
            user = %interaction.user_id,
            kind = interaction.kind.name()
        );

        async {
            if let Err(e) = self.dispatch(&interaction).await {
                self.report(&interaction, e).await;
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, interaction: &Interaction) -> Result<(), FlowError> {
        match &interaction.kind {
            InteractionKind::Command(call) => self.command(interaction, call).await,
            InteractionKind::Autocomplete { command, focused } => {
                self.autocomplete(interaction, command, focused).await
            }
            InteractionKind::SelectMenu { custom_id, values } => {
                self.select_menu(interaction, custom_id, values).await
            }
            InteractionKind::Button {
                custom_id,
                message_components,
            } => self.button(interaction, custom_id, message_components).await,
            InteractionKind::ModalSubmit { custom_id, fields } => {
                self.modal_submit(interaction, custom_id, fields).await
            }
        }
    }

    async fn command(&self, interaction: &Interaction, call: &CommandCall) -> Result<(), FlowError> {
        let handler = self.commands.get(call.kind, &call.name).ok_or_else(|| {
            FlowError::Unroutable(format!("'{}' command: {}", call.kind.as_str(), call.name))
        })?;
        debug!("Running {} command '{}'", call.kind.as_str(), call.name);
        handler.invoke(&self.ctx, interaction, call).await
    }

    /// Autocomplete cannot show an error, so failures degrade to no choices.
    async fn autocomplete(
        &self,
        interaction: &Interaction,
        call: &CommandCall,
        focused: &CommandOption,
    ) -> Result<(), FlowError> {
        let names = match self.commands.get(call.kind, &call.name) {
            Some(handler) => handler
                .autocomplete(&self.ctx, interaction, focused)
                .await
                .unwrap_or_else(|e| {
                    if e.is_expected() {
                        debug!("No autocomplete for '{}': {}", call.name, e);
                    } else {
                        error!("Autocomplete for '{}' failed: {}", call.name, e);
                    }
                    Vec::new()
                }),
            None => {
                warn!("Autocomplete for unknown {} command '{}'", call.kind.as_str(), call.name);
                Vec::new()
            }
        };

        let choices = names
            .into_iter()
            .filter(|name| name.chars().count() <= MAX_CHOICE_LEN)
            .map(|name| Choice {
                name: name.clone(),
                value: name,
            })
            .collect();

        self.ctx
            .platform
            .respond(interaction, InteractionResponse::Autocomplete(choices))
            .await?;
        Ok(())
    }

    async fn select_menu(
        &self,
        interaction: &Interaction,
        custom_id: &str,
        values: &[String],
    ) -> Result<(), FlowError> {
        if FlowStep::decode(custom_id)? != FlowStep::SelectActivity {
            return Err(FlowError::Unroutable(format!("select menu '{custom_id}'")));
        }

        let value = values
            .first()
            .ok_or_else(|| FlowError::InvalidInput("Pick an activity first.".to_string()))?;

        match FlowStep::decode(value)? {
            FlowStep::Selected {
                message_id,
                activity_name,
            } => flow::finish_selected(&self.ctx, interaction, &message_id, activity_name).await,
            _ => Err(FlowError::Unroutable(format!("select option '{value}'"))),
        }
    }

    async fn button(
        &self,
        interaction: &Interaction,
        custom_id: &str,
        message_components: &[Component],
    ) -> Result<(), FlowError> {
        match FlowStep::decode(custom_id)? {
            FlowStep::OpenModal {
                message_id,
                pending_id,
            } => flow::open_text_entry(&self.ctx, interaction, &message_id, pending_id).await,
            FlowStep::Preview(key) => {
                ensure_owner(interaction, &key)?;
                commands::preview(&self.ctx, interaction, key).await
            }
            FlowStep::Delete(key) => {
                ensure_owner(interaction, &key)?;
                self.delete_from_list(interaction, key, message_components).await
            }
            _ => Err(FlowError::Unroutable(format!("button '{custom_id}'"))),
        }
    }

    async fn modal_submit(
        &self,
        interaction: &Interaction,
        custom_id: &str,
        fields: &[ModalField],
    ) -> Result<(), FlowError> {
        match FlowStep::decode(custom_id)? {
            FlowStep::TextEntry {
                message_id,
                pending_id,
            } => {
                flow::submit_text_entry(&self.ctx, interaction, &message_id, pending_id, fields)
                    .await
            }
            _ => Err(FlowError::Unroutable(format!("form '{custom_id}'"))),
        }
    }

    /// Deletes the registration and re-renders the list the button was on with
    /// that card struck through.
    async fn delete_from_list(
        &self,
        interaction: &Interaction,
        key: MessageKey,
        message_components: &[Component],
    ) -> Result<(), FlowError> {
        let doomed = key.clone();
        self.ctx
            .with_index(move |index| index.delete_one(&doomed))
            .await?;
        info!("Deleted message for activity '{}' in channel {}", key.activity_name, key.channel_id);

        let response = match ListView::parse(message_components) {
            Some(view) => InteractionResponse::Update(OutgoingMessage::components(
                view.with_deleted(&key).render(),
            )),
            None => {
                debug!("Button message is not a message list; replying instead");
                InteractionResponse::Reply(
                    OutgoingMessage::content(format!(
                        "🗑️ Removed your message for `{}`.",
                        key.activity_name
                    ))
                    .ephemeral(),
                )
            }
        };

        self.ctx.platform.respond(interaction, response).await?;
        Ok(())
    }

    async fn report(&self, interaction: &Interaction, e: FlowError) {
        match &e {
            FlowError::NotFound(_) | FlowError::Expired(_) | FlowError::InvalidInput(_) => {
                info!("Interaction ended early: {}", e)
            }
            e if e.is_expected() => warn!("Interaction refused: {}", e),
            e => error!("Interaction failed: {}", e),
        }

        if matches!(interaction.kind, InteractionKind::Autocomplete { .. }) {
            return;
        }

        let message = OutgoingMessage::content(e.user_message()).ephemeral();
        let platform = &self.ctx.platform;
        if let Err(reply_err) = platform
            .respond(interaction, InteractionResponse::Reply(message.clone()))
            .await
        {
            debug!("Error reply failed ({}); sending as follow-up", reply_err);
            if let Err(follow_up_err) = platform.follow_up(interaction, message).await {
                warn!("Could not tell user about the failure: {}", follow_up_err);
            }
        }
    }
}

fn ensure_owner(interaction: &Interaction, key: &MessageKey) -> Result<(), FlowError> {
    if key.user_id != interaction.user_id {
        return Err(FlowError::Forbidden(interaction.user_id.clone()));
    }
    Ok(())
}
