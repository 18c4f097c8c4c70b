//! Command Dispatcher: one handler per `(kind, name)`, fixed at startup.

mod autocomplete;
mod list_messages;
mod ping;
mod preview_message;
mod register_message;
mod remove_message;
mod remove_messages;
mod silence;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use joinme_types::api::CommandDefinition;
use joinme_types::events::{CommandCall, CommandKind, CommandOption, Interaction};
use joinme_types::ids::{ChannelId, GuildId};
use joinme_types::models::normalize_activity_name;

use crate::context::HandlerContext;
use crate::error::FlowError;

pub use list_messages::ListMessages;
pub use ping::Ping;
pub use preview_message::PreviewMessage;
pub(crate) use preview_message::preview;
pub use register_message::RegisterMessage;
pub use remove_message::RemoveMessage;
pub use remove_messages::RemoveMessages;
pub use silence::{Silence, Unsilence};

#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn definition(&self) -> CommandDefinition;

    async fn invoke(
        &self,
        ctx: &HandlerContext,
        interaction: &Interaction,
        call: &CommandCall,
    ) -> Result<(), FlowError>;

    /// Suggestions for the focused option. Commands without autocompleted
    /// options keep the default.
    async fn autocomplete(
        &self,
        _ctx: &HandlerContext,
        _interaction: &Interaction,
        _focused: &CommandOption,
    ) -> Result<Vec<String>, FlowError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate {} command '{name}'", .kind.as_str())]
    Duplicate { kind: CommandKind, name: String },
}

pub struct CommandRegistry {
    handlers: Vec<Arc<dyn CommandHandler>>,
    by_name: HashMap<(CommandKind, String), usize>,
}

impl CommandRegistry {
    /// Fails if two handlers share a kind and name.
    pub fn new(handlers: Vec<Arc<dyn CommandHandler>>) -> Result<Self, RegistryError> {
        let mut by_name = HashMap::with_capacity(handlers.len());
        for (i, handler) in handlers.iter().enumerate() {
            let definition = handler.definition();
            if by_name
                .insert((definition.kind, definition.name.clone()), i)
                .is_some()
            {
                return Err(RegistryError::Duplicate {
                    kind: definition.kind,
                    name: definition.name,
                });
            }
        }
        Ok(Self { handlers, by_name })
    }

    pub fn with_default_commands() -> Result<Self, RegistryError> {
        Self::new(vec![
            Arc::new(Ping),
            Arc::new(RegisterMessage),
            Arc::new(ListMessages),
            Arc::new(PreviewMessage),
            Arc::new(RemoveMessage),
            Arc::new(RemoveMessages),
            Arc::new(Silence),
            Arc::new(Unsilence),
        ])
    }

    pub fn get(&self, kind: CommandKind, name: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.by_name
            .get(&(kind, name.to_string()))
            .map(|&i| &self.handlers[i])
    }

    /// Definitions in registration order, for publishing to the platform.
    pub fn definitions(&self) -> Vec<CommandDefinition> {
        self.handlers.iter().map(|h| h.definition()).collect()
    }
}

/// Guild and channel the interaction happened in.
pub(crate) fn guild_scope(interaction: &Interaction) -> Result<(GuildId, ChannelId), FlowError> {
    match (&interaction.guild_id, &interaction.channel_id) {
        (Some(guild_id), Some(channel_id)) => Ok((guild_id.clone(), channel_id.clone())),
        _ => Err(FlowError::MissingGuild),
    }
}

pub(crate) fn optional_activity(call: &CommandCall) -> Result<Option<String>, FlowError> {
    call.option("activity")
        .map(|raw| {
            normalize_activity_name(raw)
                .ok_or_else(|| FlowError::InvalidInput(invalid_activity_name(raw)))
        })
        .transpose()
}

pub(crate) fn required_activity(call: &CommandCall) -> Result<String, FlowError> {
    optional_activity(call)?
        .ok_or_else(|| FlowError::InvalidInput("An activity name is required.".to_string()))
}

pub(crate) fn invalid_activity_name(raw: &str) -> String {
    format!(
        "`{}` is not a valid activity name. Names must be 1 to {} characters.",
        raw.trim(),
        joinme_types::models::MAX_ACTIVITY_NAME_LEN
    )
}
