use serde::{Deserialize, Serialize};

use crate::ids::{ApplicationId, ChannelId, GuildId, InteractionId, MessageId, UserId};
use crate::models::ContinuationHandle;

/// Events delivered by the platform transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InboundEvent {
    /// A user interacted with a command, menu, button, modal or autocomplete field
    Interaction(Interaction),

    /// A user's activity set changed
    PresenceUpdate(PresenceUpdate),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: InteractionId,
    pub application_id: ApplicationId,
    /// Short-lived token used to answer or later edit this interaction.
    pub token: String,
    pub user_id: UserId,
    pub guild_id: Option<GuildId>,
    pub channel_id: Option<ChannelId>,
    pub kind: InteractionKind,
}

impl Interaction {
    pub fn continuation(&self) -> ContinuationHandle {
        ContinuationHandle {
            application_id: self.application_id.clone(),
            token: self.token.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Slash,
    MessageContextMenu,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slash => "slash",
            Self::MessageContextMenu => "message_context_menu",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandCall {
    pub kind: CommandKind,
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    /// Set for message context-menu commands.
    #[serde(default)]
    pub target_message_id: Option<MessageId>,
}

impl CommandCall {
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.name == name)
            .map(|option| option.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalField {
    pub custom_id: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionKind {
    Command(CommandCall),
    SelectMenu {
        custom_id: String,
        values: Vec<String>,
    },
    Button {
        custom_id: String,
        /// Components of the message the button belongs to, as last rendered.
        #[serde(default)]
        message_components: Vec<crate::api::Component>,
    },
    ModalSubmit {
        custom_id: String,
        fields: Vec<ModalField>,
    },
    Autocomplete {
        command: CommandCall,
        focused: CommandOption,
    },
}

impl InteractionKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Command(_) => "command",
            Self::SelectMenu { .. } => "select_menu",
            Self::Button { .. } => "button",
            Self::ModalSubmit { .. } => "modal_submit",
            Self::Autocomplete { .. } => "autocomplete",
        }
    }
}

/// A user's activity set changed. `guild_id` is absent when the platform
/// reports the change outside of any guild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceUpdate {
    pub user_id: UserId,
    pub guild_id: Option<GuildId>,
    #[serde(default)]
    pub previous: Vec<String>,
    #[serde(default)]
    pub activities: Vec<String>,
}
