use serde::{Deserialize, Serialize};

use crate::events::CommandKind;
use crate::ids::{ChannelId, GuildId, MessageId};
use crate::models::Attachment;

// -- Components --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

/// UI components in the transport's format. Rendered from view-models, never
/// edited after the fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    TextDisplay {
        content: String,
    },
    File {
        name: String,
        url: String,
    },
    Button {
        custom_id: String,
        label: String,
        style: ButtonStyle,
        disabled: bool,
    },
    StringSelect {
        custom_id: String,
        placeholder: String,
        options: Vec<SelectOption>,
    },
    ActionRow {
        components: Vec<Component>,
    },
    Container {
        components: Vec<Component>,
    },
}

impl Component {
    pub fn text(content: impl Into<String>) -> Self {
        Self::TextDisplay {
            content: content.into(),
        }
    }
}

// -- Outbound messages --

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub ephemeral: bool,
}

impl OutgoingMessage {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn components(components: Vec<Component>) -> Self {
        Self {
            components,
            ..Self::default()
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextInput {
    pub custom_id: String,
    pub label: String,
    pub required: bool,
    pub max_length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modal {
    pub custom_id: String,
    pub title: String,
    pub inputs: Vec<TextInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub name: String,
    pub value: String,
}

/// Direct answer to an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InteractionResponse {
    /// New visible response
    Reply(OutgoingMessage),
    /// In-place edit of the message whose control triggered the interaction
    Update(OutgoingMessage),
    /// Acknowledge without changing anything
    DeferUpdate,
    Modal(Modal),
    Autocomplete(Vec<Choice>),
}

// -- Platform lookups --

/// A message fetched from the platform. Attachment urls are ephemeral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub guild_id: Option<GuildId>,
    /// Whether the bot may post messages there.
    pub sendable: bool,
}

// -- Command definitions --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub autocomplete: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl OptionDefinition {
    pub fn string(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required: false,
            autocomplete: false,
            choices: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn autocomplete(mut self) -> Self {
        self.autocomplete = true;
        self
    }

    pub fn choices(mut self, choices: &[&str]) -> Self {
        self.choices = choices.iter().map(|c| c.to_string()).collect();
        self
    }
}

/// What gets published to the platform so users can invoke a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub kind: CommandKind,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDefinition>,
}
