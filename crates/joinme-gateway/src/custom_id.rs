//! Opaque identifiers carried through buttons, menus and modals.
//!
//! Every flow step the platform hands back to us is a [`FlowStep`] encoded as
//! `TAG#field#field...` with the shared segment codec, so free-text fields
//! (activity names) are escaped in exactly one place.

use thiserror::Error;
use uuid::Uuid;

use joinme_types::ids::{ChannelId, GuildId, MessageId, UserId};
use joinme_types::keys::{join_segments, split_segments};
use joinme_types::models::MessageKey;

/// Platform limit on component identifiers.
pub const MAX_CUSTOM_ID_LEN: usize = 100;

const SELECT_ACTIVITY: &str = "SELECT_ACTIVITY";
const SELECTED: &str = "SELECTED";
const OPEN_MODAL: &str = "OPEN_MODAL";
const ENTER_ACTIVITY: &str = "ENTER_ACTIVITY";
const PREVIEW: &str = "PREVIEW";
const DELETE: &str = "DELETE";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustomIdError {
    #[error("interaction identifier '{0}'")]
    Unknown(String),

    #[error("interaction identifier '{0}' (malformed)")]
    Malformed(String),

    #[error("identifier of {0} characters exceeds the platform limit")]
    TooLong(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowStep {
    /// The activity select menu itself. The chosen option's value is a
    /// [`FlowStep::Selected`].
    SelectActivity,
    Selected {
        message_id: MessageId,
        activity_name: String,
    },
    /// "Enter activity name" button; opens the text-entry modal.
    OpenModal {
        message_id: MessageId,
        pending_id: Uuid,
    },
    /// Submission of the text-entry modal.
    TextEntry {
        message_id: MessageId,
        pending_id: Uuid,
    },
    Preview(MessageKey),
    Delete(MessageKey),
}

impl FlowStep {
    pub fn encode(&self) -> Result<String, CustomIdError> {
        let encoded = match self {
            Self::SelectActivity => SELECT_ACTIVITY.to_string(),
            Self::Selected {
                message_id,
                activity_name,
            } => join_segments([SELECTED, message_id.as_str(), activity_name.as_str()]),
            Self::OpenModal {
                message_id,
                pending_id,
            } => join_segments([OPEN_MODAL, message_id.as_str(), pending_id.to_string().as_str()]),
            Self::TextEntry {
                message_id,
                pending_id,
            } => join_segments([ENTER_ACTIVITY, message_id.as_str(), pending_id.to_string().as_str()]),
            Self::Preview(key) => encode_key(PREVIEW, key),
            Self::Delete(key) => encode_key(DELETE, key),
        };

        let len = encoded.chars().count();
        if len > MAX_CUSTOM_ID_LEN {
            return Err(CustomIdError::TooLong(len));
        }
        Ok(encoded)
    }

    pub fn decode(custom_id: &str) -> Result<Self, CustomIdError> {
        let malformed = || CustomIdError::Malformed(custom_id.to_string());
        let segments = split_segments(custom_id).map_err(|_| malformed())?;

        let step = match segments.as_slice() {
            [tag] if tag == SELECT_ACTIVITY => Self::SelectActivity,
            [tag, message_id, activity_name] if tag == SELECTED => Self::Selected {
                message_id: MessageId::from(message_id.as_str()),
                activity_name: activity_name.clone(),
            },
            [tag, message_id, pending_id] if tag == OPEN_MODAL => Self::OpenModal {
                message_id: MessageId::from(message_id.as_str()),
                pending_id: Uuid::parse_str(pending_id).map_err(|_| malformed())?,
            },
            [tag, message_id, pending_id] if tag == ENTER_ACTIVITY => Self::TextEntry {
                message_id: MessageId::from(message_id.as_str()),
                pending_id: Uuid::parse_str(pending_id).map_err(|_| malformed())?,
            },
            [tag, guild, user, activity, channel] if tag == PREVIEW || tag == DELETE => {
                let key = MessageKey {
                    guild_id: GuildId::from(guild.as_str()),
                    user_id: UserId::from(user.as_str()),
                    activity_name: activity.clone(),
                    channel_id: ChannelId::from(channel.as_str()),
                };
                if tag == PREVIEW {
                    Self::Preview(key)
                } else {
                    Self::Delete(key)
                }
            }
            [tag, ..]
                if [SELECT_ACTIVITY, SELECTED, OPEN_MODAL, ENTER_ACTIVITY, PREVIEW, DELETE]
                    .contains(&tag.as_str()) =>
            {
                return Err(malformed());
            }
            _ => return Err(CustomIdError::Unknown(custom_id.to_string())),
        };

        Ok(step)
    }
}

fn encode_key(tag: &str, key: &MessageKey) -> String {
    join_segments([
        tag,
        key.guild_id.as_str(),
        key.user_id.as_str(),
        key.activity_name.as_str(),
        key.channel_id.as_str(),
    ])
}
