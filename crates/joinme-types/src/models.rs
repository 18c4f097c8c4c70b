use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::{ApplicationId, ChannelId, GuildId, UserId};

/// Longest activity name accepted from users. Names are offered back as
/// autocomplete choices, which the platform caps at 100 characters.
pub const MAX_ACTIVITY_NAME_LEN: usize = 100;

/// Trims a user-supplied activity name, rejecting empty or oversized names.
pub fn normalize_activity_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_ACTIVITY_NAME_LEN {
        return None;
    }
    Some(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// The unique tuple identifying a [`RegisteredMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageKey {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub activity_name: String,
    pub channel_id: ChannelId,
}

/// Content a user has bound to an activity, delivered to `channel_id` whenever
/// the user starts that activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredMessage {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub activity_name: String,
    pub content: String,
    /// Upload order. Urls point at durable storage, never at the platform.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub silenced_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RegisteredMessage {
    pub fn key(&self) -> MessageKey {
        MessageKey {
            guild_id: self.guild_id.clone(),
            user_id: self.user_id.clone(),
            activity_name: self.activity_name.clone(),
            channel_id: self.channel_id.clone(),
        }
    }

    pub fn is_silenced_at(&self, now: DateTime<Utc>) -> bool {
        self.silenced_until.is_some_and(|until| until > now)
    }
}

/// A user was seen doing `activity_name` at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedActivity {
    pub user_id: UserId,
    pub activity_name: String,
}

/// Handle that lets a later interaction edit the reply of an earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationHandle {
    pub application_id: ApplicationId,
    pub token: String,
}

/// Server-side continuation for a flow step that is resumed by a different
/// interaction than the one that started it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInteraction {
    pub id: Uuid,
    pub user_id: UserId,
    pub continuation: ContinuationHandle,
    pub expires_at: DateTime<Utc>,
}

impl PendingInteraction {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
