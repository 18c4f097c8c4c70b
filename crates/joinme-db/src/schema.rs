//! Key layout of the single keyed table.
//!
//! | record             | partition key     | sort key                              |
//! |--------------------|-------------------|---------------------------------------|
//! | RegisteredMessage  | `GUILD#{guild}`   | `MESSAGE#{user}#{activity}#{channel}` |
//! | ObservedActivity   | `USER#{user}`     | `ACTIVITY#{activity}`                 |
//! | PendingInteraction | `PENDING#{id}`    | `PENDING`                             |
//!
//! With the message sort key ordered user, activity, channel:
//!
//! - user in guild: prefix `MESSAGE#{user}#`
//! - user + activity in guild: prefix `MESSAGE#{user}#{activity}#`
//! - user + activity + channel: point lookup
//! - user + channel in guild: prefix `MESSAGE#{user}#` plus an in-memory
//!   channel filter (a full scan of the user's rows in that guild)

use joinme_types::ids::{ChannelId, GuildId, UserId};
use joinme_types::keys::{DELIMITER, escape_segment, join_segments};
use uuid::Uuid;

const GUILD: &str = "GUILD";
const USER: &str = "USER";
const PENDING: &str = "PENDING";
const MESSAGE: &str = "MESSAGE";
const ACTIVITY: &str = "ACTIVITY";

pub fn guild_partition(guild_id: &GuildId) -> String {
    join_segments([GUILD, guild_id.as_str()])
}

pub fn user_partition(user_id: &UserId) -> String {
    join_segments([USER, user_id.as_str()])
}

pub fn pending_partition(id: &Uuid) -> String {
    join_segments([PENDING, id.to_string().as_str()])
}

pub fn pending_sort() -> &'static str {
    PENDING
}

pub fn message_sort(user_id: &UserId, activity_name: &str, channel_id: &ChannelId) -> String {
    join_segments([MESSAGE, user_id.as_str(), activity_name, channel_id.as_str()])
}

/// Prefix matching every message of a user, optionally narrowed to one activity.
pub fn message_prefix(user_id: &UserId, activity_name: Option<&str>) -> String {
    let mut prefix = join_segments([MESSAGE, user_id.as_str()]);
    prefix.push(DELIMITER);
    if let Some(activity_name) = activity_name {
        prefix.push_str(&escape_segment(activity_name));
        prefix.push(DELIMITER);
    }
    prefix
}

pub fn activity_sort(activity_name: &str) -> String {
    join_segments([ACTIVITY, activity_name])
}

pub fn activity_prefix() -> String {
    let mut prefix = ACTIVITY.to_string();
    prefix.push(DELIMITER);
    prefix
}
