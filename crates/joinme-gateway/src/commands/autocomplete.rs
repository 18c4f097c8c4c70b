use chrono::{DateTime, Utc};

use joinme_types::events::Interaction;
use joinme_types::models::RegisteredMessage;

use crate::context::HandlerContext;
use crate::error::FlowError;
use crate::view::MAX_SELECT_OPTIONS;

use super::guild_scope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SilenceFilter {
    Any,
    Silenced,
    Unsilenced,
}

/// Distinct names of the activities the user has messages for in the current
/// channel, case-insensitively prefixed by `partial`.
pub(crate) async fn registered_activities(
    ctx: &HandlerContext,
    interaction: &Interaction,
    partial: &str,
    filter: SilenceFilter,
) -> Result<Vec<String>, FlowError> {
    let (guild_id, channel_id) = guild_scope(interaction)?;
    let user_id = interaction.user_id.clone();

    let messages = ctx
        .with_index(move |index| index.query(&guild_id, &user_id, Some(&channel_id), None))
        .await?;

    Ok(matching_names(messages, partial, filter, Utc::now()))
}

fn matching_names(
    messages: Vec<RegisteredMessage>,
    partial: &str,
    filter: SilenceFilter,
    now: DateTime<Utc>,
) -> Vec<String> {
    let needle = partial.trim().to_lowercase();

    let mut names: Vec<String> = messages
        .into_iter()
        .filter(|message| match filter {
            SilenceFilter::Any => true,
            SilenceFilter::Silenced => message.is_silenced_at(now),
            SilenceFilter::Unsilenced => !message.is_silenced_at(now),
        })
        .map(|message| message.activity_name)
        .filter(|name| name.to_lowercase().starts_with(&needle))
        .collect();

    names.sort();
    names.dedup();
    names.truncate(MAX_SELECT_OPTIONS);
    names
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use joinme_types::ids::{ChannelId, GuildId, UserId};

    use super::*;

    fn message(activity: &str, silenced_until: Option<DateTime<Utc>>) -> RegisteredMessage {
        RegisteredMessage {
            guild_id: GuildId::from("1"),
            user_id: UserId::from("2"),
            channel_id: ChannelId::from("3"),
            activity_name: activity.to_string(),
            content: String::new(),
            attachments: Vec::new(),
            silenced_until,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn prefix_match_ignores_case() {
        let now = Utc::now();
        let messages = vec![
            message("Chess", None),
            message("checkers", None),
            message("Go", None),
        ];

        let names = matching_names(messages, "CH", SilenceFilter::Any, now);
        assert_eq!(names, vec!["Chess", "checkers"]);
    }

    #[test]
    fn silence_filter_splits_by_current_state() {
        let now = Utc::now();
        let messages = vec![
            message("Chess", Some(now + TimeDelta::hours(1))),
            message("Go", Some(now - TimeDelta::hours(1))),
            message("Poker", None),
        ];

        assert_eq!(
            matching_names(messages.clone(), "", SilenceFilter::Silenced, now),
            vec!["Chess"]
        );
        assert_eq!(
            matching_names(messages, "", SilenceFilter::Unsilenced, now),
            vec!["Go", "Poker"]
        );
    }

    #[test]
    fn results_are_capped() {
        let now = Utc::now();
        let messages = (0..30).map(|i| message(&format!("Game {i:02}"), None)).collect();

        assert_eq!(matching_names(messages, "game", SilenceFilter::Any, now).len(), MAX_SELECT_OPTIONS);
    }
}
