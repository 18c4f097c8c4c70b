//! Activity Matcher: turns presence changes into deliveries of registered
//! messages.

use std::collections::HashSet;

use chrono::Utc;
use futures_util::future::join_all;
use rand::seq::IndexedRandom;
use thiserror::Error;
use tracing::{Instrument, debug, error, info, info_span, warn};

use joinme_types::events::PresenceUpdate;
use joinme_types::ids::ChannelId;
use joinme_types::models::{MessageKey, RegisteredMessage};

use crate::context::HandlerContext;
use crate::platform::PlatformError;
use crate::view;

/// Pseudo-activity the platform reports for a user's status text.
pub const STATUS_PSEUDO_ACTIVITY: &str = "Custom Status";

/// What to do when one started activity has registrations in several channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryPolicy {
    /// Every registered channel receives its message.
    #[default]
    All,
    /// One registered channel, chosen uniformly at random.
    RandomOne,
}

impl DeliveryPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "random" => Some(Self::RandomOne),
            _ => None,
        }
    }

    fn select(self, candidates: Vec<RegisteredMessage>) -> Vec<RegisteredMessage> {
        match self {
            Self::All => candidates,
            Self::RandomOne => candidates
                .choose(&mut rand::rng())
                .cloned()
                .into_iter()
                .collect(),
        }
    }
}

#[derive(Debug, Error)]
enum DeliveryError {
    #[error("channel {0} not found")]
    ChannelMissing(ChannelId),

    #[error("channel {0} does not accept messages from us")]
    NotSendable(ChannelId),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Outcome of one presence update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchReport {
    pub started: Vec<String>,
    pub delivered: Vec<MessageKey>,
    pub failed: Vec<MessageKey>,
}

/// Names in `current` but not in `previous`, in order of appearance, without
/// duplicates or the status pseudo-activity.
pub fn started_activities(previous: &[String], current: &[String]) -> Vec<String> {
    let previous: HashSet<&str> = previous.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();

    current
        .iter()
        .map(String::as_str)
        .filter(|name| *name != STATUS_PSEUDO_ACTIVITY)
        .filter(|name| !previous.contains(name))
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

#[derive(Clone)]
pub struct ActivityMatcher {
    ctx: HandlerContext,
    policy: DeliveryPolicy,
}

impl ActivityMatcher {
    pub fn new(ctx: HandlerContext, policy: DeliveryPolicy) -> Self {
        Self { ctx, policy }
    }

    pub async fn handle(&self, update: PresenceUpdate) -> MatchReport {
        let span = info_span!(
            "presence",
            user = %update.user_id,
            guild = update.guild_id.as_ref().map(|g| g.as_str()).unwrap_or("-")
        );
        self.run(update).instrument(span).await
    }

    async fn run(&self, update: PresenceUpdate) -> MatchReport {
        let started = started_activities(&update.previous, &update.activities);
        let mut report = MatchReport {
            started: started.clone(),
            ..MatchReport::default()
        };
        if started.is_empty() {
            return report;
        }
        debug!("Started activities: {:?}", started);

        // Best-effort history for the registration picker.
        let user_id = update.user_id.clone();
        let names = started.clone();
        if let Err(e) = self
            .ctx
            .with_index(move |index| index.record_activities(&user_id, &names))
            .await
        {
            warn!("Failed to record observed activities: {}", e);
        }

        let Some(guild_id) = update.guild_id else {
            warn!("Presence update carries no guild; nothing to deliver");
            return report;
        };

        let now = Utc::now();
        let mut selected = Vec::new();
        for activity_name in &started {
            let (guild_id, user_id, name) =
                (guild_id.clone(), update.user_id.clone(), activity_name.clone());
            let candidates = match self
                .ctx
                .with_index(move |index| index.query(&guild_id, &user_id, None, Some(name.as_str())))
                .await
            {
                Ok(messages) => messages,
                Err(e) => {
                    error!("Failed to look up messages for '{}': {}", activity_name, e);
                    continue;
                }
            };

            let (silenced, active): (Vec<_>, Vec<_>) =
                candidates.into_iter().partition(|m| m.is_silenced_at(now));
            if !silenced.is_empty() {
                debug!("Skipping {} silenced message(s) for '{}'", silenced.len(), activity_name);
            }
            selected.extend(self.policy.select(active));
        }

        let results = join_all(selected.iter().map(|message| self.deliver(message))).await;
        for (message, result) in selected.iter().zip(results) {
            match result {
                Ok(()) => {
                    info!(
                        "Delivered message for '{}' to channel {}",
                        message.activity_name, message.channel_id
                    );
                    report.delivered.push(message.key());
                }
                Err(e) => {
                    error!(
                        "Failed to deliver message for '{}' to channel {}: {}",
                        message.activity_name, message.channel_id, e
                    );
                    report.failed.push(message.key());
                }
            }
        }

        report
    }

    async fn deliver(&self, message: &RegisteredMessage) -> Result<(), DeliveryError> {
        let platform = &self.ctx.platform;
        let channel = platform
            .channel(&message.channel_id)
            .await?
            .ok_or_else(|| DeliveryError::ChannelMissing(message.channel_id.clone()))?;

        if !channel.sendable || channel.guild_id.as_ref() != Some(&message.guild_id) {
            return Err(DeliveryError::NotSendable(message.channel_id.clone()));
        }

        platform
            .send_message(&message.channel_id, view::delivery_message(message))
            .await?;
        Ok(())
    }
}
