use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use joinme_types::ids::{ChannelId, GuildId, UserId};
use joinme_types::models::{MessageKey, ObservedActivity, PendingInteraction, RegisteredMessage};

use crate::schema;
use crate::store::{Item, KeyValueStore};
use crate::StoreError;

/// Owns the three record kinds (registered messages, observed activities,
/// pending interactions) and every read or write against them.
#[derive(Clone)]
pub struct RegistrationIndex {
    store: Arc<dyn KeyValueStore>,
}

impl RegistrationIndex {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    // -- Registered messages --

    /// Upserts by `(guild, user, activity, channel)`. The whole record is
    /// replaced; nothing from a previous registration is merged in.
    pub fn put(&self, message: &RegisteredMessage) -> Result<(), StoreError> {
        let item = Item {
            pk: schema::guild_partition(&message.guild_id),
            sk: schema::message_sort(&message.user_id, &message.activity_name, &message.channel_id),
            body: encode(message)?,
            expires_at: None,
        };
        self.store.put(&item)
    }

    pub fn get(&self, key: &MessageKey) -> Result<Option<RegisteredMessage>, StoreError> {
        self.store
            .get(
                &schema::guild_partition(&key.guild_id),
                &schema::message_sort(&key.user_id, &key.activity_name, &key.channel_id),
            )?
            .map(|item| decode(&item))
            .transpose()
    }

    /// Messages of `user_id` in `guild_id`, ordered by activity then channel.
    ///
    /// An activity filter narrows the key prefix. A channel filter without an
    /// activity cannot, so it scans all of the user's rows in the guild and
    /// filters in memory.
    pub fn query(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
        channel_id: Option<&ChannelId>,
        activity_name: Option<&str>,
    ) -> Result<Vec<RegisteredMessage>, StoreError> {
        if let (Some(channel_id), Some(activity_name)) = (channel_id, activity_name) {
            let key = MessageKey {
                guild_id: guild_id.clone(),
                user_id: user_id.clone(),
                activity_name: activity_name.to_string(),
                channel_id: channel_id.clone(),
            };
            return Ok(self.get(&key)?.into_iter().collect());
        }

        let items = self.store.query_prefix(
            &schema::guild_partition(guild_id),
            &schema::message_prefix(user_id, activity_name),
        )?;

        let mut messages = items
            .iter()
            .map(decode::<RegisteredMessage>)
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(channel_id) = channel_id {
            messages.retain(|message| message.channel_id == *channel_id);
        }

        Ok(messages)
    }

    /// Deleting a registration that does not exist is a no-op.
    pub fn delete_one(&self, key: &MessageKey) -> Result<(), StoreError> {
        self.store.delete(
            &schema::guild_partition(&key.guild_id),
            &schema::message_sort(&key.user_id, &key.activity_name, &key.channel_id),
        )
    }

    /// Deletes every registration matching the filters. Returns how many rows
    /// were removed.
    pub fn delete_many(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
        activity_name: Option<&str>,
        channel_id: Option<&ChannelId>,
    ) -> Result<usize, StoreError> {
        let pk = schema::guild_partition(guild_id);

        match (activity_name, channel_id) {
            (Some(activity_name), Some(channel_id)) => {
                let key = MessageKey {
                    guild_id: guild_id.clone(),
                    user_id: user_id.clone(),
                    activity_name: activity_name.to_string(),
                    channel_id: channel_id.clone(),
                };
                let existed = self.get(&key)?.is_some();
                self.delete_one(&key)?;
                Ok(usize::from(existed))
            }
            (activity_name, None) => self
                .store
                .delete_prefix(&pk, &schema::message_prefix(user_id, activity_name)),
            (None, Some(channel_id)) => {
                let doomed = self.query(guild_id, user_id, Some(channel_id), None)?;
                for message in &doomed {
                    self.delete_one(&message.key())?;
                }
                Ok(doomed.len())
            }
        }
    }

    // -- Observed activities --

    /// Idempotent: recording the same activity twice leaves one row.
    pub fn record_activity(&self, user_id: &UserId, activity_name: &str) -> Result<(), StoreError> {
        self.store.put(&activity_item(user_id, activity_name)?)
    }

    /// Batched form of [`Self::record_activity`].
    pub fn record_activities(&self, user_id: &UserId, activity_names: &[String]) -> Result<(), StoreError> {
        let items = activity_names
            .iter()
            .map(|name| activity_item(user_id, name))
            .collect::<Result<Vec<_>, _>>()?;
        self.store.batch_put(&items)
    }

    pub fn query_activities(&self, user_id: &UserId) -> Result<Vec<ObservedActivity>, StoreError> {
        self.store
            .query_prefix(&schema::user_partition(user_id), &schema::activity_prefix())?
            .iter()
            .map(decode)
            .collect()
    }

    // -- Pending interactions --

    pub fn put_pending(&self, pending: &PendingInteraction) -> Result<(), StoreError> {
        let item = Item {
            pk: schema::pending_partition(&pending.id),
            sk: schema::pending_sort().to_string(),
            body: encode(pending)?,
            expires_at: Some(pending.expires_at),
        };
        self.store.put(&item)
    }

    /// Returns `None` for missing and for expired continuations alike. The
    /// store's reaper may lag behind, so expiry is checked here on every read.
    pub fn get_pending(&self, id: &Uuid) -> Result<Option<PendingInteraction>, StoreError> {
        self.get_pending_at(id, Utc::now())
    }

    pub fn get_pending_at(
        &self,
        id: &Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<PendingInteraction>, StoreError> {
        let Some(item) = self
            .store
            .get(&schema::pending_partition(id), schema::pending_sort())?
        else {
            return Ok(None);
        };

        let pending: PendingInteraction = decode(&item)?;
        if pending.is_expired_at(now) {
            debug!("Pending interaction {} expired at {}", id, pending.expires_at);
            return Ok(None);
        }

        Ok(Some(pending))
    }
}

fn activity_item(user_id: &UserId, activity_name: &str) -> Result<Item, StoreError> {
    Ok(Item {
        pk: schema::user_partition(user_id),
        sk: schema::activity_sort(activity_name),
        body: encode(&ObservedActivity {
            user_id: user_id.clone(),
            activity_name: activity_name.to_string(),
        })?,
        expires_at: None,
    })
}

fn encode<T: Serialize>(record: &T) -> Result<String, StoreError> {
    serde_json::to_string(record).map_err(StoreError::Encode)
}

fn decode<T: DeserializeOwned>(item: &Item) -> Result<T, StoreError> {
    serde_json::from_str(&item.body).map_err(|source| StoreError::Corrupt {
        pk: item.pk.clone(),
        sk: item.sk.clone(),
        source,
    })
}
