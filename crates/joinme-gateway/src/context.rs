use std::sync::Arc;

use chrono::TimeDelta;

use joinme_db::{RegistrationIndex, StoreError};
use joinme_relay::AttachmentRelay;

use crate::error::FlowError;
use crate::platform::Platform;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Lifetime of a pending interaction from its creation.
    pub pending_ttl: TimeDelta,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pending_ttl: TimeDelta::minutes(15),
        }
    }
}

/// Shared dependencies of every handler. Cheap to clone.
#[derive(Clone)]
pub struct HandlerContext {
    pub index: RegistrationIndex,
    pub relay: AttachmentRelay,
    pub platform: Arc<dyn Platform>,
    pub settings: Settings,
}

impl HandlerContext {
    pub fn new(
        index: RegistrationIndex,
        relay: AttachmentRelay,
        platform: Arc<dyn Platform>,
        settings: Settings,
    ) -> Self {
        Self {
            index,
            relay,
            platform,
            settings,
        }
    }

    /// Runs a blocking index call off the async runtime.
    pub async fn with_index<F, T>(&self, f: F) -> Result<T, FlowError>
    where
        F: FnOnce(&RegistrationIndex) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let index = self.index.clone();
        let result = tokio::task::spawn_blocking(move || f(&index)).await?;
        Ok(result?)
    }
}
