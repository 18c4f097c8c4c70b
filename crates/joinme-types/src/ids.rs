use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform identifiers are opaque strings (snowflakes on most platforms).
/// Each kind gets its own newtype so a channel id can never be passed where a
/// guild id is expected.
macro_rules! platform_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

platform_id!(
    /// A guild (server) on the chat platform.
    GuildId
);
platform_id!(UserId);
platform_id!(ChannelId);
platform_id!(MessageId);
platform_id!(ApplicationId);
platform_id!(
    /// Id of a single inbound interaction.
    InteractionId
);
