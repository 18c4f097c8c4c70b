pub mod commands;
pub mod context;
pub mod custom_id;
pub mod error;
mod flow;
pub mod matcher;
pub mod platform;
pub mod router;
pub mod view;

pub use commands::{CommandHandler, CommandRegistry, RegistryError};
pub use context::{HandlerContext, Settings};
pub use error::FlowError;
pub use matcher::{ActivityMatcher, DeliveryPolicy, MatchReport};
pub use platform::{Platform, PlatformError};
pub use router::InteractionRouter;
