#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use tempfile::TempDir;
use tokio::net::TcpListener;

use joinme_db::{Database, RegistrationIndex};
use joinme_gateway::{
    CommandRegistry, HandlerContext, InteractionRouter, Platform, PlatformError, Settings,
};
use joinme_relay::{AttachmentRelay, FsBlobStore};
use joinme_types::api::{
    ChannelInfo, CommandDefinition, Component, InteractionResponse, OutgoingMessage, SourceMessage,
};
use joinme_types::events::{CommandCall, CommandKind, CommandOption, Interaction, InteractionKind};
use joinme_types::ids::{ChannelId, GuildId, MessageId, UserId};
use joinme_types::models::{Attachment, ContinuationHandle};

pub const GUILD: &str = "guild-1";
pub const USER: &str = "user-1";
pub const CHANNEL: &str = "channel-1";
pub const PUBLIC_BASE: &str = "https://cdn.example/attachments";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Respond {
        token: String,
        response: InteractionResponse,
    },
    FollowUp {
        token: String,
        message: OutgoingMessage,
    },
    EditOriginal {
        token: String,
        message: OutgoingMessage,
    },
    Send {
        channel_id: ChannelId,
        message: OutgoingMessage,
    },
}

/// Records every outbound call and serves canned messages and channels.
#[derive(Default)]
pub struct FakePlatform {
    calls: Mutex<Vec<Call>>,
    messages: Mutex<HashMap<MessageId, SourceMessage>>,
    channels: Mutex<HashMap<ChannelId, ChannelInfo>>,
}

impl FakePlatform {
    pub fn add_message(&self, message: SourceMessage) {
        self.messages.lock().unwrap().insert(message.id.clone(), message);
    }

    pub fn add_channel(&self, id: &str, guild: &str, sendable: bool) {
        self.channels.lock().unwrap().insert(
            ChannelId::from(id),
            ChannelInfo {
                id: ChannelId::from(id),
                guild_id: Some(GuildId::from(guild)),
                sendable,
            },
        );
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn responses(&self) -> Vec<InteractionResponse> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Respond { response, .. } => Some(response),
                _ => None,
            })
            .collect()
    }

    /// The only response recorded so far.
    pub fn single_response(&self) -> InteractionResponse {
        let responses = self.responses();
        assert_eq!(responses.len(), 1, "expected exactly one response: {responses:?}");
        responses.into_iter().next().unwrap()
    }

    pub fn sends(&self) -> Vec<(ChannelId, OutgoingMessage)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send {
                    channel_id,
                    message,
                } => Some((channel_id, message)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn respond(
        &self,
        interaction: &Interaction,
        response: InteractionResponse,
    ) -> Result<(), PlatformError> {
        self.record(Call::Respond {
            token: interaction.token.clone(),
            response,
        });
        Ok(())
    }

    async fn follow_up(
        &self,
        interaction: &Interaction,
        message: OutgoingMessage,
    ) -> Result<(), PlatformError> {
        self.record(Call::FollowUp {
            token: interaction.token.clone(),
            message,
        });
        Ok(())
    }

    async fn edit_original(
        &self,
        handle: &ContinuationHandle,
        message: OutgoingMessage,
    ) -> Result<(), PlatformError> {
        self.record(Call::EditOriginal {
            token: handle.token.clone(),
            message,
        });
        Ok(())
    }

    async fn fetch_message(
        &self,
        _channel_id: &ChannelId,
        message_id: &MessageId,
    ) -> Result<Option<SourceMessage>, PlatformError> {
        Ok(self.messages.lock().unwrap().get(message_id).cloned())
    }

    async fn channel(&self, channel_id: &ChannelId) -> Result<Option<ChannelInfo>, PlatformError> {
        Ok(self.channels.lock().unwrap().get(channel_id).cloned())
    }

    async fn send_message(
        &self,
        channel_id: &ChannelId,
        message: OutgoingMessage,
    ) -> Result<(), PlatformError> {
        self.record(Call::Send {
            channel_id: channel_id.clone(),
            message,
        });
        Ok(())
    }

    async fn register_commands(&self, _commands: &[CommandDefinition]) -> Result<(), PlatformError> {
        Ok(())
    }
}

pub struct Harness {
    pub ctx: HandlerContext,
    pub router: InteractionRouter,
    pub platform: Arc<FakePlatform>,
    pub index: RegistrationIndex,
    pub blob_dir: TempDir,
    pub source_base: String,
}

impl Harness {
    pub async fn new() -> Self {
        let db = Database::open_in_memory().unwrap();
        let index = RegistrationIndex::new(Arc::new(db));

        let blob_dir = tempfile::tempdir().unwrap();
        let blobs = FsBlobStore::new(blob_dir.path().to_path_buf(), PUBLIC_BASE)
            .await
            .unwrap();
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let relay = AttachmentRelay::with_client(client, Arc::new(blobs));

        let platform = Arc::new(FakePlatform::default());
        let ctx = HandlerContext::new(index.clone(), relay, platform.clone(), Settings::default());
        let commands = Arc::new(CommandRegistry::with_default_commands().unwrap());
        let router = InteractionRouter::new(ctx.clone(), commands);

        Self {
            ctx,
            router,
            platform,
            index,
            blob_dir,
            source_base: source_server().await,
        }
    }

    pub fn source_url(&self, name: &str) -> String {
        format!("{}/files/{name}", self.source_base)
    }

    pub fn missing_url(&self, name: &str) -> String {
        format!("{}/missing/{name}", self.source_base)
    }

    /// A message in [`CHANNEL`] the platform will return when asked.
    pub fn add_source_message(&self, id: &str, content: &str, attachments: Vec<Attachment>) {
        self.platform.add_message(SourceMessage {
            id: MessageId::from(id),
            channel_id: ChannelId::from(CHANNEL),
            content: content.to_string(),
            attachments,
        });
    }

    pub fn stored_blobs(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.blob_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// `/files/{name}` answers with a body derived from the name; `/missing/*`
/// answers 404.
async fn source_server() -> String {
    let app = Router::new()
        .route(
            "/files/{name}",
            get(|Path(name): Path<String>| async move { format!("bytes of {name}") }),
        )
        .route("/missing/{name}", get(|| async { StatusCode::NOT_FOUND }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn interaction_as(user: &str, token: &str, kind: InteractionKind) -> Interaction {
    Interaction {
        id: format!("interaction-{token}").into(),
        application_id: "app".into(),
        token: token.to_string(),
        user_id: UserId::from(user),
        guild_id: Some(GuildId::from(GUILD)),
        channel_id: Some(ChannelId::from(CHANNEL)),
        kind,
    }
}

pub fn interaction(token: &str, kind: InteractionKind) -> Interaction {
    interaction_as(USER, token, kind)
}

pub fn slash(name: &str, options: &[(&str, &str)]) -> CommandCall {
    CommandCall {
        kind: CommandKind::Slash,
        name: name.to_string(),
        options: options
            .iter()
            .map(|(name, value)| CommandOption {
                name: name.to_string(),
                value: value.to_string(),
            })
            .collect(),
        target_message_id: None,
    }
}

pub fn register_message_on(message_id: &str) -> CommandCall {
    CommandCall {
        kind: CommandKind::MessageContextMenu,
        name: "Register Message".to_string(),
        options: Vec::new(),
        target_message_id: Some(MessageId::from(message_id)),
    }
}

pub fn text_of(message: &OutgoingMessage) -> String {
    let mut text = message.content.clone().unwrap_or_default();
    collect_text(&message.components, &mut text);
    text
}

fn collect_text(components: &[Component], out: &mut String) {
    for component in components {
        match component {
            Component::TextDisplay { content } => {
                out.push('\n');
                out.push_str(content);
            }
            Component::ActionRow { components } | Component::Container { components } => {
                collect_text(components, out)
            }
            _ => {}
        }
    }
}

/// Every button anywhere in `components`, as `(custom_id, label, disabled)`.
pub fn buttons(components: &[Component]) -> Vec<(String, String, bool)> {
    let mut found = Vec::new();
    for component in components {
        match component {
            Component::Button {
                custom_id,
                label,
                disabled,
                ..
            } => found.push((custom_id.clone(), label.clone(), *disabled)),
            Component::ActionRow { components } | Component::Container { components } => {
                found.extend(buttons(components))
            }
            _ => {}
        }
    }
    found
}

/// Reply message of a response that is expected to be a reply.
pub fn reply_message(response: InteractionResponse) -> OutgoingMessage {
    match response {
        InteractionResponse::Reply(message) => message,
        other => panic!("expected a reply, got {other:?}"),
    }
}
