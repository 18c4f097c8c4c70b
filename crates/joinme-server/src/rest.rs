use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use joinme_gateway::{Platform, PlatformError};
use joinme_types::api::{
    ChannelInfo, CommandDefinition, InteractionResponse, OutgoingMessage, SourceMessage,
};
use joinme_types::events::Interaction;
use joinme_types::ids::{ChannelId, MessageId};
use joinme_types::models::ContinuationHandle;

/// [`Platform`] over the transport bridge's REST api.
pub struct RestPlatform {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestPlatform {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, PlatformError> {
        let response = request
            .header(AUTHORIZATION, format!("Bot {}", self.token))
            .send()
            .await
            .map_err(|e| PlatformError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(PlatformError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    /// GET that maps 404 to `None`.
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, PlatformError> {
        match self.send(self.client.get(self.url(path))).await {
            Ok(response) => response
                .json()
                .await
                .map(Some)
                .map_err(|e| PlatformError::Decode(e.to_string())),
            Err(PlatformError::Rejected { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                debug!("{} not found on platform", path);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Platform for RestPlatform {
    async fn respond(
        &self,
        interaction: &Interaction,
        response: InteractionResponse,
    ) -> Result<(), PlatformError> {
        let path = format!("/interactions/{}/{}/callback", interaction.id, interaction.token);
        self.send(self.client.post(self.url(&path)).json(&response)).await?;
        Ok(())
    }

    async fn follow_up(
        &self,
        interaction: &Interaction,
        message: OutgoingMessage,
    ) -> Result<(), PlatformError> {
        let path = format!("/webhooks/{}/{}", interaction.application_id, interaction.token);
        self.send(self.client.post(self.url(&path)).json(&message)).await?;
        Ok(())
    }

    async fn edit_original(
        &self,
        handle: &ContinuationHandle,
        message: OutgoingMessage,
    ) -> Result<(), PlatformError> {
        let path = format!(
            "/webhooks/{}/{}/messages/@original",
            handle.application_id, handle.token
        );
        self.send(self.client.patch(self.url(&path)).json(&message)).await?;
        Ok(())
    }

    async fn fetch_message(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
    ) -> Result<Option<SourceMessage>, PlatformError> {
        self.get_optional(&format!("/channels/{channel_id}/messages/{message_id}"))
            .await
    }

    async fn channel(&self, channel_id: &ChannelId) -> Result<Option<ChannelInfo>, PlatformError> {
        self.get_optional(&format!("/channels/{channel_id}")).await
    }

    async fn send_message(
        &self,
        channel_id: &ChannelId,
        message: OutgoingMessage,
    ) -> Result<(), PlatformError> {
        let path = format!("/channels/{channel_id}/messages");
        self.send(self.client.post(self.url(&path)).json(&message)).await?;
        Ok(())
    }

    async fn register_commands(&self, commands: &[CommandDefinition]) -> Result<(), PlatformError> {
        self.send(self.client.put(self.url("/applications/commands")).json(commands))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use joinme_types::events::{CommandCall, CommandKind, InteractionKind};

    use super::*;

    type Seen = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

    async fn bridge(seen: Seen) -> String {
        let app = Router::new()
            .route(
                "/interactions/{id}/{token}/callback",
                post({
                    let seen = seen.clone();
                    move |Path((id, token)): Path<(String, String)>,
                          headers: HeaderMap,
                          Json(body): Json<Value>| {
                        let seen = seen.clone();
                        async move {
                            let auth = headers
                                .get("authorization")
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string);
                            seen.lock().unwrap().push((format!("{id}/{token}"), auth, body));
                            StatusCode::NO_CONTENT
                        }
                    }
                }),
            )
            .route(
                "/channels/{channel}",
                get(|Path(channel): Path<String>| async move {
                    if channel == "known" {
                        Ok(Json(json!({ "id": "known", "guild_id": "g", "sendable": true })))
                    } else {
                        Err(StatusCode::NOT_FOUND)
                    }
                }),
            )
            .route(
                "/channels/{channel}/messages",
                post(|| async { (StatusCode::FORBIDDEN, "Missing Access") }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn platform(base: String) -> RestPlatform {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        RestPlatform::new(client, base, "token-123")
    }

    #[tokio::test]
    async fn responses_are_posted_to_the_interaction_callback() {
        let seen: Seen = Arc::default();
        let platform = platform(bridge(seen.clone()).await);
        let interaction = Interaction {
            id: "42".into(),
            application_id: "app".into(),
            token: "tok".into(),
            user_id: "u".into(),
            guild_id: None,
            channel_id: None,
            kind: InteractionKind::Command(CommandCall {
                kind: CommandKind::Slash,
                name: "ping".into(),
                options: Vec::new(),
                target_message_id: None,
            }),
        };

        platform
            .respond(&interaction, InteractionResponse::DeferUpdate)
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "42/tok");
        assert_eq!(seen[0].1.as_deref(), Some("Bot token-123"));
        assert_eq!(seen[0].2, json!({ "type": "defer_update" }));
    }

    #[tokio::test]
    async fn unknown_channel_is_none() {
        let platform = platform(bridge(Arc::default()).await);

        let known = platform.channel(&ChannelId::from("known")).await.unwrap();
        assert!(known.is_some_and(|c| c.sendable));

        let unknown = platform.channel(&ChannelId::from("gone")).await.unwrap();
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn rejected_requests_surface_status_and_body() {
        let platform = platform(bridge(Arc::default()).await);

        let err = platform
            .send_message(&ChannelId::from("c"), OutgoingMessage::content("hi"))
            .await
            .unwrap_err();

        match err {
            PlatformError::Rejected { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "Missing Access");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
