use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use tracing::debug;

use joinme_gateway::{ActivityMatcher, InteractionRouter};
use joinme_types::events::InboundEvent;

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: InteractionRouter,
    pub matcher: ActivityMatcher,
    pub event_secret: Arc<str>,
}

pub fn router(state: AppState) -> Router {
    let events = Router::new()
        .route("/events", post(receive_event))
        .layer(middleware::from_fn_with_state(state.clone(), require_secret))
        .with_state(state);

    Router::new()
        .merge(events)
        .route("/health", get(health))
}

/// The bridge must present the shared secret as a bearer token.
async fn require_secret(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if token != &*state.event_secret {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(req).await)
}

/// Accepts one platform event. Handling runs in the background; the bridge
/// only learns that the event was taken.
async fn receive_event(State(state): State<AppState>, Json(event): Json<InboundEvent>) -> StatusCode {
    match event {
        InboundEvent::Interaction(interaction) => {
            debug!("Accepted interaction {}", interaction.id);
            tokio::spawn(async move { state.router.handle(interaction).await });
        }
        InboundEvent::PresenceUpdate(update) => {
            debug!("Accepted presence update for {}", update.user_id);
            tokio::spawn(async move {
                state.matcher.handle(update).await;
            });
        }
    }
    StatusCode::ACCEPTED
}

async fn health() -> &'static str {
    "ok"
}
