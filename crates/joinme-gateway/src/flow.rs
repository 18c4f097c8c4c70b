//! Resumable steps of the registration flow.
//!
//! Start lives in the `Register Message` command. Every later step is resumed
//! from an opaque identifier; only the free-form text entry needs a stored
//! [`PendingInteraction`], because it must edit the reply of the interaction
//! that started the flow.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use joinme_types::api::InteractionResponse;
use joinme_types::events::{Interaction, ModalField};
use joinme_types::ids::MessageId;
use joinme_types::models::{PendingInteraction, RegisteredMessage, normalize_activity_name};

use crate::commands::{guild_scope, invalid_activity_name};
use crate::context::HandlerContext;
use crate::error::FlowError;
use crate::view;

/// An activity was picked from the select menu.
pub(crate) async fn finish_selected(
    ctx: &HandlerContext,
    interaction: &Interaction,
    message_id: &MessageId,
    activity_name: String,
) -> Result<(), FlowError> {
    let registered = register(ctx, interaction, message_id, activity_name).await?;

    ctx.platform
        .respond(
            interaction,
            InteractionResponse::Update(view::registered_confirmation(&registered.activity_name)),
        )
        .await?;
    Ok(())
}

/// "Enter activity name" was pressed.
pub(crate) async fn open_text_entry(
    ctx: &HandlerContext,
    interaction: &Interaction,
    message_id: &MessageId,
    pending_id: Uuid,
) -> Result<(), FlowError> {
    let pending = load_pending(ctx, interaction, pending_id).await?;
    let modal = view::activity_modal(message_id, pending.id)?;

    ctx.platform
        .respond(interaction, InteractionResponse::Modal(modal))
        .await?;
    Ok(())
}

/// The text-entry modal was submitted. The confirmation replaces the reply
/// that started the flow; the submission itself is only acknowledged.
pub(crate) async fn submit_text_entry(
    ctx: &HandlerContext,
    interaction: &Interaction,
    message_id: &MessageId,
    pending_id: Uuid,
    fields: &[ModalField],
) -> Result<(), FlowError> {
    let raw = fields
        .iter()
        .find(|field| field.custom_id == view::ACTIVITY_INPUT_ID)
        .map(|field| field.value.as_str())
        .unwrap_or_default();
    let activity_name =
        normalize_activity_name(raw).ok_or_else(|| FlowError::InvalidInput(invalid_activity_name(raw)))?;

    let pending = load_pending(ctx, interaction, pending_id).await?;
    let registered = register(ctx, interaction, message_id, activity_name).await?;

    ctx.platform
        .edit_original(
            &pending.continuation,
            view::registered_confirmation(&registered.activity_name),
        )
        .await?;
    ctx.platform
        .respond(interaction, InteractionResponse::DeferUpdate)
        .await?;
    Ok(())
}

/// Missing and expired continuations are indistinguishable to the caller.
async fn load_pending(
    ctx: &HandlerContext,
    interaction: &Interaction,
    pending_id: Uuid,
) -> Result<PendingInteraction, FlowError> {
    let pending = ctx
        .with_index(move |index| index.get_pending(&pending_id))
        .await?
        .ok_or(FlowError::Expired(pending_id))?;

    if pending.user_id != interaction.user_id {
        return Err(FlowError::Forbidden(interaction.user_id.clone()));
    }
    Ok(pending)
}

/// Relays the source message's attachments, then persists the registration.
/// Nothing is persisted unless every attachment was relayed.
async fn register(
    ctx: &HandlerContext,
    interaction: &Interaction,
    message_id: &MessageId,
    activity_name: String,
) -> Result<RegisteredMessage, FlowError> {
    let (guild_id, channel_id) = guild_scope(interaction)?;

    let source = ctx
        .platform
        .fetch_message(&channel_id, message_id)
        .await?
        .ok_or_else(|| FlowError::NotFound("That message no longer exists.".to_string()))?;

    let group = Uuid::new_v4().to_string();
    let attachments = ctx.relay.relay_all(&group, &source.attachments).await?;

    let message = RegisteredMessage {
        guild_id,
        user_id: interaction.user_id.clone(),
        channel_id,
        activity_name,
        content: source.content,
        attachments,
        silenced_until: None,
        created_at: Utc::now(),
    };

    let stored = message.clone();
    ctx.with_index(move |index| index.put(&stored)).await?;
    info!(
        "Registered message {} for activity '{}' in channel {} ({} attachment(s))",
        message_id,
        message.activity_name,
        message.channel_id,
        message.attachments.len()
    );

    Ok(message)
}
