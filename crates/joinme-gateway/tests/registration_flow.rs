mod common;

use chrono::{TimeDelta, Utc};
use uuid::Uuid;

use joinme_gateway::custom_id::FlowStep;
use joinme_gateway::view::ACTIVITY_INPUT_ID;
use joinme_types::api::{Component, InteractionResponse};
use joinme_types::events::{InteractionKind, ModalField};
use joinme_types::ids::{ChannelId, GuildId, MessageId, UserId};
use joinme_types::models::{Attachment, ContinuationHandle, MessageKey, PendingInteraction};

use common::*;

fn key(activity: &str) -> MessageKey {
    MessageKey {
        guild_id: GuildId::from(GUILD),
        user_id: UserId::from(USER),
        activity_name: activity.to_string(),
        channel_id: ChannelId::from(CHANNEL),
    }
}

fn select(message_id: &str, activity: &str) -> InteractionKind {
    InteractionKind::SelectMenu {
        custom_id: FlowStep::SelectActivity.encode().unwrap(),
        values: vec![
            FlowStep::Selected {
                message_id: MessageId::from(message_id),
                activity_name: activity.to_string(),
            }
            .encode()
            .unwrap(),
        ],
    }
}

fn text_entry(message_id: &str, pending_id: Uuid, value: &str) -> InteractionKind {
    InteractionKind::ModalSubmit {
        custom_id: FlowStep::TextEntry {
            message_id: MessageId::from(message_id),
            pending_id,
        }
        .encode()
        .unwrap(),
        fields: vec![ModalField {
            custom_id: ACTIVITY_INPUT_ID.to_string(),
            value: value.to_string(),
        }],
    }
}

/// Runs the Start step and returns the pending id embedded in the entry button.
async fn start(h: &Harness, message_id: &str) -> Uuid {
    h.router
        .handle(interaction(
            "tok-start",
            InteractionKind::Command(register_message_on(message_id)),
        ))
        .await;

    let reply = reply_message(h.platform.single_response());
    assert!(reply.ephemeral);
    let (custom_id, label, _) = buttons(&reply.components)
        .into_iter()
        .next()
        .expect("entry button");
    assert_eq!(label, "Enter activity name");
    h.platform.clear();

    match FlowStep::decode(&custom_id).unwrap() {
        FlowStep::OpenModal { pending_id, .. } => pending_id,
        other => panic!("unexpected step {other:?}"),
    }
}

#[tokio::test]
async fn start_offers_observed_activities_and_stores_a_continuation() {
    let h = Harness::new().await;
    h.index.record_activity(&UserId::from(USER), "Go").unwrap();
    h.index.record_activity(&UserId::from(USER), "Chess").unwrap();

    h.router
        .handle(interaction(
            "tok-start",
            InteractionKind::Command(register_message_on("m-1")),
        ))
        .await;

    let reply = reply_message(h.platform.single_response());
    let Component::ActionRow { components } = &reply.components[1] else {
        panic!("expected the select row");
    };
    let Component::StringSelect { options, .. } = &components[0] else {
        panic!("expected a select menu");
    };
    let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["Chess", "Go"]);

    let (custom_id, _, _) = buttons(&reply.components).into_iter().next().unwrap();
    let FlowStep::OpenModal { pending_id, .. } = FlowStep::decode(&custom_id).unwrap() else {
        panic!("expected the entry button");
    };
    let pending = h.index.get_pending(&pending_id).unwrap().expect("stored");
    assert_eq!(pending.user_id, UserId::from(USER));
    assert_eq!(pending.continuation.token, "tok-start");
    assert!(pending.expires_at > Utc::now());
}

#[tokio::test]
async fn selecting_an_activity_relays_attachments_and_persists() {
    let h = Harness::new().await;
    h.add_source_message(
        "m-1",
        "come play",
        vec![Attachment {
            name: "board.png".into(),
            url: h.source_url("board.png"),
        }],
    );

    h.router.handle(interaction("tok-select", select("m-1", "Chess"))).await;

    let InteractionResponse::Update(update) = h.platform.single_response() else {
        panic!("expected an in-place update");
    };
    assert!(text_of(&update).contains("whenever you start `Chess`"));

    let stored = h.index.get(&key("Chess")).unwrap().expect("persisted");
    assert_eq!(stored.content, "come play");
    assert_eq!(stored.attachments.len(), 1);
    assert_eq!(stored.attachments[0].name, "board.png");
    assert!(stored.attachments[0].url.starts_with(PUBLIC_BASE));
    assert!(stored.attachments[0].url.ends_with("-board.png"));

    let blobs = h.stored_blobs();
    assert_eq!(blobs.len(), 1);
    let bytes = std::fs::read_to_string(h.blob_dir.path().join(&blobs[0])).unwrap();
    assert_eq!(bytes, "bytes of board.png");
}

#[tokio::test]
async fn re_registering_replaces_the_previous_attachments() {
    let h = Harness::new().await;
    h.add_source_message(
        "m-1",
        "first",
        vec![Attachment {
            name: "a.png".into(),
            url: h.source_url("a.png"),
        }],
    );
    h.add_source_message("m-2", "second", Vec::new());

    h.router.handle(interaction("tok-1", select("m-1", "Chess"))).await;
    h.router.handle(interaction("tok-2", select("m-2", "Chess"))).await;

    let stored = h.index.get(&key("Chess")).unwrap().unwrap();
    assert_eq!(stored.content, "second");
    assert!(stored.attachments.is_empty());
}

#[tokio::test]
async fn entry_button_opens_the_text_modal() {
    let h = Harness::new().await;
    let pending_id = start(&h, "m-1").await;

    h.router
        .handle(interaction(
            "tok-button",
            InteractionKind::Button {
                custom_id: FlowStep::OpenModal {
                    message_id: MessageId::from("m-1"),
                    pending_id,
                }
                .encode()
                .unwrap(),
                message_components: Vec::new(),
            },
        ))
        .await;

    let InteractionResponse::Modal(modal) = h.platform.single_response() else {
        panic!("expected a modal");
    };
    assert_eq!(
        FlowStep::decode(&modal.custom_id).unwrap(),
        FlowStep::TextEntry {
            message_id: MessageId::from("m-1"),
            pending_id
        }
    );
    assert_eq!(modal.inputs[0].custom_id, ACTIVITY_INPUT_ID);
}

#[tokio::test]
async fn text_entry_edits_the_original_reply() {
    let h = Harness::new().await;
    h.add_source_message("m-1", "gg", Vec::new());
    let pending_id = start(&h, "m-1").await;

    h.router
        .handle(interaction("tok-modal", text_entry("m-1", pending_id, "  Chess  ")))
        .await;

    let calls = h.platform.calls();
    assert_eq!(calls.len(), 2, "{calls:?}");
    match &calls[0] {
        Call::EditOriginal { token, message } => {
            assert_eq!(token, "tok-start");
            assert!(text_of(message).contains("`Chess`"));
        }
        other => panic!("expected edit of the original reply, got {other:?}"),
    }
    assert_eq!(
        calls[1],
        Call::Respond {
            token: "tok-modal".into(),
            response: InteractionResponse::DeferUpdate
        }
    );

    assert!(h.index.get(&key("Chess")).unwrap().is_some());
}

#[tokio::test]
async fn expired_continuation_is_reported_and_nothing_is_stored() {
    let h = Harness::new().await;
    h.add_source_message("m-1", "gg", Vec::new());
    let pending_id = Uuid::new_v4();
    h.index
        .put_pending(&PendingInteraction {
            id: pending_id,
            user_id: UserId::from(USER),
            continuation: ContinuationHandle {
                application_id: "app".into(),
                token: "tok-start".into(),
            },
            expires_at: Utc::now() - TimeDelta::seconds(1),
        })
        .unwrap();

    h.router
        .handle(interaction("tok-modal", text_entry("m-1", pending_id, "Chess")))
        .await;

    let reply = reply_message(h.platform.single_response());
    assert!(reply.ephemeral);
    assert!(text_of(&reply).contains("expired"));
    assert!(h.index.get(&key("Chess")).unwrap().is_none());
}

#[tokio::test]
async fn another_user_cannot_resume_the_flow() {
    let h = Harness::new().await;
    h.add_source_message("m-1", "gg", Vec::new());
    let pending_id = start(&h, "m-1").await;

    h.router
        .handle(interaction_as(
            "intruder",
            "tok-modal",
            text_entry("m-1", pending_id, "Chess"),
        ))
        .await;

    let reply = reply_message(h.platform.single_response());
    assert!(text_of(&reply).contains("someone else"));
    assert!(h.platform.calls().iter().all(|c| !matches!(c, Call::EditOriginal { .. })));
}

#[tokio::test]
async fn blank_activity_name_is_rejected() {
    let h = Harness::new().await;
    let pending_id = start(&h, "m-1").await;

    h.router
        .handle(interaction("tok-modal", text_entry("m-1", pending_id, "   ")))
        .await;

    let reply = reply_message(h.platform.single_response());
    assert!(text_of(&reply).starts_with("⚠️"));
}

#[tokio::test]
async fn one_failed_attachment_fails_the_whole_registration() {
    let h = Harness::new().await;
    h.add_source_message(
        "m-1",
        "two files",
        vec![
            Attachment {
                name: "ok.png".into(),
                url: h.source_url("ok.png"),
            },
            Attachment {
                name: "gone.png".into(),
                url: h.missing_url("gone.png"),
            },
        ],
    );

    h.router.handle(interaction("tok-select", select("m-1", "Chess"))).await;

    let reply = reply_message(h.platform.single_response());
    assert_eq!(text_of(&reply).trim(), "❌ Something went wrong. Please try again later.");
    assert!(h.index.get(&key("Chess")).unwrap().is_none());

    // The blob relayed before the failure is left behind.
    let blobs = h.stored_blobs();
    assert_eq!(blobs.len(), 1);
    assert!(blobs[0].ends_with("-ok.png"));
}

#[tokio::test]
async fn vanished_source_message_is_not_found() {
    let h = Harness::new().await;

    h.router.handle(interaction("tok-select", select("m-404", "Chess"))).await;

    let reply = reply_message(h.platform.single_response());
    assert!(text_of(&reply).contains("no longer exists"));
}

#[tokio::test]
async fn unknown_command_is_reported() {
    let h = Harness::new().await;

    h.router
        .handle(interaction("tok", InteractionKind::Command(slash("nope", &[]))))
        .await;

    let reply = reply_message(h.platform.single_response());
    assert_eq!(text_of(&reply).trim(), "⚠️ Unrecognized 'slash' command: nope");
}

#[tokio::test]
async fn unroutable_identifier_is_reported() {
    let h = Harness::new().await;

    h.router
        .handle(interaction(
            "tok",
            InteractionKind::Button {
                custom_id: "FROBNICATE#1".into(),
                message_components: Vec::new(),
            },
        ))
        .await;

    let reply = reply_message(h.platform.single_response());
    assert!(text_of(&reply).contains("Unrecognized interaction identifier 'FROBNICATE#1'"));
}

#[tokio::test]
async fn ping_pongs() {
    let h = Harness::new().await;

    h.router
        .handle(interaction("tok", InteractionKind::Command(slash("ping", &[]))))
        .await;

    let reply = reply_message(h.platform.single_response());
    assert_eq!(reply.content.as_deref(), Some("🏓 Pong!"));
}
