//! View-models for everything we render, and pure render functions from them
//! to platform components.
//!
//! Rendered messages are never edited in place. To change a list after the
//! fact, it is parsed back into a [`ListView`], a new view is derived, and that
//! view is rendered again.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use joinme_types::api::{
    ButtonStyle, Component, Modal, OutgoingMessage, SelectOption, TextInput,
};
use joinme_types::ids::MessageId;
use joinme_types::models::{Attachment, MAX_ACTIVITY_NAME_LEN, MessageKey, RegisteredMessage};

use crate::custom_id::{CustomIdError, FlowStep};

/// Custom id of the free-form activity name input in the text-entry modal.
pub const ACTIVITY_INPUT_ID: &str = "raw-activity-name";

/// Most options a select menu may offer.
pub const MAX_SELECT_OPTIONS: usize = 25;

const MAX_LABEL_LEN: usize = 100;
const NO_TEXT: &str = "*(no text)*";
const REGISTERED_PREFIX: &str = "-# Registered ";
const UNMANAGEABLE_HINT: &str = "-# Name too long for buttons. Use `/remove-message` to manage it.";

/// One registered message as shown in a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCard {
    pub activity_name: String,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub registered: String,
    /// `None` when the key does not fit into a button identifier.
    pub key: Option<MessageKey>,
    pub struck: bool,
    pub preview_disabled: bool,
    pub delete_disabled: bool,
}

impl MessageCard {
    pub fn from_message(message: &RegisteredMessage) -> Self {
        let key = message.key();
        let manageable = FlowStep::Preview(key.clone()).encode().is_ok()
            && FlowStep::Delete(key.clone()).encode().is_ok();

        Self {
            activity_name: message.activity_name.clone(),
            content: message.content.clone(),
            attachments: message.attachments.clone(),
            registered: message.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            key: manageable.then_some(key),
            struck: false,
            preview_disabled: false,
            delete_disabled: false,
        }
    }

    fn render(&self) -> Component {
        let heading = if self.struck {
            format!("### ~~{}~~", self.activity_name)
        } else {
            format!("### {}", self.activity_name)
        };
        let content = if self.content.is_empty() {
            NO_TEXT.to_string()
        } else {
            self.content.clone()
        };

        let mut components = vec![Component::text(heading), Component::text(content)];
        components.extend(self.attachments.iter().map(|a| Component::File {
            name: a.name.clone(),
            url: a.url.clone(),
        }));
        components.push(Component::text(format!("{REGISTERED_PREFIX}{}", self.registered)));
        components.push(self.controls());

        Component::Container { components }
    }

    fn controls(&self) -> Component {
        let ids = self.key.as_ref().and_then(|key| {
            let preview = FlowStep::Preview(key.clone()).encode().ok()?;
            let delete = FlowStep::Delete(key.clone()).encode().ok()?;
            Some((preview, delete))
        });

        let Some((preview_id, delete_id)) = ids else {
            return Component::text(UNMANAGEABLE_HINT);
        };

        Component::ActionRow {
            components: vec![
                Component::Button {
                    custom_id: preview_id,
                    label: "Preview".to_string(),
                    style: ButtonStyle::Secondary,
                    disabled: self.preview_disabled,
                },
                Component::Button {
                    custom_id: delete_id,
                    label: if self.struck { "Deleted" } else { "Delete" }.to_string(),
                    style: if self.struck {
                        ButtonStyle::Secondary
                    } else {
                        ButtonStyle::Danger
                    },
                    disabled: self.delete_disabled,
                },
            ],
        }
    }

    fn parse(component: &Component) -> Option<Self> {
        let Component::Container { components } = component else {
            return None;
        };

        let (heading, rest) = components.split_first()?;
        let Component::TextDisplay { content: heading } = heading else {
            return None;
        };
        let title = heading.strip_prefix("### ")?;
        let (activity_name, struck) = match title
            .strip_prefix("~~")
            .and_then(|t| t.strip_suffix("~~"))
        {
            Some(inner) => (inner.to_string(), true),
            None => (title.to_string(), false),
        };

        let (content, rest) = rest.split_first()?;
        let Component::TextDisplay { content } = content else {
            return None;
        };
        let content = if content == NO_TEXT {
            String::new()
        } else {
            content.clone()
        };

        let mut attachments = Vec::new();
        let mut rest = rest;
        while let Some((Component::File { name, url }, tail)) = rest.split_first() {
            attachments.push(Attachment {
                name: name.clone(),
                url: url.clone(),
            });
            rest = tail;
        }

        let [footer, controls] = rest else {
            return None;
        };
        let Component::TextDisplay { content: footer } = footer else {
            return None;
        };
        let registered = footer.strip_prefix(REGISTERED_PREFIX)?.to_string();

        let mut card = Self {
            activity_name,
            content,
            attachments,
            registered,
            key: None,
            struck,
            preview_disabled: false,
            delete_disabled: false,
        };

        if let Component::ActionRow { components } = controls {
            let [
                Component::Button {
                    custom_id: preview_id,
                    disabled: preview_disabled,
                    ..
                },
                Component::Button {
                    disabled: delete_disabled,
                    ..
                },
            ] = components.as_slice()
            else {
                return None;
            };
            let FlowStep::Preview(key) = FlowStep::decode(preview_id).ok()? else {
                return None;
            };
            card.activity_name = key.activity_name.clone();
            card.key = Some(key);
            card.preview_disabled = *preview_disabled;
            card.delete_disabled = *delete_disabled;
        }

        Some(card)
    }
}

/// A list of registered messages with per-card Preview/Delete buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListView {
    pub heading: String,
    pub cards: Vec<MessageCard>,
}

impl ListView {
    pub fn from_messages(heading: impl Into<String>, messages: &[RegisteredMessage]) -> Self {
        Self {
            heading: heading.into(),
            cards: messages.iter().map(MessageCard::from_message).collect(),
        }
    }

    pub fn render(&self) -> Vec<Component> {
        let mut components = vec![Component::text(self.heading.clone())];
        components.extend(self.cards.iter().map(MessageCard::render));
        components
    }

    /// Recovers the view a list message was rendered from.
    pub fn parse(components: &[Component]) -> Option<Self> {
        let (heading, cards) = components.split_first()?;
        let Component::TextDisplay { content: heading } = heading else {
            return None;
        };
        let cards = cards
            .iter()
            .map(MessageCard::parse)
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            heading: heading.clone(),
            cards,
        })
    }

    /// The same list with the card for `key` struck through and its buttons
    /// disabled.
    pub fn with_deleted(&self, key: &MessageKey) -> Self {
        let cards = self
            .cards
            .iter()
            .map(|card| {
                if card.key.as_ref() == Some(key) {
                    MessageCard {
                        struck: true,
                        preview_disabled: true,
                        delete_disabled: true,
                        ..card.clone()
                    }
                } else {
                    card.clone()
                }
            })
            .collect();

        Self {
            heading: self.heading.clone(),
            cards,
        }
    }
}

/// What gets posted when a registered message is delivered or previewed.
pub fn delivery_message(message: &RegisteredMessage) -> OutgoingMessage {
    OutgoingMessage {
        content: (!message.content.is_empty()).then(|| message.content.clone()),
        attachments: message.attachments.clone(),
        ..OutgoingMessage::default()
    }
}

/// Components of the first registration reply: a select menu of known
/// activities (when there are any that fit) and a free-form entry button.
pub fn activity_picker(
    message_id: &MessageId,
    activities: &[String],
    pending_id: Uuid,
) -> Result<Vec<Component>, CustomIdError> {
    let mut names: Vec<&String> = activities.iter().collect();
    names.sort();
    names.dedup();

    let options: Vec<SelectOption> = names
        .into_iter()
        .filter_map(|name| {
            let value = FlowStep::Selected {
                message_id: message_id.clone(),
                activity_name: name.clone(),
            }
            .encode()
            .ok()?;
            Some(SelectOption {
                label: truncate(name, MAX_LABEL_LEN),
                value,
            })
        })
        .take(MAX_SELECT_OPTIONS)
        .collect();

    let mut components = Vec::new();
    if options.is_empty() {
        components.push(Component::text(
            "Which activity should trigger this message? Enter its name below.",
        ));
    } else {
        components.push(Component::text(
            "Which activity should trigger this message? Pick one you've been seen doing, or enter a name.",
        ));
        components.push(Component::ActionRow {
            components: vec![Component::StringSelect {
                custom_id: FlowStep::SelectActivity.encode()?,
                placeholder: "Choose an activity".to_string(),
                options,
            }],
        });
    }

    components.push(Component::ActionRow {
        components: vec![Component::Button {
            custom_id: FlowStep::OpenModal {
                message_id: message_id.clone(),
                pending_id,
            }
            .encode()?,
            label: "Enter activity name".to_string(),
            style: ButtonStyle::Primary,
            disabled: false,
        }],
    });

    Ok(components)
}

pub fn activity_modal(message_id: &MessageId, pending_id: Uuid) -> Result<Modal, CustomIdError> {
    Ok(Modal {
        custom_id: FlowStep::TextEntry {
            message_id: message_id.clone(),
            pending_id,
        }
        .encode()?,
        title: "Register Message".to_string(),
        inputs: vec![TextInput {
            custom_id: ACTIVITY_INPUT_ID.to_string(),
            label: "Activity name".to_string(),
            required: true,
            max_length: MAX_ACTIVITY_NAME_LEN,
        }],
    })
}

pub fn registered_confirmation(activity_name: &str) -> OutgoingMessage {
    OutgoingMessage::components(vec![Component::text(format!(
        "✅ The message will be sent in this channel whenever you start `{activity_name}`."
    ))])
}

fn truncate(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use joinme_types::ids::{ChannelId, GuildId, UserId};

    use super::*;

    fn message(activity: &str, content: &str) -> RegisteredMessage {
        RegisteredMessage {
            guild_id: GuildId::from("1"),
            user_id: UserId::from("2"),
            channel_id: ChannelId::from("3"),
            activity_name: activity.to_string(),
            content: content.to_string(),
            attachments: vec![Attachment {
                name: "cat.png".into(),
                url: "https://cdn.example/g-cat.png".into(),
            }],
            silenced_until: None,
            created_at: Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap(),
        }
    }

    #[test]
    fn rendered_list_parses_back() {
        let view = ListView::from_messages(
            "Your messages",
            &[message("Chess", "gg"), message("Go", ""), message(&"y".repeat(90), "long")],
        );
        assert!(view.cards[0].key.is_some());
        assert!(view.cards[2].key.is_none());

        let parsed = ListView::parse(&view.render()).unwrap();
        assert_eq!(parsed, view);
    }

    #[test]
    fn deleting_strikes_only_the_matching_card() {
        let chess = message("Chess", "gg");
        let view = ListView::from_messages("Your messages", &[chess.clone(), message("Go", "")]);

        let updated = view.with_deleted(&chess.key());

        assert!(updated.cards[0].struck);
        assert!(updated.cards[0].preview_disabled && updated.cards[0].delete_disabled);
        assert!(!updated.cards[1].struck && !updated.cards[1].delete_disabled);
        assert!(!view.cards[0].struck, "original view is untouched");

        let rendered = updated.render();
        let Component::Container { components } = &rendered[1] else {
            panic!("expected a card container");
        };
        assert_eq!(components[0], Component::text("### ~~Chess~~"));
        assert_eq!(ListView::parse(&updated.render()).unwrap(), updated);
    }

    #[test]
    fn picker_omits_options_that_do_not_fit() {
        let activities = vec![
            "Go".to_string(),
            "Chess".to_string(),
            "Go".to_string(),
            "z".repeat(120),
        ];
        let components = activity_picker(&MessageId::from("9"), &activities, Uuid::nil()).unwrap();

        let Component::ActionRow { components: row } = &components[1] else {
            panic!("expected select row");
        };
        let Component::StringSelect { options, .. } = &row[0] else {
            panic!("expected select menu");
        };
        let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["Chess", "Go"]);
        assert_eq!(
            FlowStep::decode(&options[0].value).unwrap(),
            FlowStep::Selected {
                message_id: MessageId::from("9"),
                activity_name: "Chess".into()
            }
        );
    }

    #[test]
    fn picker_caps_options() {
        let activities: Vec<String> = (0..40).map(|i| format!("Game {i:02}")).collect();
        let components = activity_picker(&MessageId::from("9"), &activities, Uuid::nil()).unwrap();

        let Component::ActionRow { components: row } = &components[1] else {
            panic!("expected select row");
        };
        let Component::StringSelect { options, .. } = &row[0] else {
            panic!("expected select menu");
        };
        assert_eq!(options.len(), MAX_SELECT_OPTIONS);
    }

    #[test]
    fn picker_without_activities_only_offers_free_entry() {
        let components = activity_picker(&MessageId::from("9"), &[], Uuid::nil()).unwrap();
        assert_eq!(components.len(), 2);
        assert!(matches!(&components[1], Component::ActionRow { components } if matches!(components[0], Component::Button { .. })));
    }
}
