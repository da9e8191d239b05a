//! Surface-independent view of the conversation.
//!
//! [`Renderer::render`] turns a [`ChatState`] into a [`VisibleOutput`]: one
//! unit per message plus a typing unit while a request is pending. Adapters
//! ([`crate::ui::terminal`], [`crate::ui::html`]) draw it. Bodies carry the
//! raw message text; escaping for the target medium is the adapter's job.

use chrono::{FixedOffset, Local, Offset, TimeZone, Utc};

use crate::core::message::{Message, Role};
use crate::core::orchestrator::ChatState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Bot,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitBody {
    Text(String),
    Typing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleUnit {
    pub key: String,
    pub alignment: Alignment,
    pub icon: Icon,
    pub body: UnitBody,
    /// `HH:MM`; absent on the typing unit.
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleOutput {
    pub units: Vec<VisibleUnit>,
    /// Surfaces scroll to the newest unit after every render.
    pub scroll_to_end: bool,
}

impl VisibleOutput {
    /// Plain text of the whole surface, one unit per paragraph.
    pub fn visible_text(&self) -> String {
        self.units
            .iter()
            .map(|unit| {
                let body = match &unit.body {
                    UnitBody::Text(text) => text.as_str(),
                    UnitBody::Typing => "...",
                };
                match &unit.time {
                    Some(time) => format!("{body}\n{time}"),
                    None => body.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

pub trait Renderer {
    fn render(&self, state: &ChatState) -> VisibleOutput;
}

#[derive(Debug, Clone, Copy)]
enum Zone {
    Local,
    Fixed(FixedOffset),
}

/// Chat-bubble layout: assistant on the start side, user on the end side.
#[derive(Debug, Clone, Copy)]
pub struct TranscriptRenderer {
    zone: Zone,
}

impl TranscriptRenderer {
    /// Times in the machine's local zone.
    pub fn local() -> Self {
        Self { zone: Zone::Local }
    }

    pub fn utc() -> Self {
        Self::with_offset(Utc.fix())
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            zone: Zone::Fixed(offset),
        }
    }

    pub fn render_messages(&self, messages: &[Message], loading: bool) -> VisibleOutput {
        let mut units: Vec<VisibleUnit> = messages
            .iter()
            .map(|message| self.message_unit(message))
            .collect();

        if loading {
            units.push(VisibleUnit {
                key: "typing".to_string(),
                alignment: Alignment::Start,
                icon: Icon::Bot,
                body: UnitBody::Typing,
                time: None,
            });
        }

        VisibleOutput {
            units,
            scroll_to_end: true,
        }
    }

    fn message_unit(&self, message: &Message) -> VisibleUnit {
        let (alignment, icon) = match message.role {
            Role::User => (Alignment::End, Icon::User),
            Role::Assistant | Role::System => (Alignment::Start, Icon::Bot),
        };
        VisibleUnit {
            key: message.id.clone(),
            alignment,
            icon,
            body: UnitBody::Text(message.content.clone()),
            time: Some(self.format_time(message.timestamp)),
        }
    }

    fn format_time(&self, timestamp_ms: i64) -> String {
        const FORMAT: &str = "%H:%M";
        let formatted = match self.zone {
            Zone::Local => Local
                .timestamp_millis_opt(timestamp_ms)
                .single()
                .map(|t| t.format(FORMAT).to_string()),
            Zone::Fixed(offset) => offset
                .timestamp_millis_opt(timestamp_ms)
                .single()
                .map(|t| t.format(FORMAT).to_string()),
        };
        formatted.unwrap_or_else(|| "--:--".to_string())
    }
}

impl Renderer for TranscriptRenderer {
    fn render(&self, state: &ChatState) -> VisibleOutput {
        self.render_messages(state.messages(), state.loading())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::WELCOME_MESSAGE;
    use crate::core::credential::{CredentialHolder, MemoryCredentialStore};

    fn sample_messages() -> Vec<Message> {
        vec![
            Message::welcome(0),
            Message::user("hello", 90_000),
            Message::assistant("hi there", 3_600_000),
        ]
    }

    #[test]
    fn assistant_starts_and_user_ends() {
        let output = TranscriptRenderer::utc().render_messages(&sample_messages(), false);

        assert_eq!(output.units.len(), 3);
        assert_eq!(output.units[0].alignment, Alignment::Start);
        assert_eq!(output.units[0].icon, Icon::Bot);
        assert_eq!(output.units[0].key, "welcome");
        assert_eq!(output.units[1].alignment, Alignment::End);
        assert_eq!(output.units[1].icon, Icon::User);
        assert_eq!(output.units[2].alignment, Alignment::Start);
        assert!(output.scroll_to_end);
    }

    #[test]
    fn times_are_hours_and_minutes() {
        let output = TranscriptRenderer::utc().render_messages(&sample_messages(), false);
        let times: Vec<_> = output
            .units
            .iter()
            .map(|u| u.time.clone().unwrap_or_default())
            .collect();
        assert_eq!(times, vec!["00:00", "00:01", "01:00"]);

        let shifted = TranscriptRenderer::with_offset(FixedOffset::east_opt(2 * 3600).unwrap())
            .render_messages(&sample_messages()[..1], false);
        assert_eq!(shifted.units[0].time.as_deref(), Some("02:00"));
    }

    #[test]
    fn loading_appends_single_typing_unit_last() {
        let output = TranscriptRenderer::utc().render_messages(&sample_messages(), true);
        assert_eq!(output.units.len(), 4);
        let typing = output.units.last().unwrap();
        assert_eq!(typing.body, UnitBody::Typing);
        assert_eq!(typing.alignment, Alignment::Start);
        assert_eq!(typing.icon, Icon::Bot);
        assert!(typing.time.is_none());
    }

    #[test]
    fn rendering_is_idempotent() {
        let state = ChatState::new(
            CredentialHolder::load(Box::new(MemoryCredentialStore::default())),
            1_700_000_000_000,
        );
        let renderer = TranscriptRenderer::local();
        let first = renderer.render(&state);
        let second = renderer.render(&state);
        assert_eq!(first, second);
        assert_eq!(first.visible_text(), second.visible_text());
        assert!(first.visible_text().starts_with(WELCOME_MESSAGE));
    }

    #[test]
    fn markup_is_carried_verbatim() {
        let messages = vec![Message::user("<script>alert(1)</script>", 0)];
        let output = TranscriptRenderer::utc().render_messages(&messages, false);
        assert_eq!(
            output.units[0].body,
            UnitBody::Text("<script>alert(1)</script>".to_string())
        );
    }
}
