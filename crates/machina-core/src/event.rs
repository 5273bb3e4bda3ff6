//! Inbound event records.
//!
//! An [`Event`] is the unit the transport hands to the engine: a `type`
//! discriminator plus, for message-shaped events, a destination `channel`
//! and a `text` body. Everything else the wire carries is kept opaquely in
//! [`Event::extra`] — the engine never assumes a closed schema, and only
//! `type`, `channel` and `text` are ever read or rewritten.
//!
//! An event lives for exactly one dispatch pass: the transport constructs
//! it, the router consumes it, nothing retains it afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One inbound event from the messaging connection.
///
/// # Example
///
/// ```rust
/// use machina_core::Event;
///
/// let event = Event::message("C024BE91L", "hello world");
/// assert!(event.is_message());
/// assert_eq!(event.channel.as_deref(), Some("C024BE91L"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The event type discriminator (`"message"`, `"reaction_added"`, ...).
    #[serde(rename = "type")]
    pub event_type: String,

    /// Destination identifier, present on message-shaped events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    /// Message body, present on message-shaped events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// All remaining wire fields, carried opaquely.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    /// The event type that participates in message routing.
    pub const MESSAGE: &'static str = "message";

    /// Creates an event of the given type with no message fields.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            channel: None,
            text: None,
            extra: Map::new(),
        }
    }

    /// Creates a message event for a destination.
    pub fn message(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            event_type: Self::MESSAGE.to_string(),
            channel: Some(channel.into()),
            text: Some(text.into()),
            extra: Map::new(),
        }
    }

    /// Attaches an opaque wire field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Whether this event participates in message routing.
    pub fn is_message(&self) -> bool {
        self.event_type == Self::MESSAGE
    }

    /// The message body, with a missing `text` field read as empty.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Returns a copy of this event with its text replaced.
    ///
    /// Used by the router when a mention prefix has been stripped; the
    /// original event is left untouched for handlers that must observe the
    /// unmodified text.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..self.clone()
        }
    }

    /// Classifies this event's destination, if it has one.
    pub fn destination(&self) -> Option<DestinationKind> {
        self.channel.as_deref().map(DestinationKind::classify)
    }
}

/// Destination classification for directedness resolution.
///
/// Exactly two channel-like classes are recognized by their leading
/// identifier character; every other identifier is a direct-message-style
/// destination where a mention is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationKind {
    /// Public channel (`C*` identifiers).
    Channel,
    /// Private group (`G*` identifiers).
    Group,
    /// Direct conversation (anything else).
    Direct,
}

impl DestinationKind {
    /// Classifies a destination identifier by its leading character.
    pub fn classify(id: &str) -> Self {
        match id.chars().next() {
            Some('C') => Self::Channel,
            Some('G') => Self::Group,
            _ => Self::Direct,
        }
    }

    /// Whether a message on this destination must mention the bot to be
    /// considered directed.
    pub fn requires_mention(&self) -> bool {
        matches!(self, Self::Channel | Self::Group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructor_sets_fields() {
        let event = Event::message("C1", "hi");
        assert!(event.is_message());
        assert_eq!(event.channel.as_deref(), Some("C1"));
        assert_eq!(event.text(), "hi");
    }

    #[test]
    fn with_text_leaves_original_untouched() {
        let event = Event::message("C1", "@bot hi");
        let stripped = event.with_text("hi");
        assert_eq!(event.text(), "@bot hi");
        assert_eq!(stripped.text(), "hi");
        assert_eq!(stripped.channel, event.channel);
    }

    #[test]
    fn destination_classification() {
        assert_eq!(DestinationKind::classify("C024BE91L"), DestinationKind::Channel);
        assert_eq!(DestinationKind::classify("G1234"), DestinationKind::Group);
        assert_eq!(DestinationKind::classify("D1234"), DestinationKind::Direct);
        assert_eq!(DestinationKind::classify(""), DestinationKind::Direct);
        assert!(DestinationKind::Channel.requires_mention());
        assert!(!DestinationKind::Direct.requires_mention());
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let json = r#"{"type":"message","channel":"C1","text":"hi","ts":"1355517523.000005","team":"T024BE7LD"}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.extra.get("ts").and_then(Value::as_str), Some("1355517523.000005"));

        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back.get("team").and_then(Value::as_str), Some("T024BE7LD"));
    }

    #[test]
    fn missing_text_reads_as_empty() {
        let event = Event::new("message");
        assert_eq!(event.text(), "");
        assert_eq!(event.destination(), None);
    }
}
