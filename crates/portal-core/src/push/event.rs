use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Absolute unread counters pushed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnreadCounts {
    #[serde(default)]
    pub notifications: u64,
    #[serde(default)]
    pub messages: u64,
}

/// Typed inbound push message.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// A new notification; the payload is republished as received.
    Notification(Value),
    /// A new direct message.
    Message(Value),
    UnreadCount(UnreadCounts),
    /// Server acknowledgment after authenticating the socket.
    Connected(Value),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl PushEvent {
    /// Parse a `{type, data}` frame. Unknown types yield `Ok(None)`.
    pub fn parse(text: &str) -> Result<Option<Self>, serde_json::Error> {
        let envelope: Envelope = serde_json::from_str(text)?;
        let event = match envelope.kind.as_str() {
            "notification" => Self::Notification(envelope.data),
            "message" => Self::Message(envelope.data),
            "unread_count" => Self::UnreadCount(serde_json::from_value(envelope.data)?),
            "connected" => Self::Connected(envelope.data),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Notification(_) => "notification",
            Self::Message(_) => "message",
            Self::UnreadCount(_) => "unread_count",
            Self::Connected(_) => "connected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_known_frames() {
        let event = PushEvent::parse(r#"{"type":"unread_count","data":{"notifications":3,"messages":1}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            PushEvent::UnreadCount(UnreadCounts {
                notifications: 3,
                messages: 1
            })
        );

        let event = PushEvent::parse(r#"{"type":"notification","data":{"id":5,"title":"New like"}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(event, PushEvent::Notification(json!({"id": 5, "title": "New like"})));
        assert_eq!(event.kind(), "notification");

        let event = PushEvent::parse(r#"{"type":"connected"}"#).unwrap().unwrap();
        assert_eq!(event, PushEvent::Connected(Value::Null));
    }

    #[test]
    fn unknown_types_are_skipped() {
        assert_eq!(PushEvent::parse(r#"{"type":"typing","data":{}}"#).unwrap(), None);
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(PushEvent::parse("pong").is_err());
        assert!(PushEvent::parse(r#"{"type":"unread_count","data":"many"}"#).is_err());
    }
}
