use std::{fmt, str::FromStr};

use serde::Deserialize;

use crate::{CoreError, MAX_EVENT_DATA_BYTES};

/// A named server-sent-event stream on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Status,
    Files,
    Messages,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Status, Channel::Files, Channel::Messages];

    #[must_use]
    pub fn stream_name(self) -> &'static str {
        match self {
            Channel::Status => "status",
            Channel::Files => "files",
            Channel::Messages => "messages",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stream_name())
    }
}

impl FromStr for Channel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(Channel::Status),
            "files" => Ok(Channel::Files),
            "messages" => Ok(Channel::Messages),
            other => Err(CoreError::UnknownChannel(other.to_owned())),
        }
    }
}

/// A decoded backend event, tagged by the channel it arrived on.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Per-file transfer progress. The backend emits fractional percents,
    /// so this stays a float; the reconciler only cares about thresholds.
    Progress { id: String, file: String, percent: f64 },
    /// Aggregate backup status ("uploaded X of Y").
    Status { done: u64, total: u64, status: String },
    /// Human-readable message destined for a desktop notification.
    Message { kind: String, text: String },
}

#[derive(Debug, Deserialize)]
struct ProgressWire {
    id: String,
    file: String,
    percent: f64,
}

#[derive(Debug, Deserialize)]
struct StatusWire {
    done: u64,
    total: u64,
    status: String,
}

#[derive(Debug, Deserialize)]
struct MessageWire {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Decode one SSE `data` payload for the given channel.
///
/// Unknown extra fields are ignored; the backend also sends `storage` and
/// `path` on the files channel. A malformed payload is an error here, but
/// callers drop it and keep reading — decode failures are never fatal to
/// the stream.
pub fn decode_event(channel: Channel, data: &str) -> Result<Event, CoreError> {
    if data.len() > MAX_EVENT_DATA_BYTES {
        return Err(CoreError::PayloadTooLarge);
    }

    let malformed = |err: serde_json::Error| CoreError::MalformedPayload {
        channel,
        cause: err.to_string(),
    };

    match channel {
        Channel::Files => {
            let wire: ProgressWire = serde_json::from_str(data).map_err(malformed)?;
            if !wire.percent.is_finite() || wire.percent < 0.0 {
                return Err(CoreError::InvalidPercent(wire.percent));
            }
            Ok(Event::Progress {
                id: wire.id,
                file: wire.file,
                percent: wire.percent,
            })
        }
        Channel::Status => {
            let wire: StatusWire = serde_json::from_str(data).map_err(malformed)?;
            Ok(Event::Status {
                done: wire.done,
                total: wire.total,
                status: wire.status,
            })
        }
        Channel::Messages => {
            let wire: MessageWire = serde_json::from_str(data).map_err(malformed)?;
            Ok(Event::Message {
                kind: wire.kind,
                text: wire.message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_files_payload_with_extra_fields() {
        let data = r#"{"storage":"gdrive","file":"photo.jpg","path":"/home/x/photo.jpg","id":"abc123","percent":42.5}"#;
        let event = decode_event(Channel::Files, data).unwrap();
        assert_eq!(
            event,
            Event::Progress {
                id: "abc123".to_owned(),
                file: "photo.jpg".to_owned(),
                percent: 42.5,
            }
        );
    }

    #[test]
    fn decodes_status_payload() {
        let data = r#"{"done":3,"total":10,"status":"uploading"}"#;
        let event = decode_event(Channel::Status, data).unwrap();
        assert_eq!(
            event,
            Event::Status {
                done: 3,
                total: 10,
                status: "uploading".to_owned(),
            }
        );
    }

    #[test]
    fn decodes_message_payload() {
        let data = r#"{"type":"ERROR","message":"upload failed","source":"watcher"}"#;
        let event = decode_event(Channel::Messages, data).unwrap();
        assert_eq!(
            event,
            Event::Message {
                kind: "ERROR".to_owned(),
                text: "upload failed".to_owned(),
            }
        );
    }

    #[test]
    fn rejects_non_json_payload() {
        let err = decode_event(Channel::Files, "{not json").unwrap_err();
        assert!(matches!(err, CoreError::MalformedPayload { .. }));
    }

    #[test]
    fn rejects_missing_required_field() {
        let err = decode_event(Channel::Files, r#"{"id":"a","percent":10}"#).unwrap_err();
        assert!(matches!(err, CoreError::MalformedPayload { .. }));
    }

    #[test]
    fn rejects_negative_and_nan_percent() {
        let err =
            decode_event(Channel::Files, r#"{"id":"a","file":"f","percent":-1}"#).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPercent(_)));

        let err =
            decode_event(Channel::Files, r#"{"id":"a","file":"f","percent":null}"#).unwrap_err();
        assert!(matches!(err, CoreError::MalformedPayload { .. }));
    }

    #[test]
    fn channel_name_roundtrip() {
        for channel in Channel::ALL {
            assert_eq!(channel.stream_name().parse::<Channel>().unwrap(), channel);
        }
        assert!("ping".parse::<Channel>().is_err());
    }
}
