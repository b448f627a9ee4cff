//! Phoenix channel frames spoken by Supabase Realtime.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ChangeEvent, ChangeFilter, ChangeKind};
use crate::{Error, Result};

pub const PHOENIX_TOPIC: &str = "phoenix";

const EVENT_JOIN: &str = "phx_join";
const EVENT_LEAVE: &str = "phx_leave";
const EVENT_REPLY: &str = "phx_reply";
const EVENT_ERROR: &str = "phx_error";
const EVENT_CLOSE: &str = "phx_close";
const EVENT_HEARTBEAT: &str = "heartbeat";
const EVENT_SYSTEM: &str = "system";
const EVENT_POSTGRES_CHANGES: &str = "postgres_changes";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

impl PhoenixMessage {
    pub fn to_text(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Full topic name for a realtime channel.
pub fn channel_topic(channel: &str) -> String {
    format!("realtime:{channel}")
}

pub fn join(
    topic: &str,
    filter: &ChangeFilter,
    access_token: Option<&str>,
    reference: &str,
) -> PhoenixMessage {
    let mut payload = json!({
        "config": {
            "broadcast": {"ack": false, "self": false},
            "presence": {"key": ""},
            "postgres_changes": [{
                "event": filter.event.as_str(),
                "schema": filter.schema,
                "table": filter.table,
            }],
        },
    });
    if let Some(token) = access_token {
        payload["access_token"] = Value::String(token.to_string());
    }

    PhoenixMessage {
        topic: topic.to_string(),
        event: EVENT_JOIN.to_string(),
        payload,
        reference: Some(reference.to_string()),
        join_ref: Some(reference.to_string()),
    }
}

pub fn heartbeat(reference: &str) -> PhoenixMessage {
    PhoenixMessage {
        topic: PHOENIX_TOPIC.to_string(),
        event: EVENT_HEARTBEAT.to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
        join_ref: None,
    }
}

pub fn leave(topic: &str, reference: &str) -> PhoenixMessage {
    PhoenixMessage {
        topic: topic.to_string(),
        event: EVENT_LEAVE.to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
        join_ref: None,
    }
}

/// Channel lifecycle as reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    Subscribed,
    ChannelError(String),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Change(ChangeEvent),
    Status(ChannelStatus),
    /// Heartbeat replies and frames for other topics
    Ignored,
}

/// Classify a text frame received on the socket.
pub fn decode(text: &str, topic: &str, join_ref: &str) -> Result<Inbound> {
    let message: PhoenixMessage = serde_json::from_str(text)?;
    if message.topic != topic {
        return Ok(Inbound::Ignored);
    }

    match message.event.as_str() {
        EVENT_POSTGRES_CHANGES => decode_change(&message.payload).map(Inbound::Change),
        EVENT_REPLY if message.reference.as_deref() == Some(join_ref) => {
            Ok(Inbound::Status(join_reply_status(&message.payload)))
        }
        EVENT_SYSTEM => {
            let status = message.payload.get("status").and_then(Value::as_str);
            if status == Some("ok") {
                Ok(Inbound::Ignored)
            } else {
                Ok(Inbound::Status(ChannelStatus::ChannelError(
                    payload_message(&message.payload),
                )))
            }
        }
        EVENT_ERROR => Ok(Inbound::Status(ChannelStatus::ChannelError(
            payload_message(&message.payload),
        ))),
        EVENT_CLOSE => Ok(Inbound::Status(ChannelStatus::Closed)),
        _ => Ok(Inbound::Ignored),
    }
}

#[derive(Debug, Deserialize)]
struct PostgresChangeData {
    schema: String,
    table: String,
    #[serde(rename = "type")]
    kind: ChangeKind,
}

fn decode_change(payload: &Value) -> Result<ChangeEvent> {
    let data = payload
        .get("data")
        .ok_or_else(|| Error::Api("postgres_changes frame without data".to_string()))?;
    let header: PostgresChangeData = serde_json::from_value(data.clone())?;

    Ok(ChangeEvent {
        event: header.kind,
        schema: header.schema,
        table: header.table,
        payload: data.clone(),
    })
}

fn join_reply_status(payload: &Value) -> ChannelStatus {
    match payload.get("status").and_then(Value::as_str) {
        Some("ok") => ChannelStatus::Subscribed,
        _ => ChannelStatus::ChannelError(payload_message(payload)),
    }
}

fn payload_message(payload: &Value) -> String {
    payload
        .pointer("/response/reason")
        .or_else(|| payload.get("message"))
        .or_else(|| payload.get("reason"))
        .and_then(Value::as_str)
        .map_or_else(|| payload.to_string(), ToString::to_string)
}
