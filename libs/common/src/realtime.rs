//! Realtime change channel over the backend websocket
//!
//! Speaks the phoenix channel protocol: join a `realtime:<name>` topic
//! with a `postgres_changes` config, heartbeat every 25 seconds, forward
//! change frames to the callback, leave on unsubscribe.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    error::{StoreError, StoreResult},
    store::{ChangeCallback, ChangeEvent, ChangePayload, ChannelSpec, Subscription},
};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

/// A decoded server frame
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A row change on the joined table
    Change(ChangePayload),
    /// The server refused or closed the channel
    Rejected(String),
    /// Replies, presence and system messages
    Other,
}

/// Topic name for a channel
pub fn topic(channel: &ChannelSpec) -> String {
    format!("realtime:{}", channel.name)
}

/// `phx_join` message for a channel
pub fn join_message(channel: &ChannelSpec, access_token: &str, msg_ref: u64) -> Value {
    let mut change = json!({
        "event": "*",
        "schema": channel.schema,
        "table": channel.table,
    });
    if let Some(filter) = &channel.filter {
        change["filter"] = json!(filter);
    }

    json!({
        "topic": topic(channel),
        "event": "phx_join",
        "payload": {
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [change],
            },
            "access_token": access_token,
        },
        "ref": msg_ref.to_string(),
        "join_ref": msg_ref.to_string(),
    })
}

pub fn heartbeat_message(msg_ref: u64) -> Value {
    json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": msg_ref.to_string(),
    })
}

pub fn leave_message(topic: &str, msg_ref: u64) -> Value {
    json!({
        "topic": topic,
        "event": "phx_leave",
        "payload": {},
        "ref": msg_ref.to_string(),
    })
}

/// Decode one text frame from the server
pub fn decode_frame(text: &str) -> StoreResult<Frame> {
    let frame: Value = serde_json::from_str(text)?;
    let event = frame["event"].as_str().unwrap_or_default();
    let payload = &frame["payload"];

    match event {
        "postgres_changes" => {
            let data = &payload["data"];
            let event: ChangeEvent = serde_json::from_value(data["type"].clone())?;
            let non_null = |value: &Value| (!value.is_null()).then(|| value.clone());

            Ok(Frame::Change(ChangePayload {
                event,
                table: data["table"].as_str().unwrap_or_default().to_string(),
                record: non_null(&data["record"]),
                old_record: non_null(&data["old_record"]),
                commit_timestamp: data["commit_timestamp"].as_str().map(str::to_string),
            }))
        }
        "phx_reply" if payload["status"] == "error" => Ok(Frame::Rejected(
            payload["response"]["reason"]
                .as_str()
                .unwrap_or("join rejected")
                .to_string(),
        )),
        "phx_error" => Ok(Frame::Rejected("channel error".to_string())),
        "phx_close" => Ok(Frame::Rejected("channel closed".to_string())),
        _ => Ok(Frame::Other),
    }
}

/// Connect, join the channel and start forwarding changes
pub(crate) async fn open(
    endpoint: Url,
    access_token: String,
    channel: ChannelSpec,
    on_change: ChangeCallback,
) -> StoreResult<Subscription> {
    let (ws_stream, _response) = connect_async(endpoint.as_str())
        .await
        .map_err(|e| StoreError::Realtime(format!("Failed to connect: {}", e)))?;
    let (mut sink, mut stream) = ws_stream.split();

    let topic = topic(&channel);
    sink.send(Message::Text(
        join_message(&channel, &access_token, 1).to_string(),
    ))
    .await
    .map_err(|e| StoreError::Realtime(format!("Failed to join {}: {}", topic, e)))?;

    info!("Joined realtime channel {}", topic);

    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let task_topic = topic.clone();

    tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut msg_ref = 2u64;

        loop {
            tokio::select! {
                _ = &mut stop_rx => {
                    let _ = sink
                        .send(Message::Text(leave_message(&task_topic, msg_ref).to_string()))
                        .await;
                    let _ = sink.close().await;
                    info!("Left realtime channel {}", task_topic);
                    break;
                }
                _ = heartbeat.tick() => {
                    if let Err(e) = sink
                        .send(Message::Text(heartbeat_message(msg_ref).to_string()))
                        .await
                    {
                        warn!("Realtime heartbeat failed on {}: {}", task_topic, e);
                        break;
                    }
                    msg_ref += 1;
                }
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => match decode_frame(&text) {
                        Ok(Frame::Change(change)) => {
                            debug!("Realtime {:?} on {}", change.event, change.table);
                            on_change(change);
                        }
                        Ok(Frame::Rejected(reason)) => {
                            warn!("Realtime channel {} rejected: {}", task_topic, reason);
                        }
                        Ok(Frame::Other) => {}
                        Err(e) => warn!("Undecodable realtime frame on {}: {}", task_topic, e),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Realtime connection for {} closed", task_topic);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Realtime connection for {} failed: {}", task_topic, e);
                        break;
                    }
                }
            }
        }
    });

    Ok(Subscription::new(topic, move || {
        let _ = stop_tx.send(());
    }))
}
