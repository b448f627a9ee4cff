//! Supabase Realtime websocket client.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::protocol::{self, ChannelStatus, Inbound};
use super::{ChangeEvent, ChangeFilter, Subscription};
use crate::config::RemoteConfig;
use crate::Result;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
const JOIN_REF: &str = "1";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens one websocket per subscription and joins the configured channel.
#[derive(Debug, Clone)]
pub struct RealtimeFeed {
    url: String,
    channel: String,
}

impl RealtimeFeed {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            url: config.realtime_url(),
            channel: config.channel.clone(),
        }
    }

    /// Connect, join, and start forwarding changes.
    ///
    /// The socket is driven by a background task until the subscription is
    /// dropped or the server closes the channel. There is no reconnect.
    pub async fn subscribe(
        &self,
        filter: &ChangeFilter,
        access_token: Option<&str>,
    ) -> Result<Subscription> {
        let (mut socket, _response) = connect_async(self.url.as_str()).await?;
        let topic = protocol::channel_topic(&self.channel);

        let join = protocol::join(&topic, filter, access_token, JOIN_REF);
        socket.send(Message::Text(join.to_text()?)).await?;
        tracing::debug!(topic = %topic, table = %filter.table, "Realtime join sent");

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(drive_channel(socket, topic, events_tx, shutdown_rx));

        Ok(Subscription::new(events_rx, move || {
            let _ = shutdown_tx.send(());
        }))
    }
}

async fn drive_channel(
    mut socket: Socket,
    topic: String,
    events: mpsc::UnboundedSender<ChangeEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;
    let mut next_ref: u64 = 2;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                let leave = protocol::leave(&topic, &next_ref.to_string());
                if let Ok(text) = leave.to_text() {
                    let _ = socket.send(Message::Text(text)).await;
                }
                let _ = socket.close(None).await;
                tracing::info!(topic = %topic, "Realtime subscription status: CLOSED");
                break;
            }
            _ = heartbeat.tick() => {
                let frame = protocol::heartbeat(&next_ref.to_string());
                next_ref += 1;
                let sent = match frame.to_text() {
                    Ok(text) => socket.send(Message::Text(text)).await.map_err(crate::Error::from),
                    Err(error) => Err(error),
                };
                if let Err(error) = sent {
                    tracing::warn!(topic = %topic, "Realtime heartbeat failed: {}", error);
                    break;
                }
            }
            frame = socket.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if !handle_text(&text, &topic, &events) {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!(topic = %topic, "Realtime socket closed by server");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    tracing::warn!(topic = %topic, "Realtime socket error: {}", error);
                    break;
                }
            },
        }
    }
}

/// Returns `false` once the channel should stop.
fn handle_text(text: &str, topic: &str, events: &mpsc::UnboundedSender<ChangeEvent>) -> bool {
    match protocol::decode(text, topic, JOIN_REF) {
        Ok(Inbound::Change(change)) => {
            tracing::debug!(
                topic = %topic,
                event = ?change.event,
                table = %change.table,
                "Realtime change received"
            );
            events.send(change).is_ok()
        }
        Ok(Inbound::Status(ChannelStatus::Subscribed)) => {
            tracing::info!(topic = %topic, "Realtime subscription status: SUBSCRIBED");
            true
        }
        Ok(Inbound::Status(ChannelStatus::ChannelError(reason))) => {
            tracing::warn!(topic = %topic, "Realtime subscription status: CHANNEL_ERROR ({})", reason);
            true
        }
        Ok(Inbound::Status(ChannelStatus::Closed)) => {
            tracing::info!(topic = %topic, "Realtime subscription status: CLOSED");
            false
        }
        Ok(Inbound::Ignored) => true,
        Err(error) => {
            tracing::warn!(topic = %topic, "Ignoring malformed realtime frame: {}", error);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::ChangeKind;

    #[test]
    fn feed_targets_configured_channel() {
        let config = RemoteConfig::new("https://project.supabase.co", "anon")
            .unwrap()
            .with_channel(Some("links_changes".to_string()));
        let feed = RealtimeFeed::new(&config);
        assert!(feed.url.starts_with("wss://project.supabase.co/realtime/v1/websocket"));
        assert_eq!(feed.channel, "links_changes");
    }

    #[test]
    fn change_frames_are_forwarded_until_receiver_drops() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let frame = r#"{"topic":"realtime:c","event":"postgres_changes","payload":{"data":{"schema":"public","table":"bookmarks","type":"INSERT","record":{}}}}"#;

        assert!(handle_text(frame, "realtime:c", &tx));
        assert_eq!(rx.try_recv().unwrap().event, ChangeKind::Insert);

        drop(rx);
        assert!(!handle_text(frame, "realtime:c", &tx));
    }

    #[test]
    fn close_frame_stops_the_channel() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let close = r#"{"topic":"realtime:c","event":"phx_close","payload":{}}"#;
        assert!(!handle_text(close, "realtime:c", &tx));
        assert!(handle_text("garbage", "realtime:c", &tx));
    }
}
