//! RealtimeFeed: background websocket worker for table change notifications
//!
//! 1. Connect to the realtime endpoint
//! 2. Join one channel per table
//! 3. Heartbeat every 30 s
//! 4. Forward row changes into the [`ChangeHub`]
//! 5. Reconnect with exponential backoff on disconnect

use futures::{SinkExt, StreamExt};
use shared::message::{ChangeAction, ChangeEvent, Table};
use tokio::time::Duration;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::protocol::{self, PhoenixMessage};
use crate::client::ChangeHub;
use crate::{ClientConfig, ClientError, ClientResult};

/// Initial reconnect delay
const INITIAL_RETRY_DELAY_SECS: u64 = 5;
/// Max reconnect delay
const MAX_RECONNECT_DELAY_SECS: u64 = 120;
/// Phoenix heartbeat interval
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

pub struct RealtimeFeed {
    config: ClientConfig,
    hub: ChangeHub,
    tables: Vec<Table>,
    shutdown: CancellationToken,
    next_ref: u64,
}

impl RealtimeFeed {
    pub fn new(
        config: ClientConfig,
        hub: ChangeHub,
        tables: Vec<Table>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            hub,
            tables,
            shutdown,
            next_ref: 0,
        }
    }

    fn next_ref(&mut self) -> u64 {
        self.next_ref += 1;
        self.next_ref
    }

    /// Main run loop: connect, handle frames, reconnect on failure
    pub async fn run(mut self) {
        let url = match self.config.realtime_url() {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("RealtimeFeed disabled: {e}");
                return;
            }
        };

        tracing::info!(tables = ?self.tables, "RealtimeFeed started");
        let mut reconnect_delay = Duration::from_secs(INITIAL_RETRY_DELAY_SECS);
        let mut connected_before = false;

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            match tokio_tungstenite::connect_async(url.as_str()).await {
                Ok((ws, _)) => {
                    reconnect_delay = Duration::from_secs(INITIAL_RETRY_DELAY_SECS);
                    if connected_before {
                        // 断线期间的变更收不到，通知订阅方整表重拉
                        self.publish_resync();
                    }
                    connected_before = true;
                    if let Err(e) = self.run_session(ws).await {
                        tracing::warn!("Realtime session ended: {e}");
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        delay_secs = reconnect_delay.as_secs(),
                        "Realtime connection failed: {e}"
                    );
                }
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(reconnect_delay) => {},
            }
            reconnect_delay =
                (reconnect_delay * 2).min(Duration::from_secs(MAX_RECONNECT_DELAY_SECS));
        }

        tracing::info!("RealtimeFeed stopped");
    }

    fn publish_resync(&self) {
        for table in &self.tables {
            self.hub
                .publish(ChangeEvent::new(*table, ChangeAction::Update, None));
        }
    }

    /// Run a single websocket session until disconnect or shutdown
    async fn run_session<S>(&mut self, ws: S) -> ClientResult<()>
    where
        S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
            + Unpin,
    {
        let (mut sink, mut stream) = ws.split();

        for table in self.tables.clone() {
            let reference = self.next_ref();
            let join = protocol::join(table, &self.config.anon_key, reference);
            send_frame(&mut sink, &join).await?;
        }

        let mut heartbeat = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
        heartbeat.tick().await; // skip immediate tick

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    let _ = sink.close().await;
                    return Ok(());
                }

                _ = heartbeat.tick() => {
                    let reference = self.next_ref();
                    send_frame(&mut sink, &protocol::heartbeat(reference)).await?;
                }

                msg = stream.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => self.handle_frame(text.as_str())?,
                        Some(Ok(Message::Ping(data))) => {
                            let _ = sink.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            return Err(ClientError::Realtime("closed by server".into()));
                        }
                        Some(Err(e)) => return Err(ClientError::Realtime(e.to_string())),
                        None => return Err(ClientError::Realtime("stream ended".into())),
                        _ => {} // Binary, Pong
                    }
                }
            }
        }
    }

    fn handle_frame(&self, text: &str) -> ClientResult<()> {
        let frame: PhoenixMessage = match serde_json::from_str(text) {
            Ok(f) => f,
            Err(e) => {
                tracing::debug!("Ignoring malformed realtime frame: {e}");
                return Ok(());
            }
        };

        if frame.is_error_reply() {
            tracing::warn!(topic = %frame.topic, payload = %frame.payload, "Realtime join rejected");
            return Ok(());
        }
        if frame.is_channel_down() {
            return Err(ClientError::Realtime(format!(
                "channel {} {}",
                frame.topic, frame.event
            )));
        }
        if let Some(event) = frame.to_change_event() {
            tracing::debug!(table = %event.table, action = %event.action, id = ?event.id, "Realtime change");
            self.hub.publish(event);
        }
        Ok(())
    }
}

async fn send_frame<S>(sink: &mut S, frame: &PhoenixMessage) -> ClientResult<()>
where
    S: futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let json = serde_json::to_string(frame)?;
    sink.send(Message::Text(json.into()))
        .await
        .map_err(|e| ClientError::Realtime(e.to_string()))
}
