use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt};
use retroboard_common::{RetroId, SessionState};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::SyncError;

/// Events buffered per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 256;

/// Outbound intents waiting for the driver.
const OUTBOUND_CAPACITY: usize = 64;

// ── Wire message types ───────────────────────────────────────────────

/// Inbound server push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Full replacement of a retro's session state.
    #[serde(rename = "retro_update", rename_all = "camelCase")]
    RetroUpdate {
        #[serde(alias = "retro_id")]
        retro_id: RetroId,
        data: SessionState,
    },
    #[serde(rename = "retro_delete", rename_all = "camelCase")]
    RetroDelete {
        #[serde(alias = "retro_id")]
        retro_id: RetroId,
    },
    #[serde(other)]
    Unknown,
}

/// Outbound client intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientIntent {
    JoinRetro { retro_id: RetroId },
    LeaveRetro { retro_id: RetroId },
}

/// Decode one inbound text frame.
///
/// Frames that are not JSON objects or carry no string `type` are errors;
/// unrecognised tags decode to [`ServerEvent::Unknown`].
pub fn parse_server_event(frame: &str) -> Result<ServerEvent, SyncError> {
    let value: serde_json::Value =
        serde_json::from_str(frame).map_err(|e| SyncError::Malformed(e.to_string()))?;
    let Some(tag) = value.get("type").and_then(|t| t.as_str()) else {
        return Err(SyncError::MissingType);
    };
    let tag = tag.to_string();
    let event: ServerEvent = serde_json::from_value(value)
        .map_err(|e| SyncError::Malformed(format!("{tag}: {e}")))?;
    if event == ServerEvent::Unknown {
        debug!(tag = %tag, "ignoring unrecognised server event");
    }
    Ok(event)
}

/// What subscribers of a [`SyncChannel`] receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Server(ServerEvent),
    /// A connection was established. `resumed` is set on every connection
    /// after the first, when subscribers may have missed pushes.
    Connected { resumed: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Closed => "closed",
        };
        f.write_str(label)
    }
}

// ── Transport seam ───────────────────────────────────────────────────

pub type FrameSink = Pin<Box<dyn Sink<String, Error = SyncError> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, SyncError>> + Send>>;

/// Opens one text-frame connection to the sync endpoint.
/// Real implementation: `WsConnector`.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<(FrameSink, FrameStream), SyncError>;
}

/// Floor for the reconnect delay, so a zero base cannot spin the driver.
pub const MIN_RECONNECT_DELAY: Duration = Duration::from_millis(1);

/// Exponential backoff between connection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base: Duration,
    pub ceiling: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            ceiling: Duration::from_secs(30),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (zero-based). Never below
    /// [`MIN_RECONNECT_DELAY`], whatever the configured base.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base.max(MIN_RECONNECT_DELAY);
        1u32.checked_shl(attempt)
            .and_then(|factor| base.checked_mul(factor))
            .unwrap_or(self.ceiling)
            .min(self.ceiling)
            .max(MIN_RECONNECT_DELAY)
    }
}

// ── Channel ──────────────────────────────────────────────────────────

/// Process-wide realtime connection.
///
/// A single driver task owns the transport. Views subscribe to
/// [`ChannelEvent`]s and detach by dropping their receiver; the connection
/// outlives any one view.
pub struct SyncChannel {
    events: broadcast::Sender<ChannelEvent>,
    outbound: mpsc::Sender<String>,
    state: watch::Receiver<ConnectionState>,
    shutdown: CancellationToken,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl SyncChannel {
    pub fn spawn(connector: Arc<dyn Connector>, policy: ReconnectPolicy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let (state_tx, state) = watch::channel(ConnectionState::Connecting);
        let shutdown = CancellationToken::new();

        let driver = Driver {
            connector,
            policy,
            events: events.clone(),
            state: state_tx,
            outbound: outbound_rx,
            shutdown: shutdown.clone(),
        };
        let handle = tokio::spawn(driver.run());

        Self {
            events,
            outbound,
            state,
            shutdown,
            driver: Mutex::new(Some(handle)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Queue an intent on the live connection.
    ///
    /// Intents are never held across a disconnect: this fails with
    /// [`SyncError::NotConnected`] unless a connection is up right now.
    pub fn send(&self, intent: &ClientIntent) -> Result<(), SyncError> {
        match self.state() {
            ConnectionState::Connected => {}
            ConnectionState::Closed => return Err(SyncError::Closed),
            _ => return Err(SyncError::NotConnected),
        }
        let frame = serde_json::to_string(intent)?;
        self.outbound.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SyncError::NotConnected,
            mpsc::error::TrySendError::Closed(_) => SyncError::Closed,
        })
    }

    /// Stop the driver and wait for it to finish.
    pub async fn close(&self) {
        self.shutdown.cancel();
        let handle = self
            .driver
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl Drop for SyncChannel {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

enum PumpExit {
    Shutdown,
    Dropped(SyncError),
}

struct Driver {
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
    events: broadcast::Sender<ChannelEvent>,
    state: watch::Sender<ConnectionState>,
    outbound: mpsc::Receiver<String>,
    shutdown: CancellationToken,
}

impl Driver {
    async fn run(mut self) {
        let mut attempt: u32 = 0;
        let mut connected_before = false;

        loop {
            self.state.send_replace(ConnectionState::Connecting);
            let connection = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                result = self.connector.connect() => result,
            };

            match connection {
                Ok((sink, stream)) => {
                    attempt = 0;
                    self.discard_stale_intents();
                    self.state.send_replace(ConnectionState::Connected);
                    info!(resumed = connected_before, "sync channel connected");
                    let _ = self.events.send(ChannelEvent::Connected {
                        resumed: connected_before,
                    });
                    connected_before = true;

                    match self.pump(sink, stream).await {
                        PumpExit::Shutdown => break,
                        PumpExit::Dropped(reason) => {
                            warn!(error = %reason, "sync channel dropped");
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, attempt, "sync channel connect failed");
                }
            }

            self.state.send_replace(ConnectionState::Disconnected);
            let delay = self.policy.delay_for(attempt);
            attempt = attempt.saturating_add(1);
            debug!(delay_ms = delay.as_millis() as u64, "reconnecting after backoff");
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.state.send_replace(ConnectionState::Closed);
        info!("sync channel closed");
    }

    fn discard_stale_intents(&mut self) {
        let mut dropped = 0usize;
        while self.outbound.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "discarded intents queued before reconnect");
        }
    }

    async fn pump(&mut self, mut sink: FrameSink, mut stream: FrameStream) -> PumpExit {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    let _ = sink.close().await;
                    return PumpExit::Shutdown;
                }

                frame = self.outbound.recv() => {
                    let Some(frame) = frame else {
                        let _ = sink.close().await;
                        return PumpExit::Shutdown;
                    };
                    if let Err(err) = sink.send(frame).await {
                        return PumpExit::Dropped(err);
                    }
                }

                inbound = stream.next() => match inbound {
                    Some(Ok(text)) => match parse_server_event(&text) {
                        Ok(ServerEvent::Unknown) => {}
                        Ok(event) => {
                            let _ = self.events.send(ChannelEvent::Server(event));
                        }
                        // The server greets each connection with an untyped frame.
                        Err(SyncError::MissingType) => debug!("dropping untyped frame"),
                        Err(err) => warn!(error = %err, "dropping inbound frame"),
                    },
                    Some(Err(err)) => return PumpExit::Dropped(err),
                    None => return PumpExit::Dropped(SyncError::Closed),
                },
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
