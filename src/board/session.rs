//! One viewed retro: its store, its dispatcher and its share of the sync channel.

use std::sync::Arc;

use retroboard_common::{RetroId, UserId};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use super::api::RetroApi;
use super::dispatcher::Dispatcher;
use super::store::{Action, StateStore};
use super::ws::{ChannelEvent, ClientIntent, ConnectionState, ServerEvent, SyncChannel};
use crate::errors::{ClientError, SyncError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    /// The retro was deleted on the server.
    Ended,
}

/// Effect of one server event on the viewed retro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    Applied,
    Ignored,
    Ended,
}

/// Route a server push to the store of the retro being viewed.
pub fn route_event(viewing: &RetroId, store: &StateStore, event: &ServerEvent) -> Routed {
    match event {
        ServerEvent::RetroUpdate { retro_id, data } if retro_id == viewing => {
            store.dispatch(Action::SetData(data.clone()));
            Routed::Applied
        }
        ServerEvent::RetroDelete { retro_id } if retro_id == viewing => Routed::Ended,
        ServerEvent::RetroUpdate { retro_id, .. } | ServerEvent::RetroDelete { retro_id } => {
            debug!(%retro_id, %viewing, "event for another retro");
            Routed::Ignored
        }
        ServerEvent::Unknown => Routed::Ignored,
    }
}

pub struct RetroSession {
    retro_id: RetroId,
    store: StateStore,
    dispatcher: Dispatcher,
    channel: Arc<SyncChannel>,
    view: CancellationToken,
    status: watch::Receiver<SessionStatus>,
    pump: Option<JoinHandle<()>>,
}

impl RetroSession {
    /// Fetch the retro, join its channel room and start applying pushes.
    pub async fn enter(
        retro_id: RetroId,
        api: Arc<dyn RetroApi>,
        channel: Arc<SyncChannel>,
        user_id: UserId,
    ) -> Result<Self, ClientError> {
        // Subscribe before fetching so no push between the two is lost.
        let events = channel.subscribe();
        let connection = channel.watch_state();
        let retro = api.get_retro(&retro_id).await?;

        let store = StateStore::new();
        store.dispatch(Action::SetData(retro.into_session_state()));

        let view = CancellationToken::new();
        let (status_tx, status) = watch::channel(SessionStatus::Active);
        let pump = Pump {
            retro_id: retro_id.clone(),
            api: api.clone(),
            channel: channel.clone(),
            store: store.clone(),
            view: view.clone(),
            status: status_tx,
        };
        let span = info_span!("session", retro = %retro_id);
        let pump = tokio::spawn(pump.run(events, connection).instrument(span));
        info!(retro = %retro_id, "entered retro");

        let dispatcher = Dispatcher::new(api, store.clone(), user_id, view.clone());
        Ok(Self {
            retro_id,
            store,
            dispatcher,
            channel,
            view,
            status,
            pump: Some(pump),
        })
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// Send `leave_retro` and detach. The channel stays open.
    pub async fn leave(mut self) {
        match self.channel.send(&ClientIntent::LeaveRetro {
            retro_id: self.retro_id.clone(),
        }) {
            Ok(()) => {}
            Err(SyncError::NotConnected | SyncError::Closed) => {
                debug!(retro = %self.retro_id, "left retro while offline");
            }
            Err(err) => warn!(error = %err, "failed to send leave_retro"),
        }
        self.view.cancel();
        if let Some(pump) = self.pump.take() {
            let _ = pump.await;
        }
        info!(retro = %self.retro_id, "left retro");
    }
}

impl Drop for RetroSession {
    fn drop(&mut self) {
        self.view.cancel();
    }
}

fn join(channel: &SyncChannel, retro_id: &RetroId) {
    let intent = ClientIntent::JoinRetro {
        retro_id: retro_id.clone(),
    };
    if let Err(err) = channel.send(&intent) {
        warn!(error = %err, retro = %retro_id, "failed to send join_retro");
    }
}

struct Pump {
    retro_id: RetroId,
    api: Arc<dyn RetroApi>,
    channel: Arc<SyncChannel>,
    store: StateStore,
    view: CancellationToken,
    status: watch::Sender<SessionStatus>,
}

impl Pump {
    /// Joins the room once per established connection, as seen on the
    /// connection state, and applies pushes until the view goes away.
    async fn run(
        self,
        mut events: broadcast::Receiver<ChannelEvent>,
        mut connection: watch::Receiver<ConnectionState>,
    ) {
        if *connection.borrow_and_update() == ConnectionState::Connected {
            join(&self.channel, &self.retro_id);
        }
        loop {
            let received = tokio::select! {
                _ = self.view.cancelled() => break,
                changed = connection.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if *connection.borrow_and_update() == ConnectionState::Connected {
                        join(&self.channel, &self.retro_id);
                    }
                    continue;
                }
                received = events.recv() => received,
            };
            match received {
                Ok(ChannelEvent::Server(event)) => {
                    if route_event(&self.retro_id, &self.store, &event) == Routed::Ended {
                        info!("retro deleted on the server");
                        self.status.send_replace(SessionStatus::Ended);
                        self.view.cancel();
                        break;
                    }
                }
                Ok(ChannelEvent::Connected { resumed }) => {
                    if resumed {
                        self.refresh().await;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "session fell behind the channel");
                    self.refresh().await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("session pump stopped");
    }

    /// Full refetch, treated like a `retro_update`.
    async fn refresh(&self) {
        match self.api.get_retro(&self.retro_id).await {
            Ok(retro) => {
                if self.view.is_cancelled() {
                    return;
                }
                self.store
                    .dispatch(Action::SetData(retro.into_session_state()));
            }
            Err(err) => warn!(error = %err, "failed to refetch retro"),
        }
    }
}
