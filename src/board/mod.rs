//! Retro board client core.
//!
//! ## Overview
//!
//! Keeps a local copy of one retro's questions and post-its in step with the
//! board backend. User intents go out over REST; server pushes come in over a
//! WebSocket. Both end up as transitions on a single [`store::StateStore`].
//!
//! ## Module Map
//!
//! ```text
//!  user intent                          server push
//!      │                                    │
//!      v                                    v
//!  dispatcher.rs  ── REST ──> backend   ws.rs (SyncChannel, driver task)
//!  (Dispatcher)   <─────────            │   └─ connector.rs (WsConnector)
//!      │                                    │
//!      │ Action                             │ ChannelEvent
//!      v                                    v
//!  store.rs  <───────── SET_DATA ──── session.rs (RetroSession, route_event)
//!  (apply, StateStore)
//! ```
//!
//! | Module       | Responsibility                                          |
//! |--------------|---------------------------------------------------------|
//! | `store`      | `Action`, pure `apply`, `StateStore` with rollback      |
//! | `api`        | `RetroApi` trait + `HttpRetroApi` (reqwest)             |
//! | `dispatcher` | intent orchestration, ownership checks, view token      |
//! | `ws`         | wire events, `SyncChannel`, reconnect backoff           |
//! | `connector`  | tokio-tungstenite transport behind `Connector`          |
//! | `session`    | per-view glue: join/leave, refetch on resume            |

pub mod api;
pub mod connector;
pub mod dispatcher;
pub mod session;
pub mod store;
pub mod ws;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{HttpRetroApi, RetroApi};
pub use connector::WsConnector;
pub use dispatcher::{Dispatcher, Outcome};
pub use session::{RetroSession, SessionStatus};
pub use store::{Action, StateStore};
pub use ws::{ConnectionState, ReconnectPolicy, SyncChannel};
