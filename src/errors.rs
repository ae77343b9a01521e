//! Typed error hierarchy for the retroboard client.
//!
//! Three top-level enums cover the three collaborators:
//! - `ClientError` — REST calls against the board backend
//! - `DispatchError` — user intents routed through the dispatcher
//! - `SyncError` — the realtime channel and its transport
//!
//! None of these are fatal to a session: callers log them and carry on.

use retroboard_common::PostItId;
use thiserror::Error;

/// Errors from the REST client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {path} returned {status}: {message}")]
    Status {
        method: String,
        path: String,
        status: u16,
        message: String,
    },

    #[error("Failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Response from {path} carried no data")]
    EmptyResponse { path: String },

    #[error("Not logged in: run `retroboard login` first")]
    MissingCredentials,

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl ClientError {
    /// HTTP status of a rejected request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors from a dispatched user intent.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Post-it {post_it_id} belongs to another user")]
    NotOwner { post_it_id: PostItId },

    #[error(transparent)]
    Api(#[from] ClientError),
}

/// Errors from the realtime sync channel.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("WebSocket transport error: {0}")]
    Transport(String),

    #[error("Malformed frame: {0}")]
    Malformed(String),

    #[error("Frame has no `type` tag")]
    MissingType,

    #[error("Sync channel is not connected")]
    NotConnected,

    #[error("Connection closed by server")]
    Closed,

    #[error("Failed to encode intent: {0}")]
    Encode(#[from] serde_json::Error),
}
