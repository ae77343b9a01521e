//! User intents: network request plus the matching store transition.
//!
//! | Intent | Order                                               |
//! |--------|-----------------------------------------------------|
//! | create | request, then `ADD_POSTIT` with the server id        |
//! | edit   | optimistic content update, request, confirm/undo    |
//! | toggle | request with the flipped flag, then set it locally  |
//! | delete | confirmation, optimistic delete, request, confirm/undo |
//! | vote   | request, then set the server's absolute count       |
//!
//! Continuations check the view token before touching the store, so a
//! request that finishes after the view is gone changes nothing.

use std::sync::Arc;

use retroboard_common::{PostIt, PostItId, QuestionId, UserId};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, field, info_span, warn};

use super::api::{NewPostIt, PostItUpdate, RetroApi};
use super::store::{Action, CorrelationId, Optimistic, StateStore};
use crate::errors::{ClientError, DispatchError};

/// What an intent did to the session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The transition was applied (or kept, for optimistic intents).
    Applied,
    /// The target no longer exists or the intent would change nothing; no request was sent.
    Ignored,
    /// The user declined the confirmation prompt.
    Cancelled,
    /// The view went away before the request finished.
    Detached,
}

pub struct Dispatcher {
    api: Arc<dyn RetroApi>,
    store: StateStore,
    user_id: UserId,
    view: CancellationToken,
}

impl Dispatcher {
    pub fn new(
        api: Arc<dyn RetroApi>,
        store: StateStore,
        user_id: UserId,
        view: CancellationToken,
    ) -> Self {
        Self {
            api,
            store,
            user_id,
            view,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    fn span(kind: &'static str) -> Span {
        info_span!("intent", kind, correlation = field::Empty)
    }

    /// Look up a post-it the current user is allowed to modify.
    fn owned(
        &self,
        question_id: &QuestionId,
        post_it_id: &PostItId,
    ) -> Result<Option<PostIt>, DispatchError> {
        let state = self.store.snapshot();
        let Some(post_it) = state.post_it(question_id, post_it_id) else {
            debug!(%question_id, %post_it_id, "post-it not in state");
            return Ok(None);
        };
        if !post_it.is_owned_by(&self.user_id) {
            return Err(DispatchError::NotOwner {
                post_it_id: post_it_id.clone(),
            });
        }
        Ok(Some(post_it.clone()))
    }

    /// Resolve an optimistic ticket once the request has finished.
    fn settle(
        &self,
        ticket: Optimistic,
        result: Result<(), ClientError>,
    ) -> Result<Outcome, DispatchError> {
        match result {
            Ok(()) => {
                self.store.confirm(ticket);
                if self.view.is_cancelled() {
                    return Ok(Outcome::Detached);
                }
                Ok(Outcome::Applied)
            }
            Err(err) => {
                warn!(error = %err, "request failed");
                if self.view.is_cancelled() {
                    self.store.confirm(ticket);
                } else if self.store.compensate(ticket) {
                    debug!("rolled back optimistic transition");
                }
                Err(err.into())
            }
        }
    }

    pub async fn create_post_it(
        &self,
        question_id: &QuestionId,
        content: &str,
    ) -> Result<Outcome, DispatchError> {
        let span = Self::span("create");
        span.record("correlation", field::display(CorrelationId::new()));
        async {
            // The stored id carries the wire form the server used for it.
            let Some(question_id) = self
                .store
                .snapshot()
                .question(question_id)
                .map(|question| question.id.clone())
            else {
                debug!(%question_id, "question not in state");
                return Ok(Outcome::Ignored);
            };
            let request = NewPostIt {
                question_id: question_id.clone(),
                content: content.to_string(),
                hidden: false,
            };
            let created = self.api.create_post_it(&request).await.map_err(|err| {
                warn!(error = %err, "request failed");
                DispatchError::from(err)
            })?;
            if self.view.is_cancelled() {
                return Ok(Outcome::Detached);
            }
            let user_id = if created.user_id.is_empty() {
                self.user_id.clone()
            } else {
                created.user_id
            };
            self.store.dispatch(Action::AddPostIt {
                question_id,
                id: created.id,
                content: created.content,
                user_id,
            });
            Ok(Outcome::Applied)
        }
        .instrument(span)
        .await
    }

    pub async fn edit_post_it(
        &self,
        question_id: &QuestionId,
        post_it_id: &PostItId,
        content: &str,
    ) -> Result<Outcome, DispatchError> {
        async {
            let Some(post_it) = self.owned(question_id, post_it_id)? else {
                return Ok(Outcome::Ignored);
            };
            let Some(ticket) = self.store.apply_optimistic(Action::UpdatePostItContent {
                question_id: question_id.clone(),
                post_it_id: post_it_id.clone(),
                content: content.to_string(),
            }) else {
                return Ok(Outcome::Ignored);
            };
            Span::current().record("correlation", field::display(ticket.id));
            let update = PostItUpdate {
                content: content.to_string(),
                hidden: post_it.hidden,
            };
            let result = self.api.update_post_it(post_it_id, &update).await;
            self.settle(ticket, result)
        }
        .instrument(Self::span("edit"))
        .await
    }

    /// Persist the flipped visibility first, then reflect the confirmed value.
    pub async fn toggle_visibility(
        &self,
        question_id: &QuestionId,
        post_it_id: &PostItId,
    ) -> Result<Outcome, DispatchError> {
        let span = Self::span("toggle");
        span.record("correlation", field::display(CorrelationId::new()));
        async {
            let Some(post_it) = self.owned(question_id, post_it_id)? else {
                return Ok(Outcome::Ignored);
            };
            let hidden = !post_it.hidden;
            let update = PostItUpdate {
                content: post_it.content,
                hidden,
            };
            self.api
                .update_post_it(post_it_id, &update)
                .await
                .map_err(|err| {
                    warn!(error = %err, "request failed");
                    DispatchError::from(err)
                })?;
            if self.view.is_cancelled() {
                return Ok(Outcome::Detached);
            }
            self.store.dispatch(Action::SetPostItVisibility {
                question_id: question_id.clone(),
                post_it_id: post_it_id.clone(),
                hidden,
            });
            Ok(Outcome::Applied)
        }
        .instrument(span)
        .await
    }

    /// `confirm` sees the post-it about to go and may decline.
    pub async fn delete_post_it<F>(
        &self,
        question_id: &QuestionId,
        post_it_id: &PostItId,
        confirm: F,
    ) -> Result<Outcome, DispatchError>
    where
        F: FnOnce(&PostIt) -> bool,
    {
        async {
            let Some(post_it) = self.owned(question_id, post_it_id)? else {
                return Ok(Outcome::Ignored);
            };
            if !confirm(&post_it) {
                return Ok(Outcome::Cancelled);
            }
            let Some(ticket) = self.store.apply_optimistic(Action::DeletePostIt {
                question_id: question_id.clone(),
                post_it_id: post_it_id.clone(),
            }) else {
                return Ok(Outcome::Ignored);
            };
            Span::current().record("correlation", field::display(ticket.id));
            let result = self.api.delete_post_it(post_it_id).await;
            self.settle(ticket, result)
        }
        .instrument(Self::span("delete"))
        .await
    }

    /// Votes are counted by the server; the local count only ever mirrors it.
    pub async fn vote(
        &self,
        question_id: &QuestionId,
        post_it_id: &PostItId,
    ) -> Result<Outcome, DispatchError> {
        let span = Self::span("vote");
        span.record("correlation", field::display(CorrelationId::new()));
        async {
            if self.store.snapshot().post_it(question_id, post_it_id).is_none() {
                debug!(%question_id, %post_it_id, "post-it not in state");
                return Ok(Outcome::Ignored);
            }
            let receipt = self.api.vote_post_it(post_it_id).await.map_err(|err| {
                warn!(error = %err, "request failed");
                DispatchError::from(err)
            })?;
            if self.view.is_cancelled() {
                return Ok(Outcome::Detached);
            }
            self.store.dispatch(Action::UpdatePostItVotes {
                question_id: question_id.clone(),
                post_it_id: post_it_id.clone(),
                votes: receipt.votes,
            });
            Ok(Outcome::Applied)
        }
        .instrument(span)
        .await
    }
}
