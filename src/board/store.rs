//! Session state store.
//!
//! [`apply`] is the single pure transition function: it never mutates its
//! input and returns the input unchanged for anything it cannot apply.
//! [`StateStore`] owns the current [`SessionState`] and is the only place the
//! state is replaced; both the dispatcher and the sync channel route every
//! change through it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use retroboard_common::{PostIt, PostItId, Question, QuestionId, SessionState, UserId};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

// ── Actions ──────────────────────────────────────────────────────────

/// A state transition. On the wire: `{"type": "ADD_POSTIT", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "type", content = "payload")]
pub enum Action {
    /// Replace the whole session state.
    #[serde(rename = "SET_DATA")]
    SetData(SessionState),

    #[serde(rename = "ADD_POSTIT", rename_all = "camelCase")]
    AddPostIt {
        question_id: QuestionId,
        id: PostItId,
        content: String,
        user_id: UserId,
    },

    #[serde(rename = "UPDATE_POSTIT_CONTENT", rename_all = "camelCase")]
    UpdatePostItContent {
        question_id: QuestionId,
        post_it_id: PostItId,
        content: String,
    },

    /// Absolute vote count as reported by the server.
    #[serde(rename = "UPDATE_POSTIT_VOTES", rename_all = "camelCase")]
    UpdatePostItVotes {
        question_id: QuestionId,
        post_it_id: PostItId,
        votes: u32,
    },

    #[serde(rename = "TOGGLE_POSTIT_VISIBILITY", rename_all = "camelCase")]
    TogglePostItVisibility {
        question_id: QuestionId,
        post_it_id: PostItId,
    },

    #[serde(rename = "SET_POSTIT_VISIBILITY", rename_all = "camelCase")]
    SetPostItVisibility {
        question_id: QuestionId,
        post_it_id: PostItId,
        hidden: bool,
    },

    #[serde(rename = "DELETE_POSTIT", rename_all = "camelCase")]
    DeletePostIt {
        question_id: QuestionId,
        post_it_id: PostItId,
    },

    /// Re-insert a previously deleted post-it at its former position.
    #[serde(rename = "RESTORE_POSTIT", rename_all = "camelCase")]
    RestorePostIt {
        question_id: QuestionId,
        index: usize,
        post_it: PostIt,
    },

    /// Any tag not listed in [`KNOWN_KINDS`], whatever its payload.
    #[serde(other)]
    Unknown,
}

/// Wire tags that decode to a concrete transition.
pub const KNOWN_KINDS: &[&str] = &[
    "SET_DATA",
    "ADD_POSTIT",
    "UPDATE_POSTIT_CONTENT",
    "UPDATE_POSTIT_VOTES",
    "TOGGLE_POSTIT_VISIBILITY",
    "SET_POSTIT_VISIBILITY",
    "DELETE_POSTIT",
    "RESTORE_POSTIT",
];

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Action::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for Action {
    /// Reads the tag first so an unrecognized action decodes to
    /// [`Action::Unknown`] even when it carries a payload.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let known = match value.get("type") {
            Some(Value::String(tag)) => KNOWN_KINDS.contains(&tag.as_str()),
            Some(_) => return Err(de::Error::custom("action type must be a string")),
            None => return Err(de::Error::missing_field("type")),
        };
        if !known {
            return Ok(Action::Unknown);
        }
        Action::deserialize(value).map_err(de::Error::custom)
    }
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::SetData(_) => "SET_DATA",
            Action::AddPostIt { .. } => "ADD_POSTIT",
            Action::UpdatePostItContent { .. } => "UPDATE_POSTIT_CONTENT",
            Action::UpdatePostItVotes { .. } => "UPDATE_POSTIT_VOTES",
            Action::TogglePostItVisibility { .. } => "TOGGLE_POSTIT_VISIBILITY",
            Action::SetPostItVisibility { .. } => "SET_POSTIT_VISIBILITY",
            Action::DeletePostIt { .. } => "DELETE_POSTIT",
            Action::RestorePostIt { .. } => "RESTORE_POSTIT",
            Action::Unknown => "UNKNOWN",
        }
    }
}

// ── Transition function ──────────────────────────────────────────────

/// Rebuild `state` with `edit` applied to one question's post-it list.
/// Returns `None` when the question does not exist or `edit` declines.
fn edit_question(
    state: &SessionState,
    question_id: &QuestionId,
    edit: impl FnOnce(&Question) -> Option<Vec<PostIt>>,
) -> Option<SessionState> {
    let position = state.questions.iter().position(|q| &q.id == question_id)?;
    let post_its = edit(&state.questions[position])?;
    let mut questions = state.questions.clone();
    questions[position] = Question {
        post_its,
        ..state.questions[position].clone()
    };
    Some(SessionState { questions })
}

/// Rebuild `state` with `edit` applied to a single post-it.
fn edit_post_it(
    state: &SessionState,
    question_id: &QuestionId,
    post_it_id: &PostItId,
    edit: impl FnOnce(&PostIt) -> PostIt,
) -> Option<SessionState> {
    edit_question(state, question_id, |question| {
        let index = question.post_its.iter().position(|p| &p.id == post_it_id)?;
        let mut post_its = question.post_its.clone();
        post_its[index] = edit(&question.post_its[index]);
        Some(post_its)
    })
}

/// Apply `action` to `state`, producing the next state.
pub fn apply(state: &SessionState, action: &Action) -> SessionState {
    let next = match action {
        Action::SetData(payload) => Some(payload.clone()),

        Action::AddPostIt {
            question_id,
            id,
            content,
            user_id,
        } => {
            if state.contains_post_it(id) {
                None
            } else {
                edit_question(state, question_id, |question| {
                    let mut post_its = question.post_its.clone();
                    post_its.push(PostIt::new(
                        id.clone(),
                        question_id.clone(),
                        content.clone(),
                        user_id.clone(),
                    ));
                    Some(post_its)
                })
            }
        }

        Action::UpdatePostItContent {
            question_id,
            post_it_id,
            content,
        } => edit_post_it(state, question_id, post_it_id, |p| PostIt {
            content: content.clone(),
            ..p.clone()
        }),

        Action::UpdatePostItVotes {
            question_id,
            post_it_id,
            votes,
        } => edit_post_it(state, question_id, post_it_id, |p| PostIt {
            votes: *votes,
            ..p.clone()
        }),

        Action::TogglePostItVisibility {
            question_id,
            post_it_id,
        } => edit_post_it(state, question_id, post_it_id, |p| PostIt {
            hidden: !p.hidden,
            ..p.clone()
        }),

        Action::SetPostItVisibility {
            question_id,
            post_it_id,
            hidden,
        } => edit_post_it(state, question_id, post_it_id, |p| PostIt {
            hidden: *hidden,
            ..p.clone()
        }),

        Action::DeletePostIt {
            question_id,
            post_it_id,
        } => edit_question(state, question_id, |question| {
            if question.post_it(post_it_id).is_none() {
                return None;
            }
            Some(
                question
                    .post_its
                    .iter()
                    .filter(|p| &p.id != post_it_id)
                    .cloned()
                    .collect(),
            )
        }),

        Action::RestorePostIt {
            question_id,
            index,
            post_it,
        } => {
            if state.contains_post_it(&post_it.id) {
                None
            } else {
                edit_question(state, question_id, |question| {
                    let mut post_its = question.post_its.clone();
                    let at = (*index).min(post_its.len());
                    post_its.insert(
                        at,
                        PostIt {
                            question_id: question_id.clone(),
                            ..post_it.clone()
                        },
                    );
                    Some(post_its)
                })
            }
        }

        Action::Unknown => None,
    };

    next.unwrap_or_else(|| state.clone())
}

/// The transition that undoes `action` when applied to `apply(state, action)`.
/// `None` when the action would not change `state` or cannot be undone.
pub fn inverse(state: &SessionState, action: &Action) -> Option<Action> {
    match action {
        Action::SetData(_) | Action::Unknown => None,

        Action::AddPostIt {
            question_id, id, ..
        } => {
            if state.contains_post_it(id) {
                return None;
            }
            state.question(question_id)?;
            Some(Action::DeletePostIt {
                question_id: question_id.clone(),
                post_it_id: id.clone(),
            })
        }

        Action::UpdatePostItContent {
            question_id,
            post_it_id,
            ..
        } => {
            let current = state.post_it(question_id, post_it_id)?;
            Some(Action::UpdatePostItContent {
                question_id: question_id.clone(),
                post_it_id: post_it_id.clone(),
                content: current.content.clone(),
            })
        }

        Action::UpdatePostItVotes {
            question_id,
            post_it_id,
            ..
        } => {
            let current = state.post_it(question_id, post_it_id)?;
            Some(Action::UpdatePostItVotes {
                question_id: question_id.clone(),
                post_it_id: post_it_id.clone(),
                votes: current.votes,
            })
        }

        Action::TogglePostItVisibility {
            question_id,
            post_it_id,
        }
        | Action::SetPostItVisibility {
            question_id,
            post_it_id,
            ..
        } => {
            let current = state.post_it(question_id, post_it_id)?;
            Some(Action::SetPostItVisibility {
                question_id: question_id.clone(),
                post_it_id: post_it_id.clone(),
                hidden: current.hidden,
            })
        }

        Action::DeletePostIt {
            question_id,
            post_it_id,
        } => {
            let question = state.question(question_id)?;
            let index = question.post_its.iter().position(|p| &p.id == post_it_id)?;
            Some(Action::RestorePostIt {
                question_id: question_id.clone(),
                index,
                post_it: question.post_its[index].clone(),
            })
        }

        Action::RestorePostIt {
            question_id,
            post_it,
            ..
        } => {
            if state.contains_post_it(&post_it.id) {
                return None;
            }
            state.question(question_id)?;
            Some(Action::DeletePostIt {
                question_id: question_id.clone(),
                post_it_id: post_it.id.clone(),
            })
        }
    }
}

// ── Store ────────────────────────────────────────────────────────────

/// Correlates an optimistic transition with the request that confirms it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Receipt for an optimistic transition awaiting confirmation.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an optimistic transition must be confirmed or compensated"]
pub struct Optimistic {
    pub id: CorrelationId,
}

/// One optimistic transition in the order it was applied.
#[derive(Debug)]
struct Entry {
    id: CorrelationId,
    generation: u64,
    forward: Action,
    inverse: Action,
    confirmed: bool,
}

/// Bookkeeping for optimistic transitions.
///
/// Entries are kept in application order. A confirmed entry stays until
/// every entry before it has settled, so an earlier rollback can still
/// replay it. `generation` advances on every `SET_DATA`, which drops all
/// entries: the authoritative state already superseded them.
#[derive(Debug, Default)]
struct Ledger {
    generation: u64,
    entries: Vec<Entry>,
}

impl Ledger {
    fn position(&self, id: CorrelationId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    /// Forget the confirmed entries nothing earlier can still roll back past.
    fn prune_settled(&mut self) {
        let settled = self
            .entries
            .iter()
            .take_while(|entry| entry.confirmed)
            .count();
        self.entries.drain(..settled);
    }
}

struct StoreInner {
    state: watch::Sender<Arc<SessionState>>,
    ledger: Mutex<Ledger>,
}

/// Shared holder of the session state. Cheap to clone.
///
/// Lock order: the watch value is always taken before the ledger.
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<StoreInner>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("state", &*self.snapshot())
            .finish()
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self::with_state(SessionState::default())
    }

    pub fn with_state(state: SessionState) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(state));
        Self {
            inner: Arc::new(StoreInner {
                state: tx,
                ledger: Mutex::new(Ledger::default()),
            }),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        // The ledger holds no invariants a panicking writer could break halfway.
        self.inner
            .ledger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current state. The returned value never changes; later transitions
    /// produce a new `Arc`.
    pub fn snapshot(&self) -> Arc<SessionState> {
        self.inner.state.borrow().clone()
    }

    /// Receive a notification each time the state actually changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionState>> {
        self.inner.state.subscribe()
    }

    /// Apply a transition. Returns whether the state changed.
    pub fn dispatch(&self, action: Action) -> bool {
        let changed = self.inner.state.send_if_modified(|current| {
            if matches!(action, Action::SetData(_)) {
                let mut ledger = self.ledger();
                ledger.generation += 1;
                let dropped = ledger.entries.len();
                ledger.entries.clear();
                if dropped > 0 {
                    debug!(dropped, "refresh superseded optimistic transitions");
                }
            }
            let next = apply(current, &action);
            if next == **current {
                return false;
            }
            *current = Arc::new(next);
            true
        });
        debug!(action = action.kind(), changed, "applied transition");
        changed
    }

    /// Apply a transition ahead of server confirmation, remembering how to
    /// undo it. Returns `None` when the transition changes nothing.
    pub fn apply_optimistic(&self, action: Action) -> Option<Optimistic> {
        let mut ticket = None;
        self.inner.state.send_if_modified(|current| {
            let Some(undo) = inverse(current, &action) else {
                return false;
            };
            let next = apply(current, &action);
            if next == **current {
                return false;
            }
            *current = Arc::new(next);
            let id = CorrelationId::new();
            let mut ledger = self.ledger();
            let generation = ledger.generation;
            ledger.entries.push(Entry {
                id,
                generation,
                forward: action.clone(),
                inverse: undo,
                confirmed: false,
            });
            ticket = Some(Optimistic { id });
            true
        });
        if let Some(ticket) = &ticket {
            debug!(action = action.kind(), correlation = %ticket.id, "optimistic transition");
        }
        ticket
    }

    /// The server accepted the change; keep it.
    pub fn confirm(&self, ticket: Optimistic) {
        let mut ledger = self.ledger();
        if let Some(index) = ledger.position(ticket.id) {
            ledger.entries[index].confirmed = true;
            ledger.prune_settled();
        }
    }

    /// The server rejected the change; undo it unless a full refresh has
    /// already replaced the state. Returns whether the state changed.
    ///
    /// Transitions applied after the rejected one are unwound first and
    /// replayed on top of the undo, so they survive it; their own inverses
    /// are recomputed against the corrected state.
    pub fn compensate(&self, ticket: Optimistic) -> bool {
        self.inner.state.send_if_modified(|current| {
            let mut ledger = self.ledger();
            let Some(index) = ledger.position(ticket.id) else {
                debug!(correlation = %ticket.id, "compensation superseded by refresh");
                return false;
            };
            let rejected = ledger.entries.remove(index);
            if rejected.generation != ledger.generation {
                debug!(correlation = %ticket.id, "compensation superseded by refresh");
                return false;
            }

            let later = &mut ledger.entries[index..];
            let mut next = later
                .iter()
                .rev()
                .fold((**current).clone(), |state, entry| apply(&state, &entry.inverse));
            next = apply(&next, &rejected.inverse);
            for entry in later.iter_mut() {
                match inverse(&next, &entry.forward) {
                    Some(undo) => {
                        next = apply(&next, &entry.forward);
                        entry.inverse = undo;
                    }
                    None => entry.inverse = Action::Unknown,
                }
            }
            if !later.is_empty() {
                debug!(replayed = later.len(), "replayed later transitions over rollback");
            }
            ledger.prune_settled();
            drop(ledger);

            if next == **current {
                return false;
            }
            *current = Arc::new(next);
            true
        })
    }

    /// Number of optimistic transitions still awaiting an outcome.
    pub fn pending_count(&self) -> usize {
        self.ledger()
            .entries
            .iter()
            .filter(|entry| !entry.confirmed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_it(id: &str, content: &str) -> PostIt {
        PostIt::new(id.into(), 1.into(), content, "u1".into())
    }

    fn state_with(post_its: Vec<PostIt>) -> SessionState {
        let mut question = Question::new(1.into(), "What went well?");
        question.post_its = post_its;
        SessionState::new(vec![question, Question::new(2.into(), "What to improve?")])
    }

    fn all_actions() -> Vec<Action> {
        vec![
            Action::SetData(SessionState::default()),
            Action::AddPostIt {
                question_id: 1.into(),
                id: "p9".into(),
                content: "new".into(),
                user_id: "u2".into(),
            },
            Action::UpdatePostItContent {
                question_id: 1.into(),
                post_it_id: "p1".into(),
                content: "edited".into(),
            },
            Action::UpdatePostItVotes {
                question_id: 1.into(),
                post_it_id: "p1".into(),
                votes: 7,
            },
            Action::TogglePostItVisibility {
                question_id: 1.into(),
                post_it_id: "p1".into(),
            },
            Action::SetPostItVisibility {
                question_id: 1.into(),
                post_it_id: "p2".into(),
                hidden: true,
            },
            Action::DeletePostIt {
                question_id: 1.into(),
                post_it_id: "p2".into(),
            },
            Action::RestorePostIt {
                question_id: 2.into(),
                index: 0,
                post_it: post_it("p5", "back"),
            },
            Action::Unknown,
        ]
    }

    #[test]
    fn test_apply_is_pure_and_deterministic() {
        let state = state_with(vec![post_it("p1", "a"), post_it("p2", "b")]);
        let before = state.clone();
        for action in all_actions() {
            let first = apply(&state, &action);
            let second = apply(&state, &action);
            assert_eq!(first, second, "{} is not deterministic", action.kind());
            assert_eq!(state, before, "{} mutated its input", action.kind());
        }
    }

    #[test]
    fn test_add_post_it_to_question() {
        let state = state_with(vec![]);
        let next = apply(
            &state,
            &Action::AddPostIt {
                question_id: 1.into(),
                id: "p1".into(),
                content: String::new(),
                user_id: "u1".into(),
            },
        );
        let question = next.question(&1.into()).unwrap();
        assert_eq!(question.post_its.len(), 1);
        let added = &question.post_its[0];
        assert_eq!(added.id, PostItId::from("p1"));
        assert_eq!(added.content, "");
        assert!(!added.hidden);
        assert_eq!(added.votes, 0);
        assert_eq!(added.user_id, UserId::from("u1"));
        assert_eq!(added.question_id, QuestionId::from(1));
    }

    #[test]
    fn test_add_post_it_with_duplicate_id_is_ignored() {
        let state = state_with(vec![post_it("p1", "a")]);
        let next = apply(
            &state,
            &Action::AddPostIt {
                question_id: 2.into(),
                id: "p1".into(),
                content: "dup".into(),
                user_id: "u1".into(),
            },
        );
        assert_eq!(next, state);
    }

    #[test]
    fn test_update_content_keeps_visibility() {
        let state = state_with(vec![post_it("p1", "old")]);
        let next = apply(
            &state,
            &Action::UpdatePostItContent {
                question_id: 1.into(),
                post_it_id: "p1".into(),
                content: "new".into(),
            },
        );
        let updated = next.post_it(&1.into(), &"p1".into()).unwrap();
        assert_eq!(updated.content, "new");
        assert!(!updated.hidden);
    }

    #[test]
    fn test_update_votes_is_absolute() {
        let mut voted = post_it("p1", "a");
        voted.votes = 3;
        let state = state_with(vec![voted]);
        let next = apply(
            &state,
            &Action::UpdatePostItVotes {
                question_id: 1.into(),
                post_it_id: "p1".into(),
                votes: 4,
            },
        );
        assert_eq!(next.post_it(&1.into(), &"p1".into()).unwrap().votes, 4);

        let lower = apply(
            &next,
            &Action::UpdatePostItVotes {
                question_id: 1.into(),
                post_it_id: "p1".into(),
                votes: 2,
            },
        );
        assert_eq!(lower.post_it(&1.into(), &"p1".into()).unwrap().votes, 2);
    }

    #[test]
    fn test_toggle_twice_restores_visibility() {
        let state = state_with(vec![post_it("p1", "a")]);
        let toggle = Action::TogglePostItVisibility {
            question_id: 1.into(),
            post_it_id: "p1".into(),
        };
        let once = apply(&state, &toggle);
        assert!(once.post_it(&1.into(), &"p1".into()).unwrap().hidden);
        let twice = apply(&once, &toggle);
        assert_eq!(twice, state);
    }

    #[test]
    fn test_delete_post_it_keeps_order_of_rest() {
        let state = state_with(vec![post_it("p1", "a"), post_it("p2", "b")]);
        let next = apply(
            &state,
            &Action::DeletePostIt {
                question_id: 1.into(),
                post_it_id: "p1".into(),
            },
        );
        assert_eq!(next.question(&1.into()).unwrap().post_its, vec![post_it("p2", "b")]);
    }

    #[test]
    fn test_restore_post_it_clamps_index() {
        let state = state_with(vec![post_it("p1", "a")]);
        let next = apply(
            &state,
            &Action::RestorePostIt {
                question_id: 1.into(),
                index: 10,
                post_it: post_it("p2", "b"),
            },
        );
        let ids: Vec<_> = next
            .question(&1.into())
            .unwrap()
            .post_its
            .iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[test]
    fn test_missing_targets_are_no_ops() {
        let state = state_with(vec![post_it("p1", "a")]);
        let misses = vec![
            Action::AddPostIt {
                question_id: 99.into(),
                id: "p9".into(),
                content: "x".into(),
                user_id: "u1".into(),
            },
            Action::UpdatePostItContent {
                question_id: 1.into(),
                post_it_id: "nope".into(),
                content: "x".into(),
            },
            Action::UpdatePostItVotes {
                question_id: 99.into(),
                post_it_id: "p1".into(),
                votes: 1,
            },
            Action::TogglePostItVisibility {
                question_id: 2.into(),
                post_it_id: "p1".into(),
            },
            Action::DeletePostIt {
                question_id: 1.into(),
                post_it_id: "nope".into(),
            },
            Action::RestorePostIt {
                question_id: 99.into(),
                index: 0,
                post_it: post_it("p7", "x"),
            },
            Action::Unknown,
        ];
        for action in misses {
            assert_eq!(apply(&state, &action), state, "{} changed state", action.kind());
        }
    }

    #[test]
    fn test_set_data_is_total_overwrite() {
        let state = state_with(vec![post_it("p1", "a"), post_it("p2", "b")]);
        let payload = SessionState::new(vec![Question::new(7.into(), "Fresh")]);
        assert_eq!(apply(&state, &Action::SetData(payload.clone())), payload);
        assert_eq!(
            apply(&SessionState::default(), &Action::SetData(payload.clone())),
            payload
        );
    }

    #[test]
    fn test_inverse_undoes_every_change() {
        let state = state_with(vec![post_it("p1", "a"), post_it("p2", "b")]);
        for action in all_actions() {
            let Some(undo) = inverse(&state, &action) else {
                continue;
            };
            let forward = apply(&state, &action);
            assert_eq!(apply(&forward, &undo), state, "inverse of {} failed", action.kind());
        }
    }

    #[test]
    fn test_action_wire_format() {
        let json = r#"{"type":"UPDATE_POSTIT_CONTENT","payload":{"questionId":1,"postItId":"p1","content":"new"}}"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert_eq!(
            action,
            Action::UpdatePostItContent {
                question_id: 1.into(),
                post_it_id: "p1".into(),
                content: "new".into(),
            }
        );
    }

    #[test]
    fn test_unrecognized_action_applies_as_identity() {
        let state = state_with(vec![post_it("p1", "a")]);
        for json in [
            r#"{"type":"MOVE_POSTIT"}"#,
            r#"{"type":"MOVE_POSTIT","payload":{"questionId":1,"postItId":"p1"}}"#,
            r#"{"type":"CLEAR_BOARD","payload":null}"#,
        ] {
            let action: Action = serde_json::from_str(json).unwrap();
            assert_eq!(action, Action::Unknown, "{json}");
            assert_eq!(apply(&state, &action), state);
        }
    }

    #[test]
    fn test_action_without_string_type_is_rejected() {
        assert!(serde_json::from_str::<Action>(r#"{"payload":{}}"#).is_err());
        assert!(serde_json::from_str::<Action>(r#"{"type":7}"#).is_err());
        let bad_payload = r#"{"type":"DELETE_POSTIT","payload":{"questionId":1}}"#;
        assert!(serde_json::from_str::<Action>(bad_payload).is_err());
    }

    #[test]
    fn test_every_known_action_survives_the_wire() {
        for action in all_actions() {
            let json = serde_json::to_string(&action).unwrap();
            let decoded: Action = serde_json::from_str(&json).unwrap();
            assert_eq!(decoded, action, "{json}");
            if action != Action::Unknown {
                assert!(KNOWN_KINDS.contains(&action.kind()));
            }
        }
    }

    #[test]
    fn test_store_dispatch_notifies_only_on_change() {
        let store = StateStore::with_state(state_with(vec![post_it("p1", "a")]));
        let mut rx = store.subscribe();
        let before = store.snapshot();

        assert!(!store.dispatch(Action::DeletePostIt {
            question_id: 1.into(),
            post_it_id: "missing".into(),
        }));
        assert!(!rx.has_changed().unwrap());
        assert!(Arc::ptr_eq(&before, &store.snapshot()));

        assert!(store.dispatch(Action::TogglePostItVisibility {
            question_id: 1.into(),
            post_it_id: "p1".into(),
        }));
        assert!(rx.has_changed().unwrap());
        assert!(!Arc::ptr_eq(&before, &store.snapshot()));
        assert!(!before.post_it(&1.into(), &"p1".into()).unwrap().hidden);
    }

    #[test]
    fn test_optimistic_compensate_rolls_back() {
        let store = StateStore::with_state(state_with(vec![post_it("p1", "a"), post_it("p2", "b")]));
        let original = store.snapshot();
        let ticket = store
            .apply_optimistic(Action::DeletePostIt {
                question_id: 1.into(),
                post_it_id: "p1".into(),
            })
            .unwrap();
        assert_eq!(store.snapshot().post_it_count(), 1);
        assert_eq!(store.pending_count(), 1);

        assert!(store.compensate(ticket));
        assert_eq!(*store.snapshot(), *original);
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn test_optimistic_confirm_keeps_change() {
        let store = StateStore::with_state(state_with(vec![post_it("p1", "a")]));
        let ticket = store
            .apply_optimistic(Action::UpdatePostItContent {
                question_id: 1.into(),
                post_it_id: "p1".into(),
                content: "b".into(),
            })
            .unwrap();
        store.confirm(ticket);
        assert_eq!(store.pending_count(), 0);
        assert_eq!(
            store.snapshot().post_it(&1.into(), &"p1".into()).unwrap().content,
            "b"
        );
    }

    #[test]
    fn test_optimistic_miss_returns_no_ticket() {
        let store = StateStore::with_state(state_with(vec![]));
        assert!(store
            .apply_optimistic(Action::UpdatePostItContent {
                question_id: 1.into(),
                post_it_id: "p1".into(),
                content: "b".into(),
            })
            .is_none());
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn test_compensation_after_refresh_is_discarded() {
        let store = StateStore::with_state(state_with(vec![post_it("p1", "a")]));
        let ticket = store
            .apply_optimistic(Action::UpdatePostItContent {
                question_id: 1.into(),
                post_it_id: "p1".into(),
                content: "local".into(),
            })
            .unwrap();

        let server = state_with(vec![post_it("p1", "server")]);
        store.dispatch(Action::SetData(server.clone()));

        assert_eq!(store.pending_count(), 0);
        assert!(!store.compensate(ticket));
        assert_eq!(*store.snapshot(), server);
    }

    fn edit(content: &str) -> Action {
        Action::UpdatePostItContent {
            question_id: 1.into(),
            post_it_id: "p1".into(),
            content: content.into(),
        }
    }

    fn content_of(store: &StateStore) -> String {
        store
            .snapshot()
            .post_it(&1.into(), &"p1".into())
            .unwrap()
            .content
            .clone()
    }

    #[test]
    fn test_rollback_keeps_later_pending_edit() {
        let store = StateStore::with_state(state_with(vec![post_it("p1", "a")]));
        let first = store.apply_optimistic(edit("b")).unwrap();
        let second = store.apply_optimistic(edit("c")).unwrap();

        assert!(!store.compensate(first));
        assert_eq!(content_of(&store), "c");

        store.confirm(second);
        assert_eq!(content_of(&store), "c");
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn test_rollback_keeps_later_confirmed_edit() {
        let store = StateStore::with_state(state_with(vec![post_it("p1", "a")]));
        let first = store.apply_optimistic(edit("b")).unwrap();
        let second = store.apply_optimistic(edit("c")).unwrap();
        store.confirm(second);
        assert_eq!(store.pending_count(), 1);

        store.compensate(first);
        assert_eq!(content_of(&store), "c");
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn test_later_rollback_after_earlier_one_restores_original() {
        let store = StateStore::with_state(state_with(vec![post_it("p1", "a")]));
        let first = store.apply_optimistic(edit("b")).unwrap();
        let second = store.apply_optimistic(edit("c")).unwrap();

        store.compensate(first);
        assert!(store.compensate(second));
        assert_eq!(content_of(&store), "a");
    }

    #[test]
    fn test_rollback_replays_later_delete() {
        let store = StateStore::with_state(state_with(vec![post_it("p1", "a"), post_it("p2", "b")]));
        let toggle = store
            .apply_optimistic(Action::TogglePostItVisibility {
                question_id: 1.into(),
                post_it_id: "p1".into(),
            })
            .unwrap();
        let delete = store
            .apply_optimistic(Action::DeletePostIt {
                question_id: 1.into(),
                post_it_id: "p1".into(),
            })
            .unwrap();

        store.compensate(toggle);
        assert!(store.snapshot().post_it(&1.into(), &"p1".into()).is_none());

        assert!(store.compensate(delete));
        let restored = store.snapshot();
        let question = restored.question(&1.into()).unwrap();
        assert_eq!(question.post_its[0].id, PostItId::from("p1"));
        assert!(!question.post_its[0].hidden);
    }
}
