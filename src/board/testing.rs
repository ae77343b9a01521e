//! In-process test doubles shared by the board unit tests.

use std::sync::Mutex;
use std::time::Duration;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use retroboard_common::{
    PostIt, PostItId, Question, Retro, RetroId, SessionState, Template, TemplateId,
};
use tokio_util::sync::CancellationToken;

use super::api::{NewPostIt, NewRetro, NewTemplate, PostItUpdate, RetroApi, VoteReceipt};
use crate::errors::ClientError;

pub(crate) fn post_it(id: &str, question: i64, content: &str, owner: &str) -> PostIt {
    PostIt::new(id.into(), question.into(), content, owner.into())
}

/// Question 1 holds `p1` (owned by `u1`) and `p2` (owned by `u2`); question 2 is empty.
pub(crate) fn sample_state() -> SessionState {
    let mut first = Question::new(1.into(), "What went well?");
    first.post_its = vec![post_it("p1", 1, "pairing", "u1"), post_it("p2", 1, "demos", "u2")];
    SessionState::new(vec![first, Question::new(2.into(), "What to improve?")])
}

pub(crate) fn sample_retro(id: &str, state: SessionState) -> Retro {
    Retro {
        id: id.into(),
        name: format!("Retro {id}"),
        template_id: Some(TemplateId::from(1)),
        questions: state.questions,
        created_at: None,
    }
}

/// Scriptable `RetroApi` that records every call.
pub(crate) struct FakeApi {
    pub retro: Mutex<Retro>,
    pub calls: Mutex<Vec<String>>,
    /// JSON bodies of created post-its, as they would go on the wire.
    pub bodies: Mutex<Vec<serde_json::Value>>,
    pub fail: AtomicBool,
    pub votes: AtomicU32,
    next_id: AtomicU64,
    /// Makes `get_retro` take this long.
    pub fetch_delay: Mutex<Option<Duration>>,
    /// Cancelled while a request is in flight, to simulate the view going away.
    pub cancel_during_call: Mutex<Option<CancellationToken>>,
}

impl FakeApi {
    pub fn new(retro: Retro) -> Self {
        Self {
            retro: Mutex::new(retro),
            calls: Mutex::new(Vec::new()),
            bodies: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            votes: AtomicU32::new(0),
            next_id: AtomicU64::new(100),
            fetch_delay: Mutex::new(None),
            cancel_during_call: Mutex::new(None),
        }
    }

    pub fn failing(self) -> Self {
        self.fail.store(true, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_retro(&self, retro: Retro) {
        *self.retro.lock().unwrap() = retro;
    }

    fn call(&self, line: String) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(line.clone());
        if let Some(token) = self.cancel_during_call.lock().unwrap().as_ref() {
            token.cancel();
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                method: "FAKE".into(),
                path: line,
                status: 500,
                message: "scripted failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RetroApi for FakeApi {
    async fn list_templates(&self) -> Result<Vec<Template>, ClientError> {
        self.call("GET /templates".into())?;
        Ok(Vec::new())
    }

    async fn get_template(&self, id: &TemplateId) -> Result<Template, ClientError> {
        self.call(format!("GET /templates/{id}"))?;
        Err(ClientError::EmptyResponse {
            path: format!("/templates/{id}"),
        })
    }

    async fn create_template(&self, template: &NewTemplate) -> Result<Template, ClientError> {
        self.call(format!("POST /templates {}", template.name))?;
        Ok(Template {
            id: 1.into(),
            name: template.name.clone(),
            questions: Vec::new(),
            created_at: None,
        })
    }

    async fn delete_template(&self, id: &TemplateId) -> Result<(), ClientError> {
        self.call(format!("DELETE /templates/{id}"))
    }

    async fn list_retros(&self) -> Result<Vec<Retro>, ClientError> {
        self.call("GET /retros".into())?;
        Ok(vec![self.retro.lock().unwrap().clone()])
    }

    async fn get_retro(&self, id: &RetroId) -> Result<Retro, ClientError> {
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.call(format!("GET /retros/{id}"))?;
        Ok(self.retro.lock().unwrap().clone())
    }

    async fn create_retro(&self, retro: &NewRetro) -> Result<Retro, ClientError> {
        self.call(format!("POST /retros {}", retro.name))?;
        Ok(sample_retro("9", SessionState::default()))
    }

    async fn delete_retro(&self, id: &RetroId) -> Result<(), ClientError> {
        self.call(format!("DELETE /retros/{id}"))
    }

    async fn create_post_it(&self, post_it: &NewPostIt) -> Result<PostIt, ClientError> {
        self.call(format!(
            "POST /postits question={} hidden={} content={}",
            post_it.question_id, post_it.hidden, post_it.content
        ))?;
        if let Ok(body) = serde_json::to_value(post_it) {
            self.bodies.lock().unwrap().push(body);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(PostIt::new(
            PostItId::from(id as i64),
            post_it.question_id.clone(),
            post_it.content.clone(),
            "u1".into(),
        ))
    }

    async fn update_post_it(&self, id: &PostItId, update: &PostItUpdate) -> Result<(), ClientError> {
        self.call(format!(
            "PUT /postits/{id} hidden={} content={}",
            update.hidden, update.content
        ))
    }

    async fn delete_post_it(&self, id: &PostItId) -> Result<(), ClientError> {
        self.call(format!("DELETE /postits/{id}"))
    }

    async fn vote_post_it(&self, id: &PostItId) -> Result<VoteReceipt, ClientError> {
        self.call(format!("POST /postits/{id}/vote"))?;
        Ok(VoteReceipt {
            votes: self.votes.load(Ordering::SeqCst),
        })
    }
}
