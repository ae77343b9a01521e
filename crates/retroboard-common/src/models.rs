use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::{PostItId, QuestionId, RetroId, TemplateId, UserId};

/// Treat an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A single note attached to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostIt {
    pub id: PostItId,
    #[serde(default, alias = "questionId")]
    pub question_id: QuestionId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hidden: bool,
    #[serde(
        default,
        rename = "owner_id",
        alias = "userId",
        deserialize_with = "null_as_default"
    )]
    pub user_id: UserId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub votes: u32,
}

impl PostIt {
    /// A freshly created, visible post-it with no votes.
    pub fn new(
        id: PostItId,
        question_id: QuestionId,
        content: impl Into<String>,
        user_id: UserId,
    ) -> Self {
        Self {
            id,
            question_id,
            content: content.into(),
            hidden: false,
            user_id,
            votes: 0,
        }
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        !self.user_id.is_empty() && &self.user_id == user
    }
}

#[derive(Deserialize)]
struct WireQuestion {
    id: QuestionId,
    #[serde(default, alias = "text", deserialize_with = "null_as_default")]
    content: String,
    #[serde(
        default,
        alias = "postIts",
        alias = "post_its",
        deserialize_with = "null_as_default"
    )]
    postits: Vec<PostIt>,
}

/// A prompt within a retro, grouping its post-its in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireQuestion")]
pub struct Question {
    pub id: QuestionId,
    pub content: String,
    #[serde(rename = "postits")]
    pub post_its: Vec<PostIt>,
}

impl From<WireQuestion> for Question {
    fn from(wire: WireQuestion) -> Self {
        // Nested post-its always belong to the question that carries them.
        let post_its = wire
            .postits
            .into_iter()
            .map(|mut p| {
                p.question_id = wire.id.clone();
                p
            })
            .collect();
        Self {
            id: wire.id,
            content: wire.content,
            post_its,
        }
    }
}

impl Question {
    pub fn new(id: QuestionId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            post_its: Vec::new(),
        }
    }

    pub fn post_it(&self, id: &PostItId) -> Option<&PostIt> {
        self.post_its.iter().find(|p| &p.id == id)
    }
}

/// The client-held view of one retro: its questions and their post-its.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions: Vec<Question>,
}

impl SessionState {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| &q.id == id)
    }

    /// Look up a post-it under a specific question.
    pub fn post_it(&self, question_id: &QuestionId, post_it_id: &PostItId) -> Option<&PostIt> {
        self.question(question_id)?.post_it(post_it_id)
    }

    pub fn contains_post_it(&self, post_it_id: &PostItId) -> bool {
        self.questions
            .iter()
            .any(|q| q.post_its.iter().any(|p| &p.id == post_it_id))
    }

    pub fn post_it_count(&self) -> usize {
        self.questions.iter().map(|q| q.post_its.len()).sum()
    }
}

/// A prompt stored on a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateQuestion {
    #[serde(default)]
    pub id: Option<QuestionId>,
    pub content: String,
}

/// A reusable set of questions used to seed new retros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions: Vec<TemplateQuestion>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One collaborative session, instantiated from a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retro {
    pub id: RetroId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub template_id: Option<TemplateId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Retro {
    pub fn session_state(&self) -> SessionState {
        SessionState::new(self.questions.clone())
    }

    pub fn into_session_state(self) -> SessionState {
        SessionState::new(self.questions)
    }
}
