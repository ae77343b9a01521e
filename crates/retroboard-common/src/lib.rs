//! Shared domain types for the retroboard client.
//!
//! Plain records only: questions, post-its, templates and retros, plus the
//! [`SessionState`] aggregate that the client keeps in sync for the retro
//! being viewed. Wire-format quirks of the backend (numeric or string ids,
//! the `owner_id` rename, missing defaults) are absorbed here so the rest of
//! the client works with one canonical shape.

pub mod ids;
pub mod models;

pub use ids::{PostItId, QuestionId, RetroId, TemplateId, UserId};
pub use models::{PostIt, Question, Retro, SessionState, Template, TemplateQuestion};
