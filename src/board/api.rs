use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use retroboard_common::{PostIt, PostItId, QuestionId, Retro, RetroId, Template, TemplateId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::credentials::Credentials;
use crate::errors::ClientError;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTemplate {
    pub name: String,
    pub questions: Vec<String>,
}

impl NewTemplate {
    /// Blank questions are dropped; at least one must remain.
    pub fn new(name: &str, questions: &[String]) -> Result<Self, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::BadRequest("template name is empty".into()));
        }
        let questions: Vec<String> = questions
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty())
            .map(str::to_string)
            .collect();
        if questions.is_empty() {
            return Err(ClientError::BadRequest(
                "a template needs at least one question".into(),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            questions,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRetro {
    pub name: String,
    pub template_id: TemplateId,
}

impl NewRetro {
    pub fn new(name: &str, template_id: TemplateId) -> Result<Self, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::BadRequest("retro name is empty".into()));
        }
        Ok(Self {
            name: name.to_string(),
            template_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPostIt {
    pub question_id: QuestionId,
    pub content: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostItUpdate {
    pub content: String,
    pub hidden: bool,
}

/// Server-side tally after a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct VoteReceipt {
    pub votes: u32,
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Every backend response is wrapped as `{code, msg, data}`.
#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

// ── Trait ─────────────────────────────────────────────────────────────

/// The board backend's REST surface.
#[async_trait]
pub trait RetroApi: Send + Sync {
    async fn list_templates(&self) -> Result<Vec<Template>, ClientError>;
    async fn get_template(&self, id: &TemplateId) -> Result<Template, ClientError>;
    async fn create_template(&self, template: &NewTemplate) -> Result<Template, ClientError>;
    async fn delete_template(&self, id: &TemplateId) -> Result<(), ClientError>;

    async fn list_retros(&self) -> Result<Vec<Retro>, ClientError>;
    async fn get_retro(&self, id: &RetroId) -> Result<Retro, ClientError>;
    async fn create_retro(&self, retro: &NewRetro) -> Result<Retro, ClientError>;
    async fn delete_retro(&self, id: &RetroId) -> Result<(), ClientError>;

    async fn create_post_it(&self, post_it: &NewPostIt) -> Result<PostIt, ClientError>;
    async fn update_post_it(&self, id: &PostItId, update: &PostItUpdate) -> Result<(), ClientError>;
    async fn delete_post_it(&self, id: &PostItId) -> Result<(), ClientError>;
    async fn vote_post_it(&self, id: &PostItId) -> Result<VoteReceipt, ClientError>;
}

// ── HTTP implementation ───────────────────────────────────────────────

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `RetroApi` over HTTP with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpRetroApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRetroApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ClientError::Transport {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and unwrap the response envelope.
    /// `Ok(None)` when the server answered with an empty body or no `data`.
    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        method: Method,
        path: &str,
    ) -> Result<Option<T>, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, %url, "api request");

        let response = builder
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport { url, source })?;

        if !status.is_success() {
            return Err(ClientError::Status {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        if body.is_empty() {
            return Ok(None);
        }
        let envelope: Envelope<T> =
            serde_json::from_slice(&body).map_err(|e| ClientError::Decode {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        Ok(envelope.data)
    }

    async fn fetch<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T, ClientError> {
        let builder = self.request(method.clone(), path);
        self.execute(builder, method, path)
            .await?
            .ok_or_else(|| ClientError::EmptyResponse {
                path: path.to_string(),
            })
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(method.clone(), path).json(body);
        self.execute(builder, method, path)
            .await?
            .ok_or_else(|| ClientError::EmptyResponse {
                path: path.to_string(),
            })
    }

    /// Requests whose response body carries nothing the client needs.
    async fn send_unit<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<(), ClientError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let mut builder = self.request(method.clone(), path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute::<serde_json::Value>(builder, method, path)
            .await
            .map(|_| ())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Credentials, ClientError> {
        self.send_json(
            Method::POST,
            "/users/login",
            &AuthRequest { username, password },
        )
        .await
    }

    pub async fn signup(&self, username: &str, password: &str) -> Result<Credentials, ClientError> {
        self.send_json(
            Method::POST,
            "/users/signup",
            &AuthRequest { username, password },
        )
        .await
    }
}

/// Best-effort human message from an error body.
fn error_message(body: &[u8]) -> String {
    if let Ok(envelope) = serde_json::from_slice::<Envelope<serde_json::Value>>(body) {
        if !envelope.msg.is_empty() {
            return envelope.msg;
        }
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        "no details".to_string()
    } else {
        text
    }
}

#[async_trait]
impl RetroApi for HttpRetroApi {
    async fn list_templates(&self) -> Result<Vec<Template>, ClientError> {
        let builder = self.request(Method::GET, "/templates");
        Ok(self
            .execute(builder, Method::GET, "/templates")
            .await?
            .unwrap_or_default())
    }

    async fn get_template(&self, id: &TemplateId) -> Result<Template, ClientError> {
        self.fetch(Method::GET, &format!("/templates/{id}")).await
    }

    async fn create_template(&self, template: &NewTemplate) -> Result<Template, ClientError> {
        self.send_json(Method::POST, "/templates", template).await
    }

    async fn delete_template(&self, id: &TemplateId) -> Result<(), ClientError> {
        self.send_unit::<()>(Method::DELETE, &format!("/templates/{id}"), None)
            .await
    }

    async fn list_retros(&self) -> Result<Vec<Retro>, ClientError> {
        let builder = self.request(Method::GET, "/retros");
        Ok(self
            .execute(builder, Method::GET, "/retros")
            .await?
            .unwrap_or_default())
    }

    async fn get_retro(&self, id: &RetroId) -> Result<Retro, ClientError> {
        self.fetch(Method::GET, &format!("/retros/{id}")).await
    }

    async fn create_retro(&self, retro: &NewRetro) -> Result<Retro, ClientError> {
        self.send_json(Method::POST, "/retros", retro).await
    }

    async fn delete_retro(&self, id: &RetroId) -> Result<(), ClientError> {
        self.send_unit::<()>(Method::DELETE, &format!("/retros/{id}"), None)
            .await
    }

    async fn create_post_it(&self, post_it: &NewPostIt) -> Result<PostIt, ClientError> {
        self.send_json(Method::POST, "/postits", post_it).await
    }

    async fn update_post_it(&self, id: &PostItId, update: &PostItUpdate) -> Result<(), ClientError> {
        self.send_unit(Method::PUT, &format!("/postits/{id}"), Some(update))
            .await
    }

    async fn delete_post_it(&self, id: &PostItId) -> Result<(), ClientError> {
        self.send_unit::<()>(Method::DELETE, &format!("/postits/{id}"), None)
            .await
    }

    async fn vote_post_it(&self, id: &PostItId) -> Result<VoteReceipt, ClientError> {
        self.fetch(Method::POST, &format!("/postits/{id}/vote")).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
