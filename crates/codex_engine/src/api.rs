use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use codex_core::{ProcessSnapshot, ProcessState, Role, TaskId};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Fixed tick period for both poll loops.
    pub poll_interval: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://127.0.0.1:8000").expect("static url"),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// No token present, or the server rejected the one we sent. Handled by
    /// ending the session, never swallowed as a generic task failure.
    Auth,
    HttpStatus(u16),
    Timeout,
    Network,
    InvalidResponse,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_auth(&self) -> bool {
        self.kind == ApiErrorKind::Auth
    }
}

/// Shared bearer-token handle. Injected into the client and the app's
/// session persistence rather than read from any ambient global, so tests
/// can build isolated instances.
#[derive(Debug, Clone, Default)]
pub struct SessionToken(Arc<Mutex<Option<String>>>);

impl SessionToken {
    pub fn new(token: Option<String>) -> Self {
        Self(Arc::new(Mutex::new(token)))
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.0.lock().expect("token lock") = Some(token.into());
    }

    pub fn clear(&self) {
        *self.0.lock().expect("token lock") = None;
    }

    pub fn get(&self) -> Option<String> {
        self.0.lock().expect("token lock").clone()
    }
}

#[derive(Debug, Serialize)]
struct AskRequest {
    question: String,
    conversation_history: Vec<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct AskResponse {
    task_id: TaskId,
}

/// Raw chatbot answer poll payload. `status` is classified by the poll loop;
/// anything other than "pending"/"done" is a terminal error.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerResponse {
    pub status: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ProcessStatusResponse {
    status: String,
    last_run_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub filename: String,
    pub upload_date: String,
    pub processed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentsPage {
    pub items: Vec<DocumentRecord>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    // Not part of the server's pagination record; defaults to 0 when absent.
    #[serde(default)]
    pub n_not_processed: u64,
}

/// A topic as the server reports it, either standalone or attached to a
/// document. `weight` is only meaningful on a per-document record.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub words: BTreeMap<String, f64>,
}

// `GET /topics` wraps its list in an object.
#[derive(Debug, Deserialize)]
struct TopicsResponse {
    items: Vec<TopicRecord>,
}

/// One document with its topic distribution, from `/documents/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentDetail {
    pub id: String,
    pub filename: String,
    pub upload_date: String,
    pub processed: bool,
    #[serde(default)]
    pub topics: Vec<TopicRecord>,
}

#[derive(Debug, Serialize)]
struct RegisterRequest {
    username: String,
    password: String,
    creation_date: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Backend API surface, behind a trait so poll and engine tests can swap in
/// a scripted implementation.
#[async_trait::async_trait]
pub trait Api: Send + Sync {
    async fn register(&self, username: &str, password: &str) -> Result<(), ApiError>;
    async fn login(&self, username: &str, password: &str) -> Result<String, ApiError>;
    async fn upload_document(&self, filename: &str, bytes: Vec<u8>) -> Result<(), ApiError>;
    async fn documents(&self, query: &str, page: u32, limit: u32)
        -> Result<DocumentsPage, ApiError>;
    async fn document_detail(&self, document_id: &str) -> Result<DocumentDetail, ApiError>;
    async fn topics(&self) -> Result<Vec<TopicRecord>, ApiError>;
    async fn start_processing(&self) -> Result<(), ApiError>;
    async fn process_status(&self) -> Result<ProcessSnapshot, ApiError>;
    async fn ask(&self, question: &str, context: &[(Role, String)]) -> Result<TaskId, ApiError>;
    async fn answer(&self, task_id: &str) -> Result<AnswerResponse, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    client: reqwest::Client,
    settings: ApiSettings,
    token: SessionToken,
}

impl ReqwestApi {
    pub fn new(settings: ApiSettings, token: SessionToken) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(ApiErrorKind::Network, err.to_string()))?;
        Ok(Self {
            client,
            settings,
            token,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.settings
            .base_url
            .join(path)
            .map_err(|err| ApiError::new(ApiErrorKind::InvalidResponse, err.to_string()))
    }

    fn bearer(&self) -> Result<String, ApiError> {
        self.token
            .get()
            .ok_or_else(|| ApiError::new(ApiErrorKind::Auth, "no authentication token"))
    }

    /// Maps the status line before the caller touches the body. 401 is the
    /// distinguished auth-expired condition.
    fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::new(ApiErrorKind::Auth, "token expired or invalid"));
        }
        if !status.is_success() {
            return Err(ApiError::new(
                ApiErrorKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        Ok(response)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::new(ApiErrorKind::InvalidResponse, err.to_string()))
    }
}

#[async_trait::async_trait]
impl Api for ReqwestApi {
    async fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let body = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            creation_date: chrono::Utc::now().to_rfc3339(),
        };
        let response = self
            .client
            .post(self.endpoint("/user/new")?)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::check_status(response)?;
        Ok(())
    }

    async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .post(self.endpoint("/token")?)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = Self::check_status(response)?;
        let token: TokenResponse = Self::decode(response).await?;
        Ok(token.access_token)
    }

    async fn upload_document(&self, filename: &str, bytes: Vec<u8>) -> Result<(), ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(self.endpoint("/documents/")?)
            .bearer_auth(self.bearer()?)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::check_status(response)?;
        Ok(())
    }

    async fn documents(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> Result<DocumentsPage, ApiError> {
        let mut url = self.endpoint("/documents/")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());
        let response = self
            .client
            .get(url)
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::decode(Self::check_status(response)?).await
    }

    async fn document_detail(&self, document_id: &str) -> Result<DocumentDetail, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&format!("/documents/{document_id}"))?)
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::decode(Self::check_status(response)?).await
    }

    async fn topics(&self) -> Result<Vec<TopicRecord>, ApiError> {
        // No trailing slash on this route.
        let response = self
            .client
            .get(self.endpoint("/topics")?)
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let wrapper: TopicsResponse = Self::decode(Self::check_status(response)?).await?;
        Ok(wrapper.items)
    }

    async fn start_processing(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.endpoint("/documents/process")?)
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::check_status(response)?;
        Ok(())
    }

    async fn process_status(&self) -> Result<ProcessSnapshot, ApiError> {
        let response = self
            .client
            .get(self.endpoint("/documents/process/status")?)
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let raw: ProcessStatusResponse = Self::decode(Self::check_status(response)?).await?;
        let status = ProcessState::parse(&raw.status).ok_or_else(|| {
            ApiError::new(
                ApiErrorKind::InvalidResponse,
                format!("unknown process status {:?}", raw.status),
            )
        })?;
        Ok(ProcessSnapshot {
            status,
            last_run_time: raw.last_run_time,
        })
    }

    async fn ask(&self, question: &str, context: &[(Role, String)]) -> Result<TaskId, ApiError> {
        let body = AskRequest {
            question: question.to_string(),
            conversation_history: context
                .iter()
                .map(|(role, content)| (role.as_str().to_string(), content.clone()))
                .collect(),
        };
        let response = self
            .client
            .post(self.endpoint("/chatbot/ask")?)
            .bearer_auth(self.bearer()?)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let accepted: AskResponse = Self::decode(Self::check_status(response)?).await?;
        Ok(accepted.task_id)
    }

    async fn answer(&self, task_id: &str) -> Result<AnswerResponse, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&format!("/chatbot/answer/{task_id}"))?)
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::decode(Self::check_status(response)?).await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(ApiErrorKind::Timeout, err.to_string());
    }
    ApiError::new(ApiErrorKind::Network, err.to_string())
}
