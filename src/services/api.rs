// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Course platform API client.
//!
//! Handles:
//! - Bearer token injection from the session context
//! - Normalizing failures into [`ApiError`]
//! - Parsing every response into a typed schema at the boundary
//! - Dropping the session when the current token is rejected (401)

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::catalog::CourseFilter;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::admin::{
    AdminUserDetail, AdminUserUpdate, Analytics, CourseToggle, UserPage, UserQuery,
};
use crate::models::course::{CategoryList, CourseList};
use crate::models::user::{AuthResponse, MessageResponse, UserEnvelope};
use crate::models::{
    Course, CourseDetail, Credentials, Dashboard, PasswordChange, ProfileUpdate, ProgressUpdate,
    Registration, User,
};
use crate::session::{SessionContext, SessionEvent, SESSION_EXPIRED_MESSAGE};
use crate::tracker::{ProgressReport, ProgressSink};

/// Course platform API client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl ApiClient {
    /// Create a client for `base_url` (including the `/api` prefix).
    pub fn new(base_url: impl Into<String>, session: SessionContext) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, session)
    }

    /// Create a client with the transport settings from `config`.
    pub fn from_config(config: &Config, session: SessionContext) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self::with_http(http, config.api_url.clone(), session))
    }

    fn with_http(http: reqwest::Client, base_url: impl Into<String>, session: SessionContext) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ─── Core Request ────────────────────────────────────────────────────────

    /// Send a request and return the raw JSON body.
    ///
    /// Attaches the session's bearer token when one is present. Never
    /// retries; the caller decides what to do with a failure.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        self.send(method, endpoint, &[], body).await
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Value> {
        let token = self.session.token();
        self.dispatch(method, endpoint, query, body, token).await
    }

    /// Send with an explicit token; a 401 only touches the session when the
    /// request carried one.
    async fn dispatch<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        token: Option<String>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut request = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token.as_deref() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, endpoint, error = %e, "API request failed without response");
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            let err = ApiError::from_response(status, &text);
            match &err {
                ApiError::Server { .. } => {
                    tracing::error!(%method, endpoint, status = status.as_u16(), error = %err, "API server error");
                }
                _ => {
                    tracing::debug!(%method, endpoint, status = status.as_u16(), error = %err, "API request rejected");
                }
            }

            if err.is_auth_error() {
                if let Some(token) = token {
                    self.session.apply(SessionEvent::TokenRejected {
                        token,
                        message: SESSION_EXPIRED_MESSAGE.to_string(),
                    });
                }
            }
            return Err(err);
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Schema(format!("Invalid JSON: {}", e)))
    }

    /// Send a request and parse the body into `T`.
    async fn fetch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T> {
        let value = self.send(method, endpoint, query, body).await?;
        parse(endpoint, value)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.fetch::<T, Value>(Method::GET, endpoint, &[], None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T> {
        self.fetch(Method::POST, endpoint, &[], body).await
    }

    // ─── Authentication ──────────────────────────────────────────────────────

    /// Register a new account. On success the session is authenticated.
    pub async fn register(&self, form: &Registration) -> Result<User> {
        let response = self.post_credentials("/auth/register", form).await?;
        Ok(self.accept_auth(response))
    }

    /// Log in. On success the session is authenticated.
    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        let response = self.post_credentials("/auth/login", credentials).await?;
        Ok(self.accept_auth(response))
    }

    /// Credential requests go out without the bearer token, so rejected
    /// credentials never end the current session.
    async fn post_credentials<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<AuthResponse> {
        let value = self
            .dispatch(Method::POST, endpoint, &[], Some(body), None)
            .await?;
        parse(endpoint, value)
    }

    fn accept_auth(&self, response: AuthResponse) -> User {
        tracing::info!(user_id = response.user.id, "Authenticated");
        self.session.apply(SessionEvent::Authenticated {
            token: response.access_token,
            user: response.user.clone(),
        });
        response.user
    }

    /// Tell the backend the session is over. Does not touch local state.
    pub async fn logout_remote(&self) -> Result<()> {
        self.send::<Value>(Method::POST, "/auth/logout", &[], None)
            .await
            .map(|_| ())
    }

    pub async fn get_profile(&self) -> Result<User> {
        let envelope: UserEnvelope = self.get("/auth/profile").await?;
        Ok(envelope.user)
    }

    pub async fn update_profile(&self, form: &ProfileUpdate) -> Result<User> {
        let envelope: UserEnvelope = self
            .fetch(Method::PUT, "/auth/profile", &[], Some(form))
            .await?;
        Ok(envelope.user)
    }

    pub async fn change_password(&self, form: &PasswordChange) -> Result<String> {
        let response: MessageResponse = self.post("/auth/change-password", Some(form)).await?;
        Ok(response.message)
    }

    // ─── Courses ─────────────────────────────────────────────────────────────

    /// List active courses, filtered server-side.
    pub async fn get_courses(&self, filter: &CourseFilter) -> Result<Vec<Course>> {
        let list: CourseList = self
            .fetch::<_, Value>(Method::GET, "/courses", &filter.to_query(), None)
            .await?;
        Ok(list.courses)
    }

    /// Fetch a course with its stages, videos, and the learner's progress.
    pub async fn get_course(&self, course_id: u64) -> Result<CourseDetail> {
        let endpoint = format!("/courses/{}", course_id);
        let value = self.send::<Value>(Method::GET, &endpoint, &[], None).await?;
        CourseDetail::from_value(value).map_err(|e| schema_error(&endpoint, e))
    }

    pub async fn enroll(&self, course_id: u64) -> Result<String> {
        let response: MessageResponse = self
            .post::<_, Value>(&format!("/courses/{}/enroll", course_id), None)
            .await?;
        Ok(response.message)
    }

    pub async fn get_categories(&self) -> Result<Vec<String>> {
        let list: CategoryList = self.get("/categories").await?;
        Ok(list.categories)
    }

    // ─── Progress & Dashboard ────────────────────────────────────────────────

    pub async fn update_video_progress(&self, video_id: u64, update: &ProgressUpdate) -> Result<()> {
        self.send(
            Method::POST,
            &format!("/videos/{}/progress", video_id),
            &[],
            Some(update),
        )
        .await
        .map(|_| ())
    }

    pub async fn get_dashboard(&self) -> Result<Dashboard> {
        self.get("/dashboard").await
    }

    // ─── Admin ───────────────────────────────────────────────────────────────

    pub async fn get_users(&self, query: &UserQuery) -> Result<UserPage> {
        self.fetch::<_, Value>(Method::GET, "/admin/users", &query.to_query(), None)
            .await
    }

    pub async fn get_user_detail(&self, user_id: u64) -> Result<AdminUserDetail> {
        #[derive(serde::Deserialize)]
        struct Envelope {
            user: AdminUserDetail,
        }
        let envelope: Envelope = self.get(&format!("/admin/users/{}", user_id)).await?;
        Ok(envelope.user)
    }

    pub async fn update_user(&self, user_id: u64, update: &AdminUserUpdate) -> Result<User> {
        let envelope: UserEnvelope = self
            .fetch(
                Method::PUT,
                &format!("/admin/users/{}", user_id),
                &[],
                Some(update),
            )
            .await?;
        Ok(envelope.user)
    }

    pub async fn get_analytics(&self) -> Result<Analytics> {
        self.get("/admin/analytics").await
    }

    pub async fn get_admin_courses(&self) -> Result<Vec<Course>> {
        let list: CourseList = self.get("/admin/courses").await?;
        Ok(list.courses)
    }

    pub async fn toggle_course_active(&self, course_id: u64) -> Result<CourseToggle> {
        self.post::<_, Value>(&format!("/admin/courses/{}/toggle-active", course_id), None)
            .await
    }

    pub async fn toggle_course_featured(&self, course_id: u64) -> Result<CourseToggle> {
        self.post::<_, Value>(&format!("/admin/courses/{}/toggle-featured", course_id), None)
            .await
    }

    /// Check that the backend is reachable.
    pub async fn health_check(&self) -> Result<Value> {
        self.request(Method::GET, "/health", None).await
    }
}

#[async_trait]
impl ProgressSink for ApiClient {
    async fn persist(&self, report: &ProgressReport) -> Result<()> {
        self.update_video_progress(report.video_id, &report.update)
            .await
    }
}

fn parse<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| schema_error(endpoint, e))
}

fn schema_error(endpoint: &str, e: serde_json::Error) -> ApiError {
    tracing::warn!(endpoint, error = %e, "Response did not match schema");
    ApiError::Schema(format!("{}: {}", endpoint, e))
}
