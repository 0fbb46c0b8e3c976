//! REST implementation of the collaborator contracts.
//!
//! One HTTP client speaks to the backend's three surfaces: `/rest/v1` for
//! rows, `/storage/v1` for blobs and `/auth/v1` for sessions. Every request
//! carries the publishable API key; requests made with a live session also
//! carry its bearer token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{ObjectStore, Query, RecordStore, SessionService};
use crate::config::Config;
use crate::errors::{AppError, RemoteErrorBody};
use crate::session::{Session, SessionContext};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the backend. Cheap to clone.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    context: Arc<SessionContext>,
}

/// Body of a successful auth response.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<AuthResponse> for Session {
    fn from(body: AuthResponse) -> Self {
        Session {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            user_id: body.user.id,
            email: body.user.email,
        }
    }
}

impl RestClient {
    pub fn new(config: &Config, context: Arc<SessionContext>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            context,
        })
    }

    /// The session context this client publishes transitions to.
    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request with the API key and, when signed in, the bearer token.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(key) = &self.api_key {
            builder = builder.header("apikey", key);
        }
        if let Some(session) = self.context.current() {
            builder = builder.bearer_auth(session.access_token);
        }
        builder
    }

    /// Map a non-success response into an [`AppError`], consuming the body
    /// for its error message.
    async fn remote_error(response: reqwest::Response, what: &str) -> AppError {
        let status = response.status();
        let body: RemoteErrorBody = response.json().await.unwrap_or_default();
        let message = body.describe(&format!("{} failed with status {}", what, status));
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            AppError::Unauthorized(message)
        } else {
            AppError::Remote(message)
        }
    }

    async fn rows(response: reqwest::Response, what: &str) -> Result<Vec<Value>, AppError> {
        if !response.status().is_success() {
            return Err(Self::remote_error(response, what).await);
        }
        Ok(response.json().await?)
    }

    async fn auth_request(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        let response = self
            .request(Method::POST, path)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body: RemoteErrorBody = response.json().await.unwrap_or_default();
            let message = body.describe("Authentication failed");
            // Auth endpoints answer 400 to bad credentials
            return Err(if status.is_client_error() {
                AppError::Unauthorized(message)
            } else {
                AppError::Remote(message)
            });
        }

        let body: AuthResponse = response.json().await?;
        let session: Session = body.into();
        self.context.set(session.clone());
        Ok(session)
    }
}

#[async_trait]
impl RecordStore for RestClient {
    async fn get(&self, table: &str, query: &Query) -> Result<Vec<Value>, AppError> {
        let mut params: Vec<(String, String)> = query
            .filters
            .iter()
            .map(|(column, value)| (column.clone(), format!("eq.{}", value)))
            .collect();
        if let Some(column) = &query.order_desc {
            params.push(("order".to_string(), format!("{}.desc", column)));
        }

        let response = self
            .request(Method::GET, &format!("/rest/v1/{}", table))
            .query(&params)
            .send()
            .await?;

        Self::rows(response, &format!("Reading {}", table)).await
    }

    async fn get_one(&self, table: &str, id: &str) -> Result<Option<Value>, AppError> {
        let response = self
            .request(Method::GET, &format!("/rest/v1/{}", table))
            .query(&[("id", format!("eq.{}", id)), ("limit", "1".to_string())])
            .send()
            .await?;

        let rows = Self::rows(response, &format!("Reading {}", table)).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, AppError> {
        let response = self
            .request(Method::POST, &format!("/rest/v1/{}", table))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        let rows = Self::rows(response, &format!("Inserting into {}", table)).await?;
        rows.into_iter().next().ok_or_else(|| {
            AppError::Remote(format!("Insert into {} returned no representation", table))
        })
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, AppError> {
        let response = self
            .request(Method::PATCH, &format!("/rest/v1/{}", table))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;

        let rows = Self::rows(response, &format!("Updating {}", table)).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("{} row {} not found", table, id)))
    }
}

#[async_trait]
impl ObjectStore for RestClient {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError> {
        let response = self
            .request(Method::POST, &format!("/storage/v1/object/{}/{}", bucket, key))
            .header("Content-Type", content_type.to_string())
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::remote_error(response, "Image upload").await);
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, key)
    }
}

#[async_trait]
impl SessionService for RestClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        self.auth_request("/auth/v1/token?grant_type=password", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AppError> {
        self.auth_request("/auth/v1/signup", email, password).await
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        let result = self.request(Method::POST, "/auth/v1/logout").send().await;
        match result {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!("Remote sign-out failed with status {}", response.status());
            }
            Err(err) => {
                tracing::warn!("Remote sign-out failed: {}", err);
            }
            Ok(_) => {}
        }
        // The local session ends regardless of what the backend said.
        self.context.clear();
        Ok(())
    }

    async fn change_password(&self, new_password: &str) -> Result<(), AppError> {
        if self.context.current().is_none() {
            return Err(AppError::Unauthorized(
                "Sign in to change your password.".to_string(),
            ));
        }

        let response = self
            .request(Method::PUT, "/auth/v1/user")
            .json(&serde_json::json!({ "password": new_password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::remote_error(response, "Password change").await);
        }
        Ok(())
    }

    fn current_session(&self) -> Option<Session> {
        self.context.current()
    }
}
