//! REST client for the dashboard API.
//!
//! ARCHITECTURE
//! ============
//! `AuthApi` and `UsersApi` are the seams the session store and the users
//! screen depend on; `HttpApi` implements both over `reqwest`. Tests swap in
//! scripted mocks behind the same traits.
//!
//! The client carries a *default bearer* slot, the equivalent of a default
//! `Authorization` header on every outgoing request. Only the session store
//! writes it; user-management calls read it.
//!
//! ERROR HANDLING
//! ==============
//! Every non-2xx response becomes `ApiError::Rejected` with the body's
//! `detail` message extracted when present. Transport failures map to
//! `ApiError::Transport`; callers treat both as "the request failed".

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;

use super::types::{
    ApiError, LoginRequest, ManagedUser, RegisterRequest, TokenResponse, User, UserForm, extract_detail,
};
use crate::config::ClientConfig;

pub(crate) const LOGIN_PATH: &str = "/api/auth/login";
pub(crate) const REGISTER_PATH: &str = "/api/auth/register";
pub(crate) const ME_PATH: &str = "/api/auth/me";
pub(crate) const USERS_PATH: &str = "/api/users/";

pub(crate) fn user_endpoint(user_id: i64) -> String {
    format!("/api/users/{user_id}")
}

pub(crate) fn bearer_value(token: &str) -> String {
    format!("Bearer {token}")
}

// =============================================================================
// SEAMS
// =============================================================================

/// Authentication endpoints consumed by the session store.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for an access token.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the server rejects the credentials or the
    /// request cannot be completed.
    async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError>;

    /// Create an account. The response body is not needed.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if registration is rejected or fails in transit.
    async fn register(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError>;

    /// Fetch the profile of the user owning `token`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the token is invalid or the request fails.
    async fn current_user(&self, token: &str) -> Result<User, ApiError>;

    /// Replace (or clear) the bearer credential sent by default.
    fn set_default_bearer(&self, token: Option<&str>);
}

/// User-management CRUD endpoints. Authenticated with the default bearer.
#[async_trait::async_trait]
pub trait UsersApi: Send + Sync {
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the list request fails.
    async fn list_users(&self, skip: usize, limit: usize) -> Result<Vec<ManagedUser>, ApiError>;

    /// # Errors
    ///
    /// Returns an [`ApiError`] if creation is rejected (e.g. duplicate email).
    async fn create_user(&self, form: &UserForm) -> Result<ManagedUser, ApiError>;

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the user is missing or the update is rejected.
    async fn update_user(&self, user_id: i64, form: &UserForm) -> Result<ManagedUser, ApiError>;

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the user is missing or deletion fails.
    async fn delete_user(&self, user_id: i64) -> Result<(), ApiError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    default_bearer: RwLock<Option<String>>,
}

impl HttpApi {
    /// Build a client for `config.api_url` with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the TLS backend fails to initialize.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.api_url.clone(), default_bearer: RwLock::new(None) })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bearer credential currently attached to user-management calls.
    #[must_use]
    pub fn default_bearer(&self) -> Option<String> {
        self.default_bearer.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.default_bearer() {
            Some(token) => request.header(AUTHORIZATION, bearer_value(&token)),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::Rejected { status: status.as_u16(), detail: extract_detail(&text) });
        }
        Ok(text)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let text = self.send(request).await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl AuthApi for HttpApi {
    async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let body = LoginRequest { email, password };
        self.send_json(self.http.post(self.url(LOGIN_PATH)).json(&body)).await
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError> {
        let body = RegisterRequest { name, email, password };
        self.send(self.http.post(self.url(REGISTER_PATH)).json(&body)).await?;
        Ok(())
    }

    async fn current_user(&self, token: &str) -> Result<User, ApiError> {
        let request = self.http.get(self.url(ME_PATH)).header(AUTHORIZATION, bearer_value(token));
        self.send_json(request).await
    }

    fn set_default_bearer(&self, token: Option<&str>) {
        *self.default_bearer.write().unwrap_or_else(PoisonError::into_inner) = token.map(ToOwned::to_owned);
    }
}

#[async_trait::async_trait]
impl UsersApi for HttpApi {
    async fn list_users(&self, skip: usize, limit: usize) -> Result<Vec<ManagedUser>, ApiError> {
        let request = self
            .http
            .get(self.url(USERS_PATH))
            .query(&[("skip", skip), ("limit", limit)]);
        self.send_json(self.authorized(request)).await
    }

    async fn create_user(&self, form: &UserForm) -> Result<ManagedUser, ApiError> {
        let request = self.http.post(self.url(USERS_PATH)).json(form);
        self.send_json(self.authorized(request)).await
    }

    async fn update_user(&self, user_id: i64, form: &UserForm) -> Result<ManagedUser, ApiError> {
        let request = self.http.put(self.url(&user_endpoint(user_id))).json(form);
        self.send_json(self.authorized(request)).await
    }

    async fn delete_user(&self, user_id: i64) -> Result<(), ApiError> {
        let request = self.http.delete(self.url(&user_endpoint(user_id)));
        self.send(self.authorized(request)).await?;
        Ok(())
    }
}
