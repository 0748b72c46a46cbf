//! Typed HTTP client for the DevConnect API

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

use super::ClientError;
use crate::api::middleware::{ApiError, AUTH_TOKEN_HEADER};
use crate::api::responses::{AuthResponse, SuggestionResponse, UserResponse};
use crate::models::FeedPost;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Registration form
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl RegisterForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }
}

/// The auth calls the session manager depends on
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError>;

    async fn register(&self, form: &RegisterForm) -> Result<AuthResponse, ClientError>;

    /// Resolve a token to its user
    async fn current_user(&self, token: &str) -> Result<UserResponse, ClientError>;
}

/// HTTP client for every API endpoint
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for an API base URL such as `http://localhost:5001/api`
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET /users/{id}
    pub async fn get_user(&self, token: &str, id: i64) -> Result<UserResponse, ClientError> {
        self.send(self.get(&format!("/users/{}", id), token)).await
    }

    /// GET /posts
    pub async fn list_posts(&self, token: &str) -> Result<Vec<FeedPost>, ClientError> {
        self.send(self.get("/posts", token)).await
    }

    /// GET /posts/user/{id}
    pub async fn list_posts_by_user(
        &self,
        token: &str,
        user_id: i64,
    ) -> Result<Vec<FeedPost>, ClientError> {
        self.send(self.get(&format!("/posts/user/{}", user_id), token))
            .await
    }

    /// POST /posts
    pub async fn create_post(&self, token: &str, content: &str) -> Result<FeedPost, ClientError> {
        let request = self
            .http
            .post(self.url("/posts"))
            .header(AUTH_TOKEN_HEADER, token)
            .json(&json!({ "content": content }));
        self.send(request).await
    }

    /// POST /ai/suggest
    pub async fn suggest_post(&self, token: &str, draft: &str) -> Result<String, ClientError> {
        let request = self
            .http
            .post(self.url("/ai/suggest"))
            .header(AUTH_TOKEN_HEADER, token)
            .json(&json!({ "draft": draft }));
        let response: SuggestionResponse = self.send(request).await?;
        Ok(response.suggestion)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.http
            .get(self.url(path))
            .header(AUTH_TOKEN_HEADER, token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(api_error(status, &body))
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let request = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        self.send(request).await
    }

    async fn register(&self, form: &RegisterForm) -> Result<AuthResponse, ClientError> {
        let request = self.http.post(self.url("/auth/register")).json(form);
        self.send(request).await
    }

    async fn current_user(&self, token: &str) -> Result<UserResponse, ClientError> {
        self.send(self.get("/auth", token)).await
    }
}

/// Decode a server error body, falling back to the bare status
fn api_error(status: StatusCode, body: &str) -> ClientError {
    match serde_json::from_str::<ApiError>(body) {
        Ok(err) => ClientError::Api {
            status: status.as_u16(),
            code: err.error.code,
            message: err.error.message,
        },
        Err(_) => ClientError::Api {
            status: status.as_u16(),
            code: "HTTP_ERROR".to_string(),
            message: format!("Request failed with status {}", status),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_decodes_server_body() {
        let body = r#"{"error":{"code":"DUPLICATE_EMAIL","message":"User already exists"}}"#;
        match api_error(StatusCode::CONFLICT, body) {
            ClientError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 409);
                assert_eq!(code, "DUPLICATE_EMAIL");
                assert_eq!(message, "User already exists");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_api_error_falls_back_to_status() {
        let err = api_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(err.code(), Some("HTTP_ERROR"));
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:5001/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5001/api");
        assert_eq!(client.url("/posts"), "http://localhost:5001/api/posts");
    }

    #[test]
    fn test_register_form_omits_missing_optionals() {
        let json = serde_json::to_value(RegisterForm::new("Ada", "ada@example.com", "pw")).unwrap();
        assert!(json.get("bio").is_none());
        assert!(json.get("avatar_url").is_none());

        let json =
            serde_json::to_value(RegisterForm::new("Ada", "a@b", "pw").with_bio("hi")).unwrap();
        assert_eq!(json["bio"], "hi");
    }
}
