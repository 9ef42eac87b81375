//! Identity provider: password sign-in and access-token lookup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("incorrect email or password")]
    InvalidCredentials,

    #[error("session is invalid or expired")]
    InvalidSession,

    #[error("identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("identity provider answered {status}: {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: AuthUser,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Resolves the user behind an access token.
    async fn user(&self, access_token: &str) -> Result<AuthUser, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

/// Client of the managed identity REST API (`/auth/v1`).
pub struct HttpAuthProvider {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl HttpAuthProvider {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }
}

async fn api_error(resp: reqwest::Response) -> AuthError {
    AuthError::Api {
        status: resp.status().as_u16(),
        body: resp.text().await.unwrap_or_default(),
    }
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let resp = self
            .client
            .post(self.url("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        match resp.status().as_u16() {
            200..=299 => Ok(resp.json().await?),
            400 | 401 => Err(AuthError::InvalidCredentials),
            _ => Err(api_error(resp).await),
        }
    }

    async fn user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let resp = self
            .client
            .get(self.url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        match resp.status().as_u16() {
            200..=299 => Ok(resp.json().await?),
            401 | 403 => Err(AuthError::InvalidSession),
            _ => Err(api_error(resp).await),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let resp = self
            .client
            .post(self.url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        if resp.status().is_success() || resp.status().as_u16() == 401 {
            Ok(())
        } else {
            Err(api_error(resp).await)
        }
    }
}

/// In-memory accounts, used when no managed backend is configured.
#[derive(Default)]
pub struct StaticAuthProvider {
    accounts: HashMap<String, (String, AuthUser)>,
    sessions: RwLock<HashMap<String, AuthUser>>,
}

impl StaticAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, id: Uuid, email: &str, password: &str) -> Self {
        let user = AuthUser {
            id,
            email: email.to_lowercase(),
        };
        self.accounts
            .insert(email.to_lowercase(), (password.to_string(), user));
        self
    }

    /// Issues a token without a password check.
    pub fn issue_token(&self, user: AuthUser) -> String {
        let token = Uuid::new_v4().simple().to_string();
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.insert(token.clone(), user);
        }
        token
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        match self.accounts.get(&email.to_lowercase()) {
            Some((expected, user)) if expected == password => Ok(AuthSession {
                access_token: self.issue_token(user.clone()),
                user: user.clone(),
            }),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        self.sessions
            .read()
            .ok()
            .and_then(|s| s.get(access_token).cloned())
            .ok_or(AuthError::InvalidSession)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(access_token);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn static_provider_session_lifecycle() {
        let id = Uuid::new_v4();
        let auth = StaticAuthProvider::new().with_account(id, "Ana@Example.com", "pw");

        assert!(matches!(
            auth.sign_in("ana@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        let session = auth.sign_in("ana@example.com", "pw").await.unwrap();
        assert_eq!(session.user.id, id);
        assert_eq!(auth.user(&session.access_token).await.unwrap().id, id);

        auth.sign_out(&session.access_token).await.unwrap();
        assert!(matches!(
            auth.user(&session.access_token).await,
            Err(AuthError::InvalidSession)
        ));
    }
}
