use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{session::SessionUser, ClientError};
use crate::api::Envelope;

/// Body of a successful login or signup.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: SessionUser,
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ClientError>;
    async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload, ClientError>;
}

/// Talks to the `/api/auth` routes over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: Client,
    base_url: String,
}

impl HttpAuthApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = format!("{}{path}", self.base_url);
        let res = self.client.post(&url).json(body).send().await?;
        let status = res.status();
        let text = res.text().await?;
        debug!(%url, %status, "auth request finished");
        unwrap_envelope(status.as_u16(), &text)
    }
}

/// Extracts `data` from an envelope, turning failures into [`ClientError::Api`].
pub(crate) fn unwrap_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ClientError> {
    let envelope: Envelope<T> = match serde_json::from_str(body) {
        Ok(env) => env,
        Err(_) if !(200..300).contains(&status) => {
            return Err(ClientError::Api(format!("Request failed with status {status}")));
        }
        Err(e) => return Err(e.into()),
    };
    if !envelope.success {
        let message = envelope.error_text().unwrap_or("Request failed").to_string();
        return Err(ClientError::Api(message));
    }
    envelope
        .data
        .ok_or_else(|| ClientError::Api("Response contained no data".into()))
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ClientError> {
        self.post("/api/auth/login", &json!({ "email": email, "password": password }))
            .await
    }

    async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload, ClientError> {
        self.post(
            "/api/auth/signup",
            &json!({ "name": name, "email": email, "password": password }),
        )
        .await
    }
}
