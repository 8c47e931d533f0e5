//! Backend profile REST client
//!
//! - `POST {base}/auth/verify` with `{"idToken": <token>}` returns the
//!   fetch-or-created profile for the token's identity
//! - `GET {base}/users/{id}` / `PUT {base}/users/{id}` with
//!   `Authorization: Bearer <token>`

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use pp_core::ports::ProfileBackendPort;
use pp_core::{BackendError, BearerToken, Profile, ProfileId, ProfilePatch};
use reqwest::{Response, StatusCode};
use serde::Serialize;
use tracing::debug;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    id_token: &'a str,
}

pub struct HttpProfileBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProfileBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build backend HTTP client failed")?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn user_url(&self, id: &ProfileId) -> String {
        format!("{}/users/{}", self.base_url, id)
    }

    async fn read_profile(response: Response) -> Result<Profile, BackendError> {
        let response = check_status(response)?;
        response.json::<Profile>().await.map_err(map_reqwest_error)
    }
}

#[async_trait]
impl ProfileBackendPort for HttpProfileBackend {
    async fn verify(&self, token: &BearerToken) -> Result<Profile, BackendError> {
        debug!(token_len = token.as_str().len(), "POST /auth/verify");
        let response = self
            .client
            .post(format!("{}/auth/verify", self.base_url))
            .json(&VerifyRequest {
                id_token: token.as_str(),
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        Self::read_profile(response).await
    }

    async fn patch(
        &self,
        id: &ProfileId,
        patch: &ProfilePatch,
        token: &BearerToken,
    ) -> Result<(), BackendError> {
        debug!(profile_id = %id, "PUT /users/{{id}}");
        let response = self
            .client
            .put(self.user_url(id))
            .bearer_auth(token.as_str())
            .json(patch)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        check_status(response)?;
        Ok(())
    }

    async fn fetch_by_id(
        &self,
        id: &ProfileId,
        token: &BearerToken,
    ) -> Result<Profile, BackendError> {
        debug!(profile_id = %id, "GET /users/{{id}}");
        let response = self
            .client
            .get(self.user_url(id))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        Self::read_profile(response).await
    }
}

fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(map_status_code(status))
    }
}

fn map_status_code(code: StatusCode) -> BackendError {
    match code {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized,
        StatusCode::NOT_FOUND => BackendError::NotFound,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => BackendError::Timeout,
        _ => BackendError::Status(code.as_u16()),
    }
}

fn map_reqwest_error(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::Timeout
    } else if let Some(status) = error.status() {
        map_status_code(status)
    } else if error.is_decode() {
        BackendError::Decode(error.to_string())
    } else {
        BackendError::Unreachable(error.to_string())
    }
}
