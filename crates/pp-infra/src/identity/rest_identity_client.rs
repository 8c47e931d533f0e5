//! Identity provider REST client
//!
//! Talks to an identity-toolkit style API:
//!
//! - `{auth}/accounts:signInWithPassword`, `accounts:signUp`, `accounts:update`,
//!   `accounts:signInWithIdp`
//! - `{token}/token` refresh-token grant, used to mint a fresh ID token per call
//!
//! The provider session (uid, email, display name, refresh token) is owned by
//! this client and persisted under [`IDENTITY_SESSION_KEY`]. Identity changes
//! are published on a `watch` channel; until [`RestIdentityClient::restore`]
//! runs the channel reports [`IdentitySnapshot::Unknown`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use pp_core::ports::{IdentityClientPort, KeyValueStorePort, ProviderAuthFlowPort};
use pp_core::{
    AuthErrorKind, BearerToken, Identity, IdentityError, IdentitySnapshot, ProviderSignIn,
};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::error_codes::map_provider_error;

pub const IDENTITY_SESSION_KEY: &str = "identitySession";
pub const DEFAULT_AUTH_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_TOKEN_BASE_URL: &str = "https://securetoken.googleapis.com/v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    uid: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    refresh_token: String,
}

impl StoredSession {
    fn identity(&self) -> Identity {
        Identity {
            id: self.uid.as_str().into(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    is_new_user: bool,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct RestIdentityClient {
    http: reqwest::Client,
    api_key: String,
    auth_base_url: String,
    token_base_url: String,
    kv: Arc<dyn KeyValueStorePort>,
    provider_flow: Arc<dyn ProviderAuthFlowPort>,
    session: Mutex<Option<StoredSession>>,
    snapshot_tx: watch::Sender<IdentitySnapshot>,
}

impl RestIdentityClient {
    pub fn new(
        api_key: impl Into<String>,
        timeout: Duration,
        kv: Arc<dyn KeyValueStorePort>,
        provider_flow: Arc<dyn ProviderAuthFlowPort>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build identity HTTP client failed")?;

        let (snapshot_tx, _) = watch::channel(IdentitySnapshot::Unknown);

        Ok(Self {
            http,
            api_key: api_key.into(),
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            token_base_url: DEFAULT_TOKEN_BASE_URL.to_string(),
            kv,
            provider_flow,
            session: Mutex::new(None),
            snapshot_tx,
        })
    }

    /// Override the provider endpoints. Empty values keep the defaults.
    pub fn with_endpoints(mut self, auth_base_url: &str, token_base_url: &str) -> Self {
        if !auth_base_url.is_empty() {
            self.auth_base_url = auth_base_url.trim_end_matches('/').to_string();
        }
        if !token_base_url.is_empty() {
            self.token_base_url = token_base_url.trim_end_matches('/').to_string();
        }
        self
    }

    /// Load the persisted provider session and publish the resulting snapshot.
    ///
    /// Never fails: an unreadable or corrupt session is treated as signed out.
    pub async fn restore(&self) -> IdentitySnapshot {
        let stored = match self.kv.get(IDENTITY_SESSION_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<StoredSession>(&raw) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!(error = %e, "Discarding corrupt identity session");
                    if let Err(e) = self.kv.remove(IDENTITY_SESSION_KEY).await {
                        warn!(error = %e, "Failed to remove corrupt identity session");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read identity session, treating as signed out");
                None
            }
        };

        let snapshot = match &stored {
            Some(session) => IdentitySnapshot::SignedIn(session.identity()),
            None => IdentitySnapshot::SignedOut,
        };
        info!(signed_in = stored.is_some(), "Identity session restored");

        *self.session.lock().await = stored;
        self.snapshot_tx.send_replace(snapshot.clone());
        snapshot
    }

    async fn persist(&self, session: Option<&StoredSession>) {
        let result = match session {
            Some(session) => match serde_json::to_string(session) {
                Ok(raw) => self.kv.set(IDENTITY_SESSION_KEY, &raw).await,
                Err(e) => {
                    warn!(error = %e, "Failed to serialize identity session");
                    return;
                }
            },
            None => self.kv.remove(IDENTITY_SESSION_KEY).await,
        };

        if let Err(e) = result {
            warn!(error = %e, "Failed to persist identity session");
        }
    }

    async fn post_account<B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<AccountResponse, IdentityError> {
        debug!(method, "identity accounts request");
        let response = self
            .http
            .post(format!("{}/accounts:{}", self.auth_base_url, method))
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| IdentityError::network(e.to_string()))?;

        read_json(response).await
    }

    /// Adopt an account response as the current provider session.
    async fn establish(&self, account: AccountResponse) -> Result<Identity, IdentityError> {
        let refresh_token = account
            .refresh_token
            .ok_or_else(|| IdentityError::unknown("provider response carried no refresh token"))?;

        let session = StoredSession {
            uid: account.local_id,
            email: account.email,
            display_name: account.display_name.filter(|name| !name.is_empty()),
            refresh_token,
        };
        let identity = session.identity();

        self.persist(Some(&session)).await;
        *self.session.lock().await = Some(session);
        self.snapshot_tx
            .send_replace(IdentitySnapshot::SignedIn(identity.clone()));

        Ok(identity)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, IdentityError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => map_provider_error(&envelope.error.message),
            Err(_) if status.is_server_error() => {
                IdentityError::network(format!("identity provider returned {status}"))
            }
            Err(_) => IdentityError::unknown(format!("identity provider returned {status}")),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| IdentityError::unknown(format!("malformed identity response: {e}")))
}

#[async_trait]
impl IdentityClientPort for RestIdentityClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let account = self
            .post_account(
                "signInWithPassword",
                &json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        self.establish(account).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let account = self
            .post_account(
                "signUp",
                &json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        self.establish(account).await
    }

    async fn update_display_name(
        &self,
        identity: &Identity,
        display_name: &str,
    ) -> Result<(), IdentityError> {
        let token = self.mint_token(identity).await?;
        self.post_account(
            "update",
            &json!({
                "idToken": token.as_str(),
                "displayName": display_name,
                "returnSecureToken": false
            }),
        )
        .await?;

        let mut session = self.session.lock().await;
        if let Some(current) = session.as_mut().filter(|s| s.uid == identity.id.as_str()) {
            current.display_name = Some(display_name.to_string());
            let updated = current.clone();
            self.persist(Some(&updated)).await;
            self.snapshot_tx
                .send_replace(IdentitySnapshot::SignedIn(updated.identity()));
        }
        Ok(())
    }

    async fn sign_in_with_provider(&self) -> Result<Option<ProviderSignIn>, IdentityError> {
        let Some(credential) = self.provider_flow.authorize().await? else {
            return Ok(None);
        };

        let account = self
            .post_account(
                "signInWithIdp",
                &json!({
                    "postBody": format!(
                        "id_token={}&providerId={}",
                        credential.id_token, credential.provider_id
                    ),
                    "requestUri": "http://localhost",
                    "returnSecureToken": true,
                    "returnIdpCredential": true
                }),
            )
            .await?;
        let is_new_user = account.is_new_user;
        let identity = self.establish(account).await?;

        Ok(Some(ProviderSignIn {
            identity,
            is_new_user,
        }))
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let previous = self.session.lock().await.take();
        if previous.is_some() {
            self.persist(None).await;
        }
        self.snapshot_tx.send_replace(IdentitySnapshot::SignedOut);
        Ok(())
    }

    async fn mint_token(&self, identity: &Identity) -> Result<BearerToken, IdentityError> {
        let mut session = self.session.lock().await;
        let current = session
            .as_mut()
            .filter(|s| s.uid == identity.id.as_str())
            .ok_or_else(|| {
                IdentityError::new(
                    AuthErrorKind::InvalidCredential,
                    "no provider session for this identity",
                )
            })?;

        let response = self
            .http
            .post(format!("{}/token", self.token_base_url))
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", current.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| IdentityError::network(e.to_string()))?;
        let minted: TokenResponse = read_json(response).await?;

        if let Some(rotated) = minted.refresh_token.filter(|t| *t != current.refresh_token) {
            current.refresh_token = rotated;
            let updated = current.clone();
            self.persist(Some(&updated)).await;
        }

        Ok(BearerToken::new(minted.id_token))
    }

    fn subscribe(&self) -> watch::Receiver<IdentitySnapshot> {
        self.snapshot_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::provider_flow::StaticProviderAuthFlow;
    use crate::kv::FileKeyValueStore;
    use mockito::{Matcher, Server, ServerGuard};
    use pp_core::ProviderCredential;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        kv: Arc<FileKeyValueStore>,
        client: RestIdentityClient,
    }

    fn fixture(server: &ServerGuard, credential: Option<ProviderCredential>) -> Fixture {
        let dir = TempDir::new().unwrap();
        let kv = Arc::new(FileKeyValueStore::with_defaults(dir.path().to_path_buf()));
        let client = RestIdentityClient::new(
            "test-key",
            Duration::from_secs(5),
            kv.clone(),
            Arc::new(StaticProviderAuthFlow::new(credential)),
        )
        .unwrap()
        .with_endpoints(&server.url(), &server.url());
        Fixture {
            _dir: dir,
            kv,
            client,
        }
    }

    fn account_body(is_new_user: bool) -> String {
        json!({
            "localId": "uid-1",
            "email": "sam@example.com",
            "displayName": "Sam Lee",
            "idToken": "id-token",
            "refreshToken": "refresh-1",
            "isNewUser": is_new_user
        })
        .to_string()
    }

    #[tokio::test]
    async fn sign_in_persists_session_and_publishes_identity() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Regex("accounts:signInWithPassword".into()))
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::PartialJson(
                json!({ "email": "sam@example.com", "password": "pw" }),
            ))
            .with_status(200)
            .with_body(account_body(false))
            .create_async()
            .await;
        let fx = fixture(&server, None);
        let rx = fx.client.subscribe();

        let identity = fx.client.sign_in("sam@example.com", "pw").await.unwrap();

        mock.assert_async().await;
        assert_eq!(identity.id.as_str(), "uid-1");
        assert_eq!(identity.display_name.as_deref(), Some("Sam Lee"));
        assert_eq!(*rx.borrow(), IdentitySnapshot::SignedIn(identity));
        assert!(fx.kv.get(IDENTITY_SESSION_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn sign_in_maps_provider_error_codes() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", Matcher::Regex("accounts:signInWithPassword".into()))
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"EMAIL_NOT_FOUND"}}"#)
            .create_async()
            .await;
        let fx = fixture(&server, None);

        let err = fx.client.sign_in("x@example.com", "pw").await.unwrap_err();

        assert_eq!(err.kind, AuthErrorKind::UserNotFound);
        assert_eq!(*fx.client.subscribe().borrow(), IdentitySnapshot::Unknown);
    }

    #[tokio::test]
    async fn mint_token_exchanges_refresh_token_every_call() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", Matcher::Regex("accounts:signUp".into()))
            .with_status(200)
            .with_body(account_body(true))
            .create_async()
            .await;
        let token_mock = server
            .mock("POST", Matcher::Regex("^/token".into()))
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "refresh-1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"id_token":"fresh","refresh_token":"refresh-1"}"#)
            .expect(2)
            .create_async()
            .await;
        let fx = fixture(&server, None);
        let identity = fx.client.sign_up("sam@example.com", "pw").await.unwrap();

        let first = fx.client.mint_token(&identity).await.unwrap();
        let second = fx.client.mint_token(&identity).await.unwrap();

        token_mock.assert_async().await;
        assert_eq!(first.as_str(), "fresh");
        assert_eq!(second.as_str(), "fresh");
    }

    #[tokio::test]
    async fn mint_token_distinguishes_outage_from_revocation() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", Matcher::Regex("accounts:signUp".into()))
            .with_status(200)
            .with_body(account_body(true))
            .create_async()
            .await;
        let outage = server
            .mock("POST", Matcher::Regex("^/token".into()))
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;
        let fx = fixture(&server, None);
        let identity = fx.client.sign_up("sam@example.com", "pw").await.unwrap();

        let err = fx.client.mint_token(&identity).await.unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::NetworkUnavailable);
        outage.remove_async().await;

        server
            .mock("POST", Matcher::Regex("^/token".into()))
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"TOKEN_EXPIRED"}}"#)
            .create_async()
            .await;

        let err = fx.client.mint_token(&identity).await.unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::InvalidCredential);
    }

    #[tokio::test]
    async fn mint_token_for_foreign_identity_fails() {
        let server = Server::new_async().await;
        let fx = fixture(&server, None);

        let err = fx
            .client
            .mint_token(&Identity::new("someone-else"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, AuthErrorKind::InvalidCredential);
    }

    #[tokio::test]
    async fn restore_publishes_persisted_session() {
        let server = Server::new_async().await;
        let fx = fixture(&server, None);
        fx.kv
            .set(
                IDENTITY_SESSION_KEY,
                r#"{"uid":"uid-9","email":"a@b.c","refreshToken":"r"}"#,
            )
            .await
            .unwrap();

        let snapshot = fx.client.restore().await;

        assert_eq!(
            snapshot.identity().map(|i| i.id.as_str().to_string()),
            Some("uid-9".to_string())
        );
        assert_eq!(*fx.client.subscribe().borrow(), snapshot);
    }

    #[tokio::test]
    async fn restore_without_session_is_signed_out_and_sign_out_clears() {
        let server = Server::new_async().await;
        let fx = fixture(&server, None);
        fx.kv.set(IDENTITY_SESSION_KEY, "garbage").await.unwrap();

        assert_eq!(fx.client.restore().await, IdentitySnapshot::SignedOut);
        assert_eq!(fx.kv.get(IDENTITY_SESSION_KEY).await.unwrap(), None);

        fx.client.sign_out().await.unwrap();
        assert_eq!(*fx.client.subscribe().borrow(), IdentitySnapshot::SignedOut);
    }

    #[tokio::test]
    async fn provider_sign_in_cancelled_yields_none() {
        let server = Server::new_async().await;
        let fx = fixture(&server, None);

        assert_eq!(fx.client.sign_in_with_provider().await.unwrap(), None);
    }

    #[tokio::test]
    async fn provider_sign_in_reports_new_user() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Regex("accounts:signInWithIdp".into()))
            .match_body(Matcher::PartialJson(json!({
                "postBody": "id_token=google-jwt&providerId=google.com"
            })))
            .with_status(200)
            .with_body(account_body(true))
            .create_async()
            .await;
        let fx = fixture(
            &server,
            Some(ProviderCredential {
                provider_id: "google.com".into(),
                id_token: "google-jwt".into(),
            }),
        );

        let outcome = fx.client.sign_in_with_provider().await.unwrap().unwrap();

        mock.assert_async().await;
        assert!(outcome.is_new_user);
        assert_eq!(outcome.identity.id.as_str(), "uid-1");
    }
}
