//! OAuth2 token lifecycle: code exchange, expiry detection, coalesced refresh

use futures::future::{BoxFuture, FutureExt, Shared};
use oauth2::AuthorizationCode;
use serde::Deserialize;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use super::store::CredentialStore;
use super::tokens::{now_secs, TokenSet, TokenStatus, SAFETY_MARGIN_SECS};
use super::AuthConfig;
use crate::error::{Error, Result};

/// Default upper bound on a token endpoint round trip.
pub const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type RefreshFlight = Shared<BoxFuture<'static, Result<TokenSet>>>;

/// Raw token endpoint response. Toodledo reports failures in-band as
/// `{error, errorDesc}`, sometimes with a 200 status.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    scope: Option<String>,
    error: Option<String>,
    #[serde(rename = "errorDesc")]
    error_desc: Option<String>,
}

impl TokenResponse {
    fn upstream_error(&self) -> Option<String> {
        let code = self.error.as_deref()?;
        Some(match self.error_desc.as_deref() {
            Some(desc) if !desc.is_empty() => format!("{}: {}", code, desc),
            _ => code.to_string(),
        })
    }
}

/// Owner of the live token set.
///
/// Cheap to clone; all clones share one token state, one store and one
/// in-flight refresh.
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<Inner>,
}

struct Inner {
    config: AuthConfig,
    http: reqwest::Client,
    store: CredentialStore,
    margin: u64,
    tokens: RwLock<Option<TokenSet>>,
    /// Held for the whole read-modify-write of any store update.
    write_lock: tokio::sync::Mutex<()>,
    inflight: Mutex<Option<RefreshFlight>>,
}

impl TokenManager {
    /// Load any persisted tokens and build the manager.
    pub fn new(config: AuthConfig, store: CredentialStore) -> Result<Self> {
        Self::with_timeout(config, store, TOKEN_REQUEST_TIMEOUT)
    }

    /// Like `new`, with a custom bound on token endpoint requests.
    pub fn with_timeout(
        config: AuthConfig,
        store: CredentialStore,
        timeout: Duration,
    ) -> Result<Self> {
        let tokens = store.load()?;
        match &tokens {
            Some(t) => tracing::debug!("Loaded {:?} from {}", t, store.path().display()),
            None => tracing::debug!("No tokens at {}", store.path().display()),
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                http,
                store,
                margin: SAFETY_MARGIN_SECS,
                tokens: RwLock::new(tokens),
                write_lock: tokio::sync::Mutex::new(()),
                inflight: Mutex::new(None),
            }),
        })
    }

    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }

    /// True iff an access token is present. Says nothing about expiry.
    pub fn has_valid_credentials(&self) -> bool {
        self.inner
            .snapshot()
            .is_some_and(|t| !t.access_token.is_empty())
    }

    pub fn status(&self) -> Option<TokenStatus> {
        let now = now_secs();
        self.inner.snapshot().map(|t| TokenStatus {
            expires_at: t.expires_at,
            remaining_secs: t.remaining_secs(now),
            refresh_due: t.expires_within(now, self.inner.margin),
        })
    }

    /// User-facing consent URL. Pure: no network, no state change.
    pub fn authorization_url(&self) -> String {
        let config = &self.inner.config;
        let scope = config
            .scopes
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let mut url = config.auth_url.url().clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", config.client_id.as_str())
            .append_pair("scope", &scope)
            .append_pair("redirect_uri", &config.redirect_uri);
        url.to_string()
    }

    /// Return an access token valid for at least the safety margin,
    /// refreshing first when the stored one is about to expire.
    pub async fn access_token(&self) -> Result<String> {
        if let Some(tokens) = self.inner.snapshot() {
            if !tokens.expires_within(now_secs(), self.inner.margin) {
                return Ok(tokens.access_token);
            }
            tracing::debug!("Access token expires within {}s", self.inner.margin);
        }

        let tokens = self.coalesced_refresh(false).await?;
        if tokens.expires_within(now_secs(), self.inner.margin) {
            tracing::warn!(
                "Refreshed token lives {}s, below the {}s safety margin",
                tokens.remaining_secs(now_secs()),
                self.inner.margin
            );
            return Err(Error::RefreshFailed(
                "issued access token expires within the safety margin".to_string(),
            ));
        }
        Ok(tokens.access_token)
    }

    /// Trade the stored refresh token for a new token set, joining any
    /// refresh already in flight.
    pub async fn refresh(&self) -> Result<()> {
        self.coalesced_refresh(true).await.map(|_| ())
    }

    /// One-time bootstrap: trade an authorization code for the first token set.
    /// On failure the stored state is left untouched.
    pub async fn exchange_authorization_code(&self, code: &AuthorizationCode) -> Result<()> {
        let inner = &self.inner;
        let _guard = inner.write_lock.lock().await;

        tracing::info!("Exchanging authorization code for tokens...");
        let response = inner
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("code", code.secret().as_str()),
            ])
            .await
            .map_err(Error::AuthorizationFailed)?;

        tracing::info!(
            "Token granted with scope: {}",
            response.scope.as_deref().unwrap_or("unknown")
        );

        let access_token = required(response.access_token, "access_token")
            .map_err(Error::AuthorizationFailed)?;
        let refresh_token = required(response.refresh_token, "refresh_token")
            .map_err(Error::AuthorizationFailed)?;
        let expires_in =
            required(response.expires_in, "expires_in").map_err(Error::AuthorizationFailed)?;

        inner.commit(TokenSet::issue(access_token, refresh_token, expires_in))
    }

    /// Join the in-flight refresh or start one. `force` skips the re-check
    /// that lets a late caller reuse a token minted while it was queued.
    async fn coalesced_refresh(&self, force: bool) -> Result<TokenSet> {
        let flight = {
            let mut slot = self
                .inner
                .inflight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(flight) => {
                    tracing::debug!("Joining in-flight token refresh");
                    flight.clone()
                }
                None => {
                    if !force {
                        if let Some(tokens) = self.inner.snapshot() {
                            if !tokens.expires_within(now_secs(), self.inner.margin) {
                                return Ok(tokens);
                            }
                        }
                    }
                    let flight = self.spawn_refresh(force);
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    /// Run the refresh on its own task so it completes and persists even if
    /// every caller waiting on it is cancelled. Must be called with the
    /// `inflight` slot locked.
    fn spawn_refresh(&self, force: bool) -> RefreshFlight {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let result = inner.refresh_exchange(force).await;
            inner
                .inflight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            result
        });

        async move {
            task.await.unwrap_or_else(|e| {
                Err(Error::RefreshFailed(format!("refresh task aborted: {}", e)))
            })
        }
        .boxed()
        .shared()
    }
}

impl Inner {
    fn snapshot(&self) -> Option<TokenSet> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publish a new token set to memory, then to disk.
    fn commit(&self, tokens: TokenSet) -> Result<()> {
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = Some(tokens.clone());
        self.store.save(&tokens)
    }

    /// Unless `force`d, a token set committed by another writer while this
    /// one waited for the lock is returned as is.
    async fn refresh_exchange(&self, force: bool) -> Result<TokenSet> {
        let _guard = self.write_lock.lock().await;

        let current = self.snapshot().ok_or_else(|| {
            Error::NotAuthorized("no stored credentials; authorize the app first".to_string())
        })?;
        if !force && !current.expires_within(now_secs(), self.margin) {
            tracing::debug!("Token was renewed while waiting; skipping refresh");
            return Ok(current);
        }
        if current.refresh_token.is_empty() {
            return Err(Error::NotAuthorized(
                "no refresh token available; re-authorize the app".to_string(),
            ));
        }

        tracing::info!("Refreshing access token...");
        let response = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", current.refresh_token.as_str()),
            ])
            .await
            .map_err(|e| {
                tracing::warn!("Token refresh rejected: {}", e);
                Error::RefreshFailed(e)
            })?;

        let access_token =
            required(response.access_token, "access_token").map_err(Error::RefreshFailed)?;
        let expires_in =
            required(response.expires_in, "expires_in").map_err(Error::RefreshFailed)?;
        // Toodledo may omit a new refresh token; the old one stays valid then.
        let refresh_token = response
            .refresh_token
            .filter(|rt| !rt.is_empty())
            .unwrap_or(current.refresh_token);

        let tokens = TokenSet::issue(access_token, refresh_token, expires_in);
        self.commit(tokens.clone())?;
        tracing::info!("Token refresh complete");
        Ok(tokens)
    }

    /// POST a grant to the token endpoint. Errors are plain messages; the
    /// caller decides which kind they become.
    async fn token_request(
        &self,
        form: &[(&str, &str)],
    ) -> std::result::Result<TokenResponse, String> {
        let url = self.config.token_url.url().as_str();
        let resp = self
            .http
            .post(url)
            .basic_auth(
                self.config.client_id.as_str(),
                Some(self.config.client_secret.secret()),
            )
            .form(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    format!("token endpoint timed out: {}", e)
                } else {
                    format!("token endpoint request failed: {}", e)
                }
            })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| format!("failed to read token response: {}", e))?;
        let parsed: Option<TokenResponse> = serde_json::from_str(&body).ok();

        if let Some(message) = parsed.as_ref().and_then(TokenResponse::upstream_error) {
            return Err(message);
        }
        if !status.is_success() {
            return Err(format!("HTTP {}: {}", status.as_u16(), body));
        }
        parsed.ok_or_else(|| "token endpoint returned a malformed body".to_string())
    }
}

fn required<T>(value: Option<T>, field: &str) -> std::result::Result<T, String> {
    value.ok_or_else(|| format!("token response missing '{}'", field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use mockito::{Matcher, Server};
    use std::io::Write;
    use std::path::Path;
    use tokio_test::{assert_err, assert_ok};

    const BASIC_AUTH: &str = "Basic dGVzdC1jbGllbnQ6dGVzdC1zZWNyZXQ=";

    fn settings(base_url: &str, dir: &Path) -> Settings {
        Settings {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            api_base_url: base_url.to_string(),
            token_storage_path: dir.join("tokens.json"),
            ..Settings::default()
        }
    }

    fn manager(base_url: &str, dir: &Path, seed: Option<TokenSet>) -> TokenManager {
        let settings = settings(base_url, dir);
        let store = CredentialStore::new(&settings.token_storage_path);
        if let Some(tokens) = seed {
            store.save(&tokens).unwrap();
        }
        TokenManager::new(AuthConfig::from_settings(&settings).unwrap(), store).unwrap()
    }

    fn tokens(access: &str, expires_at: u64) -> TokenSet {
        TokenSet {
            access_token: access.to_string(),
            refresh_token: "refresh-old".to_string(),
            expires_at,
        }
    }

    fn grant(access: &str, refresh: Option<&str>, expires_in: u64) -> String {
        let mut body = serde_json::json!({
            "access_token": access,
            "expires_in": expires_in,
            "token_type": "Bearer",
            "scope": "basic tasks write",
        });
        if let Some(rt) = refresh {
            body["refresh_token"] = serde_json::json!(rt);
        }
        body.to_string()
    }

    #[tokio::test]
    async fn test_absent_store_is_not_authorized() {
        let server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(&server.url(), dir.path(), None);

        assert!(!mgr.has_valid_credentials());
        assert!(mgr.status().is_none());
        let err = mgr.access_token().await.unwrap_err();
        assert!(matches!(err, Error::NotAuthorized(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_fresh_token_skips_refresh() {
        let mut server = Server::new_async().await;
        let refresh = server
            .mock("POST", "/account/token.php")
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(
            &server.url(),
            dir.path(),
            Some(tokens("access-live", now_secs() + 3600)),
        );

        assert!(mgr.has_valid_credentials());
        assert_eq!(mgr.access_token().await.unwrap(), "access-live");
        assert_eq!(mgr.access_token().await.unwrap(), "access-live");
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_token_refreshes_once() {
        let mut server = Server::new_async().await;
        let refresh = server
            .mock("POST", "/account/token.php")
            .match_header("authorization", BASIC_AUTH)
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "refresh-old".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(grant("access-new", Some("refresh-new"), 7200))
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(
            &server.url(),
            dir.path(),
            Some(tokens("access-stale", now_secs() - 1)),
        );

        assert_eq!(mgr.access_token().await.unwrap(), "access-new");
        assert_eq!(mgr.access_token().await.unwrap(), "access-new");
        refresh.assert_async().await;

        let persisted = mgr.store().load().unwrap().unwrap();
        assert_eq!(persisted.access_token, "access-new");
        assert_eq!(persisted.refresh_token, "refresh-new");
    }

    #[tokio::test]
    async fn test_refresh_keeps_old_refresh_token_when_omitted() {
        let mut server = Server::new_async().await;
        let _refresh = server
            .mock("POST", "/account/token.php")
            .with_status(200)
            .with_body(grant("access-new", None, 7200))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(&server.url(), dir.path(), Some(tokens("a", 0)));

        mgr.refresh().await.unwrap();
        let persisted = mgr.store().load().unwrap().unwrap();
        assert_eq!(persisted.access_token, "access-new");
        assert_eq!(persisted.refresh_token, "refresh-old");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_refresh() {
        let mut server = Server::new_async().await;
        let refresh = server
            .mock("POST", "/account/token.php")
            .with_status(200)
            .with_body(grant("access-shared", Some("refresh-new"), 7200))
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(
            &server.url(),
            dir.path(),
            Some(tokens("access-stale", now_secs() - 1)),
        );

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let mgr = mgr.clone();
                tokio::spawn(async move { mgr.access_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "access-shared");
        }
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_failure() {
        let mut server = Server::new_async().await;
        let refresh = server
            .mock("POST", "/account/token.php")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant","errorDesc":"Refresh token expired"}"#)
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(&server.url(), dir.path(), Some(tokens("a", now_secs() - 1)));

        let (a, b) = tokio::join!(mgr.access_token(), mgr.access_token());
        for result in [a, b] {
            let err = result.unwrap_err();
            assert!(matches!(err, Error::RefreshFailed(_)), "got {err:?}");
        }
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_rejected_leaves_store_untouched() {
        let mut server = Server::new_async().await;
        let _refresh = server
            .mock("POST", "/account/token.php")
            .with_status(200)
            .with_body(r#"{"error":"invalid_grant","errorDesc":"Refresh token expired"}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let seed = tokens("access-stale", now_secs() - 10);
        let mgr = manager(&server.url(), dir.path(), Some(seed.clone()));

        let err = mgr.access_token().await.unwrap_err();
        match err {
            Error::RefreshFailed(message) => assert!(message.contains("Refresh token expired")),
            other => panic!("expected RefreshFailed, got {other:?}"),
        }
        assert_eq!(mgr.store().load().unwrap(), Some(seed));
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token() {
        let server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let seed = TokenSet {
            access_token: "a".to_string(),
            refresh_token: String::new(),
            expires_at: 0,
        };
        let mgr = manager(&server.url(), dir.path(), Some(seed));

        let err = mgr.refresh().await.unwrap_err();
        assert!(matches!(err, Error::NotAuthorized(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_short_lived_grant_is_rejected() {
        let mut server = Server::new_async().await;
        let _refresh = server
            .mock("POST", "/account/token.php")
            .with_status(200)
            .with_body(grant("access-brief", None, 60))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(&server.url(), dir.path(), Some(tokens("a", 0)));

        let err = mgr.access_token().await.unwrap_err();
        assert!(matches!(err, Error::RefreshFailed(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_returned_token_outlives_margin() {
        let mut server = Server::new_async().await;
        let _refresh = server
            .mock("POST", "/account/token.php")
            .with_status(200)
            .with_body(grant("access-new", None, 7200))
            .create_async()
            .await;

        let now = now_secs();
        for expires_at in [0, now - 1, now + 100, now + 300, now + 301, now + 10_000] {
            let dir = tempfile::tempdir().unwrap();
            let mgr = manager(&server.url(), dir.path(), Some(tokens("a", expires_at)));

            mgr.access_token().await.unwrap();
            let status = mgr.status().unwrap();
            assert!(
                status.remaining_secs >= SAFETY_MARGIN_SECS as i64,
                "expires_at={expires_at} left {}s",
                status.remaining_secs
            );
        }
    }

    #[tokio::test]
    async fn test_cancelled_caller_does_not_lose_refresh() {
        let mut server = Server::new_async().await;
        let refresh = server
            .mock("POST", "/account/token.php")
            .with_status(200)
            .with_body(grant("access-new", Some("refresh-new"), 7200))
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(&server.url(), dir.path(), Some(tokens("a", 0)));

        {
            let mut call = Box::pin(mgr.access_token());
            // Single-threaded runtime: the spawned refresh cannot have run yet.
            assert!(futures::poll!(&mut call).is_pending());
        }

        let mut persisted = None;
        for _ in 0..200 {
            persisted = mgr.store().load().unwrap().filter(|t| t.access_token == "access-new");
            if persisted.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(persisted.is_some(), "refresh was not persisted");
        assert_eq!(mgr.access_token().await.unwrap(), "access-new");
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_exchange_bad_code() {
        let mut server = Server::new_async().await;
        let _exchange = server
            .mock("POST", "/account/token.php")
            .match_body(Matcher::UrlEncoded(
                "grant_type".into(),
                "authorization_code".into(),
            ))
            .with_status(200)
            .with_body(r#"{"error":"invalid_code","errorDesc":"Authorization code is invalid"}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(&server.url(), dir.path(), None);

        let err = mgr
            .exchange_authorization_code(&AuthorizationCode::new("bad-code".to_string()))
            .await
            .unwrap_err();
        match err {
            Error::AuthorizationFailed(message) => assert!(message.contains("invalid_code")),
            other => panic!("expected AuthorizationFailed, got {other:?}"),
        }
        assert!(!mgr.has_valid_credentials());
        assert_eq!(mgr.store().load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_exchange_http_error() {
        let mut server = Server::new_async().await;
        let _exchange = server
            .mock("POST", "/account/token.php")
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(&server.url(), dir.path(), None);

        let err = mgr
            .exchange_authorization_code(&AuthorizationCode::new("code".to_string()))
            .await
            .unwrap_err();
        match err {
            Error::AuthorizationFailed(message) => assert!(message.contains("HTTP 500")),
            other => panic!("expected AuthorizationFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exchange_persists_tokens() {
        let mut server = Server::new_async().await;
        let exchange = server
            .mock("POST", "/account/token.php")
            .match_header("authorization", BASIC_AUTH)
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                Matcher::UrlEncoded("code".into(), "good-code".into()),
            ]))
            .with_status(200)
            .with_body(grant("access-1", Some("refresh-1"), 7200))
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(&server.url(), dir.path(), None);

        mgr.exchange_authorization_code(&AuthorizationCode::new("good-code".to_string()))
            .await
            .unwrap();
        exchange.assert_async().await;

        assert!(mgr.has_valid_credentials());
        assert_eq!(mgr.access_token().await.unwrap(), "access-1");
        let persisted = mgr.store().load().unwrap().unwrap();
        assert_eq!(persisted.refresh_token, "refresh-1");
        let remaining = persisted.remaining_secs(now_secs());
        assert!((7190..=7200).contains(&remaining), "remaining={remaining}");
    }

    #[tokio::test]
    async fn test_refresh_waiting_on_exchange_reuses_new_tokens() {
        let mut server = Server::new_async().await;
        let exchange = server
            .mock("POST", "/account/token.php")
            .match_body(Matcher::UrlEncoded(
                "grant_type".into(),
                "authorization_code".into(),
            ))
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(std::time::Duration::from_millis(500));
                w.write_all(grant("access-1", Some("refresh-1"), 7200).as_bytes())
            })
            .expect(1)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/account/token.php")
            .match_body(Matcher::UrlEncoded(
                "grant_type".into(),
                "refresh_token".into(),
            ))
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(&server.url(), dir.path(), None);

        let authorizing = {
            let mgr = mgr.clone();
            tokio::spawn(async move {
                mgr.exchange_authorization_code(&AuthorizationCode::new("code".to_string()))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Queues behind the exchange's write lock with no tokens in memory yet.
        let token = assert_ok!(mgr.access_token().await);
        assert_eq!(token, "access-1");
        assert_ok!(authorizing.await.unwrap());

        exchange.assert_async().await;
        refresh.assert_async().await;
        assert_eq!(mgr.store().load().unwrap().unwrap().refresh_token, "refresh-1");
    }

    #[tokio::test]
    async fn test_token_endpoint_timeout() {
        let mut server = Server::new_async().await;
        let _stalled = server
            .mock("POST", "/account/token.php")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(std::time::Duration::from_secs(2));
                w.write_all(b"{}")
            })
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&server.url(), dir.path());
        let store = CredentialStore::new(&settings.token_storage_path);
        store.save(&tokens("access-stale", 0)).unwrap();
        let mgr = TokenManager::with_timeout(
            AuthConfig::from_settings(&settings).unwrap(),
            store,
            Duration::from_millis(200),
        )
        .unwrap();

        let started = std::time::Instant::now();
        let err = assert_err!(mgr.access_token().await);
        assert!(matches!(err, Error::RefreshFailed(_)), "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(2));

        let err = assert_err!(
            mgr.exchange_authorization_code(&AuthorizationCode::new("code".to_string()))
                .await
        );
        assert!(matches!(err, Error::AuthorizationFailed(_)), "got {err:?}");
        assert_eq!(mgr.store().load().unwrap().unwrap().access_token, "access-stale");
    }

    #[test]
    fn test_authorization_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings("https://api.toodledo.com/3", dir.path());
        settings.scopes = "basic tasks".to_string();
        let store = CredentialStore::new(&settings.token_storage_path);
        let mgr = TokenManager::new(AuthConfig::from_settings(&settings).unwrap(), store).unwrap();

        let url = mgr.authorization_url();
        assert_eq!(
            url,
            "https://api.toodledo.com/3/account/authorize.php?response_type=code\
             &client_id=test-client&scope=basic+tasks\
             &redirect_uri=http%3A%2F%2Flocalhost%3A8000%2Fcallback"
        );
        assert_eq!(mgr.authorization_url(), url);
        assert!(!mgr.store().path().exists());
    }
}
