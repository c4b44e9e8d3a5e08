//! Authenticated HTTP client for the Toodledo API
//!
//! Wraps reqwest::Client; every request asks the token manager for a
//! current access token first.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::auth::TokenManager;
use crate::error::{Error, Result};
use crate::models::ListHeader;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct ToodledoClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenManager,
}

impl ToodledoClient {
    pub fn new(base_url: &str, tokens: TokenManager) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// GET with `access_token` as a query parameter (Toodledo convention).
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", path);

        let resp = self
            .http
            .get(&url)
            .query(params)
            .query(&[("access_token", token.as_str())])
            .send()
            .await?;

        decode(resp, path).await
    }

    /// POST a JSON body, token again in the query string.
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", path);

        let resp = self
            .http
            .post(&url)
            .query(&[("access_token", token.as_str())])
            .json(body)
            .send()
            .await?;

        decode(resp, path).await
    }

    /// GET a list endpoint, dropping the metadata record if one leads the
    /// array.
    pub(crate) async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<(Option<ListHeader>, Vec<T>)> {
        let raw: Vec<Value> = self.get(path, params).await?;
        let (header, items) = split_list_header(raw);
        let items = items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<T>, _>>()
            .map_err(|e| Error::api(None, format!("unexpected item in {}: {}", path, e)))?;
        Ok((header, items))
    }
}

/// Check status, surface in-band Toodledo errors, then deserialize.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response, path: &str) -> Result<T> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(Error::api(
            Some(status.as_u16()),
            format!("HTTP {} for {}: {}", status.as_u16(), path, body),
        ));
    }

    let value: Value = serde_json::from_str(&body).map_err(|e| {
        Error::api(
            Some(status.as_u16()),
            format!("malformed response from {}: {}", path, e),
        )
    })?;

    // Toodledo reports failures as 200 + {"errorCode": n, "errorDesc": "..."}
    if let Some(code) = value.get("errorCode") {
        let desc = value
            .get("errorDesc")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(Error::api(
            Some(status.as_u16()),
            format!("Toodledo error {} for {}: {}", code, path, desc),
        ));
    }

    serde_json::from_value(value).map_err(|e| {
        Error::api(
            Some(status.as_u16()),
            format!("unexpected response shape from {}: {}", path, e),
        )
    })
}

/// Task lists lead with `{"num": n, "total": m}`. The first element counts as
/// that header only if it is an object carrying `num` and no `id`; any real
/// item always has an `id`.
pub fn split_list_header(mut items: Vec<Value>) -> (Option<ListHeader>, Vec<Value>) {
    let is_header = items
        .first()
        .and_then(Value::as_object)
        .is_some_and(|first| first.contains_key("num") && !first.contains_key("id"));
    if !is_header {
        return (None, items);
    }

    let header = serde_json::from_value(items.remove(0)).ok();
    (header, items)
}
