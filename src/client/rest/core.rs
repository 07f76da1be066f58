use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::error::{BuildkiteError, Result};

pub const REST_BASE_URL: &str = "https://api.buildkite.com/";

/// Minimal client for the Buildkite REST API.
///
/// Only covers what GraphQL cannot do yet: provider settings and deletion.
pub struct RestClient {
    client: Client,
    base_url: Url,
    user_agent: &'static str,
    organization: String,
}

/// A successful REST response with its body converted by [`FromBody`].
#[derive(Debug)]
pub struct RestResponse<T> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: T,
}

/// Conversion of a successful response body into the caller's container.
pub trait FromBody: Sized {
    fn from_body(body: &[u8]) -> Result<Self>;
}

/// Discards the body.
impl FromBody for () {
    fn from_body(_body: &[u8]) -> Result<Self> {
        Ok(())
    }
}

/// JSON-decodes the body into `T`.
#[derive(Debug)]
pub struct Json<T>(pub T);

impl<T: DeserializeOwned> FromBody for Json<T> {
    fn from_body(body: &[u8]) -> Result<Self> {
        Ok(Json(serde_json::from_slice(body)?))
    }
}

/// Keeps the body verbatim, for endpoints that do not answer with JSON.
#[derive(Debug)]
pub struct Raw(pub Vec<u8>);

impl FromBody for Raw {
    fn from_body(body: &[u8]) -> Result<Self> {
        Ok(Raw(body.to_vec()))
    }
}

/// A non-2xx answer from the REST API.
///
/// Built even when the body is not the usual `{"message": ...}` document, in
/// which case `message` is empty and `raw_body` holds whatever was sent.
#[derive(Debug, Error)]
#[error("{method} {url}: {} {message}", .status.as_u16())]
pub struct ErrorResponse {
    pub method: Method,
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub message: String,
    pub raw_body: Vec<u8>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ErrorResponse {
    fn new(method: Method, url: Url, status: StatusCode, headers: HeaderMap, raw_body: Vec<u8>) -> Self {
        let message = serde_json::from_slice::<ErrorBody>(&raw_body)
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_default();

        Self {
            method,
            url,
            status,
            headers,
            message,
            raw_body,
        }
    }
}

impl RestClient {
    /// Creates a REST client for `organization`.
    ///
    /// A missing trailing slash on `base_url` is added, otherwise relative paths
    /// would replace its last segment instead of extending it.
    ///
    /// Every request carries [`USER_AGENT`](crate::client::USER_AGENT) even
    /// when `client` was not built by [`http_client`](crate::client::http_client).
    pub fn new(client: Client, base_url: &str, organization: impl Into<String>) -> Result<Self> {
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };

        Ok(Self {
            client,
            base_url,
            user_agent: crate::client::USER_AGENT,
            organization: organization.into(),
        })
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds a request for `path`, resolved against the base URL.
    ///
    /// Paths are given without a leading slash. When present, `body` is JSON
    /// encoded.
    pub fn new_request<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Request>
    where
        B: Serialize + ?Sized,
    {
        let url = self.base_url.join(path)?;

        let mut builder = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(USER_AGENT, HeaderValue::from_static(self.user_agent));

        if let Some(body) = body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        Ok(builder.build()?)
    }

    /// Sends `request` and converts the response body into `T`.
    ///
    /// Any status outside 200..=299 becomes a [`BuildkiteError::Rest`] carrying
    /// the method, URL, status, headers and decoded message.
    pub async fn execute<T: FromBody>(&self, request: Request) -> Result<RestResponse<T>> {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!("REST {method} {url}");

        let response = self.client.execute(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        if !status.is_success() {
            debug!("REST {method} {url} failed with status {status}");
            return Err(BuildkiteError::Rest(ErrorResponse::new(
                method,
                url,
                status,
                headers,
                body.to_vec(),
            )));
        }

        Ok(RestResponse {
            status,
            headers,
            body: T::from_body(&body)?,
        })
    }
}
