pub mod graphql;
pub mod rest;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Deserializer};

use crate::auth::Token;
use crate::error::{BuildkiteError, Result};

pub use graphql::GraphQLClient;
pub use rest::RestClient;

/// User agent sent with every request, REST and GraphQL alike.
pub const USER_AGENT: &str = concat!("bkpipe/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by both API clients.
///
/// The bearer token is attached as a default header, so neither client handles
/// credentials itself. No timeout is configured here; callers wanting one should
/// build their own `reqwest::Client` and hand it to the clients directly.
pub fn http_client(token: &Token) -> Result<Client> {
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
        .map_err(|e| BuildkiteError::Config(format!("Invalid API token: {e}")))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .map_err(|e| BuildkiteError::Config(format!("Failed to create HTTP client: {e}")))
}

/// Treats an explicit JSON `null` like a missing field.
///
/// Both APIs answer with `null` for unset strings; the local model uses empty
/// strings instead.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
