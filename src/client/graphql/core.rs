use graphql_client::{QueryBody, Response as GraphQLResponse};
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::error::{BuildkiteError, Result};

pub const GRAPHQL_URL: &str = "https://graphql.buildkite.com/v1";

/// Client for the Buildkite GraphQL API, the source of truth for the core
/// pipeline fields.
pub struct GraphQLClient {
    pub client: Client,
    pub graphql_url: Url,
}

impl GraphQLClient {
    pub fn new(client: Client, graphql_url: &str) -> Result<Self> {
        let graphql_url = Url::parse(graphql_url)
            .map_err(|e| BuildkiteError::Config(format!("Invalid GraphQL URL: {e}")))?;

        Ok(Self {
            client,
            graphql_url,
        })
    }

    /// Execute a GraphQL request and return its data after checking for errors.
    ///
    /// HTTP failures, an `errors` payload and a response without data are all
    /// errors. Nothing is retried.
    pub(super) async fn execute_graphql_request<V, T>(&self, request_body: &QueryBody<V>) -> Result<T>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let operation = request_body.operation_name;
        debug!("GraphQL {operation} -> {}", self.graphql_url);

        let response = self
            .client
            .post(self.graphql_url.clone())
            .json(request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(BuildkiteError::GraphQLStatus {
                status: status.as_u16(),
                message,
            });
        }

        let response_body: GraphQLResponse<T> = response.json().await?;

        if let Some(errors) = response_body.errors.filter(|errors| !errors.is_empty()) {
            return Err(BuildkiteError::GraphQL {
                operation,
                errors: errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        response_body
            .data
            .ok_or(BuildkiteError::NoResponseData(operation))
    }
}
