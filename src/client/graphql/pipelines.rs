use graphql_client::{GraphQLQuery, QueryBody};
use log::debug;
use serde::{Deserialize, Serialize};

use super::core::GraphQLClient;
use crate::client::null_as_default;
use crate::error::{BuildkiteError, Result};
use crate::pipeline::PipelineFields;

/// Shared document holding every pipeline operation plus the `PipelineFields`
/// fragment; the operation to run is picked by name.
const QUERY: &str = include_str!("pipelines.graphql");

/// The `PipelineFields` fragment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineNode {
    pub id: String,
    pub uuid: String,
    pub slug: String,
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "webhookURL", deserialize_with = "null_as_default")]
    pub webhook_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub default_branch: String,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: PipelineRepository,
    #[serde(deserialize_with = "null_as_default")]
    pub steps: PipelineSteps,
    pub skip_intermediate_builds: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub skip_intermediate_builds_branch_filter: String,
    pub cancel_intermediate_builds: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub cancel_intermediate_builds_branch_filter: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineRepository {
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSteps {
    #[serde(default, deserialize_with = "null_as_default")]
    pub yaml: String,
}

/// GraphQL-owned fields as sent by both mutations. Provider settings never
/// appear here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineInput {
    pub name: String,
    pub description: String,
    pub repository: PipelineRepository,
    pub steps: PipelineSteps,
    pub default_branch: String,
    pub skip_intermediate_builds: bool,
    pub skip_intermediate_builds_branch_filter: String,
    pub cancel_intermediate_builds: bool,
    pub cancel_intermediate_builds_branch_filter: String,
}

impl From<&PipelineFields> for PipelineInput {
    fn from(fields: &PipelineFields) -> Self {
        Self {
            name: fields.name.clone(),
            description: fields.description.clone(),
            repository: PipelineRepository {
                url: fields.repository.clone(),
            },
            steps: PipelineSteps {
                yaml: fields.steps.clone(),
            },
            default_branch: fields.default_branch.clone(),
            skip_intermediate_builds: fields.skip_intermediate_builds,
            skip_intermediate_builds_branch_filter: fields
                .skip_intermediate_builds_branch_filter
                .clone(),
            cancel_intermediate_builds: fields.cancel_intermediate_builds,
            cancel_intermediate_builds_branch_filter: fields
                .cancel_intermediate_builds_branch_filter
                .clone(),
        }
    }
}

pub struct FetchOrganization;

pub mod fetch_organization {
    use super::*;

    pub const OPERATION_NAME: &str = "FetchOrganization";

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub slug: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub organization: Option<Organization>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Organization {
        pub id: String,
    }
}

impl GraphQLQuery for FetchOrganization {
    type Variables = fetch_organization::Variables;
    type ResponseData = fetch_organization::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: QUERY,
            operation_name: fetch_organization::OPERATION_NAME,
        }
    }
}

pub struct FetchPipeline;

pub mod fetch_pipeline {
    use super::*;

    pub const OPERATION_NAME: &str = "FetchPipeline";

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub id: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub node: Option<Node>,
    }

    /// `node(id)` resolves any global ID; only pipelines are of interest.
    #[derive(Debug, Deserialize)]
    #[serde(tag = "__typename")]
    pub enum Node {
        Pipeline(PipelineNode),
        #[serde(other)]
        Other,
    }
}

impl GraphQLQuery for FetchPipeline {
    type Variables = fetch_pipeline::Variables;
    type ResponseData = fetch_pipeline::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: QUERY,
            operation_name: fetch_pipeline::OPERATION_NAME,
        }
    }
}

pub struct PipelineCreate;

pub mod pipeline_create {
    use super::*;

    pub const OPERATION_NAME: &str = "PipelineCreate";

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub input: PipelineCreateInput,
    }

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PipelineCreateInput {
        pub organization_id: String,
        #[serde(flatten)]
        pub pipeline: PipelineInput,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub pipeline_create: Option<Payload>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Payload {
        pub pipeline: PipelineNode,
    }
}

impl GraphQLQuery for PipelineCreate {
    type Variables = pipeline_create::Variables;
    type ResponseData = pipeline_create::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: QUERY,
            operation_name: pipeline_create::OPERATION_NAME,
        }
    }
}

pub struct PipelineUpdate;

pub mod pipeline_update {
    use super::*;

    pub const OPERATION_NAME: &str = "PipelineUpdate";

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub input: PipelineUpdateInput,
    }

    #[derive(Debug, Serialize)]
    pub struct PipelineUpdateInput {
        pub id: String,
        #[serde(flatten)]
        pub pipeline: PipelineInput,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub pipeline_update: Option<Payload>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Payload {
        pub pipeline: PipelineNode,
    }
}

impl GraphQLQuery for PipelineUpdate {
    type Variables = pipeline_update::Variables;
    type ResponseData = pipeline_update::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: QUERY,
            operation_name: pipeline_update::OPERATION_NAME,
        }
    }
}

impl GraphQLClient {
    /// Resolve an organization slug to the GraphQL ID `pipelineCreate` expects.
    pub async fn organization_id(&self, slug: &str) -> Result<String> {
        let request_body = FetchOrganization::build_query(fetch_organization::Variables {
            slug: slug.to_string(),
        });

        let data: fetch_organization::ResponseData =
            self.execute_graphql_request(&request_body).await?;

        data.organization
            .map(|organization| organization.id)
            .ok_or_else(|| BuildkiteError::OrganizationNotFound(slug.to_string()))
    }

    /// Create a pipeline from the GraphQL-owned fields.
    ///
    /// Provider settings are left at server defaults; they can only be set
    /// through the REST API once the slug is known.
    pub async fn create_pipeline(
        &self,
        organization_id: &str,
        fields: &PipelineFields,
    ) -> Result<PipelineNode> {
        let request_body = PipelineCreate::build_query(pipeline_create::Variables {
            input: pipeline_create::PipelineCreateInput {
                organization_id: organization_id.to_string(),
                pipeline: PipelineInput::from(fields),
            },
        });

        let data: pipeline_create::ResponseData =
            self.execute_graphql_request(&request_body).await?;

        let pipeline = data
            .pipeline_create
            .ok_or(BuildkiteError::NoResponseData(pipeline_create::OPERATION_NAME))?
            .pipeline;
        debug!("Created pipeline {} ({})", pipeline.slug, pipeline.id);

        Ok(pipeline)
    }

    pub async fn read_pipeline(&self, id: &str) -> Result<PipelineNode> {
        let request_body = FetchPipeline::build_query(fetch_pipeline::Variables {
            id: id.to_string(),
        });

        let data: fetch_pipeline::ResponseData =
            self.execute_graphql_request(&request_body).await?;

        match data.node {
            Some(fetch_pipeline::Node::Pipeline(pipeline)) => Ok(pipeline),
            _ => Err(BuildkiteError::PipelineNotFound(id.to_string())),
        }
    }

    /// Overwrite every GraphQL-owned field of pipeline `id`.
    pub async fn update_pipeline(&self, id: &str, fields: &PipelineFields) -> Result<PipelineNode> {
        let request_body = PipelineUpdate::build_query(pipeline_update::Variables {
            input: pipeline_update::PipelineUpdateInput {
                id: id.to_string(),
                pipeline: PipelineInput::from(fields),
            },
        });

        let data: pipeline_update::ResponseData =
            self.execute_graphql_request(&request_body).await?;

        Ok(data
            .pipeline_update
            .ok_or(BuildkiteError::NoResponseData(pipeline_update::OPERATION_NAME))?
            .pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::Server) -> GraphQLClient {
        GraphQLClient::new(reqwest::Client::new(), &format!("{}/v1", server.url())).unwrap()
    }

    fn fields() -> PipelineFields {
        PipelineFields {
            name: "api".to_string(),
            repository: "git@host/api.git".to_string(),
            steps: "script: true".to_string(),
            ..PipelineFields::default()
        }
    }

    fn node_json() -> serde_json::Value {
        json!({
            "id": "UGlwZWxpbmUtLS0x",
            "uuid": "0183c8a6-0000-0000-0000-000000000001",
            "slug": "api",
            "name": "api",
            "description": null,
            "webhookURL": "https://webhook.buildbox.io/deliver/abc",
            "defaultBranch": "main",
            "repository": {"url": "git@host/api.git"},
            "steps": {"yaml": "script: true"},
            "skipIntermediateBuilds": false,
            "skipIntermediateBuildsBranchFilter": null,
            "cancelIntermediateBuilds": true,
            "cancelIntermediateBuildsBranchFilter": "!main"
        })
    }

    #[test]
    fn test_query_document_has_every_operation() {
        for operation in [
            fetch_organization::OPERATION_NAME,
            fetch_pipeline::OPERATION_NAME,
            pipeline_create::OPERATION_NAME,
            pipeline_update::OPERATION_NAME,
        ] {
            assert!(QUERY.contains(operation), "missing {operation}");
        }
    }

    #[test]
    fn test_create_variables_are_camel_case() {
        let body = PipelineCreate::build_query(pipeline_create::Variables {
            input: pipeline_create::PipelineCreateInput {
                organization_id: "T3JnLS0t".to_string(),
                pipeline: PipelineInput::from(&fields()),
            },
        });

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["operationName"], "PipelineCreate");
        let input = &value["variables"]["input"];
        assert_eq!(input["organizationId"], "T3JnLS0t");
        assert_eq!(input["repository"]["url"], "git@host/api.git");
        assert_eq!(input["steps"]["yaml"], "script: true");
        assert_eq!(input["skipIntermediateBuilds"], false);
        assert!(input.get("build_pull_requests").is_none());
        assert!(input.get("buildPullRequests").is_none());
    }

    #[test]
    fn test_node_decodes_nulls_as_empty() {
        let node: PipelineNode = serde_json::from_value(node_json()).unwrap();
        assert_eq!(node.description, "");
        assert_eq!(node.skip_intermediate_builds_branch_filter, "");
        assert_eq!(node.webhook_url, "https://webhook.buildbox.io/deliver/abc");
        assert!(node.cancel_intermediate_builds);
    }

    #[tokio::test]
    async fn test_organization_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1")
            .match_body(Matcher::PartialJson(json!({
                "operationName": "FetchOrganization",
                "variables": {"slug": "acme"}
            })))
            .with_status(200)
            .with_body(json!({"data": {"organization": {"id": "T3JnLS0t"}}}).to_string())
            .create_async()
            .await;

        let id = client_for(&server).organization_id("acme").await.unwrap();
        assert_eq!(id, "T3JnLS0t");
    }

    #[tokio::test]
    async fn test_unknown_organization() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1")
            .with_status(200)
            .with_body(json!({"data": {"organization": null}}).to_string())
            .create_async()
            .await;

        let err = client_for(&server).organization_id("nope").await.unwrap_err();
        assert!(matches!(err, BuildkiteError::OrganizationNotFound(ref slug) if slug == "nope"));
    }

    #[tokio::test]
    async fn test_create_pipeline() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1")
            .match_body(Matcher::PartialJson(json!({
                "operationName": "PipelineCreate",
                "variables": {"input": {
                    "organizationId": "T3JnLS0t",
                    "name": "api",
                    "repository": {"url": "git@host/api.git"},
                    "steps": {"yaml": "script: true"}
                }}
            })))
            .with_status(200)
            .with_body(json!({"data": {"pipelineCreate": {"pipeline": node_json()}}}).to_string())
            .create_async()
            .await;

        let node = client_for(&server)
            .create_pipeline("T3JnLS0t", &fields())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(node.id, "UGlwZWxpbmUtLS0x");
        assert_eq!(node.slug, "api");
    }

    #[tokio::test]
    async fn test_create_pipeline_graphql_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1")
            .with_status(200)
            .with_body(
                json!({
                    "data": {"pipelineCreate": null},
                    "errors": [
                        {"message": "Name has already been taken"},
                        {"message": "Repository is invalid"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let err = client_for(&server)
            .create_pipeline("T3JnLS0t", &fields())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "GraphQL errors in PipelineCreate: Name has already been taken, Repository is invalid"
        );
    }

    #[tokio::test]
    async fn test_unauthorized_is_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1")
            .with_status(401)
            .with_body("Unauthorized")
            .create_async()
            .await;

        let err = client_for(&server).read_pipeline("UGlwZWxpbmUtLS0x").await.unwrap_err();
        assert!(matches!(
            err,
            BuildkiteError::GraphQLStatus { status: 401, ref message } if message == "Unauthorized"
        ));
    }

    #[tokio::test]
    async fn test_read_pipeline() {
        let mut node = node_json();
        node["__typename"] = json!("Pipeline");

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1")
            .match_body(Matcher::PartialJson(json!({
                "operationName": "FetchPipeline",
                "variables": {"id": "UGlwZWxpbmUtLS0x"}
            })))
            .with_status(200)
            .with_body(json!({"data": {"node": node}}).to_string())
            .create_async()
            .await;

        let pipeline = client_for(&server).read_pipeline("UGlwZWxpbmUtLS0x").await.unwrap();
        assert_eq!(pipeline.default_branch, "main");
        assert_eq!(pipeline.steps.yaml, "script: true");
    }

    #[tokio::test]
    async fn test_read_missing_pipeline() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1")
            .with_status(200)
            .with_body(json!({"data": {"node": null}}).to_string())
            .create_async()
            .await;

        let err = client_for(&server).read_pipeline("gone").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_read_node_of_other_type() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1")
            .with_status(200)
            .with_body(json!({"data": {"node": {"__typename": "Agent"}}}).to_string())
            .create_async()
            .await;

        let err = client_for(&server).read_pipeline("QWdlbnQtLS0x").await.unwrap_err();
        assert!(matches!(err, BuildkiteError::PipelineNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_pipeline_sends_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1")
            .match_body(Matcher::PartialJson(json!({
                "operationName": "PipelineUpdate",
                "variables": {"input": {"id": "UGlwZWxpbmUtLS0x", "name": "api"}}
            })))
            .with_status(200)
            .with_body(json!({"data": {"pipelineUpdate": {"pipeline": node_json()}}}).to_string())
            .create_async()
            .await;

        let node = client_for(&server)
            .update_pipeline("UGlwZWxpbmUtLS0x", &fields())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(node.uuid, "0183c8a6-0000-0000-0000-000000000001");
    }
}
