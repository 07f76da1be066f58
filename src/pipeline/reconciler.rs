use log::{info, warn};

use super::state::PipelineState;
use super::types::{PipelineDefinition, ProviderFields};
use crate::auth::Token;
use crate::client::{http_client, GraphQLClient, RestClient};
use crate::config::BuildkiteConfig;
use crate::error::{BuildkiteError, Result};

/// Applies declared pipelines to Buildkite through both APIs.
///
/// Every operation is a fixed sequence of remote calls. `state` is updated
/// after each call that succeeds and never before, so on error it reflects
/// what the remote side is known to hold. There is no rollback: when the REST
/// step of [`create`](Self::create) or [`update`](Self::update) fails, the
/// GraphQL half has already been applied and stays that way.
pub struct PipelineReconciler {
    graphql: GraphQLClient,
    rest: RestClient,
}

impl PipelineReconciler {
    pub fn new(graphql: GraphQLClient, rest: RestClient) -> Self {
        Self { graphql, rest }
    }

    /// Builds both clients on one bearer-authenticated HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if no organization is configured, an endpoint URL is
    /// invalid or the HTTP client cannot be built.
    pub fn from_config(config: &BuildkiteConfig, token: &Token) -> Result<Self> {
        let organization = config
            .organization
            .as_deref()
            .filter(|org| !org.is_empty())
            .ok_or_else(|| BuildkiteError::Config("No Buildkite organization configured".into()))?;

        let client = http_client(token)?;
        let graphql = GraphQLClient::new(client.clone(), &config.graphql_url)?;
        let rest = RestClient::new(client, &config.rest_url, organization)?;

        Ok(Self::new(graphql, rest))
    }

    pub fn organization(&self) -> &str {
        self.rest.organization()
    }

    /// Creates the pipeline through GraphQL, then applies its provider
    /// settings through REST using the slug Buildkite assigned.
    ///
    /// Once the pipeline exists `state` is replaced, not merged into. If the
    /// REST step fails the pipeline keeps default provider settings; `state`
    /// then holds its ID and GraphQL fields with no provider half, so running
    /// [`update`](Self::update) completes it without creating a duplicate.
    pub async fn create(&self, declared: &PipelineDefinition, state: &mut PipelineState) -> Result<()> {
        info!("Creating pipeline {} in {}", declared.pipeline.name, self.organization());

        let organization_id = self.graphql.organization_id(self.organization()).await?;
        let node = self
            .graphql
            .create_pipeline(&organization_id, &declared.pipeline)
            .await?;
        // A new pipeline: nothing observed before belongs to it.
        *state = PipelineState::default();
        state.merge_graphql(&node);

        self.apply_provider_settings(&declared.provider, state)
            .await
            .inspect_err(|e| {
                warn!(
                    "Pipeline {} was created but its provider settings were not applied: {e}",
                    node.slug
                );
            })?;

        info!("Created pipeline {} ({})", node.slug, node.id);
        Ok(())
    }

    /// Refreshes `state` from GraphQL by ID, then from REST by the slug that
    /// GraphQL just returned.
    pub async fn read(&self, state: &mut PipelineState) -> Result<()> {
        let id = state.id()?.to_string();
        info!("Reading pipeline {id}");

        let node = self.graphql.read_pipeline(&id).await?;
        state.merge_graphql(&node);

        let pipeline = self.rest.read_pipeline(state.slug()?).await?;
        state.merge_rest(&pipeline);

        Ok(())
    }

    /// Overwrites every GraphQL-owned field, then every provider setting.
    ///
    /// Both steps replace rather than patch, so repeating an update after a
    /// failure is safe.
    pub async fn update(&self, declared: &PipelineDefinition, state: &mut PipelineState) -> Result<()> {
        let id = state.id()?.to_string();
        info!("Updating pipeline {id}");

        let node = self.graphql.update_pipeline(&id, &declared.pipeline).await?;
        state.merge_graphql(&node);

        self.apply_provider_settings(&declared.provider, state)
            .await
            .inspect_err(|e| {
                warn!(
                    "Pipeline {} was updated but its provider settings were not applied: {e}",
                    node.slug
                );
            })?;

        Ok(())
    }

    /// Deletes the pipeline through REST; GraphQL has no delete mutation.
    ///
    /// `state` is left as is so the caller decides when to forget it.
    pub async fn delete(&self, state: &PipelineState) -> Result<()> {
        let slug = state.slug()?;
        info!("Deleting pipeline {slug}");

        self.rest.delete_pipeline(slug).await
    }

    /// Replaces `state` with the pipeline identified by `id`.
    pub async fn import(&self, id: &str, state: &mut PipelineState) -> Result<()> {
        *state = PipelineState::with_id(id);
        self.read(state).await
    }

    async fn apply_provider_settings(
        &self,
        declared: &ProviderFields,
        state: &mut PipelineState,
    ) -> Result<()> {
        let mut pipeline = declared.to_rest(state.slug()?);
        self.rest.update_pipeline(&mut pipeline).await?;
        state.merge_rest(&pipeline);

        Ok(())
    }
}
