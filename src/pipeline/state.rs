use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::types::{PipelineFields, ProviderFields};
use crate::client::graphql::PipelineNode;
use crate::client::rest::RestPipeline;
use crate::error::{BuildkiteError, Result};

/// What is known about a pipeline from the last successful remote calls.
///
/// GraphQL-owned and REST-owned values are kept apart: `pipeline` is only set
/// by a GraphQL response and `provider` only by a REST response, so a failed
/// second step shows up as `provider == None` rather than as stale values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineState {
    /// GraphQL node ID
    pub id: Option<String>,
    /// REST identifier, assigned by Buildkite on creation
    pub slug: Option<String>,
    pub uuid: Option<String>,
    pub webhook_url: Option<String>,
    pub pipeline: Option<PipelineFields>,
    pub provider: Option<ProviderFields>,
}

impl PipelineState {
    /// State for a pipeline known only by its GraphQL ID, as when importing.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn id(&self) -> Result<&str> {
        non_empty(&self.id).ok_or(BuildkiteError::MissingIdentity("id"))
    }

    pub fn slug(&self) -> Result<&str> {
        non_empty(&self.slug).ok_or(BuildkiteError::MissingIdentity("slug"))
    }

    /// Copy a GraphQL response into the state. Provider fields are untouched.
    pub fn merge_graphql(&mut self, node: &PipelineNode) {
        self.id = Some(node.id.clone());
        self.slug = Some(node.slug.clone());
        self.uuid = Some(node.uuid.clone());
        self.webhook_url = Some(node.webhook_url.clone());
        self.pipeline = Some(PipelineFields {
            name: node.name.clone(),
            description: node.description.clone(),
            repository: node.repository.url.clone(),
            steps: node.steps.yaml.clone(),
            default_branch: node.default_branch.clone(),
            skip_intermediate_builds: node.skip_intermediate_builds,
            skip_intermediate_builds_branch_filter: node
                .skip_intermediate_builds_branch_filter
                .clone(),
            cancel_intermediate_builds: node.cancel_intermediate_builds,
            cancel_intermediate_builds_branch_filter: node
                .cancel_intermediate_builds_branch_filter
                .clone(),
        });
    }

    /// Copy a REST response into the state. GraphQL-owned fields are untouched.
    pub fn merge_rest(&mut self, pipeline: &RestPipeline) {
        self.provider = Some(ProviderFields::from_rest(pipeline));
    }

    /// Whether both halves of the pipeline have been observed.
    pub fn is_complete(&self) -> bool {
        self.pipeline.is_some() && self.provider.is_some()
    }

    /// Load state saved by [`PipelineState::save`]; a missing file is an empty state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No state file at {}, starting empty", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!("Saved state to {}", path.display());
        Ok(())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
