use serde::{Deserialize, Serialize};

use crate::client::rest::{RestPipeline, SourceProviderSettings};

/// Fields owned by the GraphQL API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineFields {
    pub name: String,
    pub description: String,
    /// Repository URL, e.g. `git@github.com:acme/api.git`
    pub repository: String,
    /// Pipeline upload steps, kept as opaque YAML text
    pub steps: String,
    pub default_branch: String,
    pub skip_intermediate_builds: bool,
    pub skip_intermediate_builds_branch_filter: String,
    pub cancel_intermediate_builds: bool,
    pub cancel_intermediate_builds_branch_filter: String,
}

/// Fields owned by the REST API: branch filter and source provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderFields {
    pub branch_configuration: String,
    /// One of `code`, `deployment`, `fork` or `none`
    pub trigger_mode: String,
    pub build_pull_requests: bool,
    pub pull_request_branch_filter_enabled: bool,
    pub pull_request_branch_filter_configuration: String,
    pub skip_pull_request_builds_for_existing_commits: bool,
    pub build_pull_request_forks: bool,
    pub prefix_pull_request_fork_branch_names: bool,
    pub build_tags: bool,
    pub publish_commit_status: bool,
    pub publish_commit_status_per_step: bool,
    pub separate_pull_request_statuses: bool,
    pub publish_blocked_as_pending: bool,
}

impl Default for ProviderFields {
    fn default() -> Self {
        Self {
            branch_configuration: String::new(),
            trigger_mode: "code".to_string(),
            build_pull_requests: true,
            pull_request_branch_filter_enabled: false,
            pull_request_branch_filter_configuration: String::new(),
            skip_pull_request_builds_for_existing_commits: true,
            build_pull_request_forks: false,
            prefix_pull_request_fork_branch_names: true,
            build_tags: false,
            publish_commit_status: true,
            publish_commit_status_per_step: false,
            separate_pull_request_statuses: false,
            publish_blocked_as_pending: false,
        }
    }
}

impl ProviderFields {
    /// Copies the observed values out of a REST read or update echo.
    pub fn from_rest(pipeline: &RestPipeline) -> Self {
        let settings = &pipeline.provider.settings;

        Self {
            branch_configuration: pipeline.branch_configuration.clone(),
            trigger_mode: settings.trigger_mode.clone(),
            build_pull_requests: settings.build_pull_requests,
            pull_request_branch_filter_enabled: settings.pull_request_branch_filter_enabled,
            pull_request_branch_filter_configuration: settings
                .pull_request_branch_filter_configuration
                .clone(),
            skip_pull_request_builds_for_existing_commits: settings
                .skip_pull_request_builds_for_existing_commits,
            build_pull_request_forks: settings.build_pull_request_forks,
            prefix_pull_request_fork_branch_names: settings.prefix_pull_request_fork_branch_names,
            build_tags: settings.build_tags,
            publish_commit_status: settings.publish_commit_status,
            publish_commit_status_per_step: settings.publish_commit_status_per_step,
            separate_pull_request_statuses: settings.separate_pull_request_statuses,
            publish_blocked_as_pending: settings.publish_blocked_as_pending,
        }
    }

    /// The REST update body for pipeline `slug`.
    pub fn to_rest(&self, slug: &str) -> RestPipeline {
        RestPipeline {
            slug: slug.to_string(),
            branch_configuration: self.branch_configuration.clone(),
            provider_settings: SourceProviderSettings {
                trigger_mode: self.trigger_mode.clone(),
                build_pull_requests: self.build_pull_requests,
                pull_request_branch_filter_enabled: self.pull_request_branch_filter_enabled,
                pull_request_branch_filter_configuration: self
                    .pull_request_branch_filter_configuration
                    .clone(),
                skip_pull_request_builds_for_existing_commits: self
                    .skip_pull_request_builds_for_existing_commits,
                build_pull_request_forks: self.build_pull_request_forks,
                prefix_pull_request_fork_branch_names: self.prefix_pull_request_fork_branch_names,
                build_tags: self.build_tags,
                publish_commit_status: self.publish_commit_status,
                publish_commit_status_per_step: self.publish_commit_status_per_step,
                separate_pull_request_statuses: self.separate_pull_request_statuses,
                publish_blocked_as_pending: self.publish_blocked_as_pending,
            },
            ..RestPipeline::default()
        }
    }
}

/// A pipeline as the caller wants it to be.
///
/// Definition files list both field sets side by side:
///
/// ```toml
/// name = "api"
/// repository = "git@github.com:acme/api.git"
/// steps = "steps:\n  - command: buildkite-agent pipeline upload"
/// build_pull_requests = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    #[serde(flatten)]
    pub pipeline: PipelineFields,
    #[serde(flatten)]
    pub provider: ProviderFields,
}

impl PipelineDefinition {
    /// Names of required fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.pipeline.name),
            ("repository", &self.pipeline.repository),
            ("steps", &self.pipeline.steps),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}
