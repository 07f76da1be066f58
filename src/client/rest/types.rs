use serde::{Deserialize, Serialize};

use crate::client::null_as_default;

/// A pipeline as seen through the REST API.
///
/// Reads answer with `provider.settings`; writes must send `provider_settings`.
/// Everything else on the REST representation is owned by GraphQL and is left
/// out on purpose.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestPipeline {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub branch_configuration: String,
    #[serde(default, skip_serializing)]
    pub provider: SourceProvider,
    #[serde(default, skip_deserializing)]
    pub provider_settings: SourceProviderSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceProvider {
    #[serde(default)]
    pub settings: SourceProviderSettings,
}

/// Trigger policies of the source provider.
///
/// Always sent as a whole: `false` and empty values are serialized too, since
/// the API replaces the object wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceProviderSettings {
    #[serde(deserialize_with = "null_as_default")]
    pub trigger_mode: String,
    pub build_pull_requests: bool,
    pub pull_request_branch_filter_enabled: bool,
    #[serde(deserialize_with = "null_as_default")]
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_response_uses_provider_settings() {
        let body = json!({
            "id": "0183c8a6-0000-0000-0000-000000000000",
            "slug": "api",
            "name": "api",
            "branch_configuration": null,
            "provider": {
                "id": "github",
                "settings": {
                    "trigger_mode": "code",
                    "build_pull_requests": false,
                    "pull_request_branch_filter_configuration": null,
                    "publish_commit_status": true,
                    "repository": "acme/api"
                }
            }
        });

        let pipeline: RestPipeline = serde_json::from_value(body).unwrap();
        assert_eq!(pipeline.slug, "api");
        assert_eq!(pipeline.branch_configuration, "");
        assert_eq!(pipeline.provider.settings.trigger_mode, "code");
        assert!(!pipeline.provider.settings.build_pull_requests);
        assert!(pipeline.provider.settings.publish_commit_status);
        assert_eq!(
            pipeline.provider.settings.pull_request_branch_filter_configuration,
            ""
        );
        assert_eq!(pipeline.provider_settings, SourceProviderSettings::default());
    }

    #[test]
    fn test_update_body_sends_every_setting() {
        let pipeline = RestPipeline {
            slug: "api".to_string(),
            branch_configuration: String::new(),
            provider: SourceProvider::default(),
            provider_settings: SourceProviderSettings {
                trigger_mode: "code".to_string(),
                ..SourceProviderSettings::default()
            },
        };

        let value = serde_json::to_value(&pipeline).unwrap();
        assert!(value.get("provider").is_none());
        assert_eq!(value["branch_configuration"], "");
        let settings = value["provider_settings"].as_object().unwrap();
        assert_eq!(settings.len(), 12);
        assert_eq!(settings["build_pull_requests"], false);
        assert_eq!(settings["pull_request_branch_filter_configuration"], "");
    }

    #[test]
    fn test_empty_slug_is_omitted() {
        let value = serde_json::to_value(RestPipeline::default()).unwrap();
        assert!(value.get("slug").is_none());
    }
}
