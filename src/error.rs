use thiserror::Error;

use crate::client::rest::ErrorResponse;

#[derive(Error, Debug)]
pub enum BuildkiteError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("GraphQL API error (status {status}): {message}")]
    GraphQLStatus { status: u16, message: String },

    #[error("GraphQL errors in {operation}: {errors}")]
    GraphQL {
        operation: &'static str,
        errors: String,
    },

    #[error("GraphQL response for {0} contained no data")]
    NoResponseData(&'static str),

    #[error("Organization '{0}' not found")]
    OrganizationNotFound(String),

    #[error("Pipeline '{0}' not found")]
    PipelineNotFound(String),

    #[error("Pipeline state has no {0}; create or import the pipeline first")]
    MissingIdentity(&'static str),

    #[error(transparent)]
    Rest(#[from] ErrorResponse),
}

impl BuildkiteError {
    /// Whether the remote side reported that the addressed object does not exist.
    ///
    /// REST failures are only classified by status code, so any 404 counts.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::PipelineNotFound(_) | Self::OrganizationNotFound(_) => true,
            Self::Rest(response) => response.status == reqwest::StatusCode::NOT_FOUND,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildkiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_identity_message() {
        let err = BuildkiteError::MissingIdentity("slug");
        assert_eq!(
            err.to_string(),
            "Pipeline state has no slug; create or import the pipeline first"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_pipeline_not_found_is_not_found() {
        let err = BuildkiteError::PipelineNotFound("UGlwZWxpbmUtLS0x".to_string());
        assert!(err.is_not_found());
        assert!(err.to_string().contains("UGlwZWxpbmUtLS0x"));
    }

    #[test]
    fn test_graphql_errors_are_not_not_found() {
        let err = BuildkiteError::GraphQL {
            operation: "PipelineUpdate",
            errors: "Name can't be blank".to_string(),
        };
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "GraphQL errors in PipelineUpdate: Name can't be blank"
        );
    }
}
