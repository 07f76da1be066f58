//! Keeps declared Buildkite pipelines in sync with the platform.
//!
//! Buildkite splits a pipeline across two APIs: the GraphQL API owns the core
//! fields (name, repository, steps, intermediate-build controls) while the REST
//! API owns the source provider settings and is the only way to delete a
//! pipeline. [`PipelineReconciler`] drives both clients for each operation and
//! merges the responses into one [`PipelineState`].

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod pipeline;

pub use auth::Token;
pub use client::{GraphQLClient, RestClient, USER_AGENT};
pub use error::{BuildkiteError, Result};
pub use pipeline::{
    PipelineDefinition, PipelineFields, PipelineReconciler, PipelineState, ProviderFields,
};
