mod core;
mod pipelines;

pub use self::core::{GraphQLClient, GRAPHQL_URL};
pub use pipelines::{
    fetch_organization, fetch_pipeline, pipeline_create, pipeline_update, FetchOrganization,
    FetchPipeline, PipelineCreate, PipelineInput, PipelineNode, PipelineRepository,
    PipelineSteps, PipelineUpdate,
};
