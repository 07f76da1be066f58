use log::debug;
use reqwest::Method;

use super::core::{Json, RestClient, RestResponse};
use super::types::RestPipeline;
use crate::error::{BuildkiteError, Result};

// Creation goes through GraphQL; see `GraphQLClient::create_pipeline`.
impl RestClient {
    fn pipeline_path(&self, slug: &str) -> String {
        format!("v2/organizations/{}/pipelines/{}", self.organization(), slug)
    }

    pub async fn read_pipeline(&self, slug: &str) -> Result<RestPipeline> {
        let request = self.new_request::<()>(Method::GET, &self.pipeline_path(slug), None)?;
        let response: RestResponse<Json<RestPipeline>> = self.execute(request).await?;

        Ok(response.body.0)
    }

    /// Replaces the provider settings and branch configuration of the pipeline
    /// addressed by `pipeline.slug`.
    ///
    /// On success `pipeline` holds the server's echo, so its `provider.settings`
    /// reflect what was actually stored.
    pub async fn update_pipeline(&self, pipeline: &mut RestPipeline) -> Result<()> {
        if pipeline.slug.is_empty() {
            return Err(BuildkiteError::MissingIdentity("slug"));
        }

        let path = self.pipeline_path(&pipeline.slug);
        let request = self.new_request(Method::PATCH, &path, Some(&*pipeline))?;
        let response: RestResponse<Json<RestPipeline>> = self.execute(request).await?;

        debug!("Pipeline {} provider settings updated", pipeline.slug);
        *pipeline = response.body.0;

        Ok(())
    }

    /// Deletes the pipeline. A pipeline that is already gone yields a 404 error.
    pub async fn delete_pipeline(&self, slug: &str) -> Result<()> {
        let request = self.new_request::<()>(Method::DELETE, &self.pipeline_path(slug), None)?;
        self.execute::<()>(request).await?;

        Ok(())
    }
}
