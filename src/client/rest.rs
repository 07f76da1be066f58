mod core;
mod pipelines;
mod types;

pub use self::core::{ErrorResponse, FromBody, Json, Raw, RestClient, RestResponse, REST_BASE_URL};
pub use types::{RestPipeline, SourceProvider, SourceProviderSettings};
