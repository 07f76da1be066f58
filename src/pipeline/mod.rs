mod reconciler;
mod state;
mod types;


pub use reconciler::PipelineReconciler;
pub use state::PipelineState;
pub use types::{PipelineDefinition, PipelineFields, ProviderFields};
