//! Shared request state.

use std::sync::Arc;

use clf_pipeline::InferencePipeline;

/// Handle to the loaded pipeline, cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<InferencePipeline>,
}

impl AppState {
    pub fn new(pipeline: InferencePipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn pipeline(&self) -> &Arc<InferencePipeline> {
        &self.pipeline
    }
}
