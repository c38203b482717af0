//! Named scoped threads that make up a run.

use crate::error::PipelineError;
use std::thread::{self, Scope, ScopedJoinHandle};

/// A running stage thread
pub(crate) struct Stage<'scope, T = ()> {
    name: String,
    handle: ScopedJoinHandle<'scope, T>,
}

impl<'scope, T> Stage<'scope, T> {
    /// Spawn `f` as a named thread inside `scope`.
    pub(crate) fn spawn<'env, F>(
        scope: &'scope Scope<'scope, 'env>,
        name: String,
        f: F,
    ) -> Result<Self, PipelineError>
    where
        F: FnOnce() -> T + Send + 'scope,
        T: Send + 'scope,
    {
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn_scoped(scope, f)
            .map_err(|source| PipelineError::Spawn {
                stage: name.clone(),
                source,
            })?;

        Ok(Self { name, handle })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the stage to exit
    pub(crate) fn join(self) -> Result<T, PipelineError> {
        self.handle
            .join()
            .map_err(|_| PipelineError::StagePanicked { stage: self.name })
    }
}
