//! [`ProjectDirectory`] implementations.

use async_trait::async_trait;
use scriptorium_error::{PipelineError, ScriptoriumResult};
use scriptorium_interface::ProjectDirectory;
use std::collections::BTreeSet;

/// Accepts every project id.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenProjectDirectory;

#[async_trait]
impl ProjectDirectory for OpenProjectDirectory {
    async fn ensure_exists(&self, _project_id: &str) -> ScriptoriumResult<()> {
        Ok(())
    }
}

/// Accepts only a fixed set of project ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticProjectDirectory {
    known: BTreeSet<String>,
}

impl StaticProjectDirectory {
    /// Directory accepting exactly `known`.
    pub fn new<I, S>(known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: known.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `project_id` is known.
    pub fn contains(&self, project_id: &str) -> bool {
        self.known.contains(project_id)
    }
}

#[async_trait]
impl ProjectDirectory for StaticProjectDirectory {
    async fn ensure_exists(&self, project_id: &str) -> ScriptoriumResult<()> {
        if self.contains(project_id) {
            Ok(())
        } else {
            Err(PipelineError::not_found(format!("project '{}'", project_id)).into())
        }
    }
}
