use std::sync::Arc;

use crate::{registry::Registry, repos::Repos, Config};

/// Shared dependencies handed to every CRUD handler as a request
/// extension.
pub struct Context {
    pub config: Arc<Config>,
    pub repos: Repos,
    pub registry: Arc<Registry>,
}

impl Clone for Context {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            repos: self.repos.clone(),
            registry: Arc::clone(&self.registry),
        }
    }
}
