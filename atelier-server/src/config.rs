use std::time::Duration;

use serde::Deserialize;
use tokio::sync::oneshot;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub port: u16,
    /// Handed the bound port once the listener is up. Used by tests that
    /// bind port 0.
    #[serde(skip)]
    pub port_tx: Option<oneshot::Sender<u16>>,
    /// SQLite database path, or `:memory:` for throwaway storage.
    pub database_url: String,
    /// HMAC key that session tokens are signed with.
    pub session_secret: String,
    /// Wall-clock budget for a single handler invocation.
    pub handler_timeout_ms: u64,
    /// Whether deleting a project also deletes its endpoints and pages.
    pub cascade_delete: bool,
}

impl Config {
    #[must_use]
    pub fn handler_timeout(&self) -> Duration {
        Duration::from_millis(self.handler_timeout_ms)
    }

    #[must_use]
    pub fn using_inmemory_storage(&self) -> bool {
        self.database_url.contains(":memory:")
    }

    pub fn sanitize(&self) -> anyhow::Result<()> {
        if self.session_secret.is_empty() {
            return Err(anyhow::Error::msg("A session secret must be configured"));
        }

        if !self.using_inmemory_storage() {
            if let Some(parent) = std::path::Path::new(&self.database_url).parent() {
                if !parent.as_os_str().is_empty()
                    && !parent.exists()
                    && std::fs::DirBuilder::new()
                        .recursive(true)
                        .create(parent)
                        .is_err()
                {
                    return Err(anyhow::Error::msg("Failed to create storage directory"));
                }
            }
        }

        Ok(())
    }
}
