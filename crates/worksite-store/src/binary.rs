use async_trait::async_trait;
use tracing::debug;
use worksite_core::{BinaryStore, Result};

/// Binary deletion stand-in for deployments where media binaries live in an
/// external CDN with its own lifecycle rules. Always succeeds.
pub struct NullBinaryStore;

#[async_trait]
impl BinaryStore for NullBinaryStore {
    async fn delete(&self, url: &str) -> Result<()> {
        debug!(%url, "binary deletion delegated to external storage");
        Ok(())
    }
}
