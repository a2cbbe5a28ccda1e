use crate::{Result, Site, SiteId, SiteUpdate};
use async_trait::async_trait;
use tokio::sync::watch;

/// Contract with the external document store. One `Site` document is the unit
/// of atomicity; a commit applies the partial update in one document write
/// and then fans the full current document out to every subscriber.
///
/// There is no cross-session locking. Concurrent commits from independent
/// sessions serialize at the document and land last-writer-wins; callers that
/// need lock validation must read fresh state immediately before committing.
#[async_trait]
pub trait SiteStore: Send + Sync {
    /// One-shot read of the current document.
    async fn fetch(&self, id: SiteId) -> Result<Site>;

    /// Atomic partial-document update. Fields absent from the update are left
    /// untouched; they are never written as null.
    async fn commit(&self, id: SiteId, update: SiteUpdate) -> Result<()>;

    /// Live subscription. The receiver holds the current document immediately
    /// and is re-delivered the entire document on every subsequent commit.
    async fn subscribe(&self, id: SiteId) -> Result<watch::Receiver<Site>>;
}

/// Externally stored media binaries. Deletion is best-effort from the
/// engine's point of view: a failure here is logged and swallowed, never
/// allowed to abort metadata removal.
#[async_trait]
pub trait BinaryStore: Send + Sync {
    async fn delete(&self, url: &str) -> Result<()>;
}
