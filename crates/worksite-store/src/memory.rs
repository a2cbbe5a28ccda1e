use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::debug;
use worksite_core::{Result, Site, SiteId, SiteStore, SiteUpdate, WorksiteError};

struct SiteSlot {
    doc: Site,
    feed: watch::Sender<Site>,
}

/// Concurrent in-process implementation of the document store contract.
///
/// Each site lives in its own slot; a commit takes the slot's entry lock,
/// merges the partial update into the document, and pushes the full new
/// snapshot to every subscriber. That makes the document the unit of
/// atomicity and serializes concurrent commits last-writer-wins, which is
/// exactly the contract of the managed store this stands in for.
pub struct MemorySiteStore {
    sites: DashMap<SiteId, SiteSlot>,
}

impl MemorySiteStore {
    pub fn new() -> Self {
        Self {
            sites: DashMap::new(),
        }
    }

    /// Bootstraps a document. Project creation happens outside the engine in
    /// bulk; this is the seam it comes through (and the one tests use).
    pub fn insert_site(&self, site: Site) {
        let id = site.id;
        let (feed, _) = watch::channel(site.clone());
        self.sites.insert(id, SiteSlot { doc: site, feed });
        debug!(site = %id, "site document inserted");
    }

    /// Drops a document and closes its feed. Subscribers observe the channel
    /// closing on their next await.
    pub fn remove_site(&self, id: SiteId) -> bool {
        self.sites.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl Default for MemorySiteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SiteStore for MemorySiteStore {
    async fn fetch(&self, id: SiteId) -> Result<Site> {
        self.sites
            .get(&id)
            .map(|slot| slot.doc.clone())
            .ok_or_else(|| WorksiteError::not_found("site", id))
    }

    async fn commit(&self, id: SiteId, update: SiteUpdate) -> Result<()> {
        let mut slot = self
            .sites
            .get_mut(&id)
            .ok_or_else(|| WorksiteError::not_found("site", id))?;
        update.apply_to(&mut slot.doc);
        let snapshot = slot.doc.clone();
        // A send error only means nobody is subscribed right now.
        let _ = slot.feed.send(snapshot);
        debug!(site = %id, "partial update committed");
        Ok(())
    }

    async fn subscribe(&self, id: SiteId) -> Result<watch::Receiver<Site>> {
        self.sites
            .get(&id)
            .map(|slot| slot.feed.subscribe())
            .ok_or_else(|| WorksiteError::not_found("site", id))
    }
}
