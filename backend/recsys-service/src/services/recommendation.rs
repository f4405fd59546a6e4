use crate::config::RecsysConfig;
use crate::error::Result;
use crate::models::{ItemId, RecKind, TableSummary, UserId};
use crate::services::blender::blend;
use crate::services::catalog::ItemCatalog;
use crate::services::events::EventStore;
use crate::services::offline::OfflineRecommendationStore;
use crate::services::online::OnlineRecommender;
use crate::services::similarity::{load_similarity_index, NeighborIndex, SimilarityIndex};
use crate::services::stats::StatsCollector;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Serving facade over the offline store, event history and online recommender
///
/// Built once at startup and shared with request handlers.
pub struct RecommendationService {
    offline: Arc<OfflineRecommendationStore>,
    events: Arc<EventStore>,
    online: Arc<OnlineRecommender>,
    stats: Arc<StatsCollector>,
}

impl RecommendationService {
    pub fn new(
        offline: Arc<OfflineRecommendationStore>,
        events: Arc<EventStore>,
        online: Arc<OnlineRecommender>,
        stats: Arc<StatsCollector>,
    ) -> Self {
        Self {
            offline,
            events,
            online,
            stats,
        }
    }

    /// Wire up components from in-memory parts
    pub fn from_parts(
        index: Arc<dyn SimilarityIndex>,
        max_events_per_user: usize,
        catalog: Option<Arc<ItemCatalog>>,
    ) -> Self {
        let stats = Arc::new(StatsCollector::new());
        let mut offline = OfflineRecommendationStore::new(Arc::clone(&stats));
        if let Some(catalog) = catalog {
            offline = offline.with_catalog(catalog);
        }
        let events = Arc::new(EventStore::new(max_events_per_user));
        let online = Arc::new(OnlineRecommender::new(Arc::clone(&events), index));

        Self::new(Arc::new(offline), events, online, stats)
    }

    /// Build from configuration, loading every configured artifact
    ///
    /// Artifact failures are logged and leave the matching component empty.
    pub fn bootstrap(config: &RecsysConfig) -> Self {
        let catalog = config.items_path.as_deref().and_then(|path| {
            ItemCatalog::load(path)
                .map(Arc::new)
                .map_err(|e| warn!(error = %e, "Item metadata unavailable"))
                .ok()
        });

        let index: Arc<dyn SimilarityIndex> = match config.similarity_path.as_deref() {
            Some(path) => load_similarity_index(path).unwrap_or_else(|e| {
                warn!(error = %e, "Similarity model unavailable, online recommendations disabled");
                Arc::new(NeighborIndex::default())
            }),
            None => {
                info!("No similarity model configured, online recommendations disabled");
                Arc::new(NeighborIndex::default())
            }
        };

        let service = Self::from_parts(index, config.max_events_per_user, catalog);

        // Errors are already logged by the store
        if let Some(path) = config.personal_path.as_deref() {
            let _ = service.load(RecKind::Personal, path);
        }
        if let Some(path) = config.default_path.as_deref() {
            let _ = service.load(RecKind::Default, path);
        }

        service
    }

    /// Blended recommendations
    ///
    /// The offline and online branches are independent and side-effect free
    /// towards each other; both are in-memory and bounded, so they are joined
    /// on the request task rather than spawned.
    pub async fn recommend(&self, user_id: UserId, k: usize, n: usize) -> Vec<ItemId> {
        let (offline, online) = tokio::join!(
            async { self.offline.get(user_id, k) },
            async { self.online.get(user_id, k, n) }
        );

        let recs = blend(&offline, &online, k);
        info!(
            user_id = user_id,
            offline = offline.len(),
            online = online.len(),
            blended = recs.len(),
            "Blended recommendations"
        );
        recs
    }

    pub fn offline(&self, user_id: UserId, k: usize) -> Vec<ItemId> {
        self.offline.get(user_id, k)
    }

    pub fn online(&self, user_id: UserId, k: usize, n: usize) -> Vec<ItemId> {
        self.online.get(user_id, k, n)
    }

    pub fn put_event(&self, user_id: UserId, item_id: ItemId) {
        self.events.put(user_id, item_id);
    }

    pub fn events(&self, user_id: UserId, k: usize) -> Vec<ItemId> {
        self.events.get(user_id, k)
    }

    pub fn load(&self, kind: RecKind, path: &Path) -> Result<TableSummary> {
        self.offline.load(kind, path)
    }

    pub fn is_loaded(&self, kind: RecKind) -> bool {
        self.offline.is_loaded(kind)
    }

    pub fn stats(&self) -> BTreeMap<&'static str, u64> {
        self.stats.snapshot()
    }

    pub fn offline_store(&self) -> &Arc<OfflineRecommendationStore> {
        &self.offline
    }
}
