mod loader;

pub use loader::{read_rows, DefaultTable, PersonalTable};

use crate::error::Result;
use crate::metrics;
use crate::models::{DefaultRow, ItemId, PersonalRow, RecKind, TableSummary, UserId};
use crate::services::catalog::ItemCatalog;
use crate::services::stats::{Counter, StatsCollector};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Offline recommendations: per-user personal table with a popularity fallback
///
/// Each table sits behind its own lock as an `Arc` snapshot. A load builds
/// the replacement completely before swapping the pointer, and readers clone
/// the `Arc` before touching rows, so a lookup only ever sees one snapshot.
pub struct OfflineRecommendationStore {
    personal: RwLock<Option<Arc<PersonalTable>>>,
    default: RwLock<Option<Arc<DefaultTable>>>,
    stats: Arc<StatsCollector>,
    catalog: Option<Arc<ItemCatalog>>,
}

impl OfflineRecommendationStore {
    pub fn new(stats: Arc<StatsCollector>) -> Self {
        Self {
            personal: RwLock::new(None),
            default: RwLock::new(None),
            stats,
            catalog: None,
        }
    }

    /// Attach item metadata used for debug logging of served items
    pub fn with_catalog(mut self, catalog: Arc<ItemCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Replace the `kind` table with the snapshot at `path`
    ///
    /// On failure the previous table stays in place.
    pub fn load(&self, kind: RecKind, path: &Path) -> Result<TableSummary> {
        info!(kind = %kind, path = %path.display(), "Loading recommendations");

        let result = match kind {
            RecKind::Personal => read_rows::<PersonalRow>(path).map(|rows| {
                let table = PersonalTable::from_rows(rows);
                let summary = TableSummary {
                    kind,
                    rows: table.rows,
                    users: table.user_count(),
                };
                self.install_personal(table);
                summary
            }),
            RecKind::Default => read_rows::<DefaultRow>(path).map(|rows| {
                let table = DefaultTable::from_rows(rows);
                let summary = TableSummary {
                    kind,
                    rows: table.len(),
                    users: 0,
                };
                self.install_default(table);
                summary
            }),
        };

        match &result {
            Ok(summary) => {
                metrics::record_table_load(kind.as_str(), "success");
                info!(
                    kind = %kind,
                    rows = summary.rows,
                    users = summary.users,
                    "Loaded recommendations"
                );
            }
            Err(e) => {
                metrics::record_table_load(kind.as_str(), "error");
                error!(
                    kind = %kind,
                    path = %path.display(),
                    error = %e,
                    "Failed to load recommendations, keeping previous table"
                );
            }
        }

        result
    }

    pub fn install_personal(&self, table: PersonalTable) {
        *self.personal.write() = Some(Arc::new(table));
    }

    pub fn install_default(&self, table: DefaultTable) {
        *self.default.write() = Some(Arc::new(table));
    }

    pub fn is_loaded(&self, kind: RecKind) -> bool {
        match kind {
            RecKind::Personal => self.personal.read().is_some(),
            RecKind::Default => self.default.read().is_some(),
        }
    }

    /// Top `k` offline items: personal entry, else default table, else empty
    pub fn get(&self, user_id: UserId, k: usize) -> Vec<ItemId> {
        let personal = self.personal.read().clone();
        if let Some(recs) = personal.and_then(|table| table.top_k(user_id, k)) {
            self.stats.increment(Counter::PersonalServed);
            debug!(user_id = user_id, count = recs.len(), "Found personal recommendations");
            self.log_items(&recs);
            return recs;
        }

        let default = self.default.read().clone();
        if let Some(table) = default {
            let recs = table.top_k(k);
            self.stats.increment(Counter::DefaultServed);
            debug!(user_id = user_id, count = recs.len(), "Found default recommendations");
            self.log_items(&recs);
            return recs;
        }

        debug!(user_id = user_id, "No offline recommendations loaded");
        Vec::new()
    }

    fn log_items(&self, items: &[ItemId]) {
        let Some(catalog) = &self.catalog else {
            return;
        };
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        for item_id in items {
            if let Some(info) = catalog.describe(*item_id) {
                debug!(
                    item_id = info.item_id,
                    track = %info.track_name,
                    artists = %info.artists_names,
                    "Served item"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::io::Write;

    fn store() -> (OfflineRecommendationStore, Arc<StatsCollector>) {
        let stats = Arc::new(StatsCollector::new());
        (OfflineRecommendationStore::new(Arc::clone(&stats)), stats)
    }

    fn personal(rows: &[(UserId, ItemId, u32)]) -> PersonalTable {
        PersonalTable::from_rows(
            rows.iter()
                .map(|&(user_id, item_id, rank)| PersonalRow {
                    user_id,
                    item_id,
                    rank,
                })
                .collect(),
        )
    }

    fn popular(items: &[ItemId]) -> DefaultTable {
        DefaultTable::from_rows(
            items
                .iter()
                .enumerate()
                .map(|(rank, &item_id)| DefaultRow {
                    item_id,
                    rank: rank as u32,
                })
                .collect(),
        )
    }

    #[test]
    fn test_personal_entry_takes_precedence() {
        let (store, stats) = store();
        store.install_personal(personal(&[(1, 10, 1), (1, 11, 2), (1, 12, 3)]));
        store.install_default(popular(&[100, 101]));

        assert_eq!(store.get(1, 2), vec![10, 11]);
        assert_eq!(stats.get(Counter::PersonalServed), 1);
        assert_eq!(stats.get(Counter::DefaultServed), 0);
    }

    #[test]
    fn test_unknown_user_falls_back_to_default() {
        let (store, stats) = store();
        store.install_personal(personal(&[(1, 10, 1)]));
        store.install_default(popular(&[100, 101, 102]));

        assert_eq!(store.get(2, 2), vec![100, 101]);
        assert_eq!(stats.get(Counter::DefaultServed), 1);
    }

    #[test]
    fn test_default_only() {
        let (store, _) = store();
        store.install_default(popular(&[5, 6]));

        assert_eq!(store.get(1, 10), vec![5, 6]);
    }

    #[test]
    fn test_nothing_loaded_is_empty_and_uncounted() {
        let (store, stats) = store();

        assert!(store.get(1, 10).is_empty());
        assert_eq!(stats.get(Counter::PersonalServed), 0);
        assert_eq!(stats.get(Counter::DefaultServed), 0);
    }

    #[test]
    fn test_failed_load_keeps_previous_table() {
        let (store, _) = store();
        store.install_default(popular(&[1, 2, 3]));

        let result = store.load(RecKind::Default, Path::new("/nonexistent/top_popular.csv"));
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(store.get(9, 10), vec![1, 2, 3]);

        let mut corrupt = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(corrupt, "item_id,rank\n4,1\nbroken,2\n").unwrap();
        assert!(store.load(RecKind::Default, corrupt.path()).is_err());
        assert_eq!(store.get(9, 10), vec![1, 2, 3]);
    }

    #[test]
    fn test_load_replaces_table() {
        let (store, _) = store();
        assert!(!store.is_loaded(RecKind::Personal));

        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "user_id,item_id,rank\n1,7,2\n1,8,1\n2,9,1\n").unwrap();

        let summary = store.load(RecKind::Personal, file.path()).unwrap();
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.users, 2);
        assert!(store.is_loaded(RecKind::Personal));
        assert_eq!(store.get(1, 10), vec![8, 7]);
    }
}
