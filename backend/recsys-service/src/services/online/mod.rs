use crate::models::{ItemId, ScoredItem, UserId};
use crate::services::events::EventStore;
use crate::services::similarity::SimilarityIndex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Online item-to-item recommendations from a user's recent events
///
/// Algorithm:
/// 1. Take up to `k` most recent events for the user
/// 2. For each event, fetch its `n` most similar items
/// 3. Union all pairs, sort by score descending (stable)
/// 4. Keep the first occurrence of each item
///
/// The result is not truncated; the blender applies the final limit.
pub struct OnlineRecommender {
    events: Arc<EventStore>,
    index: Arc<dyn SimilarityIndex>,
}

impl OnlineRecommender {
    pub fn new(events: Arc<EventStore>, index: Arc<dyn SimilarityIndex>) -> Self {
        Self { events, index }
    }

    pub fn get(&self, user_id: UserId, k: usize, n: usize) -> Vec<ItemId> {
        let recent = self.events.get(user_id, k);
        if recent.is_empty() {
            debug!(user_id = user_id, "No recent events, skipping online recommendations");
            return Vec::new();
        }

        let mut candidates: Vec<ScoredItem> = recent
            .iter()
            .flat_map(|item_id| self.index.similar(*item_id, n))
            .collect();

        // Stable: ties keep event recency, then index order
        candidates.sort_by(ScoredItem::by_score_desc);

        let mut seen = HashSet::with_capacity(candidates.len());
        let recs: Vec<ItemId> = candidates
            .into_iter()
            .filter(|candidate| seen.insert(candidate.item_id))
            .map(|candidate| candidate.item_id)
            .collect();

        debug!(
            user_id = user_id,
            seeds = recent.len(),
            count = recs.len(),
            "Online recommendations computed"
        );

        recs
    }
}
