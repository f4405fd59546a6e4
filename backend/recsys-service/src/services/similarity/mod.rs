//! Item-to-item similarity lookup
//!
//! The index is produced by an offline training job and is read-only while
//! serving. Two artifact flavours are understood: precomputed neighbour lists
//! and raw item factors from a matrix factorisation model.

mod factors;

pub use factors::FactorIndex;

use crate::error::{AppError, Result};
use crate::models::{ItemId, ScoredItem};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Nearest-neighbour lookup over items
///
/// Contract: at most `n` pairs, descending by score, never containing `item_id`
/// itself. Unknown items yield an empty result.
pub trait SimilarityIndex: Send + Sync {
    fn similar(&self, item_id: ItemId, n: usize) -> Vec<ScoredItem>;

    fn item_count(&self) -> usize;
}

/// Precomputed neighbour lists
#[derive(Debug, Default)]
pub struct NeighborIndex {
    neighbors: HashMap<ItemId, Vec<ScoredItem>>,
}

impl NeighborIndex {
    pub fn new(raw: HashMap<ItemId, Vec<(ItemId, f32)>>) -> Result<Self> {
        let mut neighbors = HashMap::with_capacity(raw.len());

        for (item_id, pairs) in raw {
            let mut list = Vec::with_capacity(pairs.len());
            for (neighbor_id, score) in pairs {
                if !score.is_finite() {
                    return Err(AppError::Load(format!(
                        "non-finite similarity score for item {} -> {}",
                        item_id, neighbor_id
                    )));
                }
                if neighbor_id != item_id {
                    list.push(ScoredItem::new(neighbor_id, score));
                }
            }
            // Stable: equal scores keep artifact order
            list.sort_by(ScoredItem::by_score_desc);
            neighbors.insert(item_id, list);
        }

        Ok(Self { neighbors })
    }
}

impl SimilarityIndex for NeighborIndex {
    fn similar(&self, item_id: ItemId, n: usize) -> Vec<ScoredItem> {
        self.neighbors
            .get(&item_id)
            .map(|list| list.iter().take(n).copied().collect())
            .unwrap_or_default()
    }

    fn item_count(&self) -> usize {
        self.neighbors.len()
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum SimilarityArtifact {
    Neighbors {
        // JSON object keys are strings
        items: HashMap<String, Vec<(ItemId, f32)>>,
    },
    Factors {
        item_ids: Vec<ItemId>,
        factors: Vec<Vec<f32>>,
    },
}

/// Load a similarity model artifact (JSON) from disk
pub fn load_similarity_index(path: &Path) -> Result<Arc<dyn SimilarityIndex>> {
    let file = File::open(path).map_err(|e| {
        AppError::from(e).with_context(&format!("similarity artifact {}", path.display()))
    })?;
    let artifact: SimilarityArtifact = serde_json::from_reader(BufReader::new(file))?;

    let index: Arc<dyn SimilarityIndex> = match artifact {
        SimilarityArtifact::Neighbors { items } => {
            let mut raw = HashMap::with_capacity(items.len());
            for (key, pairs) in items {
                let item_id: ItemId = key.trim().parse().map_err(|_| {
                    AppError::Load(format!("invalid item id '{}' in similarity artifact", key))
                })?;
                if raw.insert(item_id, pairs).is_some() {
                    return Err(AppError::Load(format!(
                        "duplicate item id {} in similarity artifact",
                        item_id
                    )));
                }
            }
            Arc::new(NeighborIndex::new(raw)?)
        }
        SimilarityArtifact::Factors { item_ids, factors } => {
            Arc::new(FactorIndex::new(item_ids, factors)?)
        }
    };

    info!(
        path = %path.display(),
        items = index.item_count(),
        "Similarity index loaded"
    );

    Ok(index)
}
