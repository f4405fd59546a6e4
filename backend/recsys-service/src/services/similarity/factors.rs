use super::SimilarityIndex;
use crate::error::{AppError, Result};
use crate::models::{ItemId, ScoredItem};
use ndarray::{Array2, Axis};
use std::collections::HashMap;

/// Cosine similarity over item factor vectors
///
/// Rows are L2-normalised once at construction, so a lookup is a single
/// matrix-vector product followed by a top-n selection.
pub struct FactorIndex {
    item_ids: Vec<ItemId>,
    positions: HashMap<ItemId, usize>,
    factors: Array2<f32>,
}

impl FactorIndex {
    pub fn new(item_ids: Vec<ItemId>, rows: Vec<Vec<f32>>) -> Result<Self> {
        if item_ids.len() != rows.len() {
            return Err(AppError::Load(format!(
                "{} item ids but {} factor rows",
                item_ids.len(),
                rows.len()
            )));
        }

        let dims = rows.first().map(Vec::len).unwrap_or(0);
        let mut positions = HashMap::with_capacity(item_ids.len());
        for (pos, item_id) in item_ids.iter().enumerate() {
            if positions.insert(*item_id, pos).is_some() {
                return Err(AppError::Load(format!("duplicate item id {}", item_id)));
            }
        }

        let mut flat = Vec::with_capacity(rows.len() * dims);
        for (row, item_id) in rows.iter().zip(&item_ids) {
            if row.len() != dims {
                return Err(AppError::Load(format!(
                    "item {} has {} factors, expected {}",
                    item_id,
                    row.len(),
                    dims
                )));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(AppError::Load(format!(
                    "item {} has non-finite factors",
                    item_id
                )));
            }
            flat.extend_from_slice(row);
        }

        let mut factors = Array2::from_shape_vec((rows.len(), dims), flat)?;
        for mut row in factors.axis_iter_mut(Axis(0)) {
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|v| v / norm);
            }
        }

        Ok(Self {
            item_ids,
            positions,
            factors,
        })
    }
}

impl SimilarityIndex for FactorIndex {
    fn similar(&self, item_id: ItemId, n: usize) -> Vec<ScoredItem> {
        let Some(&pos) = self.positions.get(&item_id) else {
            return Vec::new();
        };
        if n == 0 {
            return Vec::new();
        }

        let query = self.factors.row(pos);
        let scores = self.factors.dot(&query);

        let mut scored: Vec<ScoredItem> = scores
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != pos)
            .map(|(idx, score)| ScoredItem::new(self.item_ids[idx], *score))
            .collect();
        // Stable: ties keep row order
        scored.sort_by(ScoredItem::by_score_desc);
        scored.truncate(n);
        scored
    }

    fn item_count(&self) -> usize {
        self.item_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> FactorIndex {
        FactorIndex::new(
            vec![1, 2, 3, 4],
            vec![
                vec![1.0, 0.0],
                vec![2.0, 0.1],
                vec![0.0, 1.0],
                vec![-1.0, 0.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_cosine_ranking_excludes_query() {
        let ids: Vec<ItemId> = index().similar(1, 10).iter().map(|s| s.item_id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_scores_are_cosine() {
        let result = index().similar(1, 3);
        assert!((result[1].score - 0.0).abs() < 1e-6);
        assert!((result[2].score + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_top_n_and_unknown() {
        let index = index();
        assert_eq!(index.similar(3, 1).len(), 1);
        assert!(index.similar(3, 0).is_empty());
        assert!(index.similar(42, 3).is_empty());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let result = FactorIndex::new(vec![1, 2], vec![vec![1.0, 0.0], vec![1.0]]);
        assert!(matches!(result, Err(AppError::Load(_))));

        let result = FactorIndex::new(vec![1], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = FactorIndex::new(vec![1, 1], vec![vec![1.0], vec![2.0]]);
        assert!(result.is_err());
    }
}
