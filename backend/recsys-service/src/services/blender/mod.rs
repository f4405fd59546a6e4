use crate::models::ItemId;
use std::collections::HashSet;

/// Merge online and offline candidates into the final ranked list
///
/// Interleaves starting with online (`on[0], off[0], on[1], off[1], ...`),
/// appends the tail of the longer list, drops repeated items keeping the
/// first occurrence, then truncates to `k`. Deduplication must happen after
/// interleaving and before truncation.
pub fn blend(offline: &[ItemId], online: &[ItemId], k: usize) -> Vec<ItemId> {
    let shared = offline.len().min(online.len());

    let interleaved = online[..shared]
        .iter()
        .zip(&offline[..shared])
        .flat_map(|(on, off)| [*on, *off])
        .chain(online[shared..].iter().copied())
        .chain(offline[shared..].iter().copied());

    let mut seen = HashSet::with_capacity(offline.len() + online.len());
    interleaved
        .filter(|item_id| seen.insert(*item_id))
        .take(k)
        .collect()
}
