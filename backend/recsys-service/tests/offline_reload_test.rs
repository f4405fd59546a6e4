use recsys_service::models::{PersonalRow, RecKind};
use recsys_service::services::offline::PersonalTable;
use recsys_service::{OfflineRecommendationStore, StatsCollector};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const USER: i64 = 1;
const K: usize = 20;

fn snapshot_items(base: i64) -> Vec<i64> {
    (base..base + K as i64).collect()
}

fn table(base: i64) -> PersonalTable {
    PersonalTable::from_rows(
        snapshot_items(base)
            .into_iter()
            .enumerate()
            .map(|(rank, item_id)| PersonalRow {
                user_id: USER,
                item_id,
                rank: rank as u32,
            })
            .collect(),
    )
}

fn write_snapshot(base: i64) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "user_id,item_id,rank").unwrap();
    for (rank, item_id) in snapshot_items(base).into_iter().enumerate() {
        writeln!(file, "{},{},{}", USER, item_id, rank).unwrap();
    }
    file
}

#[test]
fn test_concurrent_reads_see_exactly_one_snapshot() {
    let store = Arc::new(OfflineRecommendationStore::new(Arc::new(StatsCollector::new())));
    store.install_personal(table(0));

    let old = snapshot_items(0);
    let new = snapshot_items(1000);
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            let (old, new) = (old.clone(), new.clone());
            thread::spawn(move || {
                let mut reads = 0usize;
                while !done.load(Ordering::Relaxed) || reads < 100 {
                    for k in [1, 7, K] {
                        let recs = store.get(USER, k);
                        assert!(
                            recs == old[..k] || recs == new[..k],
                            "mixed snapshot: {:?}",
                            recs
                        );
                    }
                    reads += 1;
                }
            })
        })
        .collect();

    for i in 0..200 {
        let base = if i % 2 == 0 { 1000 } else { 0 };
        store.install_personal(table(base));
    }
    done.store(true, Ordering::Relaxed);

    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn test_concurrent_file_reloads_never_expose_partial_table() {
    let store = Arc::new(OfflineRecommendationStore::new(Arc::new(StatsCollector::new())));
    let old_file = write_snapshot(0);
    let new_file = write_snapshot(500);
    store.load(RecKind::Personal, old_file.path()).unwrap();

    let old = snapshot_items(0);
    let new = snapshot_items(500);
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Relaxed) {
                let recs = store.get(USER, K);
                assert!(recs == old || recs == new, "mixed snapshot: {:?}", recs);
            }
        })
    };

    for i in 0..20 {
        let path = if i % 2 == 0 {
            new_file.path()
        } else {
            old_file.path()
        };
        store.load(RecKind::Personal, path).unwrap();
    }
    done.store(true, Ordering::Relaxed);
    reader.join().unwrap();
}
