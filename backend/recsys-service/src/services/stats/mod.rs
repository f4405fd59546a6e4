use crate::metrics;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters tracked by [`StatsCollector`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    PersonalServed,
    DefaultServed,
}

impl Counter {
    pub const ALL: [Counter; 2] = [Counter::PersonalServed, Counter::DefaultServed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Counter::PersonalServed => "personal_served",
            Counter::DefaultServed => "default_served",
        }
    }

    fn branch(&self) -> &'static str {
        match self {
            Counter::PersonalServed => "personal",
            Counter::DefaultServed => "default",
        }
    }
}

/// Monotonic per-branch request counters for the offline store
///
/// Counters never reset; they live as long as the collector.
#[derive(Debug, Default)]
pub struct StatsCollector {
    personal_served: AtomicU64,
    default_served: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, counter: Counter) -> &AtomicU64 {
        match counter {
            Counter::PersonalServed => &self.personal_served,
            Counter::DefaultServed => &self.default_served,
        }
    }

    pub fn increment(&self, counter: Counter) {
        self.slot(counter).fetch_add(1, Ordering::Relaxed);
        metrics::record_offline_served(counter.branch());
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.slot(counter).load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        Counter::ALL
            .iter()
            .map(|counter| (counter.as_str(), self.get(*counter)))
            .collect()
    }
}
