pub mod blender;
pub mod catalog;
pub mod events;
pub mod offline;
pub mod online;
pub mod recommendation;
pub mod similarity;
pub mod stats;

pub use blender::blend;
pub use catalog::ItemCatalog;
pub use events::EventStore;
pub use offline::OfflineRecommendationStore;
pub use online::OnlineRecommender;
pub use recommendation::RecommendationService;
pub use similarity::{FactorIndex, NeighborIndex, SimilarityIndex};
pub use stats::{Counter, StatsCollector};
