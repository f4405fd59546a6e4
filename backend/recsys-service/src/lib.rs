pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use services::{
    blend, EventStore, OfflineRecommendationStore, OnlineRecommender, RecommendationService,
    SimilarityIndex, StatsCollector,
};
