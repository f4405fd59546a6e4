/// Recommendation API Handlers
///
/// HTTP endpoints over the recommendation service. Parameters arrive in the
/// query string; responses are JSON item-id lists.
use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::RecsysConfig;
use crate::error::{AppError, Result};
use crate::models::{ItemId, RecKind, UserId};
use crate::services::RecommendationService;

/// Request-size limits applied to every handler
#[derive(Debug, Clone, Copy)]
pub struct ServingLimits {
    pub default_k: usize,
    pub default_n: usize,
    pub max_k: usize,
    pub max_n: usize,
}

impl ServingLimits {
    fn k(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_k).min(self.max_k)
    }

    fn n(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_n).min(self.max_n)
    }
}

impl From<&RecsysConfig> for ServingLimits {
    fn from(config: &RecsysConfig) -> Self {
        Self {
            default_k: config.default_k,
            default_n: config.default_n,
            max_k: config.max_k,
            max_n: config.max_n,
        }
    }
}

/// Handler state for recommendation endpoints
pub struct RecommendationHandlerState {
    pub service: Arc<RecommendationService>,
    pub limits: ServingLimits,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub user_id: UserId,
    pub k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct OnlineQuery {
    pub user_id: UserId,
    pub k: Option<usize>,
    #[serde(rename = "N")]
    pub n: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct EventQuery {
    pub user_id: UserId,
    pub item_id: ItemId,
}

#[derive(Debug, Deserialize)]
pub struct LoadQuery {
    pub rec_type: String,
    pub file_path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recs: Vec<ItemId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventsResponse {
    pub events: Vec<ItemId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PutEventResponse {
    pub result: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoadResponse {
    pub status: String,
    pub kind: RecKind,
    pub rows: usize,
    pub users: usize,
}

/// POST /recommendations
/// Blended offline + online recommendations
#[post("/recommendations")]
pub async fn recommendations(
    query: web::Query<RecommendationQuery>,
    state: web::Data<RecommendationHandlerState>,
) -> Result<HttpResponse> {
    let k = state.limits.k(query.k);
    let n = state.limits.n(None);

    let recs = state.service.recommend(query.user_id, k, n).await;
    Ok(HttpResponse::Ok().json(RecommendationResponse { recs }))
}

/// POST /recommendations_offline
#[post("/recommendations_offline")]
pub async fn recommendations_offline(
    query: web::Query<RecommendationQuery>,
    state: web::Data<RecommendationHandlerState>,
) -> Result<HttpResponse> {
    let k = state.limits.k(query.k);

    let recs = state.service.offline(query.user_id, k);
    Ok(HttpResponse::Ok().json(RecommendationResponse { recs }))
}

/// POST /get_online_u2i
/// Online recommendations from recent events
#[post("/get_online_u2i")]
pub async fn get_online_u2i(
    query: web::Query<OnlineQuery>,
    state: web::Data<RecommendationHandlerState>,
) -> Result<HttpResponse> {
    let k = state.limits.k(query.k);
    let n = state.limits.n(query.n);
    debug!(user_id = query.user_id, k = k, n = n, "Online recommendations requested");

    let recs = state.service.online(query.user_id, k, n);
    Ok(HttpResponse::Ok().json(RecommendationResponse { recs }))
}

/// POST /put_user_event
#[post("/put_user_event")]
pub async fn put_user_event(
    query: web::Query<EventQuery>,
    state: web::Data<RecommendationHandlerState>,
) -> Result<HttpResponse> {
    state.service.put_event(query.user_id, query.item_id);
    Ok(HttpResponse::Ok().json(PutEventResponse {
        result: "ok".to_string(),
    }))
}

/// POST /get_user_events
#[post("/get_user_events")]
pub async fn get_user_events(
    query: web::Query<RecommendationQuery>,
    state: web::Data<RecommendationHandlerState>,
) -> Result<HttpResponse> {
    let k = state.limits.k(query.k);

    let events = state.service.events(query.user_id, k);
    Ok(HttpResponse::Ok().json(EventsResponse { events }))
}

/// GET /load_recommendations
/// Hot-reload an offline table from disk
#[get("/load_recommendations")]
pub async fn load_recommendations(
    query: web::Query<LoadQuery>,
    state: web::Data<RecommendationHandlerState>,
) -> Result<HttpResponse> {
    let kind: RecKind = query.rec_type.parse()?;
    let path = resolve_path(&query.file_path)?;
    info!(kind = %kind, path = %path.display(), "Reload requested");

    let service = Arc::clone(&state.service);
    let summary = web::block(move || service.load(kind, &path))
        .await
        .map_err(|e| AppError::Internal(format!("load task failed: {}", e)))??;

    Ok(HttpResponse::Ok().json(LoadResponse {
        status: "loaded".to_string(),
        kind: summary.kind,
        rows: summary.rows,
        users: summary.users,
    }))
}

/// GET /get_statistics
#[get("/get_statistics")]
pub async fn get_statistics(state: web::Data<RecommendationHandlerState>) -> HttpResponse {
    let stats: BTreeMap<&'static str, u64> = state.service.stats();
    for (name, value) in &stats {
        info!(counter = name, value = value, "Stats for recommendations");
    }
    HttpResponse::Ok().json(stats)
}

/// GET /health/ready
/// Ready once a default table is available for cold-start users
#[get("/health/ready")]
pub async fn readiness(state: web::Data<RecommendationHandlerState>) -> HttpResponse {
    if state.service.is_loaded(RecKind::Default) {
        HttpResponse::Ok().body("OK")
    } else {
        HttpResponse::ServiceUnavailable().body("default recommendations not loaded")
    }
}

fn resolve_path(raw: &str) -> Result<PathBuf> {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir()
        .map_err(|e| AppError::Internal(format!("cannot resolve working directory: {}", e)))?;
    Ok(cwd.join(path))
}

/// Register every recommendation endpoint
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(|| async { "OK" }))
        .service(readiness)
        .service(recommendations)
        .service(recommendations_offline)
        .service(get_online_u2i)
        .service(put_user_event)
        .service(get_user_events)
        .service(load_recommendations)
        .service(get_statistics);
}
