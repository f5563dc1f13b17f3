//! HTTP routes. Every governance route is scoped by a `:network` segment.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use explorer_types::{Hash, Network, SubjectType};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

type ApiResult = Result<Json<Value>, ApiError>;

/// Path segment under `/:network/dao/` for each subject type.
const SUBJECT_ROUTES: [(&str, SubjectType); 3] = [
    ("proposal", SubjectType::Proposal),
    ("payment-request", SubjectType::PaymentRequest),
    ("consultation/answer", SubjectType::ConsultationAnswer),
];

pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/:network/consensus/parameters", get(parameters))
        .route("/:network/blockcycle", get(block_cycle_at_tip))
        .route("/:network/blockcycle/:height", get(block_cycle))
        .route("/:network/events/block-indexed", post(block_indexed));

    for (segment, subject_type) in SUBJECT_ROUTES {
        let base = format!("/:network/dao/{}/:hash", segment);
        router = router
            .route(
                &format!("{}/votes", base),
                get(move |State(state): State<AppState>, Path((network, hash)): Path<(String, String)>| {
                    votes(state, network, hash, subject_type)
                }),
            )
            .route(
                &format!("{}/trend", base),
                get(move |State(state): State<AppState>, Path((network, hash)): Path<(String, String)>| {
                    trend(state, network, hash, subject_type)
                }),
            )
            .route(
                &format!("{}/cycles", base),
                get(move |State(state): State<AppState>, Path((network, hash)): Path<(String, String)>| {
                    cycles(state, network, hash, subject_type)
                }),
            );
    }

    router.with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

fn parse_network(raw: &str) -> Result<Network, ApiError> {
    raw.parse().map_err(ApiError::BadRequest)
}

fn parse_hash(raw: &str) -> Result<Hash, ApiError> {
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("invalid hash {}: {}", raw, e)))
}

#[instrument(skip(state))]
async fn parameters(State(state): State<AppState>, Path(network): Path<String>) -> ApiResult {
    let engine = state.engine(parse_network(&network)?)?;
    let parameters: Vec<_> = engine.parameters().iter().copied().collect();
    Ok(Json(serde_json::to_value(parameters)?))
}

#[instrument(skip(state))]
async fn block_cycle_at_tip(State(state): State<AppState>, Path(network): Path<String>) -> ApiResult {
    let network = parse_network(&network)?;
    let engine = state.engine(network)?;
    let key = format!("{}/blockcycle", network);
    let value = state
        .cache
        .get_or_compute(&key, || async {
            let info = engine.block_cycle_at_tip().await?;
            Ok::<_, ApiError>(serde_json::to_value(info)?)
        })
        .await?;
    Ok(Json(value))
}

#[instrument(skip(state))]
async fn block_cycle(State(state): State<AppState>, Path((network, height)): Path<(String, u64)>) -> ApiResult {
    let engine = state.engine(parse_network(&network)?)?;
    Ok(Json(serde_json::to_value(engine.block_cycle(height))?))
}

#[instrument(skip(state))]
async fn votes(state: AppState, network: String, hash: String, subject_type: SubjectType) -> ApiResult {
    let network = parse_network(&network)?;
    let hash = parse_hash(&hash)?;
    let engine = state.engine(network)?;
    let key = format!("{}/{}/{}/votes", network, subject_type, hash);

    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();
    let value = state
        .cache
        .get_or_compute(&key, || async {
            let tallies = engine.votes(subject_type, hash, &cancel).await?;
            Ok::<_, ApiError>(serde_json::to_value(tallies)?)
        })
        .await?;
    Ok(Json(value))
}

#[instrument(skip(state))]
async fn trend(state: AppState, network: String, hash: String, subject_type: SubjectType) -> ApiResult {
    let network = parse_network(&network)?;
    let hash = parse_hash(&hash)?;
    let engine = state.engine(network)?;
    let key = format!("{}/{}/{}/trend", network, subject_type, hash);

    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();
    let value = state
        .cache
        .get_or_compute(&key, || async {
            let trend = engine.trend(subject_type, hash, &cancel).await?;
            Ok::<_, ApiError>(serde_json::to_value(trend)?)
        })
        .await?;
    Ok(Json(value))
}

#[instrument(skip(state))]
async fn cycles(state: AppState, network: String, hash: String, subject_type: SubjectType) -> ApiResult {
    let network = parse_network(&network)?;
    let hash = parse_hash(&hash)?;
    let engine = state.engine(network)?;
    let key = format!("{}/{}/{}/cycles", network, subject_type, hash);

    let value = state
        .cache
        .get_or_compute(&key, || async {
            let subject = engine.subject(subject_type, hash).await?;
            let windows = engine.voting_cycles(&subject).await?;
            Ok::<_, ApiError>(serde_json::to_value(windows)?)
        })
        .await?;
    Ok(Json(value))
}

/// New block notification from the indexer: everything cached for the
/// network may now be stale.
#[instrument(skip(state))]
async fn block_indexed(State(state): State<AppState>, Path(network): Path<String>) -> ApiResult {
    let network = parse_network(&network)?;
    state.engine(network)?;
    let refreshed = state.cache.refresh(&format!("{}/", network)).await;
    info!("New block on {}, refreshed {} cached responses", network, refreshed);
    Ok(Json(json!({ "network": network, "refreshed": refreshed })))
}
