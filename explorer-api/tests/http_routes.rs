use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use explorer_api::{router, AppState, ResponseCache};
use explorer_governance::{GovernanceEngine, Sources, TallyConfig};
use explorer_store::{SledStore, StoreConfig};
use explorer_types::{
    BlockRef, ConsensusParameter, ConsensusParameterSet, Hash, Network, ParameterId, Proposal,
    SubjectRecord, SubjectStatus, SubjectType, VoteChoice,
};
use serde_json::Value;
use tower::ServiceExt;

const NETWORK: Network = Network::Testnet;

fn proposal_hash() -> Hash {
    Hash([0x11; 32])
}

fn seeded_store() -> Arc<SledStore> {
    let store = SledStore::temporary(StoreConfig::default()).unwrap();
    store
        .put_parameters(&ConsensusParameterSet::new(
            NETWORK,
            vec![
                ConsensusParameter { id: ParameterId::VotingCycleLength, value: 100 },
                ConsensusParameter { id: ParameterId::ProposalMaxVotingCycles, value: 1 },
                ConsensusParameter { id: ParameterId::PaymentRequestMaxVotingCycles, value: 1 },
                ConsensusParameter { id: ParameterId::ConsultationMaxVotingCycles, value: 1 },
            ],
        ))
        .unwrap();
    for height in 0..=350u64 {
        store
            .put_block(NETWORK, BlockRef { height, cycle_index: height / 100 + 1 })
            .unwrap();
    }
    store
        .set_best_block(NETWORK, BlockRef { height: 350, cycle_index: 4 })
        .unwrap();
    store
        .put_subject(
            NETWORK,
            &SubjectRecord::Proposal(Proposal {
                hash: proposal_hash(),
                height: 100,
                status: SubjectStatus::Pending,
                state_height: None,
                requested_amount: 500,
                description: "translations".to_string(),
            }),
        )
        .unwrap();
    for height in 100..110u64 {
        vote(&store, height, VoteChoice::Yes);
    }
    Arc::new(store)
}

fn vote(store: &SledStore, height: u64, choice: VoteChoice) {
    store
        .put_vote(
            NETWORK,
            SubjectType::Proposal,
            &proposal_hash(),
            height,
            &format!("staker{}", height),
            choice,
        )
        .unwrap();
}

async fn app(store: Arc<SledStore>) -> (Router, AppState) {
    let engine = GovernanceEngine::connect(NETWORK, Sources::from_store(store), TallyConfig::default())
        .await
        .unwrap();
    let state = AppState::new(vec![engine], ResponseCache::new(64, Duration::from_secs(600)));
    (router(state.clone()), state)
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn votes_uri() -> String {
    format!("/testnet/dao/proposal/{}/votes", hex::encode(proposal_hash().0))
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app(seeded_store()).await;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_block_cycle_routes() {
    let (app, _) = app(seeded_store()).await;

    let (status, body) = send(&app, "GET", "/testnet/blockcycle/250").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cycleIndex"], 3);
    assert_eq!(body["firstBlockOfCycle"], 200);
    assert_eq!(body["currentHeight"], 250);
    assert_eq!(body["blocksRemaining"], 49);

    let (status, body) = send(&app, "GET", "/testnet/blockcycle").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentHeight"], 350);
}

#[tokio::test]
async fn test_consensus_parameters_route() {
    let (app, _) = app(seeded_store()).await;
    let (status, body) = send(&app, "GET", "/testnet/consensus/parameters").await;
    assert_eq!(status, StatusCode::OK);
    let parameters = body.as_array().unwrap();
    assert_eq!(parameters.len(), 4);
    assert_eq!(parameters[0]["id"], 0);
    assert_eq!(parameters[0]["value"], 100);
}

#[tokio::test]
async fn test_votes_cycles_and_trend() {
    let (app, _) = app(seeded_store()).await;
    let hash = hex::encode(proposal_hash().0);

    let (status, body) = send(&app, "GET", &votes_uri()).await;
    assert_eq!(status, StatusCode::OK);
    let windows = body.as_array().unwrap();
    // 1 max cycle + 2 buffer windows: starts 100, 200, 300 all at or below the tip.
    assert_eq!(windows.len(), 3);
    assert_eq!(windows[0]["yes"], 10);
    assert_eq!(windows[0]["windowIndex"], 0);

    let (status, body) = send(&app, "GET", &format!("/testnet/dao/proposal/{}/cycles", hash)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[2]["start"], 300);
    assert_eq!(body[2]["end"], 399);

    let (status, body) = send(&app, "GET", &format!("/testnet/dao/proposal/{}/trend", hash)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_error_statuses() {
    let (app, _) = app(seeded_store()).await;
    let unknown = hex::encode([0x22; 32]);

    let (status, body) = send(&app, "GET", &format!("/testnet/dao/proposal/{}/votes", unknown)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    let (status, _) = send(&app, "GET", "/testnet/dao/proposal/not-hex/votes").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/atlantis/blockcycle").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Known network without an engine.
    let (status, _) = send(&app, "GET", "/mainnet/blockcycle").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Payment request routes exist but the hash is not a payment request.
    let path = format!("/testnet/dao/payment-request/{}/votes", hex::encode(proposal_hash().0));
    let (status, _) = send(&app, "GET", &path).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_block_indexed_event_refreshes_cache() {
    let store = seeded_store();
    let (app, _) = app(store.clone()).await;

    let (_, before) = send(&app, "GET", &votes_uri()).await;
    assert_eq!(before[0]["yes"], 10);

    vote(&store, 120, VoteChoice::No);
    let (_, cached) = send(&app, "GET", &votes_uri()).await;
    assert_eq!(cached, before);

    let (status, body) = send(&app, "POST", "/testnet/events/block-indexed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refreshed"], 1);

    let (_, after) = send(&app, "GET", &votes_uri()).await;
    assert_eq!(after[0]["no"], 1);
}

#[tokio::test]
async fn test_shutdown_cancels_requests() {
    let (app, state) = app(seeded_store()).await;
    state.shutdown.cancel();
    let (status, _) = send(&app, "GET", &votes_uri()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
