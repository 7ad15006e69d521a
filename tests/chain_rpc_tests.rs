// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON-RPC chain client against an in-process fake node.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use paddock_sync::db::{InMemoryBackend, ProfileStore};
use paddock_sync::services::chain::{membership_address, ChainClient, ChainError};
use paddock_sync::services::{MembershipSyncer, SolanaRpcClient, SyncOutcome};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::wallet;

const PROGRAM_ID: &str = "Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS";

#[derive(Clone)]
enum Reply {
    Json(Value),
    ServerError,
}

/// Raw membership account bytes.
fn account_data(owner: u8, level: u8, locks: &[(u64, i64, bool)]) -> Vec<u8> {
    let mut data = vec![0u8; 8];
    data.extend_from_slice(&[owner; 32]);
    data.push(level);
    data.extend_from_slice(&(locks.len() as u32).to_le_bytes());
    for (amount, release, locked) in locks {
        data.extend_from_slice(&amount.to_le_bytes());
        data.extend_from_slice(&release.to_le_bytes());
        data.push(u8::from(*locked));
    }
    data
}

fn account_reply(owner_program: &str, data: &[u8]) -> Reply {
    Reply::Json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "context": {"slot": 1},
            "value": {
                "data": [BASE64.encode(data), "base64"],
                "executable": false,
                "lamports": 2_039_280,
                "owner": owner_program,
                "rentEpoch": 0
            }
        }
    }))
}

async fn rpc(
    State(accounts): State<Arc<HashMap<String, Reply>>>,
    Json(request): Json<Value>,
) -> impl IntoResponse {
    let address = request["params"][0].as_str().unwrap_or_default();
    match accounts.get(address) {
        Some(Reply::Json(body)) => (StatusCode::OK, Json(body.clone())),
        Some(Reply::ServerError) => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
        None => (
            StatusCode::OK,
            Json(json!({"jsonrpc": "2.0", "id": 1, "result": {"context": {"slot": 1}, "value": null}})),
        ),
    }
}

fn address(fill: u8) -> String {
    membership_address(&wallet(fill), PROGRAM_ID).unwrap()
}

/// Fake node:
/// - wallet 1: level 3 with one active and one released lock
/// - wallet 2: no account
/// - wallet 3: node error
/// - wallet 4: account owned by another program
/// - wallet 5: HTTP 500
async fn spawn_node() -> String {
    let mut accounts = HashMap::new();
    accounts.insert(
        address(1),
        account_reply(
            PROGRAM_ID,
            &account_data(1, 3, &[(5_000_000, 1_900_000_000, true), (1_000, 1_600_000_000, false)]),
        ),
    );
    accounts.insert(
        address(3),
        Reply::Json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32005, "message": "Node is behind by 42 slots"}
        })),
    );
    accounts.insert(
        address(4),
        account_reply("11111111111111111111111111111111", &account_data(4, 9, &[])),
    );
    accounts.insert(address(5), Reply::ServerError);

    let app = Router::new()
        .route("/", post(rpc))
        .with_state(Arc::new(accounts));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/", addr)
}

async fn client() -> SolanaRpcClient {
    SolanaRpcClient::new(&spawn_node().await, PROGRAM_ID, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fetch_decodes_account() {
    let chain = client().await;
    let address = chain.derive_account_address(&wallet(1)).unwrap();

    assert!(chain.account_exists(&address).await.unwrap());
    let account = chain.fetch_account(&address).await.unwrap();

    assert_eq!(account.owner, wallet(1));
    assert_eq!(account.level, 3);
    assert_eq!(account.locks.len(), 2);
    assert_eq!(account.active_locks(), 1);
    assert_eq!(account.locked_amount(), 5_000_000);
}

#[tokio::test]
async fn test_null_value_is_absent() {
    let chain = client().await;
    let address = chain.derive_account_address(&wallet(2)).unwrap();

    assert!(!chain.account_exists(&address).await.unwrap());
    let err = chain.fetch_account(&address).await.unwrap_err();
    assert!(err.is_absent());
}

#[tokio::test]
async fn test_node_errors_are_not_absent() {
    let chain = client().await;

    let err = chain.account_exists(&address(3)).await.unwrap_err();
    assert!(matches!(err, ChainError::Rpc { code: -32005, .. }));
    assert!(!err.is_absent());

    let err = chain.account_exists(&address(5)).await.unwrap_err();
    assert!(matches!(err, ChainError::Transport(_)));

    let err = chain.fetch_account(&address(4)).await.unwrap_err();
    assert!(matches!(err, ChainError::Decode(_)));
}

#[tokio::test]
async fn test_bad_program_id_rejected() {
    assert!(SolanaRpcClient::new("http://127.0.0.1:9/", "not-a-key", Duration::from_secs(1)).is_err());
}

#[tokio::test]
async fn test_sync_through_rpc() {
    let chain = Arc::new(client().await);
    let backend = Arc::new(InMemoryBackend::new());
    let syncer = MembershipSyncer::new(chain, backend.clone());

    let outcome = syncer.sync(&wallet(1)).await.unwrap();
    assert!(matches!(
        outcome,
        SyncOutcome::Synced {
            level: 3,
            active_locks: 1,
            ..
        }
    ));

    // No account: a real zero.
    let outcome = syncer.sync(&wallet(2)).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Synced { level: 0, .. }));

    // Unknown state: nothing written.
    let writes = backend.profile_writes();
    for fill in [3, 4, 5] {
        let outcome = syncer.sync(&wallet(fill)).await.unwrap();
        assert!(!outcome.is_synced());
    }
    assert_eq!(backend.profile_writes(), writes);
    assert!(backend.get_profile(&wallet(3)).await.unwrap().is_none());

    // Malformed wallets are the caller's problem.
    assert!(syncer.sync("0OIl").await.is_err());
}
