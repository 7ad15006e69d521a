// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chain client for reading membership accounts.
//!
//! Handles:
//! - Membership account address derivation (program-derived address)
//! - Account existence checks and fetches over JSON-RPC
//! - Classifying "account does not exist" apart from every other failure

use crate::models::membership::{AccountDecodeError, MembershipAccount};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use curve25519_dalek::edwards::CompressedEdwardsY;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Seed prefix of membership accounts.
const MEMBERSHIP_SEED: &[u8] = b"membership";
/// Domain separator appended when hashing program-derived addresses.
const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Chain read errors.
///
/// Only [`ChainError::AccountNotFound`] means the account definitely does not
/// exist. Everything else leaves the real state unknown.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("RPC transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Account decode error: {0}")]
    Decode(String),
}

impl ChainError {
    /// True when the account is known to be absent (a valid zero state).
    pub fn is_absent(&self) -> bool {
        matches!(self, ChainError::AccountNotFound(_))
    }
}

impl From<AccountDecodeError> for ChainError {
    fn from(err: AccountDecodeError) -> Self {
        ChainError::Decode(err.to_string())
    }
}

/// Read access to the membership program's accounts.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Deterministic membership account address for a wallet.
    fn derive_account_address(&self, wallet: &str) -> Result<String, ChainError>;

    async fn account_exists(&self, address: &str) -> Result<bool, ChainError>;

    /// Fetch and decode an account. Absent accounts yield
    /// [`ChainError::AccountNotFound`].
    async fn fetch_account(&self, address: &str) -> Result<MembershipAccount, ChainError>;
}

/// Whether `value` is a well-formed base58 public key.
pub fn is_valid_address(value: &str) -> bool {
    decode_pubkey(value).is_ok()
}

/// Decode a base58 public key.
fn decode_pubkey(value: &str) -> Result<[u8; 32], ChainError> {
    let bytes = bs58::decode(value.trim())
        .into_vec()
        .map_err(|e| ChainError::InvalidAddress(format!("{}: {}", value, e)))?;
    bytes
        .try_into()
        .map_err(|_| ChainError::InvalidAddress(format!("{}: expected 32 bytes", value)))
}

/// Hash seeds into a candidate address, rejecting points on the ed25519 curve.
fn create_program_address(seeds: &[&[u8]], program_id: &[u8; 32]) -> Option<[u8; 32]> {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program_id);
    hasher.update(PDA_MARKER);
    let hash: [u8; 32] = hasher.finalize().into();

    if CompressedEdwardsY(hash).decompress().is_some() {
        return None;
    }
    Some(hash)
}

/// Find the program-derived address for `seeds`, searching bumps from 255 down.
pub fn find_program_address(seeds: &[&[u8]], program_id: &[u8; 32]) -> Option<([u8; 32], u8)> {
    (0..=u8::MAX).rev().find_map(|bump| {
        let bump_seed = [bump];
        let mut with_bump: Vec<&[u8]> = seeds.to_vec();
        with_bump.push(&bump_seed);
        create_program_address(&with_bump, program_id).map(|address| (address, bump))
    })
}

/// Membership account address for `wallet` under `program_id` (both base58).
pub fn membership_address(wallet: &str, program_id: &str) -> Result<String, ChainError> {
    let wallet_key = decode_pubkey(wallet)?;
    let program_key = decode_pubkey(program_id)?;

    let (address, _bump) = find_program_address(&[MEMBERSHIP_SEED, &wallet_key], &program_key)
        .ok_or_else(|| ChainError::InvalidAddress(format!("no valid bump for {}", wallet)))?;

    Ok(bs58::encode(address).into_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// SolanaRpcClient - JSON-RPC implementation
// ─────────────────────────────────────────────────────────────────────────────

/// JSON-RPC client for the membership program.
#[derive(Clone)]
pub struct SolanaRpcClient {
    http: reqwest::Client,
    rpc_url: String,
    program_id: String,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct AccountInfoResult {
    value: Option<AccountInfo>,
}

#[derive(Deserialize)]
struct AccountInfo {
    /// `[payload, encoding]`
    data: (String, String),
    owner: String,
}

impl SolanaRpcClient {
    pub fn new(rpc_url: &str, program_id: &str, timeout: Duration) -> Result<Self, ChainError> {
        // Fail fast on a malformed program ID.
        decode_pubkey(program_id)?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            rpc_url: rpc_url.to_string(),
            program_id: program_id.to_string(),
        })
    }

    /// `getAccountInfo` with base64 encoding. `Ok(None)` means absent.
    async fn get_account_info(&self, address: &str) -> Result<Option<AccountInfo>, ChainError> {
        decode_pubkey(address)?;

        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getAccountInfo",
            "params": [address, {"encoding": "base64", "commitment": "confirmed"}]
        });

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ChainError::Transport(format!("HTTP {}: {}", status, text)));
        }

        let parsed: RpcResponse<AccountInfoResult> = response
            .json()
            .await
            .map_err(|e| ChainError::Decode(format!("JSON parse error: {}", e)))?;

        if let Some(err) = parsed.error {
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        parsed
            .result
            .map(|r| r.value)
            .ok_or_else(|| ChainError::Decode("RPC response without result".to_string()))
    }
}

#[async_trait]
impl ChainClient for SolanaRpcClient {
    fn derive_account_address(&self, wallet: &str) -> Result<String, ChainError> {
        membership_address(wallet, &self.program_id)
    }

    async fn account_exists(&self, address: &str) -> Result<bool, ChainError> {
        Ok(self.get_account_info(address).await?.is_some())
    }

    async fn fetch_account(&self, address: &str) -> Result<MembershipAccount, ChainError> {
        let info = self
            .get_account_info(address)
            .await?
            .ok_or_else(|| ChainError::AccountNotFound(address.to_string()))?;

        if info.owner != self.program_id {
            return Err(ChainError::Decode(format!(
                "account {} is owned by {}, not the membership program",
                address, info.owner
            )));
        }

        let (payload, encoding) = info.data;
        if encoding != "base64" {
            return Err(ChainError::Decode(format!("unexpected encoding {}", encoding)));
        }

        let raw = BASE64
            .decode(payload)
            .map_err(|e| ChainError::Decode(e.to_string()))?;

        Ok(MembershipAccount::decode(&raw)?)
    }
}
