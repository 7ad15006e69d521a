// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Community profile model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Profile record stored in the backend, keyed by wallet address.
///
/// Fields this service does not know about are kept in `extra` so a
/// read-modify-write round trip never drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    /// Wallet address (base58, also the record key)
    pub wallet_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_picture_url: Option<String>,
    /// Last synced on-chain membership level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Unknown fields, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProfileRecord {
    /// Fresh record for a wallet that has no profile yet.
    pub fn new(wallet_address: &str, now: &str) -> Self {
        Self {
            wallet_address: wallet_address.to_string(),
            name: None,
            email: None,
            twitter_url: None,
            instagram_url: None,
            website_url: None,
            profile_picture_url: None,
            cover_picture_url: None,
            membership_level: None,
            created_at: Some(now.to_string()),
            updated_at: Some(now.to_string()),
            extra: serde_json::Map::new(),
        }
    }

    /// Set the membership level, leaving every other field untouched.
    pub fn with_membership_level(mut self, level: u32, now: &str) -> Self {
        self.membership_level = Some(level);
        self.updated_at = Some(now.to_string());
        self
    }

    /// Merge a partial update. Fields absent from the patch keep their value.
    pub fn apply(mut self, patch: ProfilePatch, now: &str) -> Self {
        fn merge(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }

        merge(&mut self.name, patch.name);
        merge(&mut self.email, patch.email);
        merge(&mut self.twitter_url, patch.twitter_url);
        merge(&mut self.instagram_url, patch.instagram_url);
        merge(&mut self.website_url, patch.website_url);
        merge(&mut self.profile_picture_url, patch.profile_picture_url);
        merge(&mut self.cover_picture_url, patch.cover_picture_url);

        if self.created_at.is_none() {
            self.created_at = Some(now.to_string());
        }
        self.updated_at = Some(now.to_string());
        self
    }
}

/// Partial profile update submitted by a member.
///
/// `membership_level` is intentionally absent: only the chain sync writes it.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(url)]
    pub twitter_url: Option<String>,
    #[validate(url)]
    pub instagram_url: Option<String>,
    #[validate(url)]
    pub website_url: Option<String>,
    #[validate(url)]
    pub profile_picture_url: Option<String>,
    #[validate(url)]
    pub cover_picture_url: Option<String>,
}

/// Public directory entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MemberSummary {
    pub wallet_address: String,
    pub name: Option<String>,
    pub profile_picture_url: Option<String>,
    pub twitter_url: Option<String>,
    pub instagram_url: Option<String>,
    pub website_url: Option<String>,
    pub membership_level: u32,
}

impl From<ProfileRecord> for MemberSummary {
    fn from(record: ProfileRecord) -> Self {
        Self {
            wallet_address: record.wallet_address,
            name: record.name,
            profile_picture_url: record.profile_picture_url,
            twitter_url: record.twitter_url,
            instagram_url: record.instagram_url,
            website_url: record.website_url,
            membership_level: record.membership_level.unwrap_or(0),
        }
    }
}
