// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gallery photo model.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Photo stored in the community gallery. The image itself lives on the
/// upload host; we only keep its URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Backend record ID
    pub id: String,
    /// Uploader's wallet address
    pub wallet_address: String,
    pub image_url: String,
    #[serde(default)]
    pub caption: Option<String>,
    pub created_at: String,
}

/// New photo submitted for the gallery.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewPhoto {
    #[validate(length(min = 32, max = 44))]
    pub wallet_address: String,
    #[validate(url)]
    pub image_url: String,
    #[validate(length(max = 280))]
    pub caption: Option<String>,
}
