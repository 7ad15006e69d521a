// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! REST proxy client for the profile/gallery/winners/schedule backend.

use crate::db::{endpoints, GalleryStore, ProfileStore, ScheduleStore, WinnerStore};
use crate::error::AppError;
use crate::models::{NewPhoto, Photo, ProfileRecord, ScheduledRace, WinnerEntry};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backend proxy client.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl BackendClient {
    /// Create a client for the proxy at `base_url`.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client setup: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, AppError> {
        builder
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))
    }

    /// GET returning `None` on 404.
    async fn get_optional<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
    ) -> Result<Option<T>, AppError> {
        let response = self.send(self.request(reqwest::Method::GET, url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.check_response_json(response).await.map(Some)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let response = self
            .send(self.request(reqwest::Method::GET, url).query(query))
            .await?;
        self.check_response_json(response).await
    }

    /// Check response status and return error if not successful.
    async fn check_response(&self, response: reqwest::Response) -> Result<(), AppError> {
        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Backend(format!("HTTP {}: {}", status, body)))
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Backend(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl ProfileStore for BackendClient {
    async fn get_profile(&self, wallet: &str) -> Result<Option<ProfileRecord>, AppError> {
        let url = self.url(&format!(
            "{}/{}",
            endpoints::PROFILES,
            urlencoding::encode(wallet)
        ));
        self.get_optional(&url).await
    }

    async fn upsert_profile(&self, profile: &ProfileRecord) -> Result<(), AppError> {
        let url = self.url(&format!(
            "{}/{}",
            endpoints::PROFILES,
            urlencoding::encode(&profile.wallet_address)
        ));
        let response = self
            .send(self.request(reqwest::Method::PUT, &url).json(profile))
            .await?;
        self.check_response(response).await
    }

    async fn list_profiles(&self) -> Result<Vec<ProfileRecord>, AppError> {
        self.get_json(&self.url(endpoints::PROFILES), &[]).await
    }
}

#[async_trait]
impl GalleryStore for BackendClient {
    async fn upload_photo(&self, photo: &NewPhoto) -> Result<Photo, AppError> {
        let response = self
            .send(
                self.request(reqwest::Method::POST, &self.url(endpoints::PHOTOS))
                    .json(photo),
            )
            .await?;
        self.check_response_json(response).await
    }

    async fn list_photos(&self) -> Result<Vec<Photo>, AppError> {
        self.get_json(&self.url(endpoints::PHOTOS), &[]).await
    }

    async fn list_photos_by_wallet(&self, wallet: &str) -> Result<Vec<Photo>, AppError> {
        self.get_json(
            &self.url(endpoints::PHOTOS),
            &[("wallet", wallet.to_string())],
        )
        .await
    }

    async fn delete_photo(&self, id: &str) -> Result<bool, AppError> {
        let url = self.url(&format!("{}/{}", endpoints::PHOTOS, urlencoding::encode(id)));
        let response = self.send(self.request(reqwest::Method::DELETE, &url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        self.check_response(response).await?;
        Ok(true)
    }
}

#[derive(Serialize)]
struct SaveWinnersRequest<'a> {
    winners: &'a [WinnerEntry],
}

#[derive(Deserialize)]
struct ExistsResponse {
    exists: bool,
}

#[async_trait]
impl WinnerStore for BackendClient {
    async fn save_winners(&self, winners: &[WinnerEntry]) -> Result<(), AppError> {
        let response = self
            .send(
                self.request(reqwest::Method::POST, &self.url(endpoints::WINNERS))
                    .json(&SaveWinnersRequest { winners }),
            )
            .await?;
        self.check_response(response).await
    }

    async fn exists_for_race(
        &self,
        race_name: &str,
        race_date: &str,
        full_name: &str,
        position: u32,
    ) -> Result<bool, AppError> {
        let response: ExistsResponse = self
            .get_json(
                &self.url(endpoints::WINNERS_EXISTS),
                &[
                    ("raceName", race_name.to_string()),
                    ("raceDate", race_date.to_string()),
                    ("fullName", full_name.to_string()),
                    ("position", position.to_string()),
                ],
            )
            .await?;
        Ok(response.exists)
    }

    async fn list_winners(&self) -> Result<Vec<WinnerEntry>, AppError> {
        self.get_json(&self.url(endpoints::WINNERS), &[]).await
    }

    async fn list_winners_for_race(
        &self,
        race_name: &str,
        race_date: &str,
    ) -> Result<Vec<WinnerEntry>, AppError> {
        self.get_json(
            &self.url(endpoints::WINNERS),
            &[
                ("raceName", race_name.to_string()),
                ("raceDate", race_date.to_string()),
            ],
        )
        .await
    }
}

#[async_trait]
impl ScheduleStore for BackendClient {
    async fn list_schedule(&self) -> Result<Vec<ScheduledRace>, AppError> {
        self.get_json(&self.url(endpoints::SCHEDULE), &[]).await
    }
}
