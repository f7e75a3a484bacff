// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Replica-to-primary write forwarding.
//!
//! A replica relays write requests to the primary endpoint verbatim and
//! passes the primary's status and body straight back to the client, so
//! clients see identical behavior regardless of which node they hit.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use tracing::{debug, warn};

use crate::handlers::ApiError;

pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Forward a JSON request to the primary and relay its response.
    pub async fn forward_json(
        &self,
        method: reqwest::Method,
        primary_endpoint: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", primary_endpoint.trim_end_matches('/'), path);
        debug!(%url, "forwarding write to primary");

        let upstream = self
            .client
            .request(method, &url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "forwarding failed");
                ApiError {
                    error_code: 50003,
                    message: format!("forwarding to primary failed: {}", e),
                }
            })?;

        let status =
            StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        let bytes = upstream.bytes().await.map_err(|e| ApiError {
            error_code: 50003,
            message: format!("reading primary response failed: {}", e),
        })?;

        Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .map_err(|e| ApiError {
                error_code: 50003,
                message: format!("relaying primary response failed: {}", e),
            })
    }
}

impl Default for Forwarder {
    fn default() -> Self {
        Self::new()
    }
}
