// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HTTP request handlers for the REST API.
//!
//! Reads are served locally on any node. Writes (register, set-config)
//! run locally on the primary and are forwarded to the primary from
//! replicas, so clients may talk to any node.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use regatta::{CompatibilityLevel, ConfigScope, RegistryError};

use crate::AppState;

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// API error response body: `{"error_code": ..., "message": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error_code: u32,
    pub message: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.error_code {
            40401..=40403 => StatusCode::NOT_FOUND,
            42201..=42203 => StatusCode::UNPROCESSABLE_ENTITY,
            40901 => StatusCode::CONFLICT,
            50001 | 50003 => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self {
            error_code: err.error_code(),
            message: err.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SchemaBody {
    pub schema: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: u32,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub subject: String,
    pub version: u32,
    pub id: u32,
    pub schema: String,
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub schema: String,
}

#[derive(Debug, Serialize)]
pub struct CompatibilityResponse {
    pub is_compatible: bool,
}

#[derive(Debug, Deserialize)]
pub struct ConfigBody {
    pub compatibility: String,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    #[serde(rename = "compatibilityLevel")]
    pub compatibility_level: String,
}

#[derive(Debug, Serialize)]
pub struct ConfigSetResponse {
    pub compatibility: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub node: String,
    pub role: &'static str,
    pub committed_offset: u64,
}

// ---------------------------------------------------------------------------
// Write handlers (forwarded from replicas)
// ---------------------------------------------------------------------------

/// POST /subjects/{subject}/versions
pub async fn register(
    State(state): State<Arc<AppState>>,
    Path(subject): Path<String>,
    Json(body): Json<SchemaBody>,
) -> Result<Response, ApiError> {
    if let Some(endpoint) = state.registry.coordinator().primary_endpoint() {
        let path = format!("/subjects/{}/versions", subject);
        return state
            .forwarder
            .forward_json(reqwest::Method::POST, &endpoint, &path, &serde_json::json!({ "schema": body.schema }))
            .await;
    }

    let id = state.registry.register(&subject, &body.schema).await?;
    Ok(Json(RegisterResponse { id }).into_response())
}

/// PUT /config
pub async fn set_global_config(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConfigBody>,
) -> Result<Response, ApiError> {
    set_config(state, ConfigScope::Global, body).await
}

/// PUT /config/{subject}
pub async fn set_subject_config(
    State(state): State<Arc<AppState>>,
    Path(subject): Path<String>,
    Json(body): Json<ConfigBody>,
) -> Result<Response, ApiError> {
    set_config(state, ConfigScope::Subject(subject), body).await
}

async fn set_config(
    state: Arc<AppState>,
    scope: ConfigScope,
    body: ConfigBody,
) -> Result<Response, ApiError> {
    if let Some(endpoint) = state.registry.coordinator().primary_endpoint() {
        let path = match &scope {
            ConfigScope::Global => "/config".to_string(),
            ConfigScope::Subject(subject) => format!("/config/{}", subject),
        };
        return state
            .forwarder
            .forward_json(
                reqwest::Method::PUT,
                &endpoint,
                &path,
                &serde_json::json!({ "compatibility": body.compatibility }),
            )
            .await;
    }

    let level: CompatibilityLevel = body.compatibility.parse().map_err(|_| ApiError {
        error_code: 42203,
        message: format!("unknown compatibility level: {}", body.compatibility),
    })?;

    state.registry.set_config(scope, level).await?;
    Ok(Json(ConfigSetResponse {
        compatibility: level.as_str().to_string(),
    })
    .into_response())
}

// ---------------------------------------------------------------------------
// Read handlers (served locally on any node)
// ---------------------------------------------------------------------------

/// POST /subjects/{subject}
pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Path(subject): Path<String>,
    Json(body): Json<SchemaBody>,
) -> Result<Json<VersionResponse>, ApiError> {
    let record = state.registry.lookup(&subject, &body.schema)?;
    Ok(Json(VersionResponse {
        subject: record.subject,
        version: record.version,
        id: record.schema_id,
        schema: record.schema,
    }))
}

/// GET /schemas/ids/{id}
pub async fn get_schema_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<SchemaResponse>, ApiError> {
    let schema = state.registry.get_schema_by_id(id)?;
    Ok(Json(SchemaResponse { schema }))
}

/// GET /subjects
pub async fn list_subjects(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.registry.list_subjects())
}

/// GET /subjects/{subject}/versions
pub async fn list_versions(
    State(state): State<Arc<AppState>>,
    Path(subject): Path<String>,
) -> Result<Json<Vec<u32>>, ApiError> {
    Ok(Json(state.registry.list_versions(&subject)?))
}

/// GET /subjects/{subject}/versions/{version}
pub async fn get_version(
    State(state): State<Arc<AppState>>,
    Path((subject, version)): Path<(String, String)>,
) -> Result<Json<VersionResponse>, ApiError> {
    let record = state.registry.get_version(&subject, &version)?;
    Ok(Json(VersionResponse {
        subject: record.subject,
        version: record.version,
        id: record.schema_id,
        schema: record.schema,
    }))
}

/// POST /compatibility/subjects/{subject}/versions/{version}
pub async fn test_compatibility(
    State(state): State<Arc<AppState>>,
    Path((subject, version)): Path<(String, String)>,
    Json(body): Json<SchemaBody>,
) -> Result<Json<CompatibilityResponse>, ApiError> {
    let is_compatible = state
        .registry
        .test_compatibility(&subject, &body.schema, &version)?;
    Ok(Json(CompatibilityResponse { is_compatible }))
}

/// GET /config
pub async fn get_global_config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    // The global scope always has a value.
    let level = state
        .registry
        .get_config(&ConfigScope::Global)
        .unwrap_or(CompatibilityLevel::None);
    Json(ConfigResponse {
        compatibility_level: level.as_str().to_string(),
    })
}

/// GET /config/{subject}
///
/// Returns 404 when the subject has no config entry of its own; this never
/// falls back to the global level, mirroring the write side where setting
/// config for an unknown subject succeeds.
pub async fn get_subject_config(
    State(state): State<Arc<AppState>>,
    Path(subject): Path<String>,
) -> Result<Json<ConfigResponse>, ApiError> {
    match state
        .registry
        .get_config(&ConfigScope::Subject(subject.clone()))
    {
        Some(level) => Ok(Json(ConfigResponse {
            compatibility_level: level.as_str().to_string(),
        })),
        None => Err(RegistryError::SubjectNotFound(subject).into()),
    }
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let role = if state.registry.coordinator().is_primary() {
        "primary"
    } else {
        "replica"
    };
    Json(HealthResponse {
        status: "ok",
        node: state.node_id.clone(),
        role,
        committed_offset: state.registry.state().committed_offset(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_to_expected_statuses() {
        let cases = [
            (RegistryError::SubjectNotFound("s".into()), StatusCode::NOT_FOUND),
            (RegistryError::VersionNotFound(9), StatusCode::NOT_FOUND),
            (RegistryError::SchemaNotFound, StatusCode::NOT_FOUND),
            (RegistryError::InvalidSchema("bad".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (RegistryError::InvalidVersion("earliest".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (RegistryError::IncompatibleSchema("f".into()), StatusCode::CONFLICT),
            (RegistryError::NotPrimary(None), StatusCode::SERVICE_UNAVAILABLE),
            (RegistryError::LogUnavailable("io".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (err, expected) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status(), expected, "code {}", api.error_code);
        }
    }

    #[test]
    fn config_response_uses_confluent_field_name() {
        let body = serde_json::to_value(ConfigResponse {
            compatibility_level: "FORWARD".to_string(),
        })
        .unwrap();
        assert_eq!(body["compatibilityLevel"], "FORWARD");
    }

    #[test]
    fn error_body_shape() {
        let api: ApiError = RegistryError::SchemaNotFound.into();
        let body = serde_json::to_value(&api).unwrap();
        assert_eq!(body["error_code"], 40403);
        assert!(body["message"].as_str().unwrap().contains("not found"));
    }
}
