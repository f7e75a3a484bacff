// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Route definitions for the REST API.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::AppState;

/// Registry API routes (Confluent-shaped).
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/subjects", get(handlers::list_subjects))
        .route("/subjects/{subject}", post(handlers::lookup))
        .route(
            "/subjects/{subject}/versions",
            get(handlers::list_versions).post(handlers::register),
        )
        .route(
            "/subjects/{subject}/versions/{version}",
            get(handlers::get_version),
        )
        .route("/schemas/ids/{id}", get(handlers::get_schema_by_id))
        .route(
            "/compatibility/subjects/{subject}/versions/{version}",
            post(handlers::test_compatibility),
        )
        .route(
            "/config",
            get(handlers::get_global_config).put(handlers::set_global_config),
        )
        .route(
            "/config/{subject}",
            get(handlers::get_subject_config).put(handlers::set_subject_config),
        )
        .route("/health", get(handlers::health))
}
