use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::state::AppState;

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Multicab Inventory API",
            "version": version,
            "description": "Inventory and sales backend for surplus multicabs, accessories and materials",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "session": "/api/users/register, /api/users/login (public - token acquisition)",
                "users": "/api/users[/:id] (protected, admin/staff for changes)",
                "accessories": "/api/accessories[/:id] (public reads)",
                "cabs": "/api/cabs[/:id] (public reads)",
                "materials": "/api/materials[/:id] (protected)",
            }
        }
    }))
}

/// GET /health - pings the pool
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unavailable"
                    }
                })),
            )
        }
    }
}
