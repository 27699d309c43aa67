// Generic CRUD handlers shared by /api/accessories, /api/materials and /api/cabs.
// PUT and PATCH both apply a partial update.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};

use crate::api::{parse_id, JsonBody};
use crate::database::Entity;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/<entity>?make=&status=&unit_color=&category=&supplier=&search=&limit=&offset=
pub async fn list<T: Entity>(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<T>> {
    let filter_data = FilterData::from(params);
    let repo = state.repository::<T>();
    let records = repo.select_any(&filter_data).await?;
    let total = repo.count(&filter_data).await?;
    Ok(ApiResponse::success(records).with_count(total))
}

/// GET /api/<entity>/:id
pub async fn get<T: Entity>(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<T> {
    let id = parse_id(&id)?;
    let record = state.repository::<T>().select_404(id).await?;
    Ok(ApiResponse::success(record))
}

/// POST /api/<entity>
pub async fn create<T: Entity>(State(state): State<AppState>, JsonBody(input): JsonBody<T::Create>) -> ApiResult<T> {
    let record = state.repository::<T>().create(input).await?;
    Ok(ApiResponse::created(record).with_message(format!("{} created successfully", T::LABEL)))
}

/// PUT|PATCH /api/<entity>/:id
pub async fn update<T: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<T::Patch>,
) -> ApiResult<T> {
    let id = parse_id(&id)?;
    let record = state.repository::<T>().update(id, patch).await?;
    Ok(ApiResponse::success(record).with_message(format!("{} updated successfully", T::LABEL)))
}

/// DELETE /api/<entity>/:id
pub async fn delete<T: Entity>(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<T> {
    let id = parse_id(&id)?;
    let record = state.repository::<T>().delete(id).await?;
    tracing::info!(id, entity = T::LABEL, "Deleted record");
    Ok(ApiResponse::success(record).with_message(format!("{} deleted successfully", T::LABEL)))
}
