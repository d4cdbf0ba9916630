use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::fields::{SuccessResponse, TenantQuery};
use super::record_type_from_path;
use crate::models::{JsonMap, StoredRecord};
use crate::services::RecordService;
use crate::utils::ApiError;

/// Bodies carry the tenant id alongside the record fields; it is split off
/// before the payload reaches the schema filter.
fn take_tenant_id(body: &mut JsonMap) -> Result<Uuid, ApiError> {
    body.remove("tenant_id")
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| ApiError::BadRequest("tenant_id is required".to_string()))
}

pub async fn list_records_handler(
    Extension(record_service): Extension<Arc<RecordService>>,
    Path(record_type): Path<String>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<Vec<StoredRecord>>, ApiError> {
    let record_type = record_type_from_path(&record_type)?;
    let records = record_service.list(query.tenant_id, record_type).await?;
    Ok(Json(records))
}

pub async fn create_record_handler(
    Extension(record_service): Extension<Arc<RecordService>>,
    Path(record_type): Path<String>,
    Json(mut body): Json<JsonMap>,
) -> Result<(StatusCode, Json<StoredRecord>), ApiError> {
    let record_type = record_type_from_path(&record_type)?;
    let tenant_id = take_tenant_id(&mut body)?;
    let record = record_service.create(tenant_id, record_type, &body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_record_handler(
    Extension(record_service): Extension<Arc<RecordService>>,
    Path((record_type, id)): Path<(String, Uuid)>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<StoredRecord>, ApiError> {
    let record_type = record_type_from_path(&record_type)?;
    let record = record_service
        .get(query.tenant_id, record_type, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{record_type} {id} not found")))?;
    Ok(Json(record))
}

pub async fn update_record_handler(
    Extension(record_service): Extension<Arc<RecordService>>,
    Path((record_type, id)): Path<(String, Uuid)>,
    Json(mut body): Json<JsonMap>,
) -> Result<Json<StoredRecord>, ApiError> {
    let record_type = record_type_from_path(&record_type)?;
    let tenant_id = take_tenant_id(&mut body)?;
    let record = record_service
        .update(tenant_id, record_type, id, &body)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{record_type} {id} not found")))?;
    Ok(Json(record))
}

pub async fn delete_record_handler(
    Extension(record_service): Extension<Arc<RecordService>>,
    Path((record_type, id)): Path<(String, Uuid)>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let record_type = record_type_from_path(&record_type)?;
    let removed = record_service.delete(query.tenant_id, record_type, id).await?;
    if !removed {
        return Err(ApiError::NotFound(format!("{record_type} {id} not found")));
    }
    Ok(Json(SuccessResponse { success: true }))
}
