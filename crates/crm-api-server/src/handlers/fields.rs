use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::record_type_from_path;
use crate::models::{FieldConfigInput, FieldConfigUpdate, FieldDefinition, FieldUpdateOutcome};
use crate::services::FieldService;
use crate::utils::ApiError;

#[derive(Deserialize)]
pub struct TenantQuery {
    pub tenant_id: Uuid,
}

pub async fn list_fields_handler(
    Extension(field_service): Extension<Arc<FieldService>>,
    Path(record_type): Path<String>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<Vec<FieldDefinition>>, ApiError> {
    let record_type = record_type_from_path(&record_type)?;
    let fields = field_service.list(query.tenant_id, record_type).await?;
    Ok(Json(fields))
}

#[derive(Deserialize)]
pub struct UpsertFieldRequest {
    pub tenant_id: Uuid,
    pub field_config: FieldConfigInput,
}

pub async fn upsert_field_handler(
    Extension(field_service): Extension<Arc<FieldService>>,
    Path(record_type): Path<String>,
    Json(request): Json<UpsertFieldRequest>,
) -> Result<Json<FieldDefinition>, ApiError> {
    let record_type = record_type_from_path(&record_type)?;
    let field = field_service
        .upsert(request.tenant_id, record_type, request.field_config)
        .await?;
    Ok(Json(field))
}

#[derive(Deserialize)]
pub struct BulkUpdateRequest {
    pub tenant_id: Uuid,
    pub field_configs: Vec<FieldConfigUpdate>,
}

#[derive(Serialize)]
pub struct BulkUpdateResponse {
    pub updated: usize,
    pub results: Vec<FieldUpdateOutcome>,
}

pub async fn bulk_update_fields_handler(
    Extension(field_service): Extension<Arc<FieldService>>,
    Path(record_type): Path<String>,
    Json(request): Json<BulkUpdateRequest>,
) -> Result<Json<BulkUpdateResponse>, ApiError> {
    let record_type = record_type_from_path(&record_type)?;
    let results = field_service
        .bulk_update(request.tenant_id, record_type, request.field_configs)
        .await?;
    let updated = results.iter().filter(|r| r.success).count();
    Ok(Json(BulkUpdateResponse { updated, results }))
}

#[derive(Deserialize)]
pub struct DeleteFieldQuery {
    pub tenant_id: Uuid,
    pub field_name: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Soft delete: the field is disabled, never removed, and stored record
/// values stay untouched.
pub async fn delete_field_handler(
    Extension(field_service): Extension<Arc<FieldService>>,
    Path(record_type): Path<String>,
    Query(query): Query<DeleteFieldQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let record_type = record_type_from_path(&record_type)?;
    field_service
        .disable(query.tenant_id, record_type, &query.field_name)
        .await?;
    info!(
        "Disabled field '{}' on {} for tenant {}",
        query.field_name, record_type, query.tenant_id
    );
    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Deserialize)]
pub struct SeedRequest {
    pub tenant_id: Uuid,
}

#[derive(Serialize)]
pub struct SeedResponse {
    pub seeded: u64,
}

pub async fn seed_fields_handler(
    Extension(field_service): Extension<Arc<FieldService>>,
    Json(request): Json<SeedRequest>,
) -> Result<Json<SeedResponse>, ApiError> {
    let seeded = field_service.seed_defaults(request.tenant_id).await?;
    Ok(Json(SeedResponse { seeded }))
}
