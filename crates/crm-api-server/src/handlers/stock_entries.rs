use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::fields::TenantQuery;
use crate::models::{JsonMap, StoredRecord};
use crate::services::StockEntryService;
use crate::utils::ApiError;

#[derive(Deserialize)]
pub struct CreateStockEntryRequest {
    pub tenant_id: Uuid,
    #[serde(default)]
    pub items: Vec<JsonMap>,
    /// Remaining keys are the header fields (entry_type, remarks, ...)
    #[serde(flatten)]
    pub entry: JsonMap,
}

#[derive(Serialize)]
pub struct StockEntryResponse {
    pub entry: StoredRecord,
    pub items: Vec<StoredRecord>,
}

pub async fn list_stock_entries_handler(
    Extension(stock_service): Extension<Arc<StockEntryService>>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<Vec<StoredRecord>>, ApiError> {
    let entries = stock_service.list(query.tenant_id).await?;
    Ok(Json(entries))
}

pub async fn create_stock_entry_handler(
    Extension(stock_service): Extension<Arc<StockEntryService>>,
    Json(request): Json<CreateStockEntryRequest>,
) -> Result<(StatusCode, Json<StockEntryResponse>), ApiError> {
    let (entry, items) = stock_service
        .create(request.tenant_id, request.entry, request.items)
        .await?;
    Ok((StatusCode::CREATED, Json(StockEntryResponse { entry, items })))
}
