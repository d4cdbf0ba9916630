use axum::{
    extract::{Extension, Multipart, Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use super::fields::TenantQuery;
use super::record_type_from_path;
use crate::models::ImportResult;
use crate::services::{FieldService, ImportService, RecordService};
use crate::spreadsheet::template::{export_records, generate_template, template_filename};
use crate::utils::ApiError;

pub async fn import_handler(
    Extension(import_service): Extension<Arc<ImportService>>,
    Path(record_type): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ImportResult>, ApiError> {
    let record_type = record_type_from_path(&record_type)?;

    let mut tenant_id: Option<Uuid> = None;
    let mut file_data: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;

    // Parse multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "tenant_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid tenant_id: {}", e)))?;
                tenant_id = Some(Uuid::parse_str(&text).map_err(|_| {
                    ApiError::BadRequest("tenant_id must be a UUID".to_string())
                })?);
            }
            "file" => {
                filename = field.file_name().map(|s| s.to_string());
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    let tenant_id =
        tenant_id.ok_or_else(|| ApiError::BadRequest("tenant_id required".to_string()))?;
    let file_data =
        file_data.ok_or_else(|| ApiError::BadRequest("file required".to_string()))?;
    let filename =
        filename.ok_or_else(|| ApiError::BadRequest("filename required".to_string()))?;

    info!(
        "Import upload for tenant {}: {} ({} bytes)",
        tenant_id,
        filename,
        file_data.len()
    );

    match import_service
        .import_file(tenant_id, record_type, &filename, &file_data)
        .await
    {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            error!("Import of {} failed: {}", filename, e);
            Err(e.into())
        }
    }
}

pub async fn template_handler(
    Extension(field_service): Extension<Arc<FieldService>>,
    Path(record_type): Path<String>,
    Query(query): Query<TenantQuery>,
) -> Result<Response, ApiError> {
    let record_type = record_type_from_path(&record_type)?;
    let defs = field_service.list(query.tenant_id, record_type).await?;

    let today = Utc::now().date_naive();
    let bytes = generate_template(&defs, record_type, today)
        .map_err(|e| ApiError::InternalError(format!("Failed to render template: {e}")))?;
    let filename = template_filename(record_type, today);

    Ok(csv_attachment(filename, bytes))
}

pub async fn export_handler(
    Extension(field_service): Extension<Arc<FieldService>>,
    Extension(record_service): Extension<Arc<RecordService>>,
    Path(record_type): Path<String>,
    Query(query): Query<TenantQuery>,
) -> Result<Response, ApiError> {
    let record_type = record_type_from_path(&record_type)?;
    let defs = field_service.list(query.tenant_id, record_type).await?;
    let records = record_service.list(query.tenant_id, record_type).await?;

    let today = Utc::now().date_naive();
    let (filename, bytes) = export_records(&defs, record_type, &records, today)
        .map_err(|e| ApiError::InternalError(format!("Failed to render export: {e}")))?;

    info!(
        "Exported {} {} records for tenant {}",
        records.len(),
        record_type,
        query.tenant_id
    );

    Ok(csv_attachment(filename, bytes))
}

fn csv_attachment(filename: String, bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
