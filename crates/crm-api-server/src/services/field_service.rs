use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::database::FieldConfigStore;
use crate::models::{
    FieldConfigInput, FieldConfigUpdate, FieldDefinition, FieldUpdateOutcome, RecordType,
};
use crate::utils::EngineError;

/// Field configuration lifecycle: list, upsert, bulk update, soft disable,
/// tenant seeding. Mandatory fields are protected from disable and delete.
pub struct FieldService {
    store: Arc<dyn FieldConfigStore>,
}

impl FieldService {
    pub fn new(store: Arc<dyn FieldConfigStore>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
    ) -> Result<Vec<FieldDefinition>, EngineError> {
        self.store.list(tenant_id, record_type).await
    }

    pub async fn upsert(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        input: FieldConfigInput,
    ) -> Result<FieldDefinition, EngineError> {
        if input.field_name.trim().is_empty() {
            return Err(EngineError::Validation("field_name is required".to_string()));
        }
        // A mandatory field must also be enabled
        if input.is_mandatory && !input.is_enabled {
            return Err(EngineError::Validation(format!(
                "field '{}' is mandatory and must stay enabled",
                input.field_name
            )));
        }
        self.store.upsert(tenant_id, record_type, input).await
    }

    /// Soft delete: mandatory fields are rejected, everything else is
    /// disabled. Stored record values are never touched.
    pub async fn disable(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        field_name: &str,
    ) -> Result<(), EngineError> {
        self.set_enabled(tenant_id, record_type, field_name, false).await
    }

    pub async fn set_enabled(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        field_name: &str,
        enabled: bool,
    ) -> Result<(), EngineError> {
        if !enabled {
            let field = self
                .store
                .get(tenant_id, record_type, field_name)
                .await?
                .ok_or_else(|| {
                    EngineError::Validation(format!(
                        "unknown field '{field_name}' for {record_type}"
                    ))
                })?;
            if field.is_mandatory {
                warn!(
                    "Rejected disable of mandatory field '{}' for tenant {}",
                    field_name, tenant_id
                );
                return Err(EngineError::MandatoryFieldProtected(field_name.to_string()));
            }
        }
        self.store
            .set_enabled(tenant_id, record_type, field_name, enabled)
            .await
    }

    /// Apply each update independently; a failure on one field never rolls
    /// back the others. The caller gets the full per-field outcome list.
    pub async fn bulk_update(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        updates: Vec<FieldConfigUpdate>,
    ) -> Result<Vec<FieldUpdateOutcome>, EngineError> {
        let mut outcomes = Vec::with_capacity(updates.len());

        for update in updates {
            let field_name = update.field_name.clone();
            let result = self.apply_one(tenant_id, record_type, update).await;
            outcomes.push(match result {
                Ok(()) => FieldUpdateOutcome {
                    field_name,
                    success: true,
                    error: None,
                },
                Err(e) => {
                    warn!("Bulk update failed for field '{}': {}", field_name, e);
                    FieldUpdateOutcome {
                        field_name,
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
            });
        }
        Ok(outcomes)
    }

    async fn apply_one(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        update: FieldConfigUpdate,
    ) -> Result<(), EngineError> {
        if update.is_enabled == Some(false) {
            let field = self
                .store
                .get(tenant_id, record_type, &update.field_name)
                .await?;
            if field.as_ref().is_some_and(|f| f.is_mandatory) {
                return Err(EngineError::MandatoryFieldProtected(
                    update.field_name.clone(),
                ));
            }
        }
        self.store.apply_update(tenant_id, record_type, update).await?;
        Ok(())
    }

    pub async fn seed_defaults(&self, tenant_id: Uuid) -> Result<u64, EngineError> {
        let created = self.store.seed_defaults(tenant_id).await?;
        info!("Seeded {} default field configurations for tenant {}", created, tenant_id);
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::models::FieldType;

    fn service() -> (Arc<MemoryStore>, FieldService) {
        let store = Arc::new(MemoryStore::new());
        let service = FieldService::new(store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn disabling_a_mandatory_field_fails_and_leaves_config_unchanged() {
        let tenant = Uuid::new_v4();
        let (store, service) = service();
        store.seed_defaults(tenant).await.unwrap();

        let err = service
            .disable(tenant, RecordType::Account, "account_name")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::MandatoryFieldProtected(_)));

        let field = FieldConfigStore::get(store.as_ref(), tenant, RecordType::Account, "account_name")
            .await
            .unwrap()
            .unwrap();
        assert!(field.is_enabled);
    }

    #[tokio::test]
    async fn disabling_an_optional_field_succeeds() {
        let tenant = Uuid::new_v4();
        let (store, service) = service();
        store.seed_defaults(tenant).await.unwrap();

        service
            .disable(tenant, RecordType::Account, "website")
            .await
            .unwrap();

        let field = FieldConfigStore::get(store.as_ref(), tenant, RecordType::Account, "website")
            .await
            .unwrap()
            .unwrap();
        assert!(!field.is_enabled);
    }

    #[tokio::test]
    async fn bulk_update_reports_per_field_outcomes() {
        let tenant = Uuid::new_v4();
        let (store, service) = service();
        store.seed_defaults(tenant).await.unwrap();

        let updates = vec![
            FieldConfigUpdate {
                field_name: "website".to_string(),
                is_enabled: Some(false),
                display_order: None,
                field_label: None,
                placeholder: None,
                help_text: None,
            },
            FieldConfigUpdate {
                field_name: "account_name".to_string(),
                is_enabled: Some(false),
                display_order: None,
                field_label: None,
                placeholder: None,
                help_text: None,
            },
            FieldConfigUpdate {
                field_name: "no_such_field".to_string(),
                is_enabled: None,
                display_order: Some(3),
                field_label: None,
                placeholder: None,
                help_text: None,
            },
        ];

        let outcomes = service
            .bulk_update(tenant, RecordType::Account, updates)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success, "mandatory field must not be disabled");
        assert!(!outcomes[2].success, "unknown field must fail");

        // The failure in the middle did not roll back the first update
        let field = FieldConfigStore::get(store.as_ref(), tenant, RecordType::Account, "website")
            .await
            .unwrap()
            .unwrap();
        assert!(!field.is_enabled);
    }

    #[tokio::test]
    async fn upsert_rejects_mandatory_but_disabled() {
        let tenant = Uuid::new_v4();
        let (_store, service) = service();

        let err = service
            .upsert(
                tenant,
                RecordType::Contact,
                FieldConfigInput {
                    field_name: "email".to_string(),
                    field_label: "Email".to_string(),
                    field_type: FieldType::Email,
                    field_options: vec![],
                    is_enabled: false,
                    is_mandatory: true,
                    display_order: 0,
                    field_section: "basic".to_string(),
                    placeholder: None,
                    help_text: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn seeding_twice_creates_nothing_new() {
        let tenant = Uuid::new_v4();
        let (_store, service) = service();

        let first = service.seed_defaults(tenant).await.unwrap();
        let second = service.seed_defaults(tenant).await.unwrap();
        assert!(first > 0);
        assert_eq!(second, 0);
    }
}
