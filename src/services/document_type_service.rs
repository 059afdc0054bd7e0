// src/services/document_type_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::DocumentTypeRepository,
    models::document_type::{DocumentType, DocumentTypePayload},
};

const CODE_MAX_LEN: usize = 20;

/// Código a partir do rótulo: maiúsculas, só A-Z/0-9, espaços viram `_`,
/// no máximo 20 caracteres. Se nada sobrar, `DOC_<epoch millis>`.
pub fn derive_code(label: &str, now_millis: i64) -> String {
    let upper = label.to_uppercase();
    let kept: String = upper
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    let code: String = kept
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(CODE_MAX_LEN)
        .collect();

    if code.is_empty() {
        format!("DOC_{}", now_millis)
    } else {
        code
    }
}

#[derive(Clone)]
pub struct DocumentTypeService {
    repo: DocumentTypeRepository,
    pool: PgPool,
}

impl DocumentTypeService {
    pub fn new(repo: DocumentTypeRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list(&self) -> Result<Vec<DocumentType>, AppError> {
        self.repo.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<DocumentType, AppError> {
        self.repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(id.to_string()))
    }

    pub async fn create(&self, payload: DocumentTypePayload) -> Result<DocumentType, AppError> {
        let (label, code) = self.resolve_fields(&payload, None).await?;
        let created = self.repo.create(&code, &label).await?;
        tracing::info!("📄 Tipo de documento criado: {} ({})", created.label, created.code);
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, payload: DocumentTypePayload) -> Result<DocumentType, AppError> {
        let current = self.get(id).await?;

        // Sem código novo, mantém o atual
        let payload = DocumentTypePayload {
            code: payload.code.or(Some(current.code)),
            ..payload
        };
        let (label, code) = self.resolve_fields(&payload, Some(id)).await?;

        self.repo
            .update(id, &code, &label)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(id.to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if self.repo.find_by_id(&mut *tx, id).await?.is_none() {
            return Err(AppError::ResourceNotFound(id.to_string()));
        }
        if self.repo.count_usages(&mut *tx, id).await? > 0 {
            return Err(AppError::LifecycleConflict("document_type.in_use"));
        }
        self.repo.delete(&mut *tx, id).await?;

        tx.commit().await?;
        tracing::info!("🗑️ Tipo de documento {} removido", id);
        Ok(())
    }

    /// Rótulo aparado e código final, ambos verificados quanto a duplicados.
    async fn resolve_fields(
        &self,
        payload: &DocumentTypePayload,
        excluding: Option<Uuid>,
    ) -> Result<(String, String), AppError> {
        let label = payload.label.trim().to_string();
        if label.is_empty() {
            return Err(AppError::RuleViolation("document_type.label_required"));
        }

        let code = match payload.code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => code.to_uppercase(),
            None => derive_code(&label, Utc::now().timestamp_millis()),
        };

        if self.repo.label_exists(&label, excluding).await? {
            return Err(AppError::Duplicate("document_type.duplicate_label", label));
        }
        if self.repo.code_exists(&code, excluding).await? {
            return Err(AppError::Duplicate("document_type.duplicate_code", code));
        }

        Ok((label, code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::test_support::seeded,
        models::{
            declarant::DeclarantInput,
            declaration::CreateDeclarationPayload,
        },
    };

    #[test]
    fn code_is_uppercased_and_spaces_collapse_to_underscores() {
        assert_eq!(derive_code("Carte  d identite", 0), "CARTE_D_IDENTITE");
        assert_eq!(derive_code("  passeport   biométrique ", 0), "PASSEPORT_BIOMTRIQUE");
    }

    #[test]
    fn punctuation_is_dropped_and_length_is_capped() {
        assert_eq!(derive_code("Permis de conduire (cat. B) 2024", 0), "PERMIS_DE_CONDUIRE_C");
        assert_eq!(derive_code("Permis de conduire (cat. B) 2024", 0).len(), 20);
    }

    #[test]
    fn nothing_left_falls_back_to_timestamp() {
        assert_eq!(derive_code("éèà !!", 1_700_000_000_000), "DOC_1700000000000");
        assert_eq!(derive_code("", 42), "DOC_42");
    }

    #[sqlx::test]
    #[ignore = "requer DATABASE_URL"]
    async fn type_in_use_cannot_be_deleted(pool: PgPool) {
        let fx = seeded(pool).await;
        let types = &fx.state.document_type_service;
        let used = types
            .create(DocumentTypePayload { label: "Carte d'identité".into(), code: None })
            .await
            .unwrap();
        let unused = types
            .create(DocumentTypePayload { label: "Permis de conduire".into(), code: Some("PERMIS".into()) })
            .await
            .unwrap();
        assert_eq!(used.code, "CARTE_DIDENTIT");

        fx.state
            .declaration_service
            .create(
                &fx.admin,
                CreateDeclarationPayload {
                    document_type_id: used.id,
                    document_number: None,
                    loss_date: None,
                    loss_place: None,
                    circumstances: None,
                    status: None,
                    declarant: DeclarantInput {
                        last_name: Some("Cissé".into()),
                        first_name: Some("Bakary".into()),
                        phone: Some("66000001".into()),
                        ..Default::default()
                    },
                },
            )
            .await
            .unwrap();

        let err = types.delete(used.id).await.unwrap_err();
        assert!(matches!(err, AppError::LifecycleConflict("document_type.in_use")), "{:?}", err);
        assert!(types.get(used.id).await.is_ok());

        types.delete(unused.id).await.unwrap();
        assert!(matches!(types.get(unused.id).await, Err(AppError::ResourceNotFound(_))));
    }
}
