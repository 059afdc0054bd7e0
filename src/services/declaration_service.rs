// src/services/declaration_service.rs

use std::sync::Arc;

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::Config,
    db::{
        declaration_repo::{DeclarationChanges, DeclarationFilter},
        DeclarationRepository, DocumentTypeRepository, StationRepository,
    },
    models::{
        declarant::{Declarant, DeclarantSearchPayload},
        declaration::{
            authorize, can_read, next_reference, CreateDeclarationPayload, DeclarationAccess,
            DeclarationDetail, DeclarationStatus, LifecycleAction, NewDeclaration,
            UpdateDeclarationPayload,
        },
        rbac::DeclarationsView,
        user::CurrentUser,
    },
    services::{declarant_service::DeclarantService, document_service::DocumentService, mailer::Mailer},
};

fn blank_to_none(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct DeclarationService {
    repo: DeclarationRepository,
    declarant_service: DeclarantService,
    document_type_repo: DocumentTypeRepository,
    station_repo: StationRepository,
    document_service: DocumentService,
    mailer: Arc<dyn Mailer>,
    config: Arc<Config>,
    pool: PgPool,
}

impl DeclarationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: DeclarationRepository,
        declarant_service: DeclarantService,
        document_type_repo: DocumentTypeRepository,
        station_repo: StationRepository,
        document_service: DocumentService,
        mailer: Arc<dyn Mailer>,
        config: Arc<Config>,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            declarant_service,
            document_type_repo,
            station_repo,
            document_service,
            mailer,
            config,
            pool,
        }
    }

    // ---
    // Criação
    // ---

    pub async fn create(
        &self,
        current: &CurrentUser,
        payload: CreateDeclarationPayload,
    ) -> Result<DeclarationDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        if self.document_type_repo.find_by_id(&mut *tx, payload.document_type_id).await?.is_none() {
            return Err(AppError::ResourceNotFound(payload.document_type_id.to_string()));
        }

        let declarant = self.declarant_service.find_or_create(&mut tx, payload.declarant).await?;

        // Referência: o lock consultivo serializa criações concorrentes
        let prefix = &self.config.reference_prefix;
        self.repo.lock_reference_sequence(&mut *tx, prefix).await?;
        let last = self.repo.last_reference(&mut *tx, prefix).await?;
        let reference = next_reference(prefix, last.as_deref());

        let new = NewDeclaration {
            reference,
            document_type_id: payload.document_type_id,
            document_number: blank_to_none(&payload.document_number).map(str::to_string),
            loss_date: payload.loss_date,
            loss_place: blank_to_none(&payload.loss_place).map(str::to_string),
            circumstances: blank_to_none(&payload.circumstances).map(str::to_string),
            status: payload.status.unwrap_or_default(),
            declarant_id: declarant.id,
            owner_id: current.id(),
            station_id: current.user.station_id,
        };
        let id = self.repo.insert(&mut *tx, &new).await?;
        let detail = self.load(&mut tx, id).await?;

        tx.commit().await?;
        tracing::info!("📝 Declaração {} criada por {}", detail.reference, current.user.matricule);

        self.send_receipt(&detail).await;
        Ok(detail)
    }

    /// Falhas no envio do recibo nunca desfazem a declaração.
    async fn send_receipt(&self, detail: &DeclarationDetail) {
        let Some(email) = detail.declarant.email.clone() else {
            return;
        };

        let station = match detail.station_id {
            Some(id) => self.station_repo.find_by_id(&self.pool, id).await.ok().flatten(),
            None => None,
        };

        let result = match self.document_service.render_receipt(detail, station.as_ref()) {
            Ok(pdf) => self.mailer.send_declaration_receipt(&email, &detail.reference, pdf).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::warn!("⚠️ Recibo {} não enviado para {}: {:?}", detail.reference, email, e);
        }
    }

    // ---
    // Transições
    // ---

    /// Tranca a declaração e aplica capacidade, posse e estado, por esta ordem.
    async fn lock_for(
        &self,
        conn: &mut PgConnection,
        current: &CurrentUser,
        id: Uuid,
        action: LifecycleAction,
    ) -> Result<Uuid, AppError> {
        let (facts, declarant_id) = self
            .repo
            .lock_facts(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(id.to_string()))?;

        authorize(&current.permissions, current.id(), &facts, action)?;
        Ok(declarant_id)
    }

    pub async fn update(
        &self,
        current: &CurrentUser,
        id: Uuid,
        payload: UpdateDeclarationPayload,
    ) -> Result<DeclarationDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        let declarant_id = self.lock_for(&mut tx, current, id, LifecycleAction::Edit).await?;

        if let Some(type_id) = payload.document_type_id {
            if self.document_type_repo.find_by_id(&mut *tx, type_id).await?.is_none() {
                return Err(AppError::ResourceNotFound(type_id.to_string()));
            }
        }

        if let Some(declarant) = payload.declarant {
            self.declarant_service.update(&mut tx, declarant_id, declarant).await?;
        }

        let changes = DeclarationChanges {
            document_type_id: payload.document_type_id,
            document_number: blank_to_none(&payload.document_number),
            loss_date: payload.loss_date,
            loss_place: blank_to_none(&payload.loss_place),
            circumstances: blank_to_none(&payload.circumstances),
            status: payload.status,
        };
        if self.repo.update_fields(&mut *tx, id, &changes, current.id()).await? == 0 {
            return Err(AppError::LifecycleConflict("declaration.deleted_immutable"));
        }

        let detail = self.load(&mut tx, id).await?;
        tx.commit().await?;
        Ok(detail)
    }

    pub async fn change_status(
        &self,
        current: &CurrentUser,
        id: Uuid,
        status: DeclarationStatus,
    ) -> Result<DeclarationDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        self.lock_for(&mut tx, current, id, LifecycleAction::ChangeStatus).await?;

        if self.repo.update_status(&mut *tx, id, status, current.id()).await? == 0 {
            return Err(AppError::LifecycleConflict("declaration.deleted_immutable"));
        }

        let detail = self.load(&mut tx, id).await?;
        tx.commit().await?;
        tracing::info!("🔄 Declaração {} passou a {:?}", detail.reference, status);
        Ok(detail)
    }

    pub async fn soft_delete(&self, current: &CurrentUser, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        self.lock_for(&mut tx, current, id, LifecycleAction::SoftDelete).await?;

        if self.repo.soft_delete(&mut *tx, id, current.id()).await? == 0 {
            return Err(AppError::LifecycleConflict("declaration.already_deleted"));
        }

        tx.commit().await?;
        tracing::info!("🗑️ Declaração {} removida (soft) por {}", id, current.user.matricule);
        Ok(())
    }

    pub async fn restore(&self, current: &CurrentUser, id: Uuid) -> Result<DeclarationDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        self.lock_for(&mut tx, current, id, LifecycleAction::Restore).await?;

        if self.repo.restore(&mut *tx, id, current.id()).await? == 0 {
            return Err(AppError::LifecycleConflict("declaration.not_deleted"));
        }

        let detail = self.load(&mut tx, id).await?;
        tx.commit().await?;
        tracing::info!("♻️ Declaração {} restaurada por {}", detail.reference, current.user.matricule);
        Ok(detail)
    }

    pub async fn hard_delete(&self, current: &CurrentUser, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        self.lock_for(&mut tx, current, id, LifecycleAction::HardDelete).await?;

        if self.repo.hard_delete(&mut *tx, id).await? == 0 {
            return Err(AppError::LifecycleConflict("declaration.hard_delete_requires_soft"));
        }

        tx.commit().await?;
        tracing::info!("💥 Declaração {} apagada definitivamente por {}", id, current.user.matricule);
        Ok(())
    }

    // ---
    // Leitura
    // ---

    async fn load(&self, conn: &mut PgConnection, id: Uuid) -> Result<DeclarationDetail, AppError> {
        self.repo
            .find_by_id(&mut *conn, id)
            .await?
            .map(DeclarationDetail::from)
            .ok_or_else(|| AppError::ResourceNotFound(id.to_string()))
    }

    pub async fn get(&self, current: &CurrentUser, id: Uuid) -> Result<DeclarationDetail, AppError> {
        let record = self
            .repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(id.to_string()))?;

        if !can_read(&current.permissions, current.id(), &record.facts()) {
            return Err(AppError::Forbidden("declaration.not_owner"));
        }
        Ok(record.into())
    }

    pub async fn get_by_reference(&self, current: &CurrentUser, reference: &str) -> Result<DeclarationDetail, AppError> {
        let record = self
            .repo
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(reference.to_string()))?;

        if !can_read(&current.permissions, current.id(), &record.facts()) {
            return Err(AppError::Forbidden("declaration.not_owner"));
        }
        Ok(record.into())
    }

    /// Listagem geral, recortada pela visão do utilizador.
    pub async fn list_visible(&self, current: &CurrentUser) -> Result<Vec<DeclarationDetail>, AppError> {
        let filter = match current.permissions.declarations_view {
            DeclarationsView::All => DeclarationFilter::default(),
            DeclarationsView::Own => DeclarationFilter { user_id: Some(current.id()), ..Default::default() },
            DeclarationsView::None => {
                return Err(AppError::Forbidden("rbac.denied.declarations"));
            }
        };
        self.list(filter).await
    }

    /// As do próprio utilizador, ativas ou removidas.
    pub async fn list_own(&self, current: &CurrentUser, deleted: bool) -> Result<Vec<DeclarationDetail>, AppError> {
        self.list(DeclarationFilter {
            user_id: Some(current.id()),
            deleted: Some(deleted),
            ..Default::default()
        })
        .await
    }

    /// As do posto do utilizador, ativas ou removidas.
    pub async fn list_station(&self, current: &CurrentUser, deleted: bool) -> Result<Vec<DeclarationDetail>, AppError> {
        self.list(DeclarationFilter {
            station_id: Some(current.user.station_id),
            deleted: Some(deleted),
            ..Default::default()
        })
        .await
    }

    async fn list(&self, filter: DeclarationFilter) -> Result<Vec<DeclarationDetail>, AppError> {
        let records = self.repo.list(filter).await?;
        Ok(records.into_iter().map(DeclarationDetail::from).collect())
    }

    pub async fn access(&self, current: &CurrentUser, id: Uuid) -> Result<DeclarationAccess, AppError> {
        let record = self
            .repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(id.to_string()))?;

        let facts = record.facts();
        if !can_read(&current.permissions, current.id(), &facts) {
            return Err(AppError::Forbidden("declaration.not_owner"));
        }
        Ok(DeclarationAccess::evaluate(&current.permissions, current.id(), &facts))
    }

    pub async fn receipt_pdf(&self, current: &CurrentUser, id: Uuid) -> Result<(String, Vec<u8>), AppError> {
        let detail = self.get(current, id).await?;
        let station = match detail.station_id {
            Some(station_id) => self.station_repo.find_by_id(&self.pool, station_id).await?,
            None => None,
        };
        let pdf = self.document_service.render_receipt(&detail, station.as_ref())?;
        Ok((detail.reference, pdf))
    }

    pub async fn search_declarant(&self, payload: &DeclarantSearchPayload) -> Result<Declarant, AppError> {
        self.declarant_service.search(payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::test_support::{seeded, Seeded},
        models::{declarant::DeclarantInput, document_type::DocumentTypePayload, rbac::RoleTag},
    };
    use chrono::NaiveDate;

    async fn passport_type(fx: &Seeded) -> Uuid {
        fx.state
            .document_type_service
            .create(DocumentTypePayload { label: "Passeport".into(), code: None })
            .await
            .unwrap()
            .id
    }

    fn declarant(nina: &str, phone: &str) -> DeclarantInput {
        DeclarantInput {
            last_name: Some("Traoré".into()),
            first_name: Some("Mariam".into()),
            phone: Some(phone.into()),
            nina: Some(nina.into()),
            ..Default::default()
        }
    }

    fn payload(document_type_id: Uuid, declarant: DeclarantInput) -> CreateDeclarationPayload {
        CreateDeclarationPayload {
            document_type_id,
            document_number: Some("AA123456".into()),
            loss_date: NaiveDate::from_ymd_opt(2025, 3, 14),
            loss_place: Some("Marché de Médina Coura".into()),
            circumstances: Some("Sac volé pendant la foire".into()),
            status: Some(DeclarationStatus::Validee),
            declarant,
        }
    }

    // DATABASE_URL=... cargo test -- --ignored

    #[sqlx::test]
    #[ignore = "requer DATABASE_URL"]
    async fn restore_brings_back_every_field(pool: PgPool) {
        let fx = seeded(pool).await;
        let agent = fx.member(&[RoleTag::Agent]).await;
        let type_id = passport_type(&fx).await;
        let service = &fx.state.declaration_service;

        let created = service
            .create(&agent, payload(type_id, declarant("11223344556677", "76000001")))
            .await
            .unwrap();
        assert!(created.reference.starts_with("DECL-BKO-"));

        service.soft_delete(&agent, created.id).await.unwrap();
        let deleted = service.get(&agent, created.id).await.unwrap();
        assert!(deleted.is_deleted);

        let restored = service.restore(&agent, created.id).await.unwrap();
        assert!(!restored.is_deleted);
        assert_eq!(restored.reference, created.reference);
        assert_eq!(restored.document_type_id, created.document_type_id);
        assert_eq!(restored.document_number, created.document_number);
        assert_eq!(restored.loss_date, created.loss_date);
        assert_eq!(restored.loss_place, created.loss_place);
        assert_eq!(restored.circumstances, created.circumstances);
        assert_eq!(restored.status, DeclarationStatus::Validee);
        assert_eq!(restored.owner_id, Some(agent.id()));
        assert_eq!(restored.station_id, created.station_id);
        assert_eq!(restored.declarant.id, created.declarant.id);
        assert_eq!(restored.created_at, created.created_at);
    }

    #[sqlx::test]
    #[ignore = "requer DATABASE_URL"]
    async fn soft_deleted_declaration_refuses_edits(pool: PgPool) {
        let fx = seeded(pool).await;
        let type_id = passport_type(&fx).await;
        let service = &fx.state.declaration_service;

        let created = service
            .create(&fx.admin, payload(type_id, declarant("99887766554433", "76000002")))
            .await
            .unwrap();
        service.soft_delete(&fx.admin, created.id).await.unwrap();

        let edit = UpdateDeclarationPayload { loss_place: Some("Kati".into()), ..Default::default() };
        let err = service.update(&fx.admin, created.id, edit).await.unwrap_err();
        assert!(matches!(err, AppError::LifecycleConflict("declaration.deleted_immutable")), "{:?}", err);

        let err = service
            .change_status(&fx.admin, created.id, DeclarationStatus::Rejetee)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LifecycleConflict("declaration.deleted_immutable")), "{:?}", err);

        let unchanged = service.get(&fx.admin, created.id).await.unwrap();
        assert_eq!(unchanged.loss_place, created.loss_place);
    }

    #[sqlx::test]
    #[ignore = "requer DATABASE_URL"]
    async fn permissions_of_a_foreign_declaration_need_read_access(pool: PgPool) {
        let fx = seeded(pool).await;
        let owner = fx.member(&[RoleTag::Agent]).await;
        let stranger = fx.member(&[RoleTag::Agent]).await;
        let type_id = passport_type(&fx).await;
        let service = &fx.state.declaration_service;

        let created = service
            .create(&owner, payload(type_id, declarant("55443322110099", "76000003")))
            .await
            .unwrap();

        let err = service.access(&stranger, created.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden("declaration.not_owner")), "{:?}", err);

        let own = service.access(&owner, created.id).await.unwrap();
        assert!(own.can_edit);
        assert!(!own.can_delete_permanently);

        let admin = service.access(&fx.admin, created.id).await.unwrap();
        assert!(admin.can_edit);
    }

    #[sqlx::test]
    #[ignore = "requer DATABASE_URL"]
    async fn same_nina_reuses_the_declarant(pool: PgPool) {
        let fx = seeded(pool).await;
        let type_id = passport_type(&fx).await;
        let service = &fx.state.declaration_service;

        let first = service
            .create(&fx.admin, payload(type_id, declarant("12121212121212", "76000004")))
            .await
            .unwrap();
        let second = service
            .create(&fx.admin, payload(type_id, declarant("12121212121212", "76000004")))
            .await
            .unwrap();

        assert_eq!(first.declarant.id, second.declarant.id);
        assert_ne!(first.reference, second.reference);
    }
}
