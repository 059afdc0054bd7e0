// src/services/system_service.rs

use chrono::Utc;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{user_repo::NewUser, RbacRepository, StationRepository, UserRepository},
    models::{
        rbac::RoleTag,
        station::station_code,
        system::{InitializePayload, SystemState},
        user::UserProfile,
    },
    services::{auth::hash_password, user_service::unique_matricule},
};

#[derive(Clone)]
pub struct SystemService {
    user_repo: UserRepository,
    rbac_repo: RbacRepository,
    station_repo: StationRepository,
    pool: PgPool,
}

impl SystemService {
    pub fn new(
        user_repo: UserRepository,
        rbac_repo: RbacRepository,
        station_repo: StationRepository,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, rbac_repo, station_repo, pool }
    }

    /// O sistema está inicializado assim que existe um ADMIN.
    pub async fn state(&self) -> Result<SystemState, AppError> {
        let initialised = self.rbac_repo.admin_exists(&self.pool).await?;
        Ok(SystemState { initialised })
    }

    /// Primeiro arranque: cria o posto inicial e o administrador, atomicamente.
    pub async fn initialize(&self, payload: InitializePayload) -> Result<UserProfile, AppError> {
        let email = payload.email.trim().to_lowercase();
        let password_hash = hash_password(&payload.password).await?;

        // 1. Inicia a transação e tranca o papel ADMIN (dois arranques simultâneos ficam em fila)
        let mut tx = self.pool.begin().await?;
        let admin_role = self.rbac_repo.lock_admin_role(&mut *tx).await?;

        if self.rbac_repo.admin_exists(&mut *tx).await? {
            return Err(AppError::AlreadyInitialized);
        }
        if self.user_repo.email_exists(&mut *tx, &email, None).await? {
            return Err(AppError::EmailAlreadyExists);
        }

        // 2. Posto inicial
        let phone = payload
            .station_phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        let station = self
            .station_repo
            .create(
                &mut *tx,
                &station_code(Utc::now()),
                payload.station_name.trim(),
                payload.address.trim(),
                phone,
            )
            .await?;

        // 3. Administrador ativo
        let tags = [RoleTag::Admin];
        let matricule = unique_matricule(&self.user_repo, &mut tx, &tags).await?;
        let admin = self
            .user_repo
            .create(
                &mut *tx,
                NewUser {
                    matricule: &matricule,
                    last_name: payload.admin_last_name.trim(),
                    first_name: payload.admin_first_name.trim(),
                    email: &email,
                    password_hash: &password_hash,
                    is_active: true,
                    station_id: station.id,
                    reset_token: None,
                    reset_token_expires_at: None,
                },
            )
            .await?;
        self.rbac_repo.add_role(&mut *tx, admin.id, admin_role.id).await?;

        // 4. Commit
        tx.commit().await?;

        tracing::info!("🚀 Sistema inicializado: posto {} e administrador {}", station.unique_code, admin.matricule);
        Ok(UserProfile::from_parts(&admin, tags.to_vec()))
    }
}
