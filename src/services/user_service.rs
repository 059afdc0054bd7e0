// src/services/user_service.rs

use std::{collections::HashMap, sync::Arc};

use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::Config,
    db::{user_repo::{NewUser, UserFilter}, RbacRepository, StationRepository, UserRepository},
    models::{
        rbac::{tags_of, Role, RoleTag},
        user::{CreateUserPayload, CurrentUser, UpdateUserPayload, User, UserProfile},
    },
    services::{auth::hash_password, mailer::Mailer},
};

const TEMP_PASSWORD_LEN: usize = 8;
const MATRICULE_ATTEMPTS: usize = 50;

/// Senha provisória: 8 caracteres alfanuméricos.
pub fn generate_temporary_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TEMP_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Prefixo do papel + 4 dígitos.
pub fn random_matricule(prefix: &str) -> String {
    let digits: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("{}{:04}", prefix, digits)
}

fn fallback_matricule(prefix: &str) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("{}{}", prefix, suffix.to_uppercase())
}

/// Matrícula livre para o conjunto de papéis; após várias colisões, sufixo UUID.
pub(crate) async fn unique_matricule(
    user_repo: &UserRepository,
    conn: &mut PgConnection,
    tags: &[RoleTag],
) -> Result<String, AppError> {
    let prefix = RoleTag::matricule_prefix(tags);
    for _ in 0..MATRICULE_ATTEMPTS {
        let candidate = random_matricule(prefix);
        if !user_repo.matricule_exists(&mut *conn, &candidate).await? {
            return Ok(candidate);
        }
    }
    Ok(fallback_matricule(prefix))
}

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    rbac_repo: RbacRepository,
    station_repo: StationRepository,
    mailer: Arc<dyn Mailer>,
    config: Arc<Config>,
    pool: PgPool,
}

impl UserService {
    pub fn new(
        user_repo: UserRepository,
        rbac_repo: RbacRepository,
        station_repo: StationRepository,
        mailer: Arc<dyn Mailer>,
        config: Arc<Config>,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, rbac_repo, station_repo, mailer, config, pool }
    }

    // ---
    // Leituras
    // ---

    pub async fn list(&self, filter: UserFilter) -> Result<Vec<UserProfile>, AppError> {
        let users = self.user_repo.list(filter).await?;
        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();

        let mut roles: HashMap<Uuid, Vec<RoleTag>> = HashMap::new();
        for (user_id, label) in self.rbac_repo.role_labels_of_users(&ids).await? {
            if let Some(tag) = RoleTag::from_label(&label) {
                roles.entry(user_id).or_default().push(tag);
            }
        }

        Ok(users
            .iter()
            .map(|u| UserProfile::from_parts(u, roles.remove(&u.id).unwrap_or_default()))
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<UserProfile, AppError> {
        let mut conn = self.pool.acquire().await?;
        let user = self
            .user_repo
            .find_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(id.to_string()))?;
        self.profile_of(&mut conn, &user).await
    }

    pub async fn exists_admin(&self) -> Result<bool, AppError> {
        self.rbac_repo.admin_exists(&self.pool).await
    }

    // ---
    // Ciclo de vida
    // ---

    pub async fn create(&self, actor: &CurrentUser, payload: CreateUserPayload) -> Result<UserProfile, AppError> {
        let email = payload.email.trim().to_lowercase();
        let mut tx = self.pool.begin().await?;

        if self.user_repo.email_exists(&mut *tx, &email, None).await? {
            return Err(AppError::EmailAlreadyExists);
        }
        if self.station_repo.find_by_id(&mut *tx, payload.station_id).await?.is_none() {
            return Err(AppError::ResourceNotFound(payload.station_id.to_string()));
        }

        // Nasce sempre inativo; o primeiro ADMIN vem da inicialização do sistema
        let roles = self.resolve_roles(&mut tx, &payload.role_ids).await?;
        let tags = tags_of(&roles);
        if tags.contains(&RoleTag::Admin) {
            Self::require_admin_granter(actor)?;
        }
        if tags.contains(&RoleTag::Supervisor) {
            self.ensure_supervisor_slot(&mut tx, payload.station_id, Uuid::nil()).await?;
        }

        let temporary_password = generate_temporary_password();
        let password_hash = hash_password(&temporary_password).await?;
        let reset_token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::hours(self.config.reset_token_ttl_hours);
        let matricule = unique_matricule(&self.user_repo, &mut tx, &tags).await?;

        let user = self
            .user_repo
            .create(
                &mut *tx,
                NewUser {
                    matricule: &matricule,
                    last_name: payload.last_name.trim(),
                    first_name: payload.first_name.trim(),
                    email: &email,
                    password_hash: &password_hash,
                    is_active: false,
                    station_id: payload.station_id,
                    reset_token: Some(&reset_token),
                    reset_token_expires_at: Some(expires_at),
                },
            )
            .await?;
        let role_ids: Vec<Uuid> = roles.iter().map(|r| r.id).collect();
        self.rbac_repo.replace_user_roles(&mut tx, user.id, &role_ids).await?;

        // Sem e-mail enviado, a conta não fica criada
        self.mailer
            .send_account_credentials(&user.email, Some(&temporary_password), &self.config.reset_link(&reset_token))
            .await?;

        tx.commit().await?;
        tracing::info!("👤 Utilizador {} criado ({})", user.matricule, user.email);
        Ok(UserProfile::from_parts(&user, tags))
    }

    pub async fn activate(&self, actor: &CurrentUser, id: Uuid, role_ids: &[Uuid]) -> Result<UserProfile, AppError> {
        if role_ids.is_empty() {
            return Err(AppError::RuleViolation("user.role_required"));
        }

        let (mut tx, _) = self.begin_with_admin_lock().await?;
        let target = self.lock_target(&mut tx, id).await?;
        if target.is_deleted {
            return Err(AppError::LifecycleConflict("user.deleted"));
        }

        // Os papéis são substituídos: perder o ADMIN conta como despromoção
        let current_tags = tags_of(&self.rbac_repo.roles_of_user(&mut *tx, id).await?);
        let was_admin = current_tags.contains(&RoleTag::Admin);
        if was_admin && !actor.permissions.is_admin {
            return Err(AppError::Forbidden("user.admin_protected"));
        }

        let roles = self.resolve_roles(&mut tx, role_ids).await?;
        let tags = tags_of(&roles);
        let admin_before = was_admin && target.is_active;
        let admin_after = tags.contains(&RoleTag::Admin);
        if admin_after && !was_admin {
            Self::require_admin_granter(actor)?;
        }
        if admin_after && !admin_before {
            self.ensure_admin_slot_free(&mut tx, id).await?;
        }
        if admin_before && !admin_after {
            self.ensure_not_last_admin(&mut tx, id).await?;
        }
        if tags.contains(&RoleTag::Supervisor) {
            self.ensure_supervisor_slot(&mut tx, target.station_id, id).await?;
        }

        self.user_repo.set_active(&mut *tx, id, true).await?;
        let ids: Vec<Uuid> = roles.iter().map(|r| r.id).collect();
        self.rbac_repo.replace_user_roles(&mut tx, id, &ids).await?;
        let matricule = unique_matricule(&self.user_repo, &mut tx, &tags).await?;
        self.user_repo.set_matricule(&mut *tx, id, &matricule).await?;

        let profile = self.reload_profile(&mut tx, id).await?;
        tx.commit().await?;
        tracing::info!("✅ Utilizador {} ativado como {}", id, matricule);
        Ok(profile)
    }

    pub async fn deactivate(&self, actor: &CurrentUser, id: Uuid) -> Result<(), AppError> {
        let (mut tx, _) = self.begin_with_admin_lock().await?;
        self.lock_target(&mut tx, id).await?;

        let tags = tags_of(&self.rbac_repo.roles_of_user(&mut *tx, id).await?);
        if tags.contains(&RoleTag::Admin) {
            Self::require_admin_granter(actor).map_err(|_| AppError::Forbidden("user.admin_protected"))?;
            self.ensure_not_last_admin(&mut tx, id).await?;
        }

        self.user_repo.set_active(&mut *tx, id, false).await?;
        tx.commit().await?;
        tracing::info!("⏸️ Utilizador {} desativado", id);
        Ok(())
    }

    pub async fn update(&self, actor: &CurrentUser, id: Uuid, payload: UpdateUserPayload) -> Result<UserProfile, AppError> {
        let (mut tx, _) = self.begin_with_admin_lock().await?;
        let target = self.lock_target(&mut tx, id).await?;
        if target.is_deleted {
            return Err(AppError::LifecycleConflict("user.deleted"));
        }

        let current_tags = tags_of(&self.rbac_repo.roles_of_user(&mut *tx, id).await?);
        let was_admin = current_tags.contains(&RoleTag::Admin);
        if was_admin && !actor.permissions.is_admin {
            return Err(AppError::Forbidden("user.admin_protected"));
        }

        let email = payload
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .unwrap_or_else(|| target.email.clone());
        if self.user_repo.email_exists(&mut *tx, &email, Some(id)).await? {
            return Err(AppError::EmailAlreadyExists);
        }

        let station_id = payload.station_id.unwrap_or(target.station_id);
        if station_id != target.station_id && self.station_repo.find_by_id(&mut *tx, station_id).await?.is_none() {
            return Err(AppError::ResourceNotFound(station_id.to_string()));
        }

        let new_roles = match &payload.role_ids {
            Some(ids) => Some(self.resolve_roles(&mut tx, ids).await?),
            None => None,
        };
        let tags = new_roles.as_deref().map(tags_of).unwrap_or_else(|| current_tags.clone());
        let is_active = payload.is_active.unwrap_or(target.is_active);

        let admin_before = was_admin && target.is_active;
        let admin_after = tags.contains(&RoleTag::Admin) && is_active;
        if tags.contains(&RoleTag::Admin) && !was_admin {
            Self::require_admin_granter(actor)?;
        }
        if admin_after && !admin_before {
            self.ensure_admin_slot_free(&mut tx, id).await?;
        }
        if admin_before && !admin_after {
            self.ensure_not_last_admin(&mut tx, id).await?;
        }
        if tags.contains(&RoleTag::Supervisor) {
            self.ensure_supervisor_slot(&mut tx, station_id, id).await?;
        }

        let last_name = payload.last_name.as_deref().map(str::trim).unwrap_or(target.last_name.as_str());
        let first_name = payload.first_name.as_deref().map(str::trim).unwrap_or(target.first_name.as_str());
        self.user_repo
            .update_profile(&mut *tx, id, last_name, first_name, &email, station_id, is_active)
            .await?;

        if let Some(roles) = &new_roles {
            let ids: Vec<Uuid> = roles.iter().map(|r| r.id).collect();
            self.rbac_repo.replace_user_roles(&mut tx, id, &ids).await?;
            if RoleTag::matricule_prefix(&tags) != RoleTag::matricule_prefix(&current_tags) {
                let matricule = unique_matricule(&self.user_repo, &mut tx, &tags).await?;
                self.user_repo.set_matricule(&mut *tx, id, &matricule).await?;
            }
        }

        if let Some(password) = payload.password.as_deref().filter(|p| !p.is_empty()) {
            let hash = hash_password(password).await?;
            self.user_repo.set_password(&mut *tx, id, &hash).await?;
        }

        let profile = self.reload_profile(&mut tx, id).await?;
        tx.commit().await?;
        Ok(profile)
    }

    pub async fn soft_delete(&self, actor: &CurrentUser, id: Uuid) -> Result<(), AppError> {
        if actor.id() == id {
            return Err(AppError::RuleViolation("user.cannot_delete_self"));
        }

        let (mut tx, _) = self.begin_with_admin_lock().await?;
        self.lock_target(&mut tx, id).await?;

        let tags = tags_of(&self.rbac_repo.roles_of_user(&mut *tx, id).await?);
        if tags.contains(&RoleTag::Admin) {
            if !actor.permissions.is_admin {
                return Err(AppError::Forbidden("user.admin_protected"));
            }
            self.ensure_not_last_admin(&mut tx, id).await?;
        }

        if self.user_repo.soft_delete(&mut *tx, id).await? == 0 {
            return Err(AppError::LifecycleConflict("user.already_deleted"));
        }
        tx.commit().await?;
        tracing::info!("🗑️ Utilizador {} removido (lógico) por {}", id, actor.user.matricule);
        Ok(())
    }

    pub async fn restore(&self, actor: &CurrentUser, id: Uuid, role_ids: &[Uuid]) -> Result<UserProfile, AppError> {
        let (mut tx, _) = self.begin_with_admin_lock().await?;
        let target = self.lock_target(&mut tx, id).await?;
        if !target.is_deleted {
            return Err(AppError::LifecycleConflict("user.not_deleted"));
        }

        let current_tags = tags_of(&self.rbac_repo.roles_of_user(&mut *tx, id).await?);
        if current_tags.contains(&RoleTag::Admin) && !actor.permissions.is_admin {
            return Err(AppError::Forbidden("user.admin_protected"));
        }
        let (roles, tags) = if role_ids.is_empty() {
            (None, current_tags.clone())
        } else {
            let roles = self.resolve_roles(&mut tx, role_ids).await?;
            let tags = tags_of(&roles);
            (Some(roles), tags)
        };

        // A conta volta ativa: o papel ADMIN obedece à mesma regra da ativação
        if tags.contains(&RoleTag::Admin) {
            if !current_tags.contains(&RoleTag::Admin) {
                Self::require_admin_granter(actor)?;
            }
            self.ensure_admin_slot_free(&mut tx, id).await?;
        }
        if tags.contains(&RoleTag::Supervisor) {
            self.ensure_supervisor_slot(&mut tx, target.station_id, id).await?;
        }

        if self.user_repo.restore(&mut *tx, id).await? == 0 {
            return Err(AppError::LifecycleConflict("user.not_deleted"));
        }
        if let Some(roles) = roles {
            let ids: Vec<Uuid> = roles.iter().map(|r| r.id).collect();
            self.rbac_repo.replace_user_roles(&mut tx, id, &ids).await?;
            let matricule = unique_matricule(&self.user_repo, &mut tx, &tags).await?;
            self.user_repo.set_matricule(&mut *tx, id, &matricule).await?;
        }

        let profile = self.reload_profile(&mut tx, id).await?;
        tx.commit().await?;
        tracing::info!("♻️ Utilizador {} restaurado", id);
        Ok(profile)
    }

    pub async fn hard_delete(&self, actor: &CurrentUser, id: Uuid) -> Result<(), AppError> {
        if actor.id() == id {
            return Err(AppError::RuleViolation("user.cannot_delete_self"));
        }

        let mut tx = self.pool.begin().await?;
        self.lock_target(&mut tx, id).await?;

        let tags = tags_of(&self.rbac_repo.roles_of_user(&mut *tx, id).await?);
        if tags.contains(&RoleTag::Admin) {
            return Err(AppError::RuleViolation("user.cannot_delete_admin"));
        }

        self.user_repo.hard_delete(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!("💀 Utilizador {} removido definitivamente por {}", id, actor.user.matricule);
        Ok(())
    }

    /// Passa o papel ADMIN de `old_id` para `new_id` numa só transação.
    pub async fn transfer_admin(&self, old_id: Uuid, new_id: Uuid) -> Result<UserProfile, AppError> {
        if old_id == new_id {
            return Err(AppError::RuleViolation("user.transfer_same_user"));
        }

        let (mut tx, admin_role) = self.begin_with_admin_lock().await?;

        // Ordem fixa dos locks
        let (first, second) = if old_id < new_id { (old_id, new_id) } else { (new_id, old_id) };
        let a = self.lock_target(&mut tx, first).await?;
        let b = self.lock_target(&mut tx, second).await?;
        let new_admin = if a.id == new_id { a } else { b };

        let old_tags = tags_of(&self.rbac_repo.roles_of_user(&mut *tx, old_id).await?);
        if !old_tags.contains(&RoleTag::Admin) {
            return Err(AppError::RuleViolation("user.transfer_source_not_admin"));
        }
        let new_tags = tags_of(&self.rbac_repo.roles_of_user(&mut *tx, new_id).await?);
        if new_tags.contains(&RoleTag::Admin) {
            return Err(AppError::RuleViolation("user.transfer_target_is_admin"));
        }
        if !new_admin.can_log_in() {
            return Err(AppError::RuleViolation("user.transfer_target_inactive"));
        }

        self.rbac_repo.remove_role(&mut *tx, old_id, admin_role.id).await?;
        self.rbac_repo.add_role(&mut *tx, new_id, admin_role.id).await?;

        for user_id in [old_id, new_id] {
            let tags = tags_of(&self.rbac_repo.roles_of_user(&mut *tx, user_id).await?);
            let matricule = unique_matricule(&self.user_repo, &mut tx, &tags).await?;
            self.user_repo.set_matricule(&mut *tx, user_id, &matricule).await?;
        }

        let profile = self.reload_profile(&mut tx, new_id).await?;
        tx.commit().await?;
        tracing::info!("👑 Papel ADMIN transferido de {} para {}", old_id, new_id);
        Ok(profile)
    }

    // ---
    // Regras auxiliares
    // ---

    /// Abre a transação já com a linha do papel ADMIN trancada.
    /// Ordem dos locks: papel ADMIN, depois utilizadores (por id).
    async fn begin_with_admin_lock(&self) -> Result<(Transaction<'static, Postgres>, Role), AppError> {
        let mut tx = self.pool.begin().await?;
        let admin_role = self.rbac_repo.lock_admin_role(&mut *tx).await?;
        Ok((tx, admin_role))
    }

    fn require_admin_granter(actor: &CurrentUser) -> Result<(), AppError> {
        if actor.permissions.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("user.admin_grant_admin_only"))
        }
    }

    /// Recusa se outro ADMIN ativo existir. O papel ADMIN já está trancado.
    async fn ensure_admin_slot_free(&self, conn: &mut PgConnection, target_id: Uuid) -> Result<(), AppError> {
        if self.rbac_repo.count_active_admins(&mut *conn, Some(target_id)).await? > 0 {
            return Err(AppError::RuleViolation("user.single_admin"));
        }
        Ok(())
    }

    async fn ensure_not_last_admin(&self, conn: &mut PgConnection, target_id: Uuid) -> Result<(), AppError> {
        if self.rbac_repo.count_active_admins(&mut *conn, Some(target_id)).await? == 0 {
            return Err(AppError::RuleViolation("user.last_admin"));
        }
        Ok(())
    }

    async fn ensure_supervisor_slot(&self, conn: &mut PgConnection, station_id: Uuid, target_id: Uuid) -> Result<(), AppError> {
        if self.rbac_repo.count_station_supervisors(&mut *conn, station_id, target_id).await? > 0 {
            return Err(AppError::RuleViolation("user.station_has_supervisor"));
        }
        Ok(())
    }

    async fn resolve_roles(&self, conn: &mut PgConnection, ids: &[Uuid]) -> Result<Vec<Role>, AppError> {
        let roles = self.rbac_repo.find_roles_by_ids(&mut *conn, ids).await?;
        if let Some(missing) = ids.iter().find(|id| !roles.iter().any(|r| r.id == **id)) {
            return Err(AppError::ResourceNotFound(missing.to_string()));
        }
        Ok(roles)
    }

    async fn lock_target(&self, conn: &mut PgConnection, id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_by_id_for_update(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(id.to_string()))
    }

    async fn profile_of(&self, conn: &mut PgConnection, user: &User) -> Result<UserProfile, AppError> {
        let roles = self.rbac_repo.roles_of_user(&mut *conn, user.id).await?;
        Ok(UserProfile::from_parts(user, tags_of(&roles)))
    }

    async fn reload_profile(&self, conn: &mut PgConnection, id: Uuid) -> Result<UserProfile, AppError> {
        let user = self.lock_target(conn, id).await?;
        self.profile_of(conn, &user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::test_support::{role_ids, seeded},
        models::station::CreateStationPayload,
    };

    #[test]
    fn temporary_password_is_eight_alphanumerics() {
        let password = generate_temporary_password();
        assert_eq!(password.len(), 8);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, generate_temporary_password());
    }

    #[test]
    fn matricule_keeps_prefix_and_four_digits() {
        for _ in 0..100 {
            let matricule = random_matricule("AGT-");
            assert!(matricule.starts_with("AGT-"));
            let digits = &matricule[4..];
            assert_eq!(digits.len(), 4);
            assert!(digits.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn fallback_matricule_is_uppercase_and_eight_chars() {
        let matricule = fallback_matricule("SUP-");
        assert_eq!(matricule.len(), 12);
        assert_eq!(matricule, matricule.to_uppercase());
    }

    // ---
    // Com base de dados: DATABASE_URL=... cargo test -- --ignored
    // ---

    #[sqlx::test]
    #[ignore = "requer DATABASE_URL"]
    async fn supervisor_cannot_reassign_the_admin_roles(pool: PgPool) {
        let fx = seeded(pool).await;
        let supervisor = fx.member(&[RoleTag::Supervisor]).await;
        let agent_role = role_ids(&fx.state, &[RoleTag::Agent]).await;

        let err = fx
            .state
            .user_service
            .activate(&supervisor, fx.admin.id(), &agent_role)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden("user.admin_protected")), "{:?}", err);
        assert!(fx.state.user_service.exists_admin().await.unwrap());
        let admin = fx.state.user_service.get(fx.admin.id()).await.unwrap();
        assert_eq!(admin.roles, vec![RoleTag::Admin]);
    }

    #[sqlx::test]
    #[ignore = "requer DATABASE_URL"]
    async fn sole_admin_cannot_activate_themselves_out_of_the_role(pool: PgPool) {
        let fx = seeded(pool).await;
        let agent_role = role_ids(&fx.state, &[RoleTag::Agent]).await;

        let err = fx
            .state
            .user_service
            .activate(&fx.admin, fx.admin.id(), &agent_role)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::RuleViolation("user.last_admin")), "{:?}", err);
        assert!(fx.state.user_service.exists_admin().await.unwrap());
    }

    #[sqlx::test]
    #[ignore = "requer DATABASE_URL"]
    async fn second_active_admin_is_refused(pool: PgPool) {
        let fx = seeded(pool).await;
        let agent = fx.member(&[RoleTag::Agent]).await;
        let admin_role = role_ids(&fx.state, &[RoleTag::Admin]).await;

        let err = fx
            .state
            .user_service
            .activate(&fx.admin, agent.id(), &admin_role)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RuleViolation("user.single_admin")), "{:?}", err);

        // Só um ADMIN concede ADMIN
        let supervisor = fx.member(&[RoleTag::Supervisor]).await;
        let err = fx
            .state
            .user_service
            .activate(&supervisor, agent.id(), &admin_role)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden("user.admin_grant_admin_only")), "{:?}", err);
    }

    #[sqlx::test]
    #[ignore = "requer DATABASE_URL"]
    async fn last_admin_cannot_be_deactivated_or_deleted(pool: PgPool) {
        let fx = seeded(pool).await;
        let supervisor = fx.member(&[RoleTag::Supervisor]).await;
        let users = &fx.state.user_service;

        let err = users.deactivate(&fx.admin, fx.admin.id()).await.unwrap_err();
        assert!(matches!(err, AppError::RuleViolation("user.last_admin")), "{:?}", err);

        let err = users.soft_delete(&supervisor, fx.admin.id()).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden("user.admin_protected")), "{:?}", err);

        let admin = users.get(fx.admin.id()).await.unwrap();
        assert!(admin.is_active && !admin.is_deleted);
    }

    #[sqlx::test]
    #[ignore = "requer DATABASE_URL"]
    async fn one_supervisor_per_station(pool: PgPool) {
        let fx = seeded(pool).await;
        fx.member(&[RoleTag::Supervisor]).await;
        let supervisor_role = role_ids(&fx.state, &[RoleTag::Supervisor]).await;

        let err = fx
            .state
            .user_service
            .create(
                &fx.admin,
                CreateUserPayload {
                    last_name: "Sangaré".into(),
                    first_name: "Oumar".into(),
                    email: "oumar@poste.ml".into(),
                    station_id: fx.station_id,
                    role_ids: supervisor_role.clone(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RuleViolation("user.station_has_supervisor")), "{:?}", err);

        let agent = fx.member(&[RoleTag::Agent]).await;
        let err = fx
            .state
            .user_service
            .activate(&fx.admin, agent.id(), &supervisor_role)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RuleViolation("user.station_has_supervisor")), "{:?}", err);

        // Outro posto, outra vaga
        let other = fx
            .state
            .station_service
            .create(CreateStationPayload {
                name: "Commissariat de Kati".into(),
                address: "Route de Kati".into(),
                phone: None,
            })
            .await
            .unwrap();
        let other_supervisor = fx.member_of(other.id, &[RoleTag::Supervisor]).await;
        assert!(other_supervisor.roles.contains(&RoleTag::Supervisor));
    }

    #[sqlx::test]
    #[ignore = "requer DATABASE_URL"]
    async fn transfer_admin_moves_the_role_and_matricules(pool: PgPool) {
        let fx = seeded(pool).await;
        let agent = fx.member(&[RoleTag::Agent]).await;
        let users = &fx.state.user_service;

        let new_admin = users.transfer_admin(fx.admin.id(), agent.id()).await.unwrap();
        assert!(new_admin.roles.contains(&RoleTag::Admin));
        assert!(new_admin.matricule.starts_with("ADM-"));

        let old_admin = users.get(fx.admin.id()).await.unwrap();
        assert!(!old_admin.roles.contains(&RoleTag::Admin));
        assert!(!old_admin.matricule.starts_with("ADM-"));

        let err = users.transfer_admin(fx.admin.id(), agent.id()).await.unwrap_err();
        assert!(matches!(err, AppError::RuleViolation("user.transfer_source_not_admin")), "{:?}", err);
    }

    #[sqlx::test]
    #[ignore = "requer DATABASE_URL"]
    async fn created_accounts_start_inactive_and_get_credentials(pool: PgPool) {
        let fx = seeded(pool).await;
        let agent_role = role_ids(&fx.state, &[RoleTag::Agent]).await;

        let created = fx
            .state
            .user_service
            .create(
                &fx.admin,
                CreateUserPayload {
                    last_name: " Dembélé ".into(),
                    first_name: "Salif".into(),
                    email: "Salif@Poste.ml".into(),
                    station_id: fx.station_id,
                    role_ids: agent_role,
                },
            )
            .await
            .unwrap();

        assert!(!created.is_active);
        assert_eq!(created.last_name, "Dembélé");
        assert!(created.matricule.starts_with("AGT-"));
        assert!(fx.mailer.recipients().contains(&"salif@poste.ml".to_string()));
    }
}
