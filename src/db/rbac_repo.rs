// src/db/rbac_repo.rs

use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::rbac::{Role, RoleTag},
};

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Leitura dos papéis (semeados pela migração)
    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, label FROM roles ORDER BY label")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    pub async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT id, label FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    pub async fn find_role_by_label(&self, label: &str) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT id, label FROM roles WHERE label = $1")
            .bind(label)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    pub async fn find_roles_by_ids<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // O SQLx lida bem com arrays usando ANY
        let roles = sqlx::query_as::<_, Role>("SELECT id, label FROM roles WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(roles)
    }

    // 2. Papéis de um utilizador
    pub async fn roles_of_user<'e, E>(&self, executor: E, user_id: Uuid) -> Result<Vec<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.label
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.label
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;
        Ok(roles)
    }

    /// Pares (utilizador, rótulo) para montar listagens sem N+1.
    pub async fn role_labels_of_users(&self, user_ids: &[Uuid]) -> Result<Vec<(Uuid, String)>, AppError> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT ur.user_id, r.label
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = ANY($1)
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // 3. Vincular Utilizador <-> Papéis (substitui o conjunto inteiro)
    pub async fn replace_user_roles(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        // Inserção em massa usando UNNEST
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_ids)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn add_role<'e, E>(&self, executor: E, user_id: Uuid, role_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(role_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn remove_role<'e, E>(&self, executor: E, user_id: Uuid, role_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // 4. Regra do administrador único
    /// Tranca a linha do papel ADMIN: concessões concorrentes ficam em fila.
    pub async fn lock_admin_role<'e, E>(&self, executor: E) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>("SELECT id, label FROM roles WHERE label = $1 FOR UPDATE")
            .bind(RoleTag::Admin.label())
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(RoleTag::Admin.label().to_string()))
    }

    pub async fn count_active_admins<'e, E>(&self, executor: E, excluding: Option<Uuid>) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM users u
            JOIN user_roles ur ON ur.user_id = u.id
            JOIN roles r ON r.id = ur.role_id
            WHERE r.label = $1
              AND u.is_active = TRUE AND u.is_deleted = FALSE
              AND ($2::uuid IS NULL OR u.id <> $2)
            "#,
        )
        .bind(RoleTag::Admin.label())
        .bind(excluding)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    pub async fn admin_exists<'e, E>(&self, executor: E) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM user_roles ur
                JOIN roles r ON r.id = ur.role_id
                JOIN users u ON u.id = ur.user_id
                WHERE r.label = $1 AND u.is_deleted = FALSE
            )
            "#,
        )
        .bind(RoleTag::Admin.label())
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    // No máximo um SUPERVISEUR ativo por posto
    pub async fn count_station_supervisors<'e, E>(
        &self,
        executor: E,
        station_id: Uuid,
        excluding: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM users u
            JOIN user_roles ur ON ur.user_id = u.id
            JOIN roles r ON r.id = ur.role_id
            WHERE r.label = $1 AND u.station_id = $2 AND u.id <> $3 AND u.is_deleted = FALSE
            "#,
        )
        .bind(RoleTag::Supervisor.label())
        .bind(station_id)
        .bind(excluding)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }
}
