// src/db/user_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::user::User,
};

const USER_COLUMNS: &str = "id, matricule, last_name, first_name, email, password_hash, is_active, \
     is_deleted, reset_token_expires_at, station_id, created_at";

/// Filtro das listagens de utilizadores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFilter {
    All,
    Active,
    Inactive,
    Deleted,
}

impl UserFilter {
    fn where_clause(self) -> &'static str {
        match self {
            UserFilter::All => "TRUE",
            UserFilter::Active => "is_active = TRUE AND is_deleted = FALSE",
            UserFilter::Inactive => "is_active = FALSE AND is_deleted = FALSE",
            UserFilter::Deleted => "is_deleted = TRUE",
        }
    }
}

// Campos de um novo utilizador
pub struct NewUser<'a> {
    pub matricule: &'a str,
    pub last_name: &'a str,
    pub first_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub is_active: bool,
    pub station_id: Uuid,
    pub reset_token: Option<&'a str>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
}

// O repositório de utilizadores, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um utilizador pelo seu e-mail
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    // Busca um utilizador pelo seu ID
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    // Mesma busca, trancando a linha até ao fim da transação
    pub async fn find_by_id_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1 FOR UPDATE",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(user)
    }

    pub async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE reset_token = $1",
            USER_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn list(&self, filter: UserFilter) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE {} ORDER BY last_name, first_name",
            USER_COLUMNS,
            filter.where_clause()
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn email_exists<'e, E>(&self, executor: E, email: &str, excluding: Option<Uuid>) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = lower($1) AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(excluding)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn matricule_exists<'e, E>(&self, executor: E, matricule: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE matricule = $1)")
            .bind(matricule)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    // Cria um novo utilizador, com tratamento de erro específico para duplicados
    pub async fn create<'e, E>(&self, executor: E, new: NewUser<'_>) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (
                matricule, last_name, first_name, email, password_hash,
                is_active, station_id, reset_token, reset_token_expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(new.matricule)
        .bind(new.last_name)
        .bind(new.first_name)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.is_active)
        .bind(new.station_id)
        .bind(new.reset_token)
        .bind(new.reset_token_expires_at)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)?;
        Ok(user)
    }

    pub async fn update_profile<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        last_name: &str,
        first_name: &str,
        email: &str,
        station_id: Uuid,
        is_active: bool,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET last_name = $2, first_name = $3, email = $4, station_id = $5,
                is_active = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(last_name)
        .bind(first_name)
        .bind(email)
        .bind(station_id)
        .bind(is_active)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)?;
        Ok(user)
    }

    pub async fn set_password<'e, E>(&self, executor: E, id: Uuid, password_hash: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn set_matricule<'e, E>(&self, executor: E, id: Uuid, matricule: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET matricule = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(matricule)
            .execute(executor)
            .await
            .map_err(map_unique_violation)?;
        Ok(())
    }

    pub async fn set_active<'e, E>(&self, executor: E, id: Uuid, active: bool) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn set_reset_token(&self, id: Uuid, token: &str, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE users SET reset_token = $2, reset_token_expires_at = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // Nova senha, conta ativa e token consumido, tudo de uma vez
    pub async fn complete_reset(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, is_active = TRUE,
                reset_token = NULL, reset_token_expires_at = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Só afeta contas ainda não removidas; devolve as linhas alteradas.
    pub async fn soft_delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE users SET is_deleted = TRUE, is_active = FALSE, updated_at = NOW() \
             WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn restore<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE users SET is_deleted = FALSE, is_active = TRUE, updated_at = NOW() \
             WHERE id = $1 AND is_deleted = TRUE",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    // Os papéis caem em cascata; as declarações ficam com a referência a NULL
    pub async fn hard_delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
