// src/db/document_type_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::document_type::DocumentType,
};

#[derive(Clone)]
pub struct DocumentTypeRepository {
    pool: PgPool,
}

impl DocumentTypeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<DocumentType>, AppError> {
        let types = sqlx::query_as::<_, DocumentType>(
            "SELECT id, code, label, created_at FROM document_types ORDER BY label",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(types)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<DocumentType>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let doc_type = sqlx::query_as::<_, DocumentType>(
            "SELECT id, code, label, created_at FROM document_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(doc_type)
    }

    // Comparação sem distinguir maiúsculas
    pub async fn label_exists(&self, label: &str, excluding: Option<Uuid>) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM document_types WHERE lower(label) = lower($1) AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(label)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn code_exists(&self, code: &str, excluding: Option<Uuid>) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM document_types WHERE code = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(code)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create(&self, code: &str, label: &str) -> Result<DocumentType, AppError> {
        let doc_type = sqlx::query_as::<_, DocumentType>(
            r#"
            INSERT INTO document_types (code, label)
            VALUES ($1, $2)
            RETURNING id, code, label, created_at
            "#,
        )
        .bind(code)
        .bind(label)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;
        Ok(doc_type)
    }

    pub async fn update(&self, id: Uuid, code: &str, label: &str) -> Result<Option<DocumentType>, AppError> {
        let doc_type = sqlx::query_as::<_, DocumentType>(
            r#"
            UPDATE document_types SET code = $2, label = $3
            WHERE id = $1
            RETURNING id, code, label, created_at
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(label)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?;
        Ok(doc_type)
    }

    pub async fn count_usages<'e, E>(&self, executor: E, id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM declarations WHERE document_type_id = $1")
            .bind(id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM document_types WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
