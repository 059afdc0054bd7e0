// src/db/declaration_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::{
        dashboard::StatusCounts,
        declaration::{DeclarationFacts, DeclarationRecord, DeclarationStatus, NewDeclaration},
    },
};

// Declaração + tipo + declarante + nomes dos autores, numa única linha
const DETAIL_SELECT: &str = r#"
    SELECT
        d.id, d.reference, d.document_type_id, dt.label AS document_type_label,
        d.document_number, d.loss_date, d.loss_place, d.circumstances, d.declared_on,
        d.status, d.is_deleted, d.owner_id, d.station_id, d.created_by,
        d.created_at, d.modified_at, d.deleted_at,
        o.matricule AS owner_matricule, o.last_name AS owner_last_name, o.first_name AS owner_first_name,
        c.last_name AS creator_last_name,
        m.last_name AS modifier_last_name, m.first_name AS modifier_first_name, m.matricule AS modifier_matricule,
        x.last_name AS deleter_last_name,
        p.id AS declarant_id, p.nina AS declarant_nina, p.id_card_number AS declarant_id_card_number,
        p.passport_number AS declarant_passport_number, p.last_name AS declarant_last_name,
        p.first_name AS declarant_first_name, p.birth_date AS declarant_birth_date,
        p.birth_place AS declarant_birth_place, p.email AS declarant_email,
        p.phone AS declarant_phone, p.address AS declarant_address
    FROM declarations d
    JOIN document_types dt ON dt.id = d.document_type_id
    JOIN declarants p ON p.id = d.declarant_id
    LEFT JOIN users o ON o.id = d.owner_id
    LEFT JOIN users c ON c.id = d.created_by
    LEFT JOIN users m ON m.id = d.modified_by
    LEFT JOIN users x ON x.id = d.deleted_by
"#;

/// Recorte das listagens; `None` não filtra.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclarationFilter {
    /// Dono ou criador
    pub user_id: Option<Uuid>,
    pub station_id: Option<Uuid>,
    pub deleted: Option<bool>,
}

// Campos editáveis de uma declaração ativa
pub struct DeclarationChanges<'a> {
    pub document_type_id: Option<Uuid>,
    pub document_number: Option<&'a str>,
    pub loss_date: Option<chrono::NaiveDate>,
    pub loss_place: Option<&'a str>,
    pub circumstances: Option<&'a str>,
    pub status: Option<DeclarationStatus>,
}

#[derive(Clone)]
pub struct DeclarationRepository {
    pool: PgPool,
}

impl DeclarationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<DeclarationRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, DeclarationRecord>(&format!("{} WHERE d.id = $1", DETAIL_SELECT))
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(record)
    }

    pub async fn find_by_reference(&self, reference: &str) -> Result<Option<DeclarationRecord>, AppError> {
        let record = sqlx::query_as::<_, DeclarationRecord>(&format!("{} WHERE d.reference = $1", DETAIL_SELECT))
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    pub async fn list(&self, filter: DeclarationFilter) -> Result<Vec<DeclarationRecord>, AppError> {
        let records = sqlx::query_as::<_, DeclarationRecord>(&format!(
            r#"{}
            WHERE ($1::uuid IS NULL OR d.owner_id = $1 OR d.created_by = $1)
              AND ($2::uuid IS NULL OR d.station_id = $2)
              AND ($3::boolean IS NULL OR d.is_deleted = $3)
            ORDER BY d.created_at DESC
            "#,
            DETAIL_SELECT
        ))
        .bind(filter.user_id)
        .bind(filter.station_id)
        .bind(filter.deleted)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Tranca a linha e devolve (factos, declarante) para as transições.
    pub async fn lock_facts<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<(DeclarationFacts, Uuid)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, (Option<Uuid>, Option<Uuid>, bool, Uuid)>(
            "SELECT owner_id, created_by, is_deleted, declarant_id FROM declarations WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(row.map(|(owner_id, created_by, is_deleted, declarant_id)| {
            (DeclarationFacts { owner_id, created_by, is_deleted }, declarant_id)
        }))
    }

    // --- Numeração ---

    /// Serializa a geração de referências até ao fim da transação.
    pub async fn lock_reference_sequence<'e, E>(&self, executor: E, prefix: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(prefix)
            .execute(executor)
            .await?;
        Ok(())
    }

    // Ordenar por tamanho primeiro faz "DECL-1000" vir antes de "DECL-999"
    pub async fn last_reference<'e, E>(&self, executor: E, prefix: &str) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reference: Option<String> = sqlx::query_scalar(
            r#"
            SELECT reference FROM declarations
            WHERE left(reference, length($1)) = $1
              AND substr(reference, length($1) + 1) ~ '^[0-9]+$'
            ORDER BY length(reference) DESC, reference DESC
            LIMIT 1
            "#,
        )
        .bind(prefix)
        .fetch_optional(executor)
        .await?;
        Ok(reference)
    }

    // --- Escrita ---

    pub async fn insert<'e, E>(&self, executor: E, new: &NewDeclaration) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO declarations (
                reference, document_type_id, document_number, loss_date, loss_place,
                circumstances, status, declarant_id, owner_id, station_id, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $9)
            RETURNING id
            "#,
        )
        .bind(&new.reference)
        .bind(new.document_type_id)
        .bind(&new.document_number)
        .bind(new.loss_date)
        .bind(&new.loss_place)
        .bind(&new.circumstances)
        .bind(new.status)
        .bind(new.declarant_id)
        .bind(new.owner_id)
        .bind(new.station_id)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)?;
        Ok(id)
    }

    /// Só toca em declarações não removidas; devolve as linhas alteradas.
    pub async fn update_fields<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        changes: &DeclarationChanges<'_>,
        modified_by: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE declarations SET
                document_type_id = COALESCE($2, document_type_id),
                document_number = COALESCE($3, document_number),
                loss_date = COALESCE($4, loss_date),
                loss_place = COALESCE($5, loss_place),
                circumstances = COALESCE($6, circumstances),
                status = COALESCE($7, status),
                modified_by = $8,
                modified_at = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .bind(changes.document_type_id)
        .bind(changes.document_number)
        .bind(changes.loss_date)
        .bind(changes.loss_place)
        .bind(changes.circumstances)
        .bind(changes.status)
        .bind(modified_by)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: DeclarationStatus,
        modified_by: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE declarations SET status = $2, modified_by = $3, modified_at = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(modified_by)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn soft_delete<'e, E>(&self, executor: E, id: Uuid, deleted_by: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE declarations SET is_deleted = TRUE, deleted_by = $2, deleted_at = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .bind(deleted_by)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    // Só a flag muda; o resto da declaração fica como estava
    pub async fn restore<'e, E>(&self, executor: E, id: Uuid, restored_by: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE declarations SET is_deleted = FALSE, modified_by = $2, modified_at = NOW()
            WHERE id = $1 AND is_deleted = TRUE
            "#,
        )
        .bind(id)
        .bind(restored_by)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn hard_delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM declarations WHERE id = $1 AND is_deleted = TRUE")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // --- Estatísticas ---

    pub async fn count_by_status(&self, user_id: Option<Uuid>, station_id: Option<Uuid>) -> Result<StatusCounts, AppError> {
        let counts = sqlx::query_as::<_, StatusCounts>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE NOT is_deleted AND status = 'BROUILLON')   AS brouillon,
                COUNT(*) FILTER (WHERE NOT is_deleted AND status = 'ENREGISTREE') AS enregistree,
                COUNT(*) FILTER (WHERE NOT is_deleted AND status = 'VALIDEE')     AS validee,
                COUNT(*) FILTER (WHERE NOT is_deleted AND status = 'REJETEE')     AS rejetee,
                COUNT(*) FILTER (WHERE is_deleted)                                AS deleted
            FROM declarations
            WHERE ($1::uuid IS NULL OR owner_id = $1 OR created_by = $1)
              AND ($2::uuid IS NULL OR station_id = $2)
            "#,
        )
        .bind(user_id)
        .bind(station_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }
}
