// src/db/declarant_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::declarant::{Declarant, DeclarantInput, DeclarantLookup},
};

const DECLARANT_COLUMNS: &str = "id, nina, id_card_number, passport_number, last_name, first_name, \
     birth_date, birth_place, email, phone, address";

#[derive(Clone)]
pub struct DeclarantRepository {
    pool: PgPool,
}

impl DeclarantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // A coluna vem de um enum fechado, nunca do pedido
    pub async fn find_by<'e, E>(&self, executor: E, key: DeclarantLookup<'_>) -> Result<Option<Declarant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let comparison = match key {
            DeclarantLookup::Email(_) => "lower(email) = lower($1)".to_string(),
            other => format!("{} = $1", other.column()),
        };
        let declarant = sqlx::query_as::<_, Declarant>(&format!(
            "SELECT {} FROM declarants WHERE {}",
            DECLARANT_COLUMNS, comparison
        ))
        .bind(key.value())
        .fetch_optional(executor)
        .await?;
        Ok(declarant)
    }

    pub async fn search(&self, key: DeclarantLookup<'_>) -> Result<Option<Declarant>, AppError> {
        self.find_by(&self.pool, key).await
    }

    /// `true` se outro declarante já usa este valor na coluna da chave (ou o telefone).
    pub async fn value_taken<'e, E>(
        &self,
        executor: E,
        column: &'static str,
        value: &str,
        excluding: Option<Uuid>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM declarants WHERE {} = $1 AND ($2::uuid IS NULL OR id <> $2))",
            column
        ))
        .bind(value)
        .bind(excluding)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn create<'e, E>(&self, executor: E, input: &DeclarantInput) -> Result<Declarant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let declarant = sqlx::query_as::<_, Declarant>(&format!(
            r#"
            INSERT INTO declarants (
                nina, id_card_number, passport_number, last_name, first_name,
                birth_date, birth_place, email, phone, address
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            DECLARANT_COLUMNS
        ))
        .bind(&input.nina)
        .bind(&input.id_card_number)
        .bind(&input.passport_number)
        .bind(&input.last_name)
        .bind(&input.first_name)
        .bind(input.birth_date)
        .bind(&input.birth_place)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)?;
        Ok(declarant)
    }

    // Atualização parcial: só os campos presentes mudam
    pub async fn update<'e, E>(&self, executor: E, id: Uuid, input: &DeclarantInput) -> Result<Declarant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let declarant = sqlx::query_as::<_, Declarant>(&format!(
            r#"
            UPDATE declarants SET
                nina = COALESCE($2, nina),
                id_card_number = COALESCE($3, id_card_number),
                passport_number = COALESCE($4, passport_number),
                last_name = COALESCE($5, last_name),
                first_name = COALESCE($6, first_name),
                birth_date = COALESCE($7, birth_date),
                birth_place = COALESCE($8, birth_place),
                email = COALESCE($9, email),
                phone = COALESCE($10, phone),
                address = COALESCE($11, address)
            WHERE id = $1
            RETURNING {}
            "#,
            DECLARANT_COLUMNS
        ))
        .bind(id)
        .bind(&input.nina)
        .bind(&input.id_card_number)
        .bind(&input.passport_number)
        .bind(&input.last_name)
        .bind(&input.first_name)
        .bind(input.birth_date)
        .bind(&input.birth_place)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)?;
        Ok(declarant)
    }
}
