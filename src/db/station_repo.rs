// src/db/station_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::station::Station,
};

const STATION_COLUMNS: &str = "id, unique_code, name, address, phone, is_active, created_at";

#[derive(Clone)]
pub struct StationRepository {
    pool: PgPool,
}

impl StationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Station>, AppError> {
        let stations = sqlx::query_as::<_, Station>(&format!(
            "SELECT {} FROM police_stations ORDER BY name",
            STATION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(stations)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Station>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let station = sqlx::query_as::<_, Station>(&format!(
            "SELECT {} FROM police_stations WHERE id = $1",
            STATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(station)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        unique_code: &str,
        name: &str,
        address: &str,
        phone: Option<&str>,
    ) -> Result<Station, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let station = sqlx::query_as::<_, Station>(&format!(
            r#"
            INSERT INTO police_stations (unique_code, name, address, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            STATION_COLUMNS
        ))
        .bind(unique_code)
        .bind(name)
        .bind(address)
        .bind(phone)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)?;
        Ok(station)
    }
}
