// src/services/station_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::StationRepository,
    models::station::{station_code, CreateStationPayload, Station},
};

#[derive(Clone)]
pub struct StationService {
    repo: StationRepository,
    pool: PgPool,
}

impl StationService {
    pub fn new(repo: StationRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list(&self) -> Result<Vec<Station>, AppError> {
        self.repo.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Station, AppError> {
        self.repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(id.to_string()))
    }

    pub async fn create(&self, payload: CreateStationPayload) -> Result<Station, AppError> {
        let phone = payload
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());

        let station = self
            .repo
            .create(
                &self.pool,
                &station_code(Utc::now()),
                payload.name.trim(),
                payload.address.trim(),
                phone,
            )
            .await?;

        tracing::info!("🏢 Posto criado: {} ({})", station.name, station.unique_code);
        Ok(station)
    }
}
