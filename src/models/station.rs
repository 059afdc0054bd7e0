// src/models/station.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Posto de polícia (Tabela police_stations)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: Uuid,
    #[serde(rename = "codeUnique")]
    #[schema(example = "POSTE-1735689600000")]
    pub unique_code: String,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "adresse")]
    pub address: String,
    #[serde(rename = "telephone")]
    pub phone: Option<String>,
    #[serde(rename = "actif")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStationPayload {
    #[serde(rename = "nom")]
    #[validate(length(min = 1, max = 150, message = "validation.required"))]
    pub name: String,

    #[serde(rename = "adresse")]
    #[validate(length(min = 1, max = 255, message = "validation.required"))]
    pub address: String,

    #[serde(rename = "telephone")]
    #[validate(length(max = 20, message = "validation.phone_length"))]
    pub phone: Option<String>,
}

/// Código único gerado para um novo posto.
pub fn station_code(now: DateTime<Utc>) -> String {
    format!("POSTE-{}", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn code_carries_epoch_millis() {
        let now = Utc.timestamp_millis_opt(1_735_689_600_123).unwrap();
        assert_eq!(station_code(now), "POSTE-1735689600123");
    }
}
