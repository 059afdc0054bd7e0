// src/models/document_type.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentType {
    pub id: Uuid,
    #[schema(example = "CARTE_D_IDENTITE")]
    pub code: String,
    #[serde(rename = "libelle")]
    #[schema(example = "Carte d'identité")]
    pub label: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DocumentTypePayload {
    #[serde(rename = "libelle", alias = "libelleTypeDocument")]
    #[validate(length(min = 1, max = 150, message = "validation.required"))]
    pub label: String,

    #[validate(length(max = 50, message = "validation.code_length"))]
    pub code: Option<String>,
}
