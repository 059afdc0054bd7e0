// src/models/system.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct SystemState {
    pub initialised: bool,
}

// Primeiro arranque: posto inicial + administrador
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitializePayload {
    #[serde(rename = "posteNom")]
    #[validate(length(min = 1, max = 150, message = "validation.required"))]
    pub station_name: String,

    #[serde(rename = "adresse")]
    #[validate(length(min = 1, max = 255, message = "validation.required"))]
    pub address: String,

    #[serde(rename = "posteTelephone")]
    #[validate(length(max = 20, message = "validation.phone_length"))]
    pub station_phone: Option<String>,

    #[serde(rename = "nomAdmin")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub admin_last_name: String,

    #[serde(rename = "prenomAdmin")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub admin_first_name: String,

    #[validate(email(message = "validation.email"))]
    pub email: String,

    #[serde(rename = "motDePasse")]
    #[validate(length(min = 6, message = "validation.password_length"))]
    pub password: String,
}
