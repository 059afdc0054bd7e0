// src/models/shared.rs

use serde::Serialize;
use utoipa::ToSchema;

// Resposta simples das operações sem corpo próprio
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
