// src/handlers/system.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::{
        system::{InitializePayload, SystemState},
        user::UserProfile,
    },
};

// GET /api/system/etat
#[utoipa::path(
    get,
    path = "/api/system/etat",
    tag = "System",
    responses((status = 200, description = "O sistema já tem um administrador?", body = SystemState))
)]
pub async fn system_state(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<Json<SystemState>, ApiError> {
    let state = app_state
        .system_service
        .state()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(state))
}

// POST /api/system/initialiser (público, uma única vez)
#[utoipa::path(
    post,
    path = "/api/system/initialiser",
    tag = "System",
    request_body = InitializePayload,
    responses(
        (status = 201, description = "Posto e administrador criados", body = UserProfile),
        (status = 400, description = "Sistema já inicializado ou dados inválidos")
    )
)]
pub async fn initialize_system(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<InitializePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let admin = app_state
        .system_service
        .initialize(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(admin)))
}
