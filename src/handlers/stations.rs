// src/handlers/stations.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermManageUsers, RequirePermission},
    },
    models::station::{CreateStationPayload, Station},
};

// GET /api/postes-police
#[utoipa::path(
    get,
    path = "/api/postes-police",
    tag = "Postes de police",
    responses(
        (status = 200, description = "Lista dos postos", body = Vec<Station>)
    )
)]
pub async fn list_stations(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<Json<Vec<Station>>, ApiError> {
    let stations = app_state
        .station_service
        .list()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(stations))
}

// GET /api/postes-police/{id}
#[utoipa::path(
    get,
    path = "/api/postes-police/{id}",
    tag = "Postes de police",
    params(("id" = Uuid, Path, description = "ID do posto")),
    responses(
        (status = 200, description = "Posto", body = Station),
        (status = 404, description = "Posto não encontrado")
    )
)]
pub async fn get_station(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<Json<Station>, ApiError> {
    let station = app_state
        .station_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(station))
}

// POST /api/postes-police (só ADMIN)
#[utoipa::path(
    post,
    path = "/api/postes-police",
    tag = "Postes de police",
    request_body = CreateStationPayload,
    responses(
        (status = 201, description = "Posto criado", body = Station),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Reservado ao administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_station(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManageUsers>,
    Json(payload): Json<CreateStationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let station = app_state
        .station_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(station)))
}
