// src/handlers/dashboard.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermManageUsers, RequirePermission},
    },
    models::dashboard::{StationStatsQuery, StatsEnvelope},
};

// GET /api/dashboard/stats
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Estatísticas no alcance do utilizador", body = StatsEnvelope),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "Sem acesso às declarações")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
) -> Result<Json<StatsEnvelope>, ApiError> {
    let stats = app_state
        .dashboard_service
        .stats_for(&current)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(StatsEnvelope::new(stats)))
}

// GET /api/dashboard/stats/user/{user_id}
#[utoipa::path(
    get,
    path = "/api/dashboard/stats/user/{user_id}",
    tag = "Dashboard",
    params(("user_id" = Uuid, Path, description = "ID do utilizador")),
    responses(
        (status = 200, description = "Estatísticas de um utilizador", body = StatsEnvelope),
        (status = 403, description = "Só as próprias, salvo ADMIN/SUPERVISEUR")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<StatsEnvelope>, ApiError> {
    let stats = app_state
        .dashboard_service
        .stats_of_user(&current, user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(StatsEnvelope::new(stats)))
}

// GET /api/dashboard/stats/poste?posteId=... (só ADMIN)
#[utoipa::path(
    get,
    path = "/api/dashboard/stats/poste",
    tag = "Dashboard",
    params(StationStatsQuery),
    responses(
        (status = 200, description = "Estatísticas de um posto", body = StatsEnvelope),
        (status = 403, description = "Reservado ao administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_station_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    _guard: RequirePermission<PermManageUsers>,
    Query(query): Query<StationStatsQuery>,
) -> Result<Json<StatsEnvelope>, ApiError> {
    let stats = app_state
        .dashboard_service
        .stats_of_station(&current, query.poste_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(StatsEnvelope::new(stats)))
}
