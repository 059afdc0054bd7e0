// src/handlers/rbac.rs

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::rbac::Role,
};

// GET /api/roles (papéis fixos, semeados pela migração)
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "Roles",
    responses(
        (status = 200, description = "Lista dos papéis", body = Vec<Role>)
    )
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<Json<Vec<Role>>, ApiError> {
    let roles = app_state
        .rbac_service
        .list_roles()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(roles))
}

// GET /api/roles/{id}
#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    tag = "Roles",
    params(("id" = Uuid, Path, description = "ID do papel")),
    responses(
        (status = 200, description = "Papel", body = Role),
        (status = 404, description = "Papel não encontrado")
    )
)]
pub async fn get_role(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<Json<Role>, ApiError> {
    let role = app_state
        .rbac_service
        .get_role(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(role))
}

// GET /api/roles/libelle/{libelle}
#[utoipa::path(
    get,
    path = "/api/roles/libelle/{libelle}",
    tag = "Roles",
    params(("libelle" = String, Path, description = "Rótulo, ex: ROLE_AGENT")),
    responses(
        (status = 200, description = "Papel", body = Role),
        (status = 404, description = "Papel não encontrado")
    )
)]
pub async fn get_role_by_label(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(label): Path<String>,
) -> Result<Json<Role>, ApiError> {
    let role = app_state
        .rbac_service
        .get_role_by_label(&label)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(role))
}
