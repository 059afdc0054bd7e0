// src/handlers/users.rs

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
    db::user_repo::UserFilter,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermAdministerAccounts, PermManageUsers, PermTransferAdmin, RequirePermission},
    },
    models::{
        shared::MessageResponse,
        user::{CreateUserPayload, ExistsAdminResponse, RoleIdsPayload, UpdateUserPayload, UserProfile},
    },
};

// POST /api/utilisateurs
#[utoipa::path(
    post,
    path = "/api/utilisateurs",
    tag = "Utilisateurs",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Conta criada; credenciais enviadas por e-mail", body = UserProfile),
        (status = 403, description = "Reservado a ADMIN e SUPERVISEUR"),
        (status = 409, description = "E-mail já usado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    _guard: RequirePermission<PermAdministerAccounts>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let created = app_state
        .user_service
        .create(&current, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_with(app_state: &AppState, locale: &Locale, filter: UserFilter) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let users = app_state
        .user_service
        .list(filter)
        .await
        .map_err(|e| e.to_api_error(locale, &app_state.i18n_store))?;
    Ok(Json(users))
}

// GET /api/utilisateurs
#[utoipa::path(
    get,
    path = "/api/utilisateurs",
    tag = "Utilisateurs",
    responses((status = 200, description = "Todas as contas", body = Vec<UserProfile>)),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAdministerAccounts>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    list_with(&app_state, &locale, UserFilter::All).await
}

// GET /api/utilisateurs/actifs
#[utoipa::path(
    get,
    path = "/api/utilisateurs/actifs",
    tag = "Utilisateurs",
    responses((status = 200, description = "Contas ativas", body = Vec<UserProfile>)),
    security(("api_jwt" = []))
)]
pub async fn list_active_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAdministerAccounts>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    list_with(&app_state, &locale, UserFilter::Active).await
}

// GET /api/utilisateurs/inactifs
#[utoipa::path(
    get,
    path = "/api/utilisateurs/inactifs",
    tag = "Utilisateurs",
    responses((status = 200, description = "Contas à espera de ativação", body = Vec<UserProfile>)),
    security(("api_jwt" = []))
)]
pub async fn list_inactive_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAdministerAccounts>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    list_with(&app_state, &locale, UserFilter::Inactive).await
}

// GET /api/utilisateurs/supprimes
#[utoipa::path(
    get,
    path = "/api/utilisateurs/supprimes",
    tag = "Utilisateurs",
    responses((status = 200, description = "Contas removidas", body = Vec<UserProfile>)),
    security(("api_jwt" = []))
)]
pub async fn list_deleted_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAdministerAccounts>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    list_with(&app_state, &locale, UserFilter::Deleted).await
}

// GET /api/utilisateurs/{id}
#[utoipa::path(
    get,
    path = "/api/utilisateurs/{id}",
    tag = "Utilisateurs",
    params(("id" = Uuid, Path, description = "ID do utilizador")),
    responses(
        (status = 200, description = "Conta", body = UserProfile),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAdministerAccounts>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = app_state
        .user_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(user))
}

// GET /api/utilisateurs/existe-admin (público: o cliente decide se mostra o ecrã de inicialização)
#[utoipa::path(
    get,
    path = "/api/utilisateurs/existe-admin",
    tag = "Utilisateurs",
    responses((status = 200, description = "Existe um administrador?", body = ExistsAdminResponse))
)]
pub async fn exists_admin(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<Json<ExistsAdminResponse>, ApiError> {
    let existe = app_state
        .user_service
        .exists_admin()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ExistsAdminResponse { existe }))
}

// POST /api/utilisateurs/{id}/activer
#[utoipa::path(
    post,
    path = "/api/utilisateurs/{id}/activer",
    tag = "Utilisateurs",
    params(("id" = Uuid, Path, description = "ID do utilizador")),
    request_body(content = Vec<Uuid>, description = "IDs dos papéis a atribuir"),
    responses(
        (status = 200, description = "Conta ativada", body = UserProfile),
        (status = 400, description = "Sem papéis, ou já existe um administrador ativo"),
        (status = 409, description = "Conta removida")
    ),
    security(("api_jwt" = []))
)]
pub async fn activate_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    _guard: RequirePermission<PermAdministerAccounts>,
    Path(id): Path<Uuid>,
    Json(role_ids): Json<Vec<Uuid>>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = app_state
        .user_service
        .activate(&current, id, &role_ids)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(user))
}

// POST /api/utilisateurs/{id}/desactiver
#[utoipa::path(
    post,
    path = "/api/utilisateurs/{id}/desactiver",
    tag = "Utilisateurs",
    params(("id" = Uuid, Path, description = "ID do utilizador")),
    responses(
        (status = 200, description = "Conta desativada", body = MessageResponse),
        (status = 400, description = "Último administrador ativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    _guard: RequirePermission<PermAdministerAccounts>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    app_state
        .user_service
        .deactivate(&current, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(MessageResponse::new(
        app_state.i18n_store.translate(&locale.0, "user.deactivated"),
    )))
}

// PUT /api/utilisateurs/{id}
#[utoipa::path(
    put,
    path = "/api/utilisateurs/{id}",
    tag = "Utilisateurs",
    params(("id" = Uuid, Path, description = "ID do utilizador")),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "Conta atualizada", body = UserProfile),
        (status = 400, description = "Regra violada (supervisor do posto, administrador único)"),
        (status = 409, description = "E-mail já usado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    _guard: RequirePermission<PermAdministerAccounts>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<UserProfile>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let user = app_state
        .user_service
        .update(&current, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(user))
}

// DELETE /api/utilisateurs/{id} (remoção lógica)
#[utoipa::path(
    delete,
    path = "/api/utilisateurs/{id}",
    tag = "Utilisateurs",
    params(("id" = Uuid, Path, description = "ID do utilizador")),
    responses(
        (status = 200, description = "Conta removida", body = MessageResponse),
        (status = 400, description = "A própria conta ou o último administrador"),
        (status = 403, description = "Um supervisor não remove um administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    _guard: RequirePermission<PermAdministerAccounts>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    app_state
        .user_service
        .soft_delete(&current, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(MessageResponse::new(
        app_state.i18n_store.translate(&locale.0, "user.soft_deleted"),
    )))
}

// POST /api/utilisateurs/{id}/restaurer
#[utoipa::path(
    post,
    path = "/api/utilisateurs/{id}/restaurer",
    tag = "Utilisateurs",
    params(("id" = Uuid, Path, description = "ID do utilizador")),
    request_body(content = RoleIdsPayload, description = "Papéis novos (opcional)"),
    responses(
        (status = 200, description = "Conta restaurada", body = UserProfile),
        (status = 409, description = "A conta não estava removida")
    ),
    security(("api_jwt" = []))
)]
pub async fn restore_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    _guard: RequirePermission<PermAdministerAccounts>,
    Path(id): Path<Uuid>,
    payload: Option<Json<RoleIdsPayload>>,
) -> Result<Json<UserProfile>, ApiError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    let user = app_state
        .user_service
        .restore(&current, id, &payload.role_ids)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(user))
}

// DELETE /api/utilisateurs/{id}/definitif (só ADMIN)
#[utoipa::path(
    delete,
    path = "/api/utilisateurs/{id}/definitif",
    tag = "Utilisateurs",
    params(("id" = Uuid, Path, description = "ID do utilizador")),
    responses(
        (status = 200, description = "Conta apagada", body = MessageResponse),
        (status = 400, description = "A própria conta ou um administrador"),
        (status = 403, description = "Reservado ao administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn hard_delete_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    _guard: RequirePermission<PermManageUsers>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    app_state
        .user_service
        .hard_delete(&current, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(MessageResponse::new(
        app_state.i18n_store.translate(&locale.0, "user.hard_deleted"),
    )))
}

// POST /api/utilisateurs/{old_id}/transferer-admin/{new_id} (só ADMIN)
#[utoipa::path(
    post,
    path = "/api/utilisateurs/{old_id}/transferer-admin/{new_id}",
    tag = "Utilisateurs",
    params(
        ("old_id" = Uuid, Path, description = "Administrador atual"),
        ("new_id" = Uuid, Path, description = "Novo administrador")
    ),
    responses(
        (status = 200, description = "Papel transferido; devolve o novo administrador", body = UserProfile),
        (status = 400, description = "Transferência inválida"),
        (status = 403, description = "Reservado ao administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn transfer_admin(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermTransferAdmin>,
    Path((old_id, new_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = app_state
        .user_service
        .transfer_admin(old_id, new_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(user))
}
