// src/handlers/declarations.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{
            PermCreateDeclaration, PermDeletePermanently, PermEditDeclaration, PermRestoreDeclaration,
            PermViewAllDeclarations, RequirePermission,
        },
    },
    models::{
        declarant::{Declarant, DeclarantSearchPayload},
        declaration::{
            CreateDeclarationPayload, DeclarationAccess, DeclarationDetail, DeclarationListResponse,
            StatusQuery, UpdateDeclarationPayload,
        },
        shared::MessageResponse,
    },
};

// POST /api/declarations
#[utoipa::path(
    post,
    path = "/api/declarations",
    tag = "Declarations",
    request_body = CreateDeclarationPayload,
    responses(
        (status = 201, description = "Declaração registada", body = DeclarationDetail),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Sem permissão para declarar"),
        (status = 409, description = "Declarante duplicado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_declaration(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    _guard: RequirePermission<PermCreateDeclaration>,
    Json(payload): Json<CreateDeclarationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let created = app_state
        .declaration_service
        .create(&current, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// PUT /api/declarations/{id}
#[utoipa::path(
    put,
    path = "/api/declarations/{id}",
    tag = "Declarations",
    params(("id" = Uuid, Path, description = "ID da declaração")),
    request_body = UpdateDeclarationPayload,
    responses(
        (status = 200, description = "Declaração atualizada", body = DeclarationDetail),
        (status = 403, description = "Sem permissão ou não é o dono"),
        (status = 409, description = "Declaração removida não pode ser editada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_declaration(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    _guard: RequirePermission<PermEditDeclaration>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDeclarationPayload>,
) -> Result<Json<DeclarationDetail>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .declaration_service
        .update(&current, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(updated))
}

// PATCH /api/declarations/{id}/statut?statut=VALIDEE
#[utoipa::path(
    patch,
    path = "/api/declarations/{id}/statut",
    tag = "Declarations",
    params(("id" = Uuid, Path, description = "ID da declaração"), StatusQuery),
    responses(
        (status = 200, description = "Estado alterado", body = DeclarationDetail),
        (status = 409, description = "Declaração removida")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_status(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    _guard: RequirePermission<PermEditDeclaration>,
    Path(id): Path<Uuid>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<DeclarationDetail>, ApiError> {
    let updated = app_state
        .declaration_service
        .change_status(&current, id, query.statut)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(updated))
}

// DELETE /api/declarations/{id} (remoção lógica)
#[utoipa::path(
    delete,
    path = "/api/declarations/{id}",
    tag = "Declarations",
    params(("id" = Uuid, Path, description = "ID da declaração")),
    responses(
        (status = 200, description = "Declaração removida", body = MessageResponse),
        (status = 409, description = "Já estava removida")
    ),
    security(("api_jwt" = []))
)]
pub async fn soft_delete_declaration(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    _guard: RequirePermission<PermEditDeclaration>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    app_state
        .declaration_service
        .soft_delete(&current, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(MessageResponse::new(
        app_state.i18n_store.translate(&locale.0, "declaration.soft_deleted"),
    )))
}

// PATCH /api/declarations/{id}/restaurer
#[utoipa::path(
    patch,
    path = "/api/declarations/{id}/restaurer",
    tag = "Declarations",
    params(("id" = Uuid, Path, description = "ID da declaração")),
    responses(
        (status = 200, description = "Declaração restaurada", body = DeclarationDetail),
        (status = 409, description = "A declaração não estava removida")
    ),
    security(("api_jwt" = []))
)]
pub async fn restore_declaration(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    _guard: RequirePermission<PermRestoreDeclaration>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeclarationDetail>, ApiError> {
    let restored = app_state
        .declaration_service
        .restore(&current, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(restored))
}

// DELETE /api/declarations/{id}/definitif (só ADMIN, só a partir de removida)
#[utoipa::path(
    delete,
    path = "/api/declarations/{id}/definitif",
    tag = "Declarations",
    params(("id" = Uuid, Path, description = "ID da declaração")),
    responses(
        (status = 200, description = "Declaração apagada", body = MessageResponse),
        (status = 403, description = "Reservado ao administrador"),
        (status = 409, description = "É preciso remover antes de apagar")
    ),
    security(("api_jwt" = []))
)]
pub async fn hard_delete_declaration(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    _guard: RequirePermission<PermDeletePermanently>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    app_state
        .declaration_service
        .hard_delete(&current, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(MessageResponse::new(
        app_state.i18n_store.translate(&locale.0, "declaration.hard_deleted"),
    )))
}

// GET /api/declarations/{id}
#[utoipa::path(
    get,
    path = "/api/declarations/{id}",
    tag = "Declarations",
    params(("id" = Uuid, Path, description = "ID da declaração")),
    responses(
        (status = 200, description = "Declaração", body = DeclarationDetail),
        (status = 403, description = "Não é o dono"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_declaration(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeclarationDetail>, ApiError> {
    let declaration = app_state
        .declaration_service
        .get(&current, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(declaration))
}

// GET /api/declarations/reference/{reference}
#[utoipa::path(
    get,
    path = "/api/declarations/reference/{reference}",
    tag = "Declarations",
    params(("reference" = String, Path, description = "Número de referência, ex: DECL-BKO-007")),
    responses(
        (status = 200, description = "Declaração", body = DeclarationDetail),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_by_reference(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(reference): Path<String>,
) -> Result<Json<DeclarationDetail>, ApiError> {
    let declaration = app_state
        .declaration_service
        .get_by_reference(&current, &reference)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(declaration))
}

// GET /api/declarations
#[utoipa::path(
    get,
    path = "/api/declarations",
    tag = "Declarations",
    responses(
        (status = 200, description = "Declarações visíveis para o utilizador", body = DeclarationListResponse),
        (status = 403, description = "Sem acesso às declarações")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_declarations(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
) -> Result<Json<DeclarationListResponse>, ApiError> {
    let declarations = app_state
        .declaration_service
        .list_visible(&current)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(declarations.into()))
}

// GET /api/declarations/actives
#[utoipa::path(
    get,
    path = "/api/declarations/actives",
    tag = "Declarations",
    responses((status = 200, description = "As minhas declarações ativas", body = DeclarationListResponse)),
    security(("api_jwt" = []))
)]
pub async fn list_own_active(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
) -> Result<Json<DeclarationListResponse>, ApiError> {
    let declarations = app_state
        .declaration_service
        .list_own(&current, false)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(declarations.into()))
}

// GET /api/declarations/supprimees
#[utoipa::path(
    get,
    path = "/api/declarations/supprimees",
    tag = "Declarations",
    responses((status = 200, description = "As minhas declarações removidas", body = DeclarationListResponse)),
    security(("api_jwt" = []))
)]
pub async fn list_own_deleted(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
) -> Result<Json<DeclarationListResponse>, ApiError> {
    let declarations = app_state
        .declaration_service
        .list_own(&current, true)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(declarations.into()))
}

// GET /api/declarations/actives/poste
#[utoipa::path(
    get,
    path = "/api/declarations/actives/poste",
    tag = "Declarations",
    responses(
        (status = 200, description = "Declarações ativas do posto", body = DeclarationListResponse),
        (status = 403, description = "Reservado a ADMIN e SUPERVISEUR")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_station_active(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    _guard: RequirePermission<PermViewAllDeclarations>,
) -> Result<Json<DeclarationListResponse>, ApiError> {
    let declarations = app_state
        .declaration_service
        .list_station(&current, false)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(declarations.into()))
}

// GET /api/declarations/supprimees/poste
#[utoipa::path(
    get,
    path = "/api/declarations/supprimees/poste",
    tag = "Declarations",
    responses(
        (status = 200, description = "Declarações removidas do posto", body = DeclarationListResponse),
        (status = 403, description = "Reservado a ADMIN e SUPERVISEUR")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_station_deleted(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    _guard: RequirePermission<PermViewAllDeclarations>,
) -> Result<Json<DeclarationListResponse>, ApiError> {
    let declarations = app_state
        .declaration_service
        .list_station(&current, true)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(declarations.into()))
}

// GET /api/declarations/{id}/permissions
#[utoipa::path(
    get,
    path = "/api/declarations/{id}/permissions",
    tag = "Declarations",
    params(("id" = Uuid, Path, description = "ID da declaração")),
    responses(
        (status = 200, description = "O que o utilizador pode fazer com esta declaração", body = DeclarationAccess),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn declaration_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeclarationAccess>, ApiError> {
    let access = app_state
        .declaration_service
        .access(&current, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(access))
}

// GET /api/declarations/{id}/pdf
#[utoipa::path(
    get,
    path = "/api/declarations/{id}/pdf",
    tag = "Declarations",
    params(("id" = Uuid, Path, description = "ID da declaração")),
    responses(
        (status = 200, description = "Recibo em PDF", content_type = "application/pdf"),
        (status = 404, description = "Não encontrada"),
        (status = 500, description = "Fontes do PDF em falta")
    ),
    security(("api_jwt" = []))
)]
pub async fn declaration_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let (reference, pdf_bytes) = app_state
        .declaration_service
        .receipt_pdf(&current, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Mostra no navegador em vez de descarregar
    let disposition = format!("inline; filename=\"declaration_{}.pdf\"", reference);
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];

    Ok((headers, pdf_bytes).into_response())
}

// POST /api/declarations/rechercher-declarant
#[utoipa::path(
    post,
    path = "/api/declarations/rechercher-declarant",
    tag = "Declarations",
    request_body = DeclarantSearchPayload,
    responses(
        (status = 200, description = "Declarante encontrado", body = Declarant),
        (status = 400, description = "Nenhum identificador enviado"),
        (status = 404, description = "Declarante não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn search_declarant(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCreateDeclaration>,
    Json(payload): Json<DeclarantSearchPayload>,
) -> Result<Json<Declarant>, ApiError> {
    let declarant = app_state
        .declaration_service
        .search_declarant(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(declarant))
}
