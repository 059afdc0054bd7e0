// src/handlers/document_types.rs

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
        rbac::{PermDeletePermanently, PermManageDocumentTypes, RequirePermission},
    },
    models::{
        document_type::{DocumentType, DocumentTypePayload},
        shared::MessageResponse,
    },
};

// GET /api/types-document
#[utoipa::path(
    get,
    path = "/api/types-document",
    tag = "Types de document",
    responses(
        (status = 200, description = "Tipos de documento", body = Vec<DocumentType>),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_document_types(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<Json<Vec<DocumentType>>, ApiError> {
    let types = app_state
        .document_type_service
        .list()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(types))
}

// GET /api/types-document/{id}
#[utoipa::path(
    get,
    path = "/api/types-document/{id}",
    tag = "Types de document",
    params(("id" = Uuid, Path, description = "ID do tipo de documento")),
    responses(
        (status = 200, description = "Tipo de documento", body = DocumentType),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_document_type(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentType>, ApiError> {
    let document_type = app_state
        .document_type_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(document_type))
}

// POST /api/types-document
#[utoipa::path(
    post,
    path = "/api/types-document",
    tag = "Types de document",
    request_body = DocumentTypePayload,
    responses(
        (status = 201, description = "Tipo criado", body = DocumentType),
        (status = 400, description = "Rótulo em falta"),
        (status = 409, description = "Rótulo ou código duplicado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_document_type(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManageDocumentTypes>,
    Json(payload): Json<DocumentTypePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let created = app_state
        .document_type_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// PUT /api/types-document/{id}
#[utoipa::path(
    put,
    path = "/api/types-document/{id}",
    tag = "Types de document",
    params(("id" = Uuid, Path, description = "ID do tipo de documento")),
    request_body = DocumentTypePayload,
    responses(
        (status = 200, description = "Tipo atualizado", body = DocumentType),
        (status = 404, description = "Não encontrado"),
        (status = 409, description = "Rótulo ou código duplicado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_document_type(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManageDocumentTypes>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DocumentTypePayload>,
) -> Result<Json<DocumentType>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .document_type_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(updated))
}

// DELETE /api/types-document/{id} (só ADMIN; recusado enquanto houver declarações)
#[utoipa::path(
    delete,
    path = "/api/types-document/{id}",
    tag = "Types de document",
    params(("id" = Uuid, Path, description = "ID do tipo de documento")),
    responses(
        (status = 200, description = "Tipo removido", body = MessageResponse),
        (status = 403, description = "Reservado ao administrador"),
        (status = 409, description = "Tipo em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_document_type(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermDeletePermanently>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    app_state
        .document_type_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(MessageResponse::new(
        app_state.i18n_store.translate(&locale.0, "document_type.deleted"),
    )))
}
