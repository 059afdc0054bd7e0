// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        auth::{AuthResponse, ForgotPasswordPayload, LoginPayload, ResetPasswordPayload, TokenResponse},
        rbac::Permissions,
        shared::MessageResponse,
        user::{ProfileResponse, UserProfile},
    },
};

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Login efetuado", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas"),
        (status = 403, description = "Conta inativa ou removida")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let (token, current) = app_state
        .auth_service
        .login(&payload.email, &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            token,
            message: app_state.i18n_store.translate(&locale.0, "auth.login_success"),
            user: UserProfile::from(&current),
        }),
    ))
}

// GET /api/auth/profile
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "Auth",
    responses(
        (status = 200, description = "Perfil do utilizador autenticado", body = ProfileResponse),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn profile(AuthenticatedUser(current): AuthenticatedUser) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        profile: UserProfile::from(&current),
        permissions: current.permissions,
    })
}

// GET /api/auth/permissions
#[utoipa::path(
    get,
    path = "/api/auth/permissions",
    tag = "Auth",
    responses(
        (status = 200, description = "Capacidades resolvidas a partir dos papéis", body = Permissions),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn permissions(AuthenticatedUser(current): AuthenticatedUser) -> Json<Permissions> {
    Json(current.permissions)
}

// POST /api/auth/refresh
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Auth",
    responses(
        (status = 200, description = "Novo token", body = TokenResponse),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn refresh(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(current): AuthenticatedUser,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = app_state
        .auth_service
        .refresh(&current)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(TokenResponse { token }))
}

// POST /api/utilisateurs/forgot-password
#[utoipa::path(
    post,
    path = "/api/utilisateurs/forgot-password",
    tag = "Auth",
    request_body = ForgotPasswordPayload,
    responses(
        (status = 200, description = "Link de redefinição enviado", body = MessageResponse),
        (status = 404, description = "E-mail desconhecido")
    )
)]
pub async fn forgot_password(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<ForgotPasswordPayload>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .auth_service
        .forgot_password(&payload.email)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(MessageResponse::new(
        app_state.i18n_store.translate(&locale.0, "auth.reset_link_sent"),
    )))
}

// POST /api/utilisateurs/reset-password
#[utoipa::path(
    post,
    path = "/api/utilisateurs/reset-password",
    tag = "Auth",
    request_body = ResetPasswordPayload,
    responses(
        (status = 200, description = "Senha redefinida", body = MessageResponse),
        (status = 400, description = "Token inválido ou expirado")
    )
)]
pub async fn reset_password(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .auth_service
        .reset_password(&payload.reset_token, &payload.new_password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(MessageResponse::new(
        app_state.i18n_store.translate(&locale.0, "auth.password_reset"),
    )))
}
