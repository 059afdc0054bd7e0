// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Erros de domínio. As mensagens visíveis ao utilizador vêm do I18nStore;
// o texto do `#[error]` é só para os logs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Conta inativa ou removida")]
    AccountInactive,

    #[error("Token de redefinição inválido ou expirado")]
    InvalidResetToken,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    // A chave i18n da regra violada
    #[error("Acesso negado: {0}")]
    Forbidden(&'static str),

    // Transição de ciclo de vida inválida (ex: editar uma declaração removida)
    #[error("Conflito de ciclo de vida: {0}")]
    LifecycleConflict(&'static str),

    // Regra de negócio recusada (ex: remover o último administrador)
    #[error("Regra de negócio violada: {0}")]
    RuleViolation(&'static str),

    // Duplicado detectado antes do INSERT; a chave i18n e o valor em conflito
    #[error("Duplicado ({0}): {1}")]
    Duplicate(&'static str, String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Sistema já inicializado")]
    AlreadyInitialized,

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O erro que sai para o cliente, já traduzido
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl AppError {
    /// Status HTTP e chave i18n (com argumento opcional) de cada variante.
    fn status_and_key(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "error.validation", None),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "user.email_exists", None),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "auth.invalid_credentials", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "auth.invalid_token", None),
            AppError::AccountInactive => (StatusCode::FORBIDDEN, "auth.account_inactive", None),
            AppError::InvalidResetToken => (StatusCode::BAD_REQUEST, "auth.invalid_reset_token", None),
            AppError::ResourceNotFound(what) => (StatusCode::NOT_FOUND, "error.not_found", Some(what.clone())),
            AppError::Forbidden(key) => (StatusCode::FORBIDDEN, *key, None),
            AppError::LifecycleConflict(key) => (StatusCode::CONFLICT, *key, None),
            AppError::RuleViolation(key) => (StatusCode::BAD_REQUEST, *key, None),
            AppError::Duplicate(key, value) => (StatusCode::CONFLICT, *key, Some(value.clone())),
            AppError::UniqueConstraintViolation(c) => (StatusCode::CONFLICT, "error.unique_violation", Some(c.clone())),
            AppError::AlreadyInitialized => (StatusCode::BAD_REQUEST, "system.already_initialized", None),
            AppError::FontNotFound(_) => (StatusCode::INTERNAL_SERVER_ERROR, "error.font_not_found", None),
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "error.internal", None),
        }
    }

    /// Converte o erro de domínio na resposta traduzida para o idioma do pedido.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let (status, key, arg) = self.status_and_key();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("🔥 Erro Interno do Servidor: {:?}", self);
        }

        let error = match arg {
            Some(arg) => store.translate_with(&locale.0, key, &arg),
            None => store.translate(&locale.0, key),
        };

        // Detalhes por campo, com as mensagens do validator também traduzidas
        let details = match &self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref())
                        .map(|m| Value::String(store.translate(&locale.0, m)))
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                Some(Value::Object(details))
            }
            _ => None,
        };

        ApiError { status, error, details }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Traduz violações de unicidade do Postgres pelo nome da constraint
pub fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(constraint) = db_err.constraint() {
                return match constraint {
                    "users_email_key" => AppError::EmailAlreadyExists,
                    "declarants_email_key" => AppError::Duplicate("declarant.duplicate_identifier", "e-mail".into()),
                    "declarants_phone_key" => AppError::Duplicate("declarant.duplicate_identifier", "telephone".into()),
                    "declarants_nina_key" => AppError::Duplicate("declarant.duplicate_identifier", "NINA".into()),
                    "declarants_id_card_number_key" => AppError::Duplicate("declarant.duplicate_identifier", "CNI".into()),
                    "declarants_passport_number_key" => AppError::Duplicate("declarant.duplicate_identifier", "passeport".into()),
                    "document_types_label_key" => AppError::UniqueConstraintViolation("libelle".into()),
                    "document_types_code_key" => AppError::UniqueConstraintViolation("code".into()),
                    _ => AppError::UniqueConstraintViolation(constraint.to_string()),
                };
            }
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn store() -> I18nStore {
        I18nStore::load().unwrap()
    }

    #[test]
    fn lifecycle_conflict_maps_to_409_with_translation() {
        let err = AppError::LifecycleConflict("declaration.deleted_immutable")
            .to_api_error(&Locale("fr".into()), &store());
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert!(!err.error.is_empty());
        assert_ne!(err.error, "declaration.deleted_immutable");
    }

    #[test]
    fn not_found_carries_the_resource_name() {
        let err = AppError::ResourceNotFound("DECL-BKO-042".into())
            .to_api_error(&Locale("en".into()), &store());
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(err.error.contains("DECL-BKO-042"));
    }

    #[test]
    fn internal_errors_hide_the_cause() {
        let err = AppError::InternalServerError(anyhow::anyhow!("pool exhausted"))
            .to_api_error(&Locale("fr".into()), &store());
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.error.contains("pool exhausted"));
    }

    #[derive(Validate)]
    struct Probe {
        #[validate(email(message = "validation.email"))]
        email: String,
    }

    #[test]
    fn validation_errors_list_translated_messages_per_field() {
        let errors = Probe { email: "nope".into() }.validate().unwrap_err();
        let err = AppError::ValidationError(errors).to_api_error(&Locale("fr".into()), &store());

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let details = err.details.unwrap();
        let messages = details["email"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_ne!(messages[0].as_str().unwrap(), "validation.email");
    }
}
