// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::Config,
    db::{RbacRepository, UserRepository},
    models::{auth::Claims, rbac::tags_of, user::{CurrentUser, User}},
    services::mailer::Mailer,
};

/// bcrypt é lento de propósito: corre fora do executor async.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password_clone = password.to_owned();
    let password_hash_clone = password_hash.to_owned();

    // Executa a verificação em um thread separado
    let is_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(is_valid)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    rbac_repo: RbacRepository,
    mailer: Arc<dyn Mailer>,
    config: Arc<Config>,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        rbac_repo: RbacRepository,
        mailer: Arc<dyn Mailer>,
        config: Arc<Config>,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, rbac_repo, mailer, config, pool }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(String, CurrentUser), AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        if !user.can_log_in() {
            return Err(AppError::AccountInactive);
        }

        let token = self.create_token(user.id)?;
        let current = self.load_current(user).await?;
        tracing::info!("🔑 Login de {}", current.user.email);
        Ok((token, current))
    }

    /// Valida o JWT e recarrega o utilizador com os papéis atuais.
    pub async fn authenticate(&self, token: &str) -> Result<CurrentUser, AppError> {
        let claims = self.decode_claims(token)?;

        let user = self
            .user_repo
            .find_by_id(&self.pool, claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.can_log_in() {
            return Err(AppError::AccountInactive);
        }

        self.load_current(user).await
    }

    pub fn refresh(&self, current: &CurrentUser) -> Result<String, AppError> {
        self.create_token(current.id())
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(email.to_string()))?;

        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + chrono::Duration::hours(self.config.reset_token_ttl_hours);
        self.user_repo.set_reset_token(user.id, &token, expires_at).await?;

        self.mailer
            .send_account_credentials(&user.email, None, &self.config.reset_link(&token))
            .await
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find_by_reset_token(token)
            .await?
            .ok_or(AppError::InvalidResetToken)?;

        let expired = user
            .reset_token_expires_at
            .is_none_or(|expires_at| expires_at < Utc::now());
        if expired {
            return Err(AppError::InvalidResetToken);
        }

        let password_hash = hash_password(new_password).await?;
        self.user_repo.complete_reset(user.id, &password_hash).await?;
        tracing::info!("🔐 Senha redefinida para {}", user.email);
        Ok(())
    }

    async fn load_current(&self, user: User) -> Result<CurrentUser, AppError> {
        let roles = self.rbac_repo.roles_of_user(&self.pool, user.id).await?;
        Ok(CurrentUser::new(user, tags_of(&roles)))
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    pub fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.config.jwt_expiration_hours);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        // Usa '?' para um tratamento de erro mais limpo
        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::lazy_state;

    #[tokio::test]
    async fn token_round_trips_the_subject() {
        let (state, _) = lazy_state();
        let id = Uuid::new_v4();
        let token = state.auth_service.create_token(id).unwrap();
        assert_eq!(state.auth_service.decode_claims(&token).unwrap().sub, id);
    }

    #[tokio::test]
    async fn garbage_and_foreign_tokens_are_rejected() {
        let (state, _) = lazy_state();
        assert!(matches!(state.auth_service.decode_claims("abc.def.ghi"), Err(AppError::InvalidToken)));

        let foreign = encode(
            &Header::default(),
            &Claims { sub: Uuid::new_v4(), exp: usize::MAX / 2, iat: 0 },
            &EncodingKey::from_secret(b"outro-segredo"),
        )
        .unwrap();
        assert!(matches!(state.auth_service.decode_claims(&foreign), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let (state, _) = lazy_state();
        let expired = encode(
            &Header::default(),
            &Claims { sub: Uuid::new_v4(), exp: 1_000, iat: 0 },
            &EncodingKey::from_secret(b"segredo-de-teste"),
        )
        .unwrap();
        assert!(matches!(state.auth_service.decode_claims(&expired), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hashed = hash_password("s3nha-forte").await.unwrap();
        assert!(verify_password("s3nha-forte", &hashed).await.unwrap());
        assert!(!verify_password("errada", &hashed).await.unwrap());
    }
}
