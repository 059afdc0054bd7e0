// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::rbac::Capability,
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn capability() -> Capability;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts: as capacidades vêm do resolvedor,
// calculadas no auth_guard a partir dos papéis atuais do utilizador.
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);

        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        let required = T::capability();

        if !user.0.permissions.allows(required) {
            tracing::debug!(
                "Acesso negado a {} ({})",
                user.0.user.email,
                required.slug()
            );
            return Err(AppError::Forbidden(required.denial_key())
                .to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission {
    ($name:ident, $capability:expr) => {
        pub struct $name;
        impl PermissionDef for $name {
            fn capability() -> Capability {
                $capability
            }
        }
    };
}

permission!(PermViewAllDeclarations, Capability::ViewAllDeclarations);
permission!(PermCreateDeclaration, Capability::CreateDeclaration);
permission!(PermEditDeclaration, Capability::EditDeclaration);
permission!(PermRestoreDeclaration, Capability::RestoreDeclaration);
permission!(PermDeletePermanently, Capability::DeletePermanently);
permission!(PermManageDocumentTypes, Capability::ManageDocumentTypes);
permission!(PermManageUsers, Capability::ManageUsers);
permission!(PermAdministerAccounts, Capability::AdministerAccounts);
permission!(PermTransferAdmin, Capability::TransferAdmin);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::lazy_state;
    use crate::models::{
        rbac::{Permissions, RoleTag},
        user::{CurrentUser, User},
    };
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use uuid::Uuid;

    fn user_with(roles: Vec<RoleTag>) -> AuthenticatedUser {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            matricule: "AGT-0001".into(),
            last_name: "Traoré".into(),
            first_name: "Awa".into(),
            email: "awa@poste.ml".into(),
            password_hash: String::new(),
            is_active: true,
            is_deleted: false,
            reset_token_expires_at: None,
            station_id: Uuid::new_v4(),
            created_at: now,
        };
        AuthenticatedUser(CurrentUser::new(user, roles))
    }

    async fn check<T: PermissionDef>(user: Option<AuthenticatedUser>) -> Result<(), StatusCode> {
        let (state, _) = lazy_state();
        let mut req = Request::builder().uri("/").body(()).unwrap();
        if let Some(user) = user {
            req.extensions_mut().insert(user);
        }
        let (mut parts, _) = req.into_parts();
        RequirePermission::<T>::from_request_parts(&mut parts, &state)
            .await
            .map(|_| ())
            .map_err(|e| e.status)
    }

    #[tokio::test]
    async fn agent_may_create_but_not_delete_permanently() {
        let agent = user_with(vec![RoleTag::Agent]);
        assert!(check::<PermCreateDeclaration>(Some(agent.clone())).await.is_ok());
        assert_eq!(
            check::<PermDeletePermanently>(Some(agent)).await,
            Err(StatusCode::FORBIDDEN)
        );
    }

    #[tokio::test]
    async fn supervisor_administers_accounts_but_cannot_transfer_admin() {
        let sup = user_with(vec![RoleTag::Supervisor]);
        assert!(check::<PermAdministerAccounts>(Some(sup.clone())).await.is_ok());
        assert_eq!(check::<PermTransferAdmin>(Some(sup)).await, Err(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn missing_user_is_unauthorized() {
        assert_eq!(
            check::<PermViewAllDeclarations>(None).await,
            Err(StatusCode::UNAUTHORIZED)
        );
    }

    #[test]
    fn extractor_and_resolver_agree() {
        let perms = Permissions::resolve(&[RoleTag::Admin]);
        assert!(perms.allows(PermManageUsers::capability()));
        assert!(perms.allows(PermTransferAdmin::capability()));
    }
}
