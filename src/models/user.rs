// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::rbac::{Permissions, RoleTag};

// Representa um utilizador vindo do banco de dados
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub matricule: String,
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_deleted: bool,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub station_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Estados do ciclo de vida de uma conta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserState {
    Inactive,
    Active,
    Deleted,
}

impl User {
    pub fn state(&self) -> UserState {
        if self.is_deleted {
            UserState::Deleted
        } else if self.is_active {
            UserState::Active
        } else {
            UserState::Inactive
        }
    }

    pub fn can_log_in(&self) -> bool {
        self.state() == UserState::Active
    }
}

/// O utilizador do pedido, com os papéis e as capacidades já resolvidas.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub roles: Vec<RoleTag>,
    pub permissions: Permissions,
}

impl CurrentUser {
    pub fn new(user: User, roles: Vec<RoleTag>) -> Self {
        let permissions = Permissions::resolve(&roles);
        Self { user, roles, permissions }
    }

    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

// O que o cliente vê de um utilizador
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    #[schema(example = "AGT-4821")]
    pub matricule: String,
    #[serde(rename = "nom")]
    pub last_name: String,
    #[serde(rename = "prenom")]
    pub first_name: String,
    pub email: String,
    #[serde(rename = "actif")]
    pub is_active: bool,
    #[serde(rename = "supprime")]
    pub is_deleted: bool,
    #[serde(rename = "posteId")]
    pub station_id: Uuid,
    pub roles: Vec<RoleTag>,
    #[serde(rename = "dateCreation")]
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn from_parts(user: &User, roles: Vec<RoleTag>) -> Self {
        Self {
            id: user.id,
            matricule: user.matricule.clone(),
            last_name: user.last_name.clone(),
            first_name: user.first_name.clone(),
            email: user.email.clone(),
            is_active: user.is_active,
            is_deleted: user.is_deleted,
            station_id: user.station_id,
            roles,
            created_at: user.created_at,
        }
    }
}

impl From<&CurrentUser> for UserProfile {
    fn from(current: &CurrentUser) -> Self {
        UserProfile::from_parts(&current.user, current.roles.clone())
    }
}

// Perfil + capacidades (GET /api/auth/profile)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub permissions: Permissions,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[serde(rename = "nom")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub last_name: String,

    #[serde(rename = "prenom")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub first_name: String,

    #[validate(email(message = "validation.email"))]
    pub email: String,

    #[serde(rename = "postePoliceId")]
    pub station_id: Uuid,

    #[serde(default)]
    pub role_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[serde(rename = "nom")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub last_name: Option<String>,

    #[serde(rename = "prenom")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub first_name: Option<String>,

    #[validate(email(message = "validation.email"))]
    pub email: Option<String>,

    #[serde(rename = "postePoliceId")]
    pub station_id: Option<Uuid>,

    pub role_ids: Option<Vec<Uuid>>,

    #[serde(rename = "actif")]
    pub is_active: Option<bool>,

    #[serde(rename = "motDePasse")]
    #[validate(length(min = 6, message = "validation.password_length"))]
    pub password: Option<String>,
}

// Corpo opcional de /activer e /restaurer
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleIdsPayload {
    #[serde(default)]
    pub role_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExistsAdminResponse {
    pub existe: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(active: bool, deleted: bool) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            matricule: "USR-0001".into(),
            last_name: "Diarra".into(),
            first_name: "Moussa".into(),
            email: "moussa@poste.ml".into(),
            password_hash: String::new(),
            is_active: active,
            is_deleted: deleted,
            reset_token_expires_at: None,
            station_id: Uuid::new_v4(),
            created_at: now,
        }
    }

    #[test]
    fn deleted_wins_over_active_flag() {
        assert_eq!(user(true, true).state(), UserState::Deleted);
        assert_eq!(user(false, false).state(), UserState::Inactive);
        assert!(user(true, false).can_log_in());
        assert!(!user(true, true).can_log_in());
    }

    #[test]
    fn profile_uses_wire_names_and_hides_hash() {
        let current = CurrentUser::new(user(true, false), vec![RoleTag::Agent]);
        let json = serde_json::to_value(UserProfile::from(&current)).unwrap();
        assert_eq!(json["nom"], "Diarra");
        assert_eq!(json["actif"], true);
        assert_eq!(json["roles"][0], "ROLE_AGENT");
        assert!(json.get("dateCreation").is_some());
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn create_payload_rejects_bad_email() {
        let payload: CreateUserPayload = serde_json::from_value(serde_json::json!({
            "nom": "Keita", "prenom": "Fatou", "email": "pas-un-email",
            "postePoliceId": Uuid::new_v4(), "roleIds": []
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }
}
