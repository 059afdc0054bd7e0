// src/models/declaration.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    models::{
        declarant::{Declarant, DeclarantInput},
        rbac::{Capability, Permissions},
    },
};

// Mapeia o ENUM 'declaration_status' do Postgres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "declaration_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeclarationStatus {
    Brouillon,
    #[default]
    Enregistree,
    Validee,
    Rejetee,
}

impl DeclarationStatus {
    pub fn label(self) -> &'static str {
        match self {
            DeclarationStatus::Brouillon => "Brouillon",
            DeclarationStatus::Enregistree => "Enregistrée",
            DeclarationStatus::Validee => "Validée",
            DeclarationStatus::Rejetee => "Rejetée",
        }
    }
}

/// Linha "achatada" do SELECT com JOINs (declaração + tipo + declarante + autores).
#[derive(Debug, Clone, FromRow)]
pub struct DeclarationRecord {
    pub id: Uuid,
    pub reference: String,
    pub document_type_id: Uuid,
    pub document_type_label: String,
    pub document_number: Option<String>,
    pub loss_date: Option<NaiveDate>,
    pub loss_place: Option<String>,
    pub circumstances: Option<String>,
    pub declared_on: NaiveDate,
    pub status: DeclarationStatus,
    pub is_deleted: bool,
    pub owner_id: Option<Uuid>,
    pub station_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,

    pub owner_matricule: Option<String>,
    pub owner_last_name: Option<String>,
    pub owner_first_name: Option<String>,
    pub creator_last_name: Option<String>,
    pub modifier_last_name: Option<String>,
    pub modifier_first_name: Option<String>,
    pub modifier_matricule: Option<String>,
    pub deleter_last_name: Option<String>,

    pub declarant_id: Uuid,
    pub declarant_nina: Option<String>,
    pub declarant_id_card_number: Option<String>,
    pub declarant_passport_number: Option<String>,
    pub declarant_last_name: String,
    pub declarant_first_name: String,
    pub declarant_birth_date: Option<NaiveDate>,
    pub declarant_birth_place: Option<String>,
    pub declarant_email: Option<String>,
    pub declarant_phone: String,
    pub declarant_address: Option<String>,
}

impl DeclarationRecord {
    pub fn facts(&self) -> DeclarationFacts {
        DeclarationFacts {
            owner_id: self.owner_id,
            created_by: self.created_by,
            is_deleted: self.is_deleted,
        }
    }
}

// O que sai para o cliente
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationDetail {
    pub id: Uuid,
    #[serde(rename = "numeroReference")]
    #[schema(example = "DECL-BKO-001")]
    pub reference: String,
    #[serde(rename = "typeDocumentId")]
    pub document_type_id: Uuid,
    #[serde(rename = "typeDocumentLibelle")]
    pub document_type_label: String,
    #[serde(rename = "numeroDocument")]
    pub document_number: Option<String>,
    #[serde(rename = "datePerte")]
    pub loss_date: Option<NaiveDate>,
    #[serde(rename = "lieuPerte")]
    pub loss_place: Option<String>,
    #[serde(rename = "circonstances")]
    pub circumstances: Option<String>,
    #[serde(rename = "dateDeclaration")]
    pub declared_on: NaiveDate,
    #[serde(rename = "statut")]
    pub status: DeclarationStatus,
    #[serde(rename = "supprime")]
    pub is_deleted: bool,
    #[serde(rename = "posteId")]
    pub station_id: Option<Uuid>,
    #[serde(rename = "utilisateurId")]
    pub owner_id: Option<Uuid>,
    #[serde(rename = "utilisateurMatricule")]
    pub owner_matricule: Option<String>,
    #[serde(rename = "utilisateurNom")]
    pub owner_last_name: Option<String>,
    #[serde(rename = "utilisateurPrenom")]
    pub owner_first_name: Option<String>,
    pub declarant: Declarant,
    #[serde(rename = "creeParNom")]
    pub creator_last_name: Option<String>,
    #[serde(rename = "creeLe")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "modifieParNom")]
    pub modifier_last_name: Option<String>,
    #[serde(rename = "modifieParPrenom")]
    pub modifier_first_name: Option<String>,
    #[serde(rename = "modifieParMatricule")]
    pub modifier_matricule: Option<String>,
    #[serde(rename = "modifieLe")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(rename = "supprimeParNom")]
    pub deleter_last_name: Option<String>,
    #[serde(rename = "supprimeLe")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<DeclarationRecord> for DeclarationDetail {
    fn from(r: DeclarationRecord) -> Self {
        Self {
            id: r.id,
            reference: r.reference,
            document_type_id: r.document_type_id,
            document_type_label: r.document_type_label,
            document_number: r.document_number,
            loss_date: r.loss_date,
            loss_place: r.loss_place,
            circumstances: r.circumstances,
            declared_on: r.declared_on,
            status: r.status,
            is_deleted: r.is_deleted,
            station_id: r.station_id,
            owner_id: r.owner_id,
            owner_matricule: r.owner_matricule,
            owner_last_name: r.owner_last_name,
            owner_first_name: r.owner_first_name,
            declarant: Declarant {
                id: r.declarant_id,
                nina: r.declarant_nina,
                id_card_number: r.declarant_id_card_number,
                passport_number: r.declarant_passport_number,
                last_name: r.declarant_last_name,
                first_name: r.declarant_first_name,
                birth_date: r.declarant_birth_date,
                birth_place: r.declarant_birth_place,
                email: r.declarant_email,
                phone: r.declarant_phone,
                address: r.declarant_address,
            },
            creator_last_name: r.creator_last_name,
            created_at: r.created_at,
            modifier_last_name: r.modifier_last_name,
            modifier_first_name: r.modifier_first_name,
            modifier_matricule: r.modifier_matricule,
            modified_at: r.modified_at,
            deleter_last_name: r.deleter_last_name,
            deleted_at: r.deleted_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeclarationListResponse {
    pub total: usize,
    pub declarations: Vec<DeclarationDetail>,
}

impl From<Vec<DeclarationDetail>> for DeclarationListResponse {
    fn from(declarations: Vec<DeclarationDetail>) -> Self {
        Self { total: declarations.len(), declarations }
    }
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeclarationPayload {
    #[serde(rename = "typeDocumentId")]
    pub document_type_id: Uuid,

    #[serde(rename = "numeroDocument")]
    pub document_number: Option<String>,

    #[serde(rename = "datePerte")]
    pub loss_date: Option<NaiveDate>,

    #[serde(rename = "lieuPerte")]
    pub loss_place: Option<String>,

    #[serde(rename = "circonstances")]
    #[validate(length(max = 500, message = "validation.circumstances_length"))]
    pub circumstances: Option<String>,

    #[serde(rename = "statut")]
    pub status: Option<DeclarationStatus>,

    #[validate(nested)]
    pub declarant: DeclarantInput,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeclarationPayload {
    #[serde(rename = "typeDocumentId")]
    pub document_type_id: Option<Uuid>,

    #[serde(rename = "numeroDocument")]
    pub document_number: Option<String>,

    #[serde(rename = "datePerte")]
    pub loss_date: Option<NaiveDate>,

    #[serde(rename = "lieuPerte")]
    pub loss_place: Option<String>,

    #[serde(rename = "circonstances")]
    #[validate(length(max = 500, message = "validation.circumstances_length"))]
    pub circumstances: Option<String>,

    #[serde(rename = "statut")]
    pub status: Option<DeclarationStatus>,

    #[validate(nested)]
    pub declarant: Option<DeclarantInput>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct StatusQuery {
    pub statut: DeclarationStatus,
}

// Campos a gravar, já resolvidos pelo serviço
#[derive(Debug, Clone)]
pub struct NewDeclaration {
    pub reference: String,
    pub document_type_id: Uuid,
    pub document_number: Option<String>,
    pub loss_date: Option<NaiveDate>,
    pub loss_place: Option<String>,
    pub circumstances: Option<String>,
    pub status: DeclarationStatus,
    pub declarant_id: Uuid,
    pub owner_id: Uuid,
    pub station_id: Uuid,
}

// ---
// Ciclo de vida
// ---

/// Os factos de uma declaração que decidem quem pode fazer o quê.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclarationFacts {
    pub owner_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub is_deleted: bool,
}

impl DeclarationFacts {
    pub fn state(&self) -> LifecycleState {
        if self.is_deleted { LifecycleState::SoftDeleted } else { LifecycleState::Active }
    }

    pub fn belongs_to(&self, user_id: Uuid) -> bool {
        self.owner_id == Some(user_id) || self.created_by == Some(user_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Active,
    SoftDeleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Edit,
    ChangeStatus,
    SoftDelete,
    Restore,
    HardDelete,
}

impl LifecycleAction {
    pub fn capability(self) -> Capability {
        match self {
            LifecycleAction::Edit | LifecycleAction::ChangeStatus | LifecycleAction::SoftDelete => {
                Capability::EditDeclaration
            }
            LifecycleAction::Restore => Capability::RestoreDeclaration,
            LifecycleAction::HardDelete => Capability::DeletePermanently,
        }
    }
}

impl LifecycleState {
    /// `Err` traz a chave i18n do conflito.
    pub fn permits(self, action: LifecycleAction) -> Result<(), &'static str> {
        match (self, action) {
            (LifecycleState::Active, LifecycleAction::Edit | LifecycleAction::ChangeStatus | LifecycleAction::SoftDelete) => Ok(()),
            (LifecycleState::SoftDeleted, LifecycleAction::Restore | LifecycleAction::HardDelete) => Ok(()),
            (LifecycleState::SoftDeleted, LifecycleAction::Edit | LifecycleAction::ChangeStatus) => {
                Err("declaration.deleted_immutable")
            }
            (LifecycleState::SoftDeleted, LifecycleAction::SoftDelete) => Err("declaration.already_deleted"),
            (LifecycleState::Active, LifecycleAction::Restore) => Err("declaration.not_deleted"),
            (LifecycleState::Active, LifecycleAction::HardDelete) => Err("declaration.hard_delete_requires_soft"),
        }
    }
}

/// Leitura: quem vê tudo, ou o dono/criador.
pub fn can_read(permissions: &Permissions, caller: Uuid, facts: &DeclarationFacts) -> bool {
    permissions.can_view_all_declarations || facts.belongs_to(caller)
}

/// Capacidade (403), depois posse (403), depois estado (409).
pub fn authorize(
    permissions: &Permissions,
    caller: Uuid,
    facts: &DeclarationFacts,
    action: LifecycleAction,
) -> Result<(), AppError> {
    let capability = action.capability();
    if !permissions.allows(capability) {
        return Err(AppError::Forbidden(capability.denial_key()));
    }
    if action != LifecycleAction::HardDelete && !can_read(permissions, caller, facts) {
        return Err(AppError::Forbidden("declaration.not_owner"));
    }
    facts.state().permits(action).map_err(AppError::LifecycleConflict)
}

// GET /api/declarations/{id}/permissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationAccess {
    pub can_edit: bool,
    pub can_change_status: bool,
    pub can_delete: bool,
    pub can_restore: bool,
    pub can_delete_permanently: bool,
}

impl DeclarationAccess {
    pub fn evaluate(permissions: &Permissions, caller: Uuid, facts: &DeclarationFacts) -> Self {
        let ok = |action| authorize(permissions, caller, facts, action).is_ok();
        Self {
            can_edit: ok(LifecycleAction::Edit),
            can_change_status: ok(LifecycleAction::ChangeStatus),
            can_delete: ok(LifecycleAction::SoftDelete),
            can_restore: ok(LifecycleAction::Restore),
            can_delete_permanently: ok(LifecycleAction::HardDelete),
        }
    }
}

// ---
// Numeração das referências
// ---

/// `<prefixo><n:03>` com n = maior sufixo numérico + 1. Sem anterior, ou
/// com sufixo não numérico, começa em 1.
pub fn next_reference(prefix: &str, last: Option<&str>) -> String {
    let next = last
        .and_then(|r| r.strip_prefix(prefix))
        .and_then(|suffix| suffix.parse::<u64>().ok())
        .map_or(1, |n| n + 1);
    format!("{}{:03}", prefix, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rbac::RoleTag;

    const ACTIONS: [LifecycleAction; 5] = [
        LifecycleAction::Edit,
        LifecycleAction::ChangeStatus,
        LifecycleAction::SoftDelete,
        LifecycleAction::Restore,
        LifecycleAction::HardDelete,
    ];

    fn facts(owner: Uuid, deleted: bool) -> DeclarationFacts {
        DeclarationFacts { owner_id: Some(owner), created_by: Some(owner), is_deleted: deleted }
    }

    #[test]
    fn soft_deleted_declaration_is_never_editable() {
        let owner = Uuid::new_v4();
        for roles in [vec![RoleTag::Admin], vec![RoleTag::Supervisor], vec![RoleTag::Agent]] {
            let perms = Permissions::resolve(&roles);
            let access = DeclarationAccess::evaluate(&perms, owner, &facts(owner, true));
            assert!(!access.can_edit);
            assert!(!access.can_change_status);
            let err = authorize(&perms, owner, &facts(owner, true), LifecycleAction::Edit).unwrap_err();
            assert!(matches!(err, AppError::LifecycleConflict("declaration.deleted_immutable")));
        }
    }

    #[test]
    fn state_machine_allows_only_documented_transitions() {
        for action in ACTIONS {
            let active = LifecycleState::Active.permits(action).is_ok();
            let deleted = LifecycleState::SoftDeleted.permits(action).is_ok();
            match action {
                LifecycleAction::Restore | LifecycleAction::HardDelete => assert!(!active && deleted),
                _ => assert!(active && !deleted),
            }
        }
    }

    #[test]
    fn agent_cannot_touch_someone_elses_declaration() {
        let perms = Permissions::resolve(&[RoleTag::Agent]);
        let other = facts(Uuid::new_v4(), false);
        let err = authorize(&perms, Uuid::new_v4(), &other, LifecycleAction::Edit).unwrap_err();
        assert!(matches!(err, AppError::Forbidden("declaration.not_owner")));
        assert!(!can_read(&perms, Uuid::new_v4(), &other));
    }

    #[test]
    fn capability_is_checked_before_state() {
        let perms = Permissions::resolve(&[RoleTag::Agent]);
        let owner = Uuid::new_v4();
        let err = authorize(&perms, owner, &facts(owner, false), LifecycleAction::HardDelete).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn supervisor_restores_any_deleted_declaration() {
        let perms = Permissions::resolve(&[RoleTag::Supervisor]);
        let access = DeclarationAccess::evaluate(&perms, Uuid::new_v4(), &facts(Uuid::new_v4(), true));
        assert!(access.can_restore);
        assert!(!access.can_delete_permanently);
        assert!(!access.can_delete);
    }

    #[test]
    fn admin_hard_deletes_only_after_soft_delete() {
        let perms = Permissions::resolve(&[RoleTag::Admin]);
        let owner = Uuid::new_v4();
        assert!(DeclarationAccess::evaluate(&perms, owner, &facts(owner, true)).can_delete_permanently);
        assert!(!DeclarationAccess::evaluate(&perms, owner, &facts(owner, false)).can_delete_permanently);
    }

    #[test]
    fn creator_counts_as_owner() {
        let creator = Uuid::new_v4();
        let f = DeclarationFacts { owner_id: None, created_by: Some(creator), is_deleted: false };
        assert!(f.belongs_to(creator));
    }

    #[test]
    fn references_are_numbered_from_the_highest_numeric_suffix() {
        assert_eq!(next_reference("DECL-BKO-", None), "DECL-BKO-001");
        assert_eq!(next_reference("DECL-BKO-", Some("DECL-BKO-009")), "DECL-BKO-010");
        assert_eq!(next_reference("DECL-BKO-", Some("DECL-BKO-1234")), "DECL-BKO-1235");
        assert_eq!(next_reference("DECL-BKO-", Some("DECL-BKO-ABC")), "DECL-BKO-001");
        assert_eq!(next_reference("DECL-BKO-", Some("AUTRE-005")), "DECL-BKO-001");
    }

    #[test]
    fn status_uses_stored_names() {
        assert_eq!(serde_json::to_string(&DeclarationStatus::Enregistree).unwrap(), "\"ENREGISTREE\"");
        assert_eq!(DeclarationStatus::default(), DeclarationStatus::Enregistree);
        let q: StatusQuery = serde_json::from_value(serde_json::json!({"statut": "VALIDEE"})).unwrap();
        assert_eq!(q.statut, DeclarationStatus::Validee);
    }

    #[test]
    fn list_response_counts_its_items() {
        let list = DeclarationListResponse::from(Vec::new());
        assert_eq!(list.total, 0);
    }
}
