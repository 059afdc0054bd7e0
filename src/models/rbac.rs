// src/models/rbac.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Os três papéis fixos do sistema, serializados com o rótulo guardado no banco.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum RoleTag {
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    #[serde(rename = "ROLE_SUPERVISEUR")]
    Supervisor,
    #[serde(rename = "ROLE_AGENT")]
    Agent,
}

impl RoleTag {
    pub const fn label(self) -> &'static str {
        match self {
            RoleTag::Admin => "ROLE_ADMIN",
            RoleTag::Supervisor => "ROLE_SUPERVISEUR",
            RoleTag::Agent => "ROLE_AGENT",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "ROLE_ADMIN" => Some(RoleTag::Admin),
            "ROLE_SUPERVISEUR" => Some(RoleTag::Supervisor),
            "ROLE_AGENT" => Some(RoleTag::Agent),
            _ => None,
        }
    }

    /// Prefixo da matrícula: o papel mais alto vence.
    pub fn matricule_prefix(roles: &[RoleTag]) -> &'static str {
        if roles.contains(&RoleTag::Admin) {
            "ADM-"
        } else if roles.contains(&RoleTag::Supervisor) {
            "SUP-"
        } else if roles.contains(&RoleTag::Agent) {
            "AGT-"
        } else {
            "USR-"
        }
    }
}

// O que sai do banco (Tabela roles)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "ROLE_AGENT")]
    pub label: String,
}

impl Role {
    pub fn tag(&self) -> Option<RoleTag> {
        RoleTag::from_label(&self.label)
    }
}

pub fn tags_of(roles: &[Role]) -> Vec<RoleTag> {
    roles.iter().filter_map(Role::tag).collect()
}

/// Que declarações o utilizador pode listar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationsView {
    All,
    Own,
    #[default]
    None,
}

/// Ações controladas pelo resolvedor de permissões.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewAllDeclarations,
    CreateDeclaration,
    EditDeclaration,
    RestoreDeclaration,
    ManageDocumentTypes,
    ManageUsers,
    DeletePermanently,
    TransferAdmin,
    // Criar/ativar/atualizar contas: o backend abre também ao SUPERVISEUR
    AdministerAccounts,
}

impl Capability {
    pub const fn slug(self) -> &'static str {
        match self {
            Capability::ViewAllDeclarations => "declarations:view_all",
            Capability::CreateDeclaration => "declarations:create",
            Capability::EditDeclaration => "declarations:edit",
            Capability::RestoreDeclaration => "declarations:restore",
            Capability::ManageDocumentTypes => "document_types:manage",
            Capability::ManageUsers => "users:manage",
            Capability::DeletePermanently => "records:delete_permanently",
            Capability::TransferAdmin => "users:transfer_admin",
            Capability::AdministerAccounts => "users:administer",
        }
    }

    /// Chave i18n da mensagem de recusa.
    pub const fn denial_key(self) -> &'static str {
        match self {
            Capability::ViewAllDeclarations => "rbac.denied.view_all",
            Capability::CreateDeclaration
            | Capability::EditDeclaration
            | Capability::RestoreDeclaration => "rbac.denied.declarations",
            Capability::ManageDocumentTypes => "rbac.denied.document_types",
            Capability::ManageUsers | Capability::AdministerAccounts => "rbac.denied.users",
            Capability::DeletePermanently => "rbac.denied.delete_permanently",
            Capability::TransferAdmin => "rbac.denied.transfer_admin",
        }
    }
}

/// Capacidades derivadas de um conjunto de papéis. Função pura e total:
/// o mesmo conjunto dá sempre o mesmo resultado, e o conjunto vazio não dá nada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub is_admin: bool,
    pub is_supervisor: bool,
    pub is_agent: bool,
    pub can_view_all_declarations: bool,
    pub can_create_declaration: bool,
    pub can_edit_declaration: bool,
    pub can_restore_declaration: bool,
    pub can_manage_document_types: bool,
    pub can_manage_users: bool,
    pub can_delete_permanently: bool,
    pub can_transfer_admin: bool,
    pub can_administer_accounts: bool,
    pub declarations_view: DeclarationsView,
}

impl Permissions {
    pub fn resolve(roles: &[RoleTag]) -> Self {
        let is_admin = roles.contains(&RoleTag::Admin);
        let is_supervisor = roles.contains(&RoleTag::Supervisor);
        let is_agent = roles.contains(&RoleTag::Agent);

        let any_role = is_admin || is_supervisor || is_agent;

        let declarations_view = if is_admin || is_supervisor {
            DeclarationsView::All
        } else if is_agent {
            DeclarationsView::Own
        } else {
            DeclarationsView::None
        };

        Self {
            is_admin,
            is_supervisor,
            is_agent,
            can_view_all_declarations: is_admin || is_supervisor,
            can_create_declaration: any_role,
            can_edit_declaration: any_role,
            can_restore_declaration: any_role,
            can_manage_document_types: any_role,
            can_manage_users: is_admin,
            can_delete_permanently: is_admin,
            can_transfer_admin: is_admin,
            can_administer_accounts: is_admin || is_supervisor,
            declarations_view,
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::ViewAllDeclarations => self.can_view_all_declarations,
            Capability::CreateDeclaration => self.can_create_declaration,
            Capability::EditDeclaration => self.can_edit_declaration,
            Capability::RestoreDeclaration => self.can_restore_declaration,
            Capability::ManageDocumentTypes => self.can_manage_document_types,
            Capability::ManageUsers => self.can_manage_users,
            Capability::DeletePermanently => self.can_delete_permanently,
            Capability::TransferAdmin => self.can_transfer_admin,
            Capability::AdministerAccounts => self.can_administer_accounts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [RoleTag; 3] = [RoleTag::Admin, RoleTag::Supervisor, RoleTag::Agent];

    fn every_role_set() -> Vec<Vec<RoleTag>> {
        (0u8..8)
            .map(|mask| {
                ALL.iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, r)| *r)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn agent_alone_creates_but_sees_only_own() {
        let p = Permissions::resolve(&[RoleTag::Agent]);
        assert!(p.can_create_declaration);
        assert!(!p.can_view_all_declarations);
        assert!(!p.can_manage_users);
        assert_eq!(p.declarations_view, DeclarationsView::Own);
    }

    #[test]
    fn empty_role_set_is_most_restrictive() {
        assert_eq!(Permissions::resolve(&[]), Permissions::default());
        assert_eq!(Permissions::resolve(&[]).declarations_view, DeclarationsView::None);
    }

    #[test]
    fn resolution_is_deterministic_and_order_independent() {
        for set in every_role_set() {
            let mut reversed = set.clone();
            reversed.reverse();
            assert_eq!(Permissions::resolve(&set), Permissions::resolve(&set));
            assert_eq!(Permissions::resolve(&set), Permissions::resolve(&reversed));
        }
    }

    #[test]
    fn only_admin_sets_expose_permanent_delete_and_transfer() {
        for set in every_role_set() {
            let p = Permissions::resolve(&set);
            let has_admin = set.contains(&RoleTag::Admin);
            assert_eq!(p.can_delete_permanently, has_admin);
            assert_eq!(p.can_transfer_admin, has_admin);
            assert_eq!(p.can_manage_users, has_admin);
        }
    }

    #[test]
    fn view_all_matches_admin_or_supervisor() {
        for set in every_role_set() {
            let p = Permissions::resolve(&set);
            let expected = set.contains(&RoleTag::Admin) || set.contains(&RoleTag::Supervisor);
            assert_eq!(p.can_view_all_declarations, expected);
            assert_eq!(p.declarations_view == DeclarationsView::All, expected);
        }
    }

    #[test]
    fn own_view_only_for_agent_without_higher_role() {
        let p = Permissions::resolve(&[RoleTag::Agent, RoleTag::Supervisor]);
        assert_eq!(p.declarations_view, DeclarationsView::All);
    }

    #[test]
    fn labels_round_trip_and_unknown_labels_grant_nothing() {
        for tag in ALL {
            assert_eq!(RoleTag::from_label(tag.label()), Some(tag));
        }
        let roles = vec![Role { id: Uuid::new_v4(), label: "ROLE_VISITEUR".into() }];
        assert!(tags_of(&roles).is_empty());
    }

    #[test]
    fn matricule_prefix_follows_highest_role() {
        assert_eq!(RoleTag::matricule_prefix(&[RoleTag::Agent, RoleTag::Admin]), "ADM-");
        assert_eq!(RoleTag::matricule_prefix(&[RoleTag::Agent, RoleTag::Supervisor]), "SUP-");
        assert_eq!(RoleTag::matricule_prefix(&[RoleTag::Agent]), "AGT-");
        assert_eq!(RoleTag::matricule_prefix(&[]), "USR-");
    }

    #[test]
    fn serialises_with_stored_labels() {
        assert_eq!(serde_json::to_string(&RoleTag::Supervisor).unwrap(), "\"ROLE_SUPERVISEUR\"");
    }
}
