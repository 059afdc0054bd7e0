// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::profile,
        handlers::auth::permissions,
        handlers::auth::refresh,
        handlers::auth::forgot_password,
        handlers::auth::reset_password,

        // --- Utilisateurs ---
        handlers::users::create_user,
        handlers::users::list_users,
        handlers::users::list_active_users,
        handlers::users::list_inactive_users,
        handlers::users::list_deleted_users,
        handlers::users::get_user,
        handlers::users::exists_admin,
        handlers::users::activate_user,
        handlers::users::deactivate_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::users::restore_user,
        handlers::users::hard_delete_user,
        handlers::users::transfer_admin,

        // --- Declarations ---
        handlers::declarations::create_declaration,
        handlers::declarations::update_declaration,
        handlers::declarations::change_status,
        handlers::declarations::soft_delete_declaration,
        handlers::declarations::restore_declaration,
        handlers::declarations::hard_delete_declaration,
        handlers::declarations::get_declaration,
        handlers::declarations::get_by_reference,
        handlers::declarations::list_declarations,
        handlers::declarations::list_own_active,
        handlers::declarations::list_own_deleted,
        handlers::declarations::list_station_active,
        handlers::declarations::list_station_deleted,
        handlers::declarations::declaration_permissions,
        handlers::declarations::declaration_pdf,
        handlers::declarations::search_declarant,

        // --- Types de document ---
        handlers::document_types::list_document_types,
        handlers::document_types::get_document_type,
        handlers::document_types::create_document_type,
        handlers::document_types::update_document_type,
        handlers::document_types::delete_document_type,

        // --- Roles ---
        handlers::rbac::list_roles,
        handlers::rbac::get_role,
        handlers::rbac::get_role_by_label,

        // --- Postes ---
        handlers::stations::list_stations,
        handlers::stations::get_station,
        handlers::stations::create_station,

        // --- System ---
        handlers::system::system_state,
        handlers::system::initialize_system,

        // --- Dashboard ---
        handlers::dashboard::get_stats,
        handlers::dashboard::get_user_stats,
        handlers::dashboard::get_station_stats,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::auth::TokenResponse,
            models::auth::ForgotPasswordPayload,
            models::auth::ResetPasswordPayload,

            // --- Utilisateurs ---
            models::user::UserProfile,
            models::user::ProfileResponse,
            models::user::CreateUserPayload,
            models::user::UpdateUserPayload,
            models::user::RoleIdsPayload,
            models::user::ExistsAdminResponse,

            // --- RBAC ---
            models::rbac::Role,
            models::rbac::RoleTag,
            models::rbac::Permissions,
            models::rbac::DeclarationsView,

            // --- Declarations ---
            models::declaration::DeclarationStatus,
            models::declaration::DeclarationDetail,
            models::declaration::DeclarationListResponse,
            models::declaration::CreateDeclarationPayload,
            models::declaration::UpdateDeclarationPayload,
            models::declaration::DeclarationAccess,
            models::declarant::Declarant,
            models::declarant::DeclarantInput,
            models::declarant::DeclarantSearchPayload,

            // --- Referência ---
            models::document_type::DocumentType,
            models::document_type::DocumentTypePayload,
            models::station::Station,
            models::station::CreateStationPayload,
            models::system::SystemState,
            models::system::InitializePayload,

            // --- Dashboard ---
            models::dashboard::DeclarationStats,
            models::dashboard::StatsEnvelope,

            models::shared::MessageResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação, sessão e redefinição de senha"),
        (name = "Utilisateurs", description = "Ciclo de vida das contas"),
        (name = "Declarations", description = "Declarações de perda e o seu ciclo de vida"),
        (name = "Types de document", description = "Catálogo dos tipos de documento"),
        (name = "Roles", description = "Papéis fixos do sistema"),
        (name = "Postes de police", description = "Postos de polícia"),
        (name = "System", description = "Estado e inicialização do sistema"),
        (name = "Dashboard", description = "Indicadores das declarações")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
