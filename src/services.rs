pub mod auth;
pub mod dashboard_service;
pub mod declarant_service;
pub mod declaration_service;
pub mod document_service;
pub mod document_type_service;
pub mod mailer;
pub mod rbac_service;
pub mod station_service;
pub mod system_service;
pub mod user_service;
