pub mod auth;
pub mod dashboard;
pub mod declarations;
pub mod document_types;
pub mod rbac;
pub mod stations;
pub mod system;
pub mod users;
