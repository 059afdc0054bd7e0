// src/models.rs

pub mod auth;
pub mod dashboard;
pub mod declarant;
pub mod declaration;
pub mod document_type;
pub mod rbac;
pub mod shared;
pub mod station;
pub mod system;
pub mod user;
