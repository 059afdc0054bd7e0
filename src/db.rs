// src/db.rs

pub mod declarant_repo;
pub mod declaration_repo;
pub mod document_type_repo;
pub mod rbac_repo;
pub mod station_repo;
pub mod user_repo;

pub use declarant_repo::DeclarantRepository;
pub use declaration_repo::DeclarationRepository;
pub use document_type_repo::DocumentTypeRepository;
pub use rbac_repo::RbacRepository;
pub use station_repo::StationRepository;
pub use user_repo::UserRepository;
