// src/services/rbac_service.rs

use uuid::Uuid;

use crate::{common::error::AppError, db::RbacRepository, models::rbac::Role};

// Papéis são só leitura pela API: a taxonomia vem da migração
#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
}

impl RbacService {
    pub fn new(repo: RbacRepository) -> Self {
        Self { repo }
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        self.repo.list_roles().await
    }

    pub async fn get_role(&self, id: Uuid) -> Result<Role, AppError> {
        self.repo
            .find_role_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(id.to_string()))
    }

    pub async fn get_role_by_label(&self, label: &str) -> Result<Role, AppError> {
        self.repo
            .find_role_by_label(label)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(label.to_string()))
    }
}
