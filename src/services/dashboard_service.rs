// src/services/dashboard_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::DeclarationRepository,
    models::{
        dashboard::DeclarationStats,
        rbac::DeclarationsView,
        user::CurrentUser,
    },
};

#[derive(Clone)]
pub struct DashboardService {
    repo: DeclarationRepository,
}

impl DashboardService {
    pub fn new(repo: DeclarationRepository) -> Self {
        Self { repo }
    }

    /// Estatísticas no alcance do utilizador: globais para quem vê tudo,
    /// só as suas para os restantes.
    pub async fn stats_for(&self, current: &CurrentUser) -> Result<DeclarationStats, AppError> {
        let user_id = match current.permissions.declarations_view {
            DeclarationsView::All => None,
            DeclarationsView::Own => Some(current.id()),
            DeclarationsView::None => return Err(AppError::Forbidden("rbac.denied.declarations")),
        };
        let counts = self.repo.count_by_status(user_id, None).await?;
        Ok(DeclarationStats::from_counts(counts))
    }

    pub async fn stats_of_user(&self, current: &CurrentUser, user_id: Uuid) -> Result<DeclarationStats, AppError> {
        if user_id != current.id() && !current.permissions.can_view_all_declarations {
            return Err(AppError::Forbidden("rbac.denied.view_all"));
        }
        let counts = self.repo.count_by_status(Some(user_id), None).await?;
        Ok(DeclarationStats::from_counts(counts))
    }

    /// Sem posto indicado, usa o do próprio utilizador.
    pub async fn stats_of_station(&self, current: &CurrentUser, station_id: Option<Uuid>) -> Result<DeclarationStats, AppError> {
        let station_id = station_id.unwrap_or(current.user.station_id);
        let counts = self.repo.count_by_status(None, Some(station_id)).await?;
        Ok(DeclarationStats::from_counts(counts))
    }
}
