// src/models/dashboard.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Contagens brutas de uma consulta de agregação.
#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct StatusCounts {
    pub brouillon: i64,
    pub enregistree: i64,
    pub validee: i64,
    pub rejetee: i64,
    pub deleted: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationStats {
    pub total_declarations: i64,
    pub declarations_validees: i64,
    pub declarations_enregistrees: i64,
    pub declarations_rejetees: i64,
    pub declarations_brouillons: i64,
    pub declarations_supprimees: i64,
}

impl DeclarationStats {
    /// O total soma só as declarações ativas; as removidas contam à parte.
    pub fn from_counts(c: StatusCounts) -> Self {
        Self {
            total_declarations: c.brouillon + c.enregistree + c.validee + c.rejetee,
            declarations_validees: c.validee,
            declarations_enregistrees: c.enregistree,
            declarations_rejetees: c.rejetee,
            declarations_brouillons: c.brouillon,
            declarations_supprimees: c.deleted,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsEnvelope {
    pub success: bool,
    pub data: DeclarationStats,
    pub timestamp: DateTime<Utc>,
}

impl StatsEnvelope {
    pub fn new(data: DeclarationStats) -> Self {
        Self { success: true, data, timestamp: Utc::now() }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct StationStatsQuery {
    pub poste_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_excludes_soft_deleted() {
        let stats = DeclarationStats::from_counts(StatusCounts {
            brouillon: 1,
            enregistree: 4,
            validee: 2,
            rejetee: 1,
            deleted: 3,
        });
        assert_eq!(stats.total_declarations, 8);
        assert_eq!(stats.declarations_supprimees, 3);
    }

    #[test]
    fn envelope_uses_wire_names() {
        let json = serde_json::to_value(StatsEnvelope::new(DeclarationStats::from_counts(StatusCounts::default()))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["totalDeclarations"], 0);
        assert!(json["data"].get("declarationsSupprimees").is_some());
    }
}
