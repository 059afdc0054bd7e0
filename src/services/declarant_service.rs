// src/services/declarant_service.rs

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{DeclarantRepository, UserRepository},
    models::declarant::{Declarant, DeclarantInput, DeclarantSearchPayload},
};

#[derive(Clone)]
pub struct DeclarantService {
    repo: DeclarantRepository,
    user_repo: UserRepository,
}

impl DeclarantService {
    pub fn new(repo: DeclarantRepository, user_repo: UserRepository) -> Self {
        Self { repo, user_repo }
    }

    /// Reaproveita o declarante pelo primeiro identificador conhecido
    /// (NINA, CNI, passaporte, e-mail); senão cria um novo.
    pub async fn find_or_create(&self, conn: &mut PgConnection, input: DeclarantInput) -> Result<Declarant, AppError> {
        let input = input.normalized();

        if let Some(key) = input.lookup_key() {
            if let Some(existing) = self.repo.find_by(&mut *conn, key).await? {
                return Ok(existing);
            }
        }

        if input.last_name.is_none() || input.first_name.is_none() || input.phone.is_none() {
            return Err(AppError::RuleViolation("declarant.required_fields"));
        }

        self.ensure_unique(conn, &input, None).await?;
        let declarant = self.repo.create(&mut *conn, &input).await?;
        tracing::info!("👤 Declarante criado: {} {}", declarant.first_name, declarant.last_name);
        Ok(declarant)
    }

    pub async fn update(&self, conn: &mut PgConnection, id: Uuid, input: DeclarantInput) -> Result<Declarant, AppError> {
        let input = input.normalized();
        self.ensure_unique(conn, &input, Some(id)).await?;
        self.repo.update(&mut *conn, id, &input).await
    }

    pub async fn search(&self, payload: &DeclarantSearchPayload) -> Result<Declarant, AppError> {
        let key = payload
            .lookup_key()
            .ok_or(AppError::RuleViolation("declarant.search_key_required"))?;

        self.repo
            .search(key)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(key.value().to_string()))
    }

    async fn ensure_unique(
        &self,
        conn: &mut PgConnection,
        input: &DeclarantInput,
        excluding: Option<Uuid>,
    ) -> Result<(), AppError> {
        if let Some(email) = &input.email {
            if self.repo.value_taken(&mut *conn, "email", email, excluding).await? {
                return Err(AppError::Duplicate("declarant.duplicate_email", email.clone()));
            }
            // O e-mail de um declarante não pode ser o de uma conta
            if self.user_repo.email_exists(&mut *conn, email, None).await? {
                return Err(AppError::Duplicate("declarant.email_is_user", email.clone()));
            }
        }

        let identifiers = [
            ("nina", "NINA", &input.nina),
            ("id_card_number", "CNI", &input.id_card_number),
            ("passport_number", "passeport", &input.passport_number),
        ];
        for (column, name, value) in identifiers {
            if let Some(value) = value {
                if self.repo.value_taken(&mut *conn, column, value, excluding).await? {
                    return Err(AppError::Duplicate("declarant.duplicate_identifier", name.to_string()));
                }
            }
        }

        if let Some(phone) = &input.phone {
            if self.repo.value_taken(&mut *conn, "phone", phone, excluding).await? {
                return Err(AppError::Duplicate("declarant.duplicate_phone", phone.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn service(pool: &PgPool) -> DeclarantService {
        DeclarantService::new(DeclarantRepository::new(pool.clone()), UserRepository::new(pool.clone()))
    }

    fn input(nina: Option<&str>, phone: &str) -> DeclarantInput {
        DeclarantInput {
            last_name: Some(" Keïta ".into()),
            first_name: Some("Fatoumata".into()),
            phone: Some(phone.into()),
            nina: nina.map(str::to_string),
            ..Default::default()
        }
    }

    #[sqlx::test]
    #[ignore = "requer DATABASE_URL"]
    async fn known_identifier_returns_the_existing_declarant(pool: PgPool) {
        let declarants = service(&pool);
        let mut conn = pool.acquire().await.unwrap();

        let created = declarants
            .find_or_create(&mut *conn, input(Some("20202020202020"), "70000001"))
            .await
            .unwrap();
        assert_eq!(created.last_name, "Keïta");

        // Mesmo NINA, outros dados: reaproveita sem tocar no registo
        let again = declarants
            .find_or_create(&mut *conn, DeclarantInput {
                first_name: Some("Autre".into()),
                ..input(Some(" 20202020202020 "), "70000099")
            })
            .await
            .unwrap();
        assert_eq!(again.id, created.id);
        assert_eq!(again.first_name, "Fatoumata");
    }

    #[sqlx::test]
    #[ignore = "requer DATABASE_URL"]
    async fn new_declarant_needs_names_and_a_free_phone(pool: PgPool) {
        let declarants = service(&pool);
        let mut conn = pool.acquire().await.unwrap();

        let err = declarants
            .find_or_create(&mut *conn, DeclarantInput { phone: Some("70000002".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RuleViolation("declarant.required_fields")), "{:?}", err);

        declarants.find_or_create(&mut *conn, input(None, "70000003")).await.unwrap();
        let err = declarants
            .find_or_create(&mut *conn, input(Some("30303030303030"), "70000003"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate("declarant.duplicate_phone", _)), "{:?}", err);
    }
}
