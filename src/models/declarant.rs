// src/models/declarant.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// A pessoa que declara a perda (Tabela declarants)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Declarant {
    pub id: Uuid,
    #[serde(rename = "numNina")]
    pub nina: Option<String>,
    #[serde(rename = "numCarteIdentite")]
    pub id_card_number: Option<String>,
    #[serde(rename = "numPasseport")]
    pub passport_number: Option<String>,
    #[serde(rename = "nom")]
    pub last_name: String,
    #[serde(rename = "prenom")]
    pub first_name: String,
    #[serde(rename = "dateNaissance")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "lieuNaissance")]
    pub birth_place: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "telephone")]
    pub phone: String,
    #[serde(rename = "adresse")]
    pub address: Option<String>,
}

/// Dados do declarante tal como chegam no corpo da declaração.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeclarantInput {
    #[serde(rename = "nom")]
    pub last_name: Option<String>,
    #[serde(rename = "prenom")]
    pub first_name: Option<String>,
    #[serde(rename = "telephone")]
    pub phone: Option<String>,
    #[validate(email(message = "validation.email"))]
    pub email: Option<String>,
    #[serde(rename = "adresse")]
    pub address: Option<String>,
    #[serde(rename = "numNina")]
    pub nina: Option<String>,
    #[serde(rename = "numPasseport", alias = "numPassePort")]
    pub passport_number: Option<String>,
    #[serde(rename = "numCarteIdentite")]
    pub id_card_number: Option<String>,
    #[serde(rename = "dateNaissance")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "lieuNaissance")]
    pub birth_place: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl DeclarantInput {
    /// Remove espaços e transforma campos em branco em `None`.
    pub fn normalized(self) -> Self {
        Self {
            last_name: clean(self.last_name),
            first_name: clean(self.first_name),
            phone: clean(self.phone),
            email: clean(self.email),
            address: clean(self.address),
            nina: clean(self.nina),
            passport_number: clean(self.passport_number),
            id_card_number: clean(self.id_card_number),
            birth_date: self.birth_date,
            birth_place: clean(self.birth_place),
        }
    }

    /// Primeiro identificador presente, pela ordem de pesquisa.
    pub fn lookup_key(&self) -> Option<DeclarantLookup<'_>> {
        if let Some(v) = &self.nina {
            Some(DeclarantLookup::Nina(v))
        } else if let Some(v) = &self.id_card_number {
            Some(DeclarantLookup::IdCard(v))
        } else if let Some(v) = &self.passport_number {
            Some(DeclarantLookup::Passport(v))
        } else {
            self.email.as_deref().map(DeclarantLookup::Email)
        }
    }
}

/// Chave usada para encontrar um declarante existente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarantLookup<'a> {
    Nina(&'a str),
    IdCard(&'a str),
    Passport(&'a str),
    Email(&'a str),
}

impl DeclarantLookup<'_> {
    pub fn column(&self) -> &'static str {
        match self {
            DeclarantLookup::Nina(_) => "nina",
            DeclarantLookup::IdCard(_) => "id_card_number",
            DeclarantLookup::Passport(_) => "passport_number",
            DeclarantLookup::Email(_) => "email",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            DeclarantLookup::Nina(v)
            | DeclarantLookup::IdCard(v)
            | DeclarantLookup::Passport(v)
            | DeclarantLookup::Email(v) => *v,
        }
    }
}

// POST /api/declarations/rechercher-declarant
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DeclarantSearchPayload {
    pub email: Option<String>,
    #[serde(rename = "numNina")]
    pub nina: Option<String>,
    #[serde(rename = "numPassePort", alias = "numPasseport")]
    pub passport_number: Option<String>,
    #[serde(rename = "numCarteIdentite")]
    pub id_card_number: Option<String>,
}

fn pick(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl DeclarantSearchPayload {
    /// Pela ordem: e-mail, NINA, passaporte, CNI. O primeiro não vazio vence.
    pub fn lookup_key(&self) -> Option<DeclarantLookup<'_>> {
        pick(&self.email)
            .map(DeclarantLookup::Email)
            .or_else(|| pick(&self.nina).map(DeclarantLookup::Nina))
            .or_else(|| pick(&self.passport_number).map(DeclarantLookup::Passport))
            .or_else(|| pick(&self.id_card_number).map(DeclarantLookup::IdCard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_trims_and_blanks_become_none() {
        let input = DeclarantInput {
            last_name: Some("  Coulibaly ".into()),
            email: Some("   ".into()),
            nina: Some("".into()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(input.last_name.as_deref(), Some("Coulibaly"));
        assert!(input.email.is_none());
        assert!(input.nina.is_none());
    }

    #[test]
    fn creation_lookup_prefers_nina_then_card_then_passport_then_email() {
        let mut input = DeclarantInput {
            email: Some("a@b.ml".into()),
            passport_number: Some("P1".into()),
            id_card_number: Some("C1".into()),
            nina: Some("N1".into()),
            ..Default::default()
        };
        assert_eq!(input.lookup_key(), Some(DeclarantLookup::Nina("N1")));
        input.nina = None;
        assert_eq!(input.lookup_key(), Some(DeclarantLookup::IdCard("C1")));
        input.id_card_number = None;
        assert_eq!(input.lookup_key(), Some(DeclarantLookup::Passport("P1")));
        input.passport_number = None;
        assert_eq!(input.lookup_key(), Some(DeclarantLookup::Email("a@b.ml")));
        input.email = None;
        assert_eq!(input.lookup_key(), None);
    }

    #[test]
    fn search_takes_first_non_blank_identifier() {
        let payload: DeclarantSearchPayload = serde_json::from_value(serde_json::json!({
            "email": "  ",
            "numNina": "",
            "numPassePort": " P-77 ",
            "numCarteIdentite": "C-1"
        }))
        .unwrap();
        let key = payload.lookup_key().unwrap();
        assert_eq!(key, DeclarantLookup::Passport("P-77"));
        assert_eq!(key.column(), "passport_number");
    }

    #[test]
    fn search_without_identifier_has_no_key() {
        assert!(DeclarantSearchPayload::default().lookup_key().is_none());
    }
}
