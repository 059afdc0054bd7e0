// src/common/i18n.rs

use std::collections::HashMap;

use anyhow::Context;

pub const DEFAULT_LANG: &str = "fr";

// Catálogos embutidos no binário
const CATALOGS: &[(&str, &str)] = &[
    ("fr", include_str!("../../locales/fr.json")),
    ("en", include_str!("../../locales/en.json")),
];

/// Mensagens traduzidas, indexadas por idioma e depois por chave.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();
        for (lang, raw) in CATALOGS {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("Catálogo de mensagens inválido: {}", lang))?;
            catalogs.insert(lang.to_string(), messages);
        }
        Ok(Self { catalogs })
    }

    /// Idioma pedido, depois o padrão, depois a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.lookup(lang, key)
            .or_else(|| self.lookup(DEFAULT_LANG, key))
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }

    pub fn translate_with(&self, lang: &str, key: &str, arg: &str) -> String {
        self.translate(lang, key).replacen("{}", arg, 1)
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.catalogs.get(lang)?.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_has_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let fr = &store.catalogs["fr"];
        let en = &store.catalogs["en"];
        for key in fr.keys() {
            assert!(en.contains_key(key), "chave ausente em en: {}", key);
        }
        assert_eq!(fr.len(), en.len());
    }

    #[test]
    fn unknown_language_falls_back_to_french() {
        let store = I18nStore::load().unwrap();
        assert_eq!(
            store.translate("de", "auth.invalid_credentials"),
            store.translate("fr", "auth.invalid_credentials")
        );
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::load().unwrap();
        assert_eq!(store.translate("fr", "nao.existe"), "nao.existe");
    }

    #[test]
    fn argument_is_substituted_once() {
        let store = I18nStore::load().unwrap();
        let msg = store.translate_with("fr", "error.not_found", "DECL-BKO-007");
        assert!(msg.contains("DECL-BKO-007"));
        assert!(!msg.contains("{}"));
    }
}
