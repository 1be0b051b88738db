// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "pt";

/// Catálogos de mensagens embutidos no binário.
const CATALOGS: &[(&str, &str)] = &[
    ("pt", include_str!("../../locales/pt.json")),
    ("en", include_str!("../../locales/en.json")),
];

#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn embedded() -> Self {
        let mut messages = HashMap::new();
        for (lang, raw) in CATALOGS {
            // Os catálogos são fixos; um JSON inválido aqui vira catálogo vazio.
            let catalog: HashMap<String, String> = match serde_json::from_str(raw) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("Catálogo de idioma '{}' inválido: {}", lang, e);
                    HashMap::new()
                }
            };
            messages.insert(lang.to_string(), catalog);
        }
        Self { messages }
    }

    /// Traduz uma chave, trocando `{param}` pelos valores informados.
    /// Idioma desconhecido cai no padrão; chave desconhecida volta a própria chave.
    pub fn translate(&self, lang: &str, key: &str, params: &[(&str, &str)]) -> String {
        let template = self
            .messages
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string());

        params.iter().fold(template, |acc, (name, value)| {
            acc.replace(&format!("{{{}}}", name), value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_catalogs_have_the_same_keys() {
        let store = I18nStore::embedded();
        let mut pt: Vec<_> = store.messages["pt"].keys().collect();
        let mut en: Vec<_> = store.messages["en"].keys().collect();
        pt.sort();
        en.sort();
        assert!(!pt.is_empty());
        assert_eq!(pt, en);
    }

    #[test]
    fn unknown_language_falls_back_to_portuguese() {
        let store = I18nStore::embedded();
        assert_eq!(
            store.translate("de", "error.invalid_token", &[]),
            "Token de autenticação inválido ou ausente."
        );
    }

    #[test]
    fn placeholders_are_replaced() {
        let store = I18nStore::embedded();
        let msg = store.translate("en", "error.forbidden_role", &[("papel", "ADMIN")]);
        assert_eq!(msg, "You need the 'ADMIN' role to perform this action.");
    }

    #[test]
    fn unknown_key_returns_the_key() {
        let store = I18nStore::embedded();
        assert_eq!(store.translate("pt", "error.nao_existe", &[]), "error.nao_existe");
    }
}
