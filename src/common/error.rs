use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::common::i18n::{I18nStore, DEFAULT_LANG};
use crate::middleware::i18n::Locale;

// Nosso tipo de erro de domínio, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Empresa já existe: {0}")]
    EmpresaNameAlreadyExists(String),

    #[error("Papel insuficiente: {0}")]
    ForbiddenRole(&'static str),

    #[error("Acesso negado à empresa")]
    TenantAccessDenied,

    #[error("Cabeçalho X-Tenant-ID ausente")]
    TenantHeaderMissing,

    #[error("Cabeçalho X-Tenant-ID inválido")]
    TenantHeaderInvalid,

    #[error("Requer superadmin")]
    SuperadminRequired,

    #[error("Regra de negócio: {0}")]
    BusinessRule(String),

    #[error("Upload inválido: {0}")]
    InvalidUpload(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// O erro que de fato sai pela API, já traduzido.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Status HTTP, chave de tradução e parâmetros de cada variante.
    fn describe(&self) -> (StatusCode, &'static str, Vec<(&'static str, String)>) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "error.validation", vec![]),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "error.email_exists", vec![]),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "error.invalid_credentials", vec![]),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "error.invalid_token", vec![]),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "error.user_not_found", vec![]),
            AppError::ResourceNotFound(recurso) => {
                (StatusCode::NOT_FOUND, "error.not_found", vec![("recurso", recurso.clone())])
            }
            AppError::UniqueConstraintViolation(detalhe) => {
                (StatusCode::CONFLICT, "error.conflict", vec![("detalhe", detalhe.clone())])
            }
            AppError::EmpresaNameAlreadyExists(nome) => {
                (StatusCode::CONFLICT, "error.empresa_name_exists", vec![("nome", nome.clone())])
            }
            AppError::ForbiddenRole(papel) => {
                (StatusCode::FORBIDDEN, "error.forbidden_role", vec![("papel", papel.to_string())])
            }
            AppError::TenantAccessDenied => (StatusCode::FORBIDDEN, "error.tenant_access_denied", vec![]),
            AppError::TenantHeaderMissing => (StatusCode::BAD_REQUEST, "error.tenant_header_missing", vec![]),
            AppError::TenantHeaderInvalid => (StatusCode::BAD_REQUEST, "error.tenant_header_invalid", vec![]),
            AppError::SuperadminRequired => (StatusCode::FORBIDDEN, "error.superadmin_required", vec![]),
            AppError::BusinessRule(detalhe) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "error.business_rule", vec![("detalhe", detalhe.clone())])
            }
            AppError::InvalidUpload(detalhe) => {
                (StatusCode::BAD_REQUEST, "error.invalid_upload", vec![("detalhe", detalhe.clone())])
            }
            AppError::FontNotFound(_) => (StatusCode::INTERNAL_SERVER_ERROR, "error.font_not_found", vec![]),
            // Linha inexistente vira 404, o resto do banco vira 500.
            AppError::DatabaseError(sqlx::Error::RowNotFound) => {
                (StatusCode::NOT_FOUND, "error.not_found", vec![("recurso", "registro".to_string())])
            }
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "error.internal", vec![]),
        }
    }

    /// Converte o erro de domínio no erro da API, traduzido para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let (status, key, params) = self.describe();

        if status.is_server_error() {
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let params: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let error = store.translate(&locale.0, key, &params);

        let details = match self {
            AppError::ValidationError(errors) => Some(validation_details(errors)),
            _ => None,
        };

        ApiError { status, error, details }
    }
}

// Usado pelos middlewares, que não têm o idioma do cliente em mãos.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let store = I18nStore::embedded();
        self.to_api_error(&Locale(DEFAULT_LANG.to_string()), &store)
            .into_response()
    }
}

fn validation_details(errors: &validator::ValidationErrors) -> serde_json::Value {
    let mut details = HashMap::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| match &e.message {
                Some(m) => m.to_string(),
                None => e.code.to_string(),
            })
            .collect();
        details.insert(field.to_string(), messages);
    }
    json!(details)
}

/// Mapeia violação de unicidade do Postgres para `UniqueConstraintViolation`.
pub(crate) fn map_unique_violation(e: sqlx::Error, detalhe: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(detalhe.to_string());
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    fn pt() -> Locale {
        Locale("pt".to_string())
    }

    #[test]
    fn not_found_is_translated_with_resource_name() {
        let store = I18nStore::embedded();
        let api = AppError::ResourceNotFound("Lote L-001".into()).to_api_error(&pt(), &store);

        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.error, "Recurso não encontrado: Lote L-001.");
        assert!(api.details.is_none());
    }

    #[test]
    fn english_locale_uses_english_catalog() {
        let store = I18nStore::embedded();
        let api = AppError::InvalidCredentials.to_api_error(&Locale("en".into()), &store);

        assert_eq!(api.status, StatusCode::UNAUTHORIZED);
        assert_eq!(api.error, "Invalid e-mail or password.");
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("length");
        err.message = Some("O nome é obrigatório.".into());
        errors.add("nome", err);

        let store = I18nStore::embedded();
        let api = AppError::ValidationError(errors).to_api_error(&pt(), &store);

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["nome"][0], "O nome é obrigatório.");
    }

    #[test]
    fn row_not_found_maps_to_404_and_other_db_errors_to_500() {
        let store = I18nStore::embedded();

        let missing = AppError::DatabaseError(sqlx::Error::RowNotFound).to_api_error(&pt(), &store);
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let closed = AppError::DatabaseError(sqlx::Error::PoolClosed).to_api_error(&pt(), &store);
        assert_eq!(closed.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(closed.error, "Ocorreu um erro inesperado.");
    }

    #[test]
    fn business_rule_is_unprocessable() {
        let store = I18nStore::embedded();
        let api = AppError::BusinessRule("lote concluído".into()).to_api_error(&pt(), &store);

        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.error, "Operação não permitida: lote concluído.");
    }
}
