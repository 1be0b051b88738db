// src/middleware/tenancy.rs

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::common::error::AppError;

// O nome do nosso cabeçalho HTTP customizado
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// A empresa que o usuário quer acessar.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

impl TenantContext {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let value = headers
            .get(TENANT_ID_HEADER)
            .ok_or(AppError::TenantHeaderMissing)?;

        let value_str = value.to_str().map_err(|_| AppError::TenantHeaderInvalid)?;
        let tenant_id = Uuid::parse_str(value_str.trim()).map_err(|_| AppError::TenantHeaderInvalid)?;

        Ok(TenantContext(tenant_id))
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // O tenant_guard já validou o vínculo; fora dele lemos o cabeçalho cru.
        match parts.extensions.get::<TenantContext>() {
            Some(ctx) => Ok(*ctx),
            None => TenantContext::from_headers(&parts.headers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_uuid_from_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());

        assert_eq!(TenantContext::from_headers(&headers).unwrap().0, id);
    }

    #[test]
    fn missing_and_invalid_headers_are_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(
            TenantContext::from_headers(&headers),
            Err(AppError::TenantHeaderMissing)
        ));

        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_static("loja-1"));
        assert!(matches!(
            TenantContext::from_headers(&headers),
            Err(AppError::TenantHeaderInvalid)
        ));
    }
}
