// src/middleware/auth.rs

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantContext,
    models::auth::{Claims, User},
};

/// Valida o Bearer token e coloca o usuário e as claims nos extensions.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let (user, claims) = authenticate(&app_state, request.headers()).await?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// `auth_guard` + cabeçalho `x-tenant-id` + vínculo ativo do usuário com a empresa.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let (user, claims) = authenticate(&app_state, request.headers()).await?;
    let tenant = TenantContext::from_headers(request.headers())?;

    let membro = app_state
        .empresa_repo
        .find_active_membership(user.id, tenant.0)
        .await?
        .ok_or(AppError::TenantAccessDenied)?;

    let extensions = request.extensions_mut();
    extensions.insert(AuthenticatedUser(user));
    extensions.insert(claims);
    extensions.insert(tenant);
    extensions.insert(membro);
    Ok(next.run(request).await)
}

async fn authenticate(app_state: &AppState, headers: &HeaderMap) -> Result<(User, Claims), AppError> {
    let token = bearer_token(headers).ok_or(AppError::InvalidToken)?;
    app_state.auth_service.validate_token(&token).await
}

/// Token do cabeçalho `Authorization: Bearer ...`, já sem espaços.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

/// Claims do token corrente (usadas no logout).
pub struct CurrentClaims(pub Claims);

impl<S> FromRequestParts<S> for CurrentClaims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(CurrentClaims)
            .ok_or(AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(authorization).unwrap());
        headers
    }

    #[test]
    fn extrai_token_bearer() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def.ghi ")).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn rejeita_cabecalho_sem_bearer_ou_vazio() {
        assert!(bearer_token(&HeaderMap::new()).is_none());
        assert!(bearer_token(&headers_with("Basic dXNlcjpzZW5oYQ==")).is_none());
        assert!(bearer_token(&headers_with("Bearer   ")).is_none());
    }
}
