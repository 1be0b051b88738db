// src/handlers/tenancy.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Admin, RequireRole},
        tenancy::TenantContext,
    },
    models::{
        auth::UserEmpresa,
        empresa::{
            AddMemberPayload, CheckoutPayload, CreateEmpresaPayload, Empresa, EmpresaMembro,
            MembroDetalhe, SetPapelPayload,
        },
    },
};

#[utoipa::path(
    post,
    path = "/api/empresas",
    tag = "Empresas",
    request_body = CreateEmpresaPayload,
    responses(
        (status = 201, description = "Empresa criada; o criador vira ADMIN", body = Empresa),
        (status = 409, description = "Você já tem uma empresa com esse nome")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_empresa(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateEmpresaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let empresa = app_state
        .empresa_service
        .create_empresa_with_owner(
            &payload.nome,
            payload.cnpj.as_deref(),
            payload.descricao.as_deref(),
            user.0.id,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(empresa)))
}

#[utoipa::path(
    get,
    path = "/api/empresas",
    tag = "Empresas",
    responses(
        (status = 200, description = "Empresas do usuário", body = Vec<UserEmpresa>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_empresas(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<Json<Vec<UserEmpresa>>, ApiError> {
    let empresas = app_state
        .empresa_service
        .list_user_empresas(user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(empresas))
}

#[utoipa::path(
    put,
    path = "/api/empresa/checkout",
    tag = "Empresas",
    request_body = CheckoutPayload,
    responses(
        (status = 200, description = "Assinatura atualizada", body = Empresa),
        (status = 403, description = "Requer ADMIN")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Empresa")),
    security(("api_jwt" = []))
)]
pub async fn update_checkout(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Admin>,
    Json(payload): Json<CheckoutPayload>,
) -> Result<Json<Empresa>, ApiError> {
    let empresa = app_state
        .empresa_service
        .update_checkout(tenant.0, payload.ativa)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(empresa))
}

// --- Membros ---

#[utoipa::path(
    get,
    path = "/api/empresa/membros",
    tag = "Empresas",
    responses(
        (status = 200, description = "Membros da empresa", body = Vec<MembroDetalhe>)
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Empresa")),
    security(("api_jwt" = []))
)]
pub async fn list_members(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<Json<Vec<MembroDetalhe>>, ApiError> {
    let membros = app_state
        .empresa_service
        .list_members(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(membros))
}

#[utoipa::path(
    post,
    path = "/api/empresa/membros",
    tag = "Empresas",
    request_body = AddMemberPayload,
    responses(
        (status = 201, description = "Membro adicionado", body = EmpresaMembro),
        (status = 404, description = "Usuário não encontrado")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Empresa")),
    security(("api_jwt" = []))
)]
pub async fn add_member(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Admin>,
    Json(payload): Json<AddMemberPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let membro = app_state
        .empresa_service
        .add_member(tenant.0, &payload.email, payload.papel)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(membro)))
}

#[utoipa::path(
    put,
    path = "/api/empresa/membros/{user_id}/papel",
    tag = "Empresas",
    request_body = SetPapelPayload,
    responses(
        (status = 200, description = "Papel alterado", body = EmpresaMembro),
        (status = 422, description = "Último ADMIN da empresa")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("user_id" = Uuid, Path, description = "Usuário membro")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_member_papel(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Admin>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SetPapelPayload>,
) -> Result<Json<EmpresaMembro>, ApiError> {
    let membro = app_state
        .empresa_service
        .set_member_papel(tenant.0, user_id, payload.papel)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(membro))
}

#[utoipa::path(
    delete,
    path = "/api/empresa/membros/{user_id}",
    tag = "Empresas",
    responses(
        (status = 204, description = "Membro desativado"),
        (status = 422, description = "Último ADMIN da empresa")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("user_id" = Uuid, Path, description = "Usuário membro")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_member(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Admin>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .empresa_service
        .deactivate_member(tenant.0, user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
