// src/handlers/admin.rs

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
    models::empresa::{
        CreateEmpresaComAdminPayload, EmpresaCriada, ExclusaoEmpresaReport, ResetMemberPasswordPayload,
    },
};

#[utoipa::path(
    post,
    path = "/api/admin/empresas",
    tag = "Admin",
    request_body = CreateEmpresaComAdminPayload,
    responses(
        (status = 201, description = "Empresa e ADMIN criados", body = EmpresaCriada),
        (status = 403, description = "Requer superadmin")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_empresa_with_admin(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateEmpresaComAdminPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let criada = app_state
        .admin_service
        .create_empresa_with_admin(&user.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(criada)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/empresas/{empresa_id}",
    tag = "Admin",
    responses(
        (status = 200, description = "Relatório da exclusão por tabela", body = ExclusaoEmpresaReport),
        (status = 403, description = "Requer superadmin ou ADMIN da empresa"),
        (status = 404, description = "Empresa não encontrada")
    ),
    params(("empresa_id" = Uuid, Path, description = "Empresa a excluir")),
    security(("api_jwt" = []))
)]
pub async fn delete_empresa(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(empresa_id): Path<Uuid>,
) -> Result<Json<ExclusaoEmpresaReport>, ApiError> {
    let report = app_state
        .admin_service
        .delete_empresa(&user.0, empresa_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}

#[utoipa::path(
    post,
    path = "/api/empresa/membros/{user_id}/senha",
    tag = "Admin",
    request_body = ResetMemberPasswordPayload,
    responses(
        (status = 204, description = "Senha redefinida"),
        (status = 401, description = "Senha do ADMIN incorreta"),
        (status = 404, description = "Usuário não é membro da empresa")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("user_id" = Uuid, Path, description = "Membro que terá a senha trocada")
    ),
    security(("api_jwt" = []))
)]
pub async fn reset_member_password(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Admin>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ResetMemberPasswordPayload>,
) -> Result<StatusCode, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .admin_service
        .reset_member_password(
            tenant.0,
            &user.0,
            user_id,
            &payload.admin_password,
            &payload.new_password,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
