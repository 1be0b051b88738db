// src/handlers/materiais.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Gestor, RequireRole},
        tenancy::TenantContext,
    },
    models::material::{Material, MaterialPayload},
};

#[utoipa::path(
    post,
    path = "/api/materiais",
    tag = "Materiais",
    request_body = MaterialPayload,
    responses(
        (status = 201, description = "Material criado", body = Material),
        (status = 409, description = "Nome já usado")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Empresa")),
    security(("api_jwt" = []))
)]
pub async fn create_material(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<MaterialPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let material = app_state
        .material_repo
        .create(&mut *rls_conn, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(material)))
}

#[utoipa::path(
    get,
    path = "/api/materiais",
    tag = "Materiais",
    responses((status = 200, description = "Lista de materiais", body = Vec<Material>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Empresa")),
    security(("api_jwt" = []))
)]
pub async fn list_materiais(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<Vec<Material>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let materiais = app_state
        .material_repo
        .list(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(materiais))
}

#[utoipa::path(
    get,
    path = "/api/materiais/{id}",
    tag = "Materiais",
    responses(
        (status = 200, description = "Material", body = Material),
        (status = 404, description = "Não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do material")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_material(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Material>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let material = app_state
        .material_repo
        .get(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(material))
}

#[utoipa::path(
    put,
    path = "/api/materiais/{id}",
    tag = "Materiais",
    request_body = MaterialPayload,
    responses(
        (status = 200, description = "Material atualizado", body = Material),
        (status = 404, description = "Não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do material")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_material(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MaterialPayload>,
) -> Result<Json<Material>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let material = app_state
        .material_repo
        .update(&mut *rls_conn, tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(material))
}

#[utoipa::path(
    delete,
    path = "/api/materiais/{id}",
    tag = "Materiais",
    responses(
        (status = 204, description = "Material removido"),
        (status = 422, description = "Material usado em ficha técnica ou consumo")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do material")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_material(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .material_repo
        .delete(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
