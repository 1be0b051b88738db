// src/handlers/colaboradores.rs

use axum::{
    extract::{Path, Query, State},
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
    models::colaborador::{Colaborador, ColaboradorFiltro, ColaboradorPayload},
};

#[utoipa::path(
    post,
    path = "/api/colaboradores",
    tag = "Colaboradores",
    request_body = ColaboradorPayload,
    responses(
        (status = 201, description = "Colaborador criado", body = Colaborador),
        (status = 400, description = "Dados inválidos")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Empresa")),
    security(("api_jwt" = []))
)]
pub async fn create_colaborador(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<ColaboradorPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let colaborador = app_state
        .colaborador_repo
        .create(&mut *rls_conn, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(colaborador)))
}

#[utoipa::path(
    get,
    path = "/api/colaboradores",
    tag = "Colaboradores",
    responses(
        (status = 200, description = "Lista de colaboradores", body = Vec<Colaborador>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ColaboradorFiltro
    ),
    security(("api_jwt" = []))
)]
pub async fn list_colaboradores(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(filtro): Query<ColaboradorFiltro>,
) -> Result<Json<Vec<Colaborador>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let colaboradores = app_state
        .colaborador_repo
        .list(&mut *rls_conn, tenant.0, filtro.somente_ativos)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(colaboradores))
}

#[utoipa::path(
    get,
    path = "/api/colaboradores/{id}",
    tag = "Colaboradores",
    responses(
        (status = 200, description = "Colaborador", body = Colaborador),
        (status = 404, description = "Não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do colaborador")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_colaborador(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Colaborador>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let colaborador = app_state
        .colaborador_repo
        .get(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(colaborador))
}

#[utoipa::path(
    put,
    path = "/api/colaboradores/{id}",
    tag = "Colaboradores",
    request_body = ColaboradorPayload,
    responses(
        (status = 200, description = "Colaborador atualizado", body = Colaborador),
        (status = 404, description = "Não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do colaborador")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_colaborador(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ColaboradorPayload>,
) -> Result<Json<Colaborador>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let colaborador = app_state
        .colaborador_repo
        .update(&mut *rls_conn, tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(colaborador))
}

#[utoipa::path(
    delete,
    path = "/api/colaboradores/{id}",
    tag = "Colaboradores",
    responses(
        (status = 204, description = "Colaborador removido"),
        (status = 404, description = "Não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do colaborador")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_colaborador(
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
        .colaborador_repo
        .delete(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
