// src/handlers/lotes.rs

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
    models::{
        lote::{
            CreateLotePayload, DetalhesLote, Lote, LoteFiltro, Producao, RegistrarProducaoPayload,
            UpdateLotePayload,
        },
        material::{ConsumoMaterial, ConsumoPayload},
    },
};

// =============================================================================
//  LOTES
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/lotes",
    tag = "Lotes",
    request_body = CreateLotePayload,
    responses(
        (status = 201, description = "Lote criado como PENDENTE", body = Lote),
        (status = 409, description = "Código de lote já usado")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Empresa")),
    security(("api_jwt" = []))
)]
pub async fn create_lote(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<CreateLotePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let lote = app_state
        .lote_service
        .create_lote(&mut *rls_conn, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(lote)))
}

#[utoipa::path(
    get,
    path = "/api/lotes",
    tag = "Lotes",
    responses((status = 200, description = "Lotes (filtro por status e produto)", body = Vec<Lote>)),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        LoteFiltro
    ),
    security(("api_jwt" = []))
)]
pub async fn list_lotes(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(filtro): Query<LoteFiltro>,
) -> Result<Json<Vec<Lote>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let lotes = app_state
        .lote_service
        .list_lotes(&mut *rls_conn, tenant.0, &filtro)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lotes))
}

#[utoipa::path(
    get,
    path = "/api/lotes/{id}",
    tag = "Lotes",
    responses(
        (status = 200, description = "Lote", body = Lote),
        (status = 404, description = "Não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do lote")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lote(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Lote>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let lote = app_state
        .lote_service
        .get_lote(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lote))
}

#[utoipa::path(
    put,
    path = "/api/lotes/{id}",
    tag = "Lotes",
    request_body = UpdateLotePayload,
    responses(
        (status = 200, description = "Lote atualizado", body = Lote),
        (status = 422, description = "Transição de status não permitida")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do lote")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lote(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLotePayload>,
) -> Result<Json<Lote>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let lote = app_state
        .lote_service
        .update_lote(&mut *rls_conn, tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lote))
}

#[utoipa::path(
    delete,
    path = "/api/lotes/{id}",
    tag = "Lotes",
    responses(
        (status = 204, description = "Lote removido com apontamentos e consumos"),
        (status = 404, description = "Não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do lote")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_lote(
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
        .lote_service
        .delete_lote(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/lotes/{id}/detalhes",
    tag = "Lotes",
    responses(
        (status = 200, description = "Progresso por etapa, eficiência, consumo e prazos", body = DetalhesLote),
        (status = 404, description = "Não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do lote")
    ),
    security(("api_jwt" = []))
)]
pub async fn detalhes_lote(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<DetalhesLote>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detalhes = app_state
        .lote_service
        .detalhes_lote(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detalhes))
}

// =============================================================================
//  APONTAMENTOS DE PRODUÇÃO
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/lotes/{id}/producoes",
    tag = "Lotes",
    request_body = RegistrarProducaoPayload,
    responses(
        (status = 201, description = "Produção registrada; o status do lote pode avançar", body = Producao),
        (status = 422, description = "Lote encerrado ou etapa de outro produto")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do lote")
    ),
    security(("api_jwt" = []))
)]
pub async fn registrar_producao(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(lote_id): Path<Uuid>,
    Json(payload): Json<RegistrarProducaoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let producao = app_state
        .lote_service
        .registrar_producao(&mut *rls_conn, tenant.0, lote_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(producao)))
}

#[utoipa::path(
    get,
    path = "/api/lotes/{id}/producoes",
    tag = "Lotes",
    responses((status = 200, description = "Apontamentos do lote", body = Vec<Producao>)),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do lote")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_producoes(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(lote_id): Path<Uuid>,
) -> Result<Json<Vec<Producao>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let producoes = app_state
        .lote_service
        .list_producoes(&mut *rls_conn, tenant.0, lote_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(producoes))
}

#[utoipa::path(
    delete,
    path = "/api/lotes/{id}/producoes/{producao_id}",
    tag = "Lotes",
    responses(
        (status = 204, description = "Apontamento removido"),
        (status = 422, description = "Lote encerrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do lote"),
        ("producao_id" = Uuid, Path, description = "ID do apontamento")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_producao(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Path((lote_id, producao_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .lote_service
        .delete_producao(&mut *rls_conn, tenant.0, lote_id, producao_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  CONSUMO DE MATERIAL
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/lotes/{id}/consumos",
    tag = "Lotes",
    request_body = ConsumoPayload,
    responses(
        (status = 201, description = "Consumo registrado", body = ConsumoMaterial),
        (status = 422, description = "Lote cancelado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do lote")
    ),
    security(("api_jwt" = []))
)]
pub async fn registrar_consumo(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(lote_id): Path<Uuid>,
    Json(payload): Json<ConsumoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let consumo = app_state
        .lote_service
        .registrar_consumo(&mut *rls_conn, tenant.0, lote_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(consumo)))
}

#[utoipa::path(
    get,
    path = "/api/lotes/{id}/consumos",
    tag = "Lotes",
    responses((status = 200, description = "Consumos de material do lote", body = Vec<ConsumoMaterial>)),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do lote")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_consumos(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(lote_id): Path<Uuid>,
) -> Result<Json<Vec<ConsumoMaterial>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let consumos = app_state
        .lote_service
        .list_consumos(&mut *rls_conn, tenant.0, lote_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(consumos))
}

#[utoipa::path(
    delete,
    path = "/api/lotes/{id}/consumos/{consumo_id}",
    tag = "Lotes",
    responses(
        (status = 204, description = "Consumo removido"),
        (status = 404, description = "Não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do lote"),
        ("consumo_id" = Uuid, Path, description = "ID do consumo")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_consumo(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Path((lote_id, consumo_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .lote_service
        .delete_consumo(&mut *rls_conn, tenant.0, lote_id, consumo_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
