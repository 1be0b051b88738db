// src/handlers/comercial.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        business_days::first_day_of_month,
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
    models::comercial::{
        PeriodoFiltro, Projecao, ProjecaoFiltro, ProjecaoPayload, ResumoVendasPerdidas, VendaPerdida,
        VendaPerdidaPayload,
    },
};

// =============================================================================
//  PROJEÇÕES DE VENDA
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/projecoes",
    tag = "Comercial",
    request_body = ProjecaoPayload,
    responses(
        (status = 201, description = "Projeção criada (mês normalizado para o dia 1)", body = Projecao),
        (status = 409, description = "Já existe projeção do produto no mês")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Empresa")),
    security(("api_jwt" = []))
)]
pub async fn create_projecao(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<ProjecaoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .produto_repo
        .get(&mut *rls_conn, tenant.0, payload.produto_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let projecao = app_state
        .comercial_repo
        .create_projecao(
            &mut *rls_conn,
            tenant.0,
            payload.produto_id,
            first_day_of_month(payload.mes),
            payload.quantidade,
            payload.observacoes.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(projecao)))
}

#[utoipa::path(
    get,
    path = "/api/projecoes",
    tag = "Comercial",
    responses((status = 200, description = "Projeções (opcionalmente de um mês)", body = Vec<Projecao>)),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ProjecaoFiltro
    ),
    security(("api_jwt" = []))
)]
pub async fn list_projecoes(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(filtro): Query<ProjecaoFiltro>,
) -> Result<Json<Vec<Projecao>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let projecoes = app_state
        .comercial_repo
        .list_projecoes(&mut *rls_conn, tenant.0, filtro.mes.map(first_day_of_month))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(projecoes))
}

#[utoipa::path(
    put,
    path = "/api/projecoes/{id}",
    tag = "Comercial",
    request_body = ProjecaoPayload,
    responses(
        (status = 200, description = "Projeção atualizada", body = Projecao),
        (status = 404, description = "Não encontrada")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID da projeção")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_projecao(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProjecaoPayload>,
) -> Result<Json<Projecao>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // O produto de uma projeção não muda; só mês, quantidade e observações.
    let projecao = app_state
        .comercial_repo
        .update_projecao(
            &mut *rls_conn,
            tenant.0,
            id,
            first_day_of_month(payload.mes),
            payload.quantidade,
            payload.observacoes.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(projecao))
}

#[utoipa::path(
    delete,
    path = "/api/projecoes/{id}",
    tag = "Comercial",
    responses(
        (status = 204, description = "Projeção removida"),
        (status = 404, description = "Não encontrada")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID da projeção")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_projecao(
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
        .comercial_repo
        .delete_projecao(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  VENDAS PERDIDAS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/vendas-perdidas",
    tag = "Comercial",
    request_body = VendaPerdidaPayload,
    responses(
        (status = 201, description = "Venda perdida registrada", body = VendaPerdida),
        (status = 400, description = "Dados inválidos")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Empresa")),
    security(("api_jwt" = []))
)]
pub async fn create_venda_perdida(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<VendaPerdidaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    if let Some(produto_id) = payload.produto_id {
        app_state
            .produto_repo
            .get(&mut *rls_conn, tenant.0, produto_id)
            .await
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    }

    let data = payload.data.unwrap_or_else(|| Utc::now().date_naive());
    let venda = app_state
        .comercial_repo
        .create_venda_perdida(&mut *rls_conn, tenant.0, &payload, data)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(venda)))
}

#[utoipa::path(
    get,
    path = "/api/vendas-perdidas",
    tag = "Comercial",
    responses((status = 200, description = "Vendas perdidas no período", body = Vec<VendaPerdida>)),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        PeriodoFiltro
    ),
    security(("api_jwt" = []))
)]
pub async fn list_vendas_perdidas(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(periodo): Query<PeriodoFiltro>,
) -> Result<Json<Vec<VendaPerdida>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let vendas = app_state
        .comercial_repo
        .list_vendas_perdidas(&mut *rls_conn, tenant.0, &periodo)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(vendas))
}

#[utoipa::path(
    delete,
    path = "/api/vendas-perdidas/{id}",
    tag = "Comercial",
    responses(
        (status = 204, description = "Registro removido"),
        (status = 404, description = "Não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID da venda perdida")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_venda_perdida(
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
        .comercial_repo
        .delete_venda_perdida(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/vendas-perdidas/resumo",
    tag = "Comercial",
    responses(
        (status = 200, description = "Vendas perdidas agrupadas por motivo e por produto", body = ResumoVendasPerdidas)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        PeriodoFiltro
    ),
    security(("api_jwt" = []))
)]
pub async fn resumo_vendas_perdidas(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(periodo): Query<PeriodoFiltro>,
) -> Result<Json<ResumoVendasPerdidas>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let por_motivo = app_state
        .comercial_repo
        .vendas_perdidas_por_motivo(&mut *rls_conn, tenant.0, &periodo)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let por_produto = app_state
        .comercial_repo
        .vendas_perdidas_por_produto(&mut *rls_conn, tenant.0, &periodo)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ResumoVendasPerdidas::from_grupos(por_motivo, por_produto)))
}
