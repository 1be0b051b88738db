// src/handlers/dashboard.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{
        error::ApiError,
        db_utils::get_rls_connection,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        tenancy::TenantContext,
    },
    // Importamos os models para referenciar na documentação
    models::dashboard::{DashboardSummary, ProductionChartEntry, TopProductEntry},
};

// GET /api/dashboard/summary
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Lotes por status, unidades produzidas e vendas perdidas do mês", body = DashboardSummary),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "Sem acesso à empresa")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let summary = app_state.dashboard_service
        .get_summary(&mut *rls_conn, tenant.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/dashboard/production-chart
#[utoipa::path(
    get,
    path = "/api/dashboard/production-chart",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Unidades produzidas por dia (últimos 30 dias)", body = Vec<ProductionChartEntry>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_production_chart(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let chart = app_state.dashboard_service
        .get_production_chart(&mut *rls_conn, tenant.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(chart)))
}

// GET /api/dashboard/top-products
#[utoipa::path(
    get,
    path = "/api/dashboard/top-products",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Top 5 produtos por unidades em lotes concluídos", body = Vec<TopProductEntry>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_top_products(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let top = app_state.dashboard_service
        .get_top_products(&mut *rls_conn, tenant.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(top)))
}
