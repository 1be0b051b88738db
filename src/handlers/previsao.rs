// src/handlers/previsao.rs

use axum::{
    extract::{Query, State},
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
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::previsao::{PrevisaoProducao, PrevisaoQuery, ResumoPrevisao, ResumoQuery},
};

// GET /api/previsao
#[utoipa::path(
    get,
    path = "/api/previsao",
    tag = "Previsão",
    responses(
        (status = 200, description = "Tempo, prazo em dias úteis, custos e materiais para produzir a quantidade", body = PrevisaoProducao),
        (status = 400, description = "Quantidade fora da faixa"),
        (status = 422, description = "Prazo não cabe no calendário"),
        (status = 404, description = "Produto não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        PrevisaoQuery
    ),
    security(("api_jwt" = []))
)]
pub async fn calcular_previsao(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(query): Query<PrevisaoQuery>,
) -> Result<Json<PrevisaoProducao>, ApiError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let previsao = app_state
        .previsao_service
        .calcular(
            &mut *rls_conn,
            tenant.0,
            query.produto_id,
            query.quantidade,
            query.data_inicio,
            query.colaboradores,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(previsao))
}

// GET /api/previsao/resumo
#[utoipa::path(
    get,
    path = "/api/previsao/resumo",
    tag = "Previsão",
    responses(
        (status = 200, description = "Projeções do mês contra a capacidade da equipe", body = ResumoPrevisao)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ResumoQuery
    ),
    security(("api_jwt" = []))
)]
pub async fn resumo_previsao(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(query): Query<ResumoQuery>,
) -> Result<Json<ResumoPrevisao>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let resumo = app_state
        .previsao_service
        .resumo(&mut *rls_conn, tenant.0, query.mes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(resumo))
}
