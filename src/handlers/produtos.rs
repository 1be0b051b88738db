// src/handlers/produtos.rs

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
    models::{
        previsao::DetalhamentoCustos,
        produto::{
            Etapa, EtapaComSubetapas, EtapaPayload, MaterialDoProduto, MaterialDoProdutoPayload,
            Produto, ProdutoPayload, Subetapa,
        },
    },
};

// =============================================================================
//  PRODUTOS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/produtos",
    tag = "Produtos",
    request_body = ProdutoPayload,
    responses(
        (status = 201, description = "Produto criado", body = Produto),
        (status = 409, description = "Código já usado")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Empresa")),
    security(("api_jwt" = []))
)]
pub async fn create_produto(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<ProdutoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let produto = app_state
        .produto_repo
        .create(&mut *rls_conn, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(produto)))
}

#[utoipa::path(
    get,
    path = "/api/produtos",
    tag = "Produtos",
    responses((status = 200, description = "Catálogo", body = Vec<Produto>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Empresa")),
    security(("api_jwt" = []))
)]
pub async fn list_produtos(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<Vec<Produto>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let produtos = app_state
        .produto_repo
        .list(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(produtos))
}

#[utoipa::path(
    get,
    path = "/api/produtos/{id}",
    tag = "Produtos",
    responses(
        (status = 200, description = "Produto", body = Produto),
        (status = 404, description = "Não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_produto(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Produto>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let produto = app_state
        .produto_repo
        .get(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(produto))
}

#[utoipa::path(
    put,
    path = "/api/produtos/{id}",
    tag = "Produtos",
    request_body = ProdutoPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = Produto),
        (status = 409, description = "Código já usado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_produto(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProdutoPayload>,
) -> Result<Json<Produto>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let produto = app_state
        .produto_repo
        .update(&mut *rls_conn, tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(produto))
}

#[utoipa::path(
    delete,
    path = "/api/produtos/{id}",
    tag = "Produtos",
    responses(
        (status = 204, description = "Produto removido"),
        (status = 422, description = "Produto em uso por lotes ou projeções")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_produto(
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
        .produto_repo
        .delete(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/produtos/{id}/custos",
    tag = "Produtos",
    responses(
        (status = 200, description = "Custo unitário detalhado (materiais e mão de obra)", body = DetalhamentoCustos)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn detalhamento_custos(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<DetalhamentoCustos>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detalhamento = app_state
        .previsao_service
        .detalhamento(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detalhamento))
}

// =============================================================================
//  ETAPAS & SUBETAPAS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/produtos/{id}/etapas",
    tag = "Produtos",
    request_body = EtapaPayload,
    responses(
        (status = 201, description = "Etapa adicionada", body = Etapa),
        (status = 409, description = "Ordem já usada no produto")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_etapa(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Path(produto_id): Path<Uuid>,
    Json(payload): Json<EtapaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // A FK não enxerga o RLS: o produto precisa ser desta empresa.
    app_state
        .produto_repo
        .get(&mut *rls_conn, tenant.0, produto_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let etapa = app_state
        .produto_repo
        .add_etapa(&mut *rls_conn, tenant.0, produto_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(etapa)))
}

#[utoipa::path(
    get,
    path = "/api/produtos/{id}/etapas",
    tag = "Produtos",
    responses(
        (status = 200, description = "Roteiro do produto em ordem, com subetapas", body = Vec<EtapaComSubetapas>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_etapas(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(produto_id): Path<Uuid>,
) -> Result<Json<Vec<EtapaComSubetapas>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let etapas = app_state
        .produto_repo
        .list_etapas(&mut *rls_conn, tenant.0, produto_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let subetapas = app_state
        .produto_repo
        .list_subetapas_do_produto(&mut *rls_conn, tenant.0, produto_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(EtapaComSubetapas::agrupar(etapas, subetapas)))
}

#[utoipa::path(
    put,
    path = "/api/etapas/{id}",
    tag = "Produtos",
    request_body = EtapaPayload,
    responses(
        (status = 200, description = "Etapa atualizada", body = Etapa),
        (status = 404, description = "Não encontrada")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID da etapa")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_etapa(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EtapaPayload>,
) -> Result<Json<Etapa>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let etapa = app_state
        .produto_repo
        .update_etapa(&mut *rls_conn, tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(etapa))
}

#[utoipa::path(
    delete,
    path = "/api/etapas/{id}",
    tag = "Produtos",
    responses(
        (status = 204, description = "Etapa removida"),
        (status = 422, description = "Etapa com produção registrada")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID da etapa")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_etapa(
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
        .produto_repo
        .delete_etapa(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/etapas/{id}/subetapas",
    tag = "Produtos",
    request_body = EtapaPayload,
    responses(
        (status = 201, description = "Subetapa adicionada", body = Subetapa),
        (status = 404, description = "Etapa não encontrada")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID da etapa")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_subetapa(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Path(etapa_id): Path<Uuid>,
    Json(payload): Json<EtapaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .produto_repo
        .get_etapa(&mut *rls_conn, tenant.0, etapa_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let subetapa = app_state
        .produto_repo
        .add_subetapa(&mut *rls_conn, tenant.0, etapa_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(subetapa)))
}

#[utoipa::path(
    get,
    path = "/api/produtos/{id}/subetapas",
    tag = "Produtos",
    responses((status = 200, description = "Subetapas de todas as etapas do produto", body = Vec<Subetapa>)),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_subetapas(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(produto_id): Path<Uuid>,
) -> Result<Json<Vec<Subetapa>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let subetapas = app_state
        .produto_repo
        .list_subetapas_do_produto(&mut *rls_conn, tenant.0, produto_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(subetapas))
}

#[utoipa::path(
    delete,
    path = "/api/subetapas/{id}",
    tag = "Produtos",
    responses(
        (status = 204, description = "Subetapa removida"),
        (status = 404, description = "Não encontrada")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID da subetapa")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_subetapa(
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
        .produto_repo
        .delete_subetapa(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  FICHA TÉCNICA (BOM)
// =============================================================================

#[utoipa::path(
    put,
    path = "/api/produtos/{id}/materiais",
    tag = "Produtos",
    request_body = MaterialDoProdutoPayload,
    responses(
        (status = 200, description = "Ficha técnica atualizada", body = Vec<MaterialDoProduto>),
        (status = 404, description = "Produto ou material não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_material(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Path(produto_id): Path<Uuid>,
    Json(payload): Json<MaterialDoProdutoPayload>,
) -> Result<Json<Vec<MaterialDoProduto>>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .produto_repo
        .get(&mut *rls_conn, tenant.0, produto_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    app_state
        .material_repo
        .get(&mut *rls_conn, tenant.0, payload.material_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .produto_repo
        .set_material(&mut *rls_conn, tenant.0, produto_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let materiais = app_state
        .produto_repo
        .list_materiais(&mut *rls_conn, tenant.0, produto_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(materiais))
}

#[utoipa::path(
    get,
    path = "/api/produtos/{id}/materiais",
    tag = "Produtos",
    responses((status = 200, description = "Ficha técnica do produto", body = Vec<MaterialDoProduto>)),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_materiais(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(produto_id): Path<Uuid>,
) -> Result<Json<Vec<MaterialDoProduto>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let materiais = app_state
        .produto_repo
        .list_materiais(&mut *rls_conn, tenant.0, produto_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(materiais))
}

#[utoipa::path(
    delete,
    path = "/api/produtos/{id}/materiais/{material_id}",
    tag = "Produtos",
    responses(
        (status = 204, description = "Material retirado da ficha técnica"),
        (status = 404, description = "Material não está na ficha")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do produto"),
        ("material_id" = Uuid, Path, description = "ID do material")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_material(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Gestor>,
    Path((produto_id, material_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .produto_repo
        .remove_material(&mut *rls_conn, tenant.0, produto_id, material_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
