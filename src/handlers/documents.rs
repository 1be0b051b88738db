// src/handlers/documents.rs

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::{
    common::{error::{ApiError, AppError}, db_utils::get_rls_connection},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::documento::Documento,
};

/// Arquivo lido do multipart; só os metadados seguem adiante.
struct ArquivoRecebido {
    nome: String,
    content_type: String,
    tamanho: usize,
}

async fn ler_arquivo(multipart: &mut Multipart) -> Result<ArquivoRecebido, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidUpload(e.body_text()))?
    {
        // Campos de texto (sem nome de arquivo) são ignorados.
        let Some(nome) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidUpload(e.body_text()))?;

        return Ok(ArquivoRecebido { nome, content_type, tamanho: bytes.len() });
    }

    Err(AppError::InvalidUpload("nenhum arquivo enviado".into()))
}

#[utoipa::path(
    post,
    path = "/api/documentos",
    tag = "Documentos",
    request_body(content_type = "multipart/form-data", description = "Arquivo no campo `file` (até 10 MiB)"),
    responses(
        (status = 201, description = "Metadados do documento recebido", body = Documento),
        (status = 400, description = "Arquivo ausente, vazio ou grande demais")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Empresa")),
    security(("api_jwt" = []))
)]
pub async fn upload_documento(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {

    let arquivo = ler_arquivo(&mut multipart)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let documento = app_state.document_service
        .registrar_upload(
            &mut *rls_conn,
            tenant.0,
            user.0.id,
            &arquivo.nome,
            &arquivo.content_type,
            arquivo.tamanho,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(documento)))
}

#[utoipa::path(
    get,
    path = "/api/documentos",
    tag = "Documentos",
    responses((status = 200, description = "Documentos recebidos", body = Vec<Documento>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Empresa")),
    security(("api_jwt" = []))
)]
pub async fn list_documentos(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<Vec<Documento>>, ApiError> {

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let documentos = app_state.document_service
        .list_documentos(&mut *rls_conn, tenant.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(documentos))
}

#[utoipa::path(
    get,
    path = "/api/lotes/{id}/ficha",
    tag = "Documentos",
    responses(
        (status = 200, description = "Ficha de produção do lote em PDF", content_type = "application/pdf"),
        (status = 404, description = "Lote não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa"),
        ("id" = Uuid, Path, description = "ID do lote")
    ),
    security(("api_jwt" = []))
)]
pub async fn ficha_lote_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(lote_id): Path<Uuid>,
) -> Result<Response, ApiError> {

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state.document_service
        .ficha_lote_pdf(&mut *rls_conn, tenant.0, lote_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    // Configura os Headers para o navegador baixar ou mostrar o PDF
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("inline; filename=\"ficha_lote_{}.pdf\"", lote_id)),
    ];

    Ok((headers, pdf_bytes).into_response())
}
