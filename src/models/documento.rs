// src/models/documento.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Metadados de um documento enviado. O conteúdo não é guardado.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Documento {
    pub id: Uuid,
    #[schema(ignore)]
    pub empresa_id: Uuid,
    pub enviado_por: Uuid,
    #[schema(example = "nota-fiscal.pdf")]
    pub nome_arquivo: String,
    #[schema(example = "application/pdf")]
    pub content_type: String,
    pub tamanho_bytes: i64,
    #[schema(example = "RECEBIDO")]
    pub status: String,
    pub created_at: DateTime<Utc>,
}
