// src/db/documento_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::documento::Documento};

const COLUMNS: &str =
    "id, empresa_id, enviado_por, nome_arquivo, content_type, tamanho_bytes, status, created_at";

#[derive(Clone)]
pub struct DocumentoRepository {
    pool: PgPool,
}

impl DocumentoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        enviado_por: Uuid,
        nome_arquivo: &str,
        content_type: &str,
        tamanho_bytes: i64,
    ) -> Result<Documento, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let doc = sqlx::query_as::<_, Documento>(&format!(
            r#"
            INSERT INTO documentos (empresa_id, enviado_por, nome_arquivo, content_type, tamanho_bytes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(empresa_id)
        .bind(enviado_por)
        .bind(nome_arquivo)
        .bind(content_type)
        .bind(tamanho_bytes)
        .fetch_one(executor)
        .await?;
        Ok(doc)
    }

    pub async fn list<'e, E>(&self, executor: E, empresa_id: Uuid) -> Result<Vec<Documento>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let docs = sqlx::query_as::<_, Documento>(&format!(
            "SELECT {COLUMNS} FROM documentos WHERE empresa_id = $1 ORDER BY created_at DESC"
        ))
        .bind(empresa_id)
        .fetch_all(executor)
        .await?;
        Ok(docs)
    }
}
