// src/db/lote_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::lote::{Lote, LoteFiltro, LoteStatus, Producao, RegistrarProducaoPayload},
};

const LOTE_COLUMNS: &str = "id, empresa_id, produto_id, codigo, quantidade, status, data_inicio, \
                            data_prevista, data_conclusao, observacoes, created_at, updated_at";
const PRODUCAO_COLUMNS: &str = "id, empresa_id, lote_id, etapa_id, subetapa_id, colaborador_id, \
                                quantidade, tempo_gasto_min, data, observacoes, created_at";

#[derive(Clone)]
pub struct LoteRepository {
    pool: PgPool,
}

impl LoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  LOTES
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        produto_id: Uuid,
        codigo: &str,
        quantidade: i32,
        data_inicio: NaiveDate,
        data_prevista: Option<NaiveDate>,
        observacoes: Option<&str>,
    ) -> Result<Lote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Lote>(&format!(
            r#"
            INSERT INTO lotes (empresa_id, produto_id, codigo, quantidade, data_inicio, data_prevista, observacoes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LOTE_COLUMNS}
            "#
        ))
        .bind(empresa_id)
        .bind(produto_id)
        .bind(codigo)
        .bind(quantidade)
        .bind(data_inicio)
        .bind(data_prevista)
        .bind(observacoes)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, &format!("lote {}", codigo)))
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        filtro: &LoteFiltro,
    ) -> Result<Vec<Lote>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lotes = sqlx::query_as::<_, Lote>(&format!(
            r#"
            SELECT {LOTE_COLUMNS} FROM lotes
            WHERE empresa_id = $1
              AND ($2::lote_status IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR produto_id = $3)
            ORDER BY data_inicio DESC, codigo
            "#
        ))
        .bind(empresa_id)
        .bind(filtro.status)
        .bind(filtro.produto_id)
        .fetch_all(executor)
        .await?;
        Ok(lotes)
    }

    pub async fn get<'e, E>(&self, executor: E, empresa_id: Uuid, id: Uuid) -> Result<Lote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Lote>(&format!(
            "SELECT {LOTE_COLUMNS} FROM lotes WHERE empresa_id = $1 AND id = $2"
        ))
        .bind(empresa_id)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound(format!("Lote {}", id)))
    }

    /// Trava a linha do lote até o fim da transação.
    pub async fn get_for_update<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        id: Uuid,
    ) -> Result<Lote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Lote>(&format!(
            "SELECT {LOTE_COLUMNS} FROM lotes WHERE empresa_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(empresa_id)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound(format!("Lote {}", id)))
    }

    /// Grava os campos editáveis já resolvidos pelo serviço.
    #[allow(clippy::too_many_arguments)]
    pub async fn update<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        id: Uuid,
        status: LoteStatus,
        data_prevista: Option<NaiveDate>,
        data_conclusao: Option<NaiveDate>,
        observacoes: Option<&str>,
    ) -> Result<Lote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Lote>(&format!(
            r#"
            UPDATE lotes
            SET status = $3, data_prevista = $4, data_conclusao = $5, observacoes = $6, updated_at = NOW()
            WHERE empresa_id = $1 AND id = $2
            RETURNING {LOTE_COLUMNS}
            "#
        ))
        .bind(empresa_id)
        .bind(id)
        .bind(status)
        .bind(data_prevista)
        .bind(data_conclusao)
        .bind(observacoes)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound(format!("Lote {}", id)))
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        id: Uuid,
        status: LoteStatus,
        data_conclusao: Option<NaiveDate>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE lotes SET status = $3, data_conclusao = $4, updated_at = NOW()
            WHERE empresa_id = $1 AND id = $2
            "#,
        )
        .bind(empresa_id)
        .bind(id)
        .bind(status)
        .bind(data_conclusao)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, empresa_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Apontamentos e consumos saem junto (ON DELETE CASCADE).
        let result = sqlx::query("DELETE FROM lotes WHERE empresa_id = $1 AND id = $2")
            .bind(empresa_id)
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("Lote {}", id)));
        }
        Ok(())
    }

    // =========================================================================
    //  PRODUÇÕES (apontamentos)
    // =========================================================================

    pub async fn insert_producao<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        lote_id: Uuid,
        input: &RegistrarProducaoPayload,
        data: NaiveDate,
    ) -> Result<Producao, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let producao = sqlx::query_as::<_, Producao>(&format!(
            r#"
            INSERT INTO producoes
                (empresa_id, lote_id, etapa_id, subetapa_id, colaborador_id, quantidade, tempo_gasto_min, data, observacoes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCAO_COLUMNS}
            "#
        ))
        .bind(empresa_id)
        .bind(lote_id)
        .bind(input.etapa_id)
        .bind(input.subetapa_id)
        .bind(input.colaborador_id)
        .bind(input.quantidade)
        .bind(input.tempo_gasto_min)
        .bind(data)
        .bind(input.observacoes.as_deref())
        .fetch_one(executor)
        .await?;
        Ok(producao)
    }

    pub async fn list_producoes<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        lote_id: Uuid,
    ) -> Result<Vec<Producao>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let producoes = sqlx::query_as::<_, Producao>(&format!(
            r#"
            SELECT {PRODUCAO_COLUMNS} FROM producoes
            WHERE empresa_id = $1 AND lote_id = $2
            ORDER BY data, created_at
            "#
        ))
        .bind(empresa_id)
        .bind(lote_id)
        .fetch_all(executor)
        .await?;
        Ok(producoes)
    }

    pub async fn delete_producao<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        lote_id: Uuid,
        id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result =
            sqlx::query("DELETE FROM producoes WHERE empresa_id = $1 AND lote_id = $2 AND id = $3")
                .bind(empresa_id)
                .bind(lote_id)
                .bind(id)
                .execute(executor)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("Produção {}", id)));
        }
        Ok(())
    }
}
