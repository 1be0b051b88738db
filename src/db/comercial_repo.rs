// src/db/comercial_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::comercial::{
        AgrupamentoVendaPerdida, PeriodoFiltro, Projecao, VendaPerdida, VendaPerdidaPayload,
    },
};

const PROJECAO_COLUMNS: &str =
    "id, empresa_id, produto_id, mes, quantidade, observacoes, created_at, updated_at";
const VENDA_COLUMNS: &str =
    "id, empresa_id, produto_id, cliente, quantidade, valor_estimado, motivo, data, created_at";

#[derive(Clone)]
pub struct ComercialRepository {
    pool: PgPool,
}

impl ComercialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PROJEÇÕES
    // =========================================================================

    /// `mes` já deve vir normalizado para o dia 1.
    pub async fn create_projecao<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        produto_id: Uuid,
        mes: NaiveDate,
        quantidade: i32,
        observacoes: Option<&str>,
    ) -> Result<Projecao, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Projecao>(&format!(
            r#"
            INSERT INTO projecoes (empresa_id, produto_id, mes, quantidade, observacoes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PROJECAO_COLUMNS}
            "#
        ))
        .bind(empresa_id)
        .bind(produto_id)
        .bind(mes)
        .bind(quantidade)
        .bind(observacoes)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, &format!("projeção de {}", mes.format("%m/%Y"))))
    }

    pub async fn list_projecoes<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        mes: Option<NaiveDate>,
    ) -> Result<Vec<Projecao>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let projecoes = sqlx::query_as::<_, Projecao>(&format!(
            r#"
            SELECT {PROJECAO_COLUMNS} FROM projecoes
            WHERE empresa_id = $1 AND ($2::date IS NULL OR mes = $2)
            ORDER BY mes, produto_id
            "#
        ))
        .bind(empresa_id)
        .bind(mes)
        .fetch_all(executor)
        .await?;
        Ok(projecoes)
    }

    pub async fn update_projecao<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        id: Uuid,
        mes: NaiveDate,
        quantidade: i32,
        observacoes: Option<&str>,
    ) -> Result<Projecao, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Projecao>(&format!(
            r#"
            UPDATE projecoes
            SET mes = $3, quantidade = $4, observacoes = $5, updated_at = NOW()
            WHERE empresa_id = $1 AND id = $2
            RETURNING {PROJECAO_COLUMNS}
            "#
        ))
        .bind(empresa_id)
        .bind(id)
        .bind(mes)
        .bind(quantidade)
        .bind(observacoes)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_unique_violation(e, &format!("projeção de {}", mes.format("%m/%Y"))))?
        .ok_or_else(|| AppError::ResourceNotFound(format!("Projeção {}", id)))
    }

    pub async fn delete_projecao<'e, E>(&self, executor: E, empresa_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM projecoes WHERE empresa_id = $1 AND id = $2")
            .bind(empresa_id)
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("Projeção {}", id)));
        }
        Ok(())
    }

    // =========================================================================
    //  VENDAS PERDIDAS
    // =========================================================================

    pub async fn create_venda_perdida<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        input: &VendaPerdidaPayload,
        data: NaiveDate,
    ) -> Result<VendaPerdida, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let venda = sqlx::query_as::<_, VendaPerdida>(&format!(
            r#"
            INSERT INTO vendas_perdidas (empresa_id, produto_id, cliente, quantidade, valor_estimado, motivo, data)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {VENDA_COLUMNS}
            "#
        ))
        .bind(empresa_id)
        .bind(input.produto_id)
        .bind(input.cliente.as_deref())
        .bind(input.quantidade)
        .bind(input.valor_estimado)
        .bind(input.motivo.trim())
        .bind(data)
        .fetch_one(executor)
        .await?;
        Ok(venda)
    }

    pub async fn list_vendas_perdidas<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        periodo: &PeriodoFiltro,
    ) -> Result<Vec<VendaPerdida>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vendas = sqlx::query_as::<_, VendaPerdida>(&format!(
            r#"
            SELECT {VENDA_COLUMNS} FROM vendas_perdidas
            WHERE empresa_id = $1
              AND ($2::date IS NULL OR data >= $2)
              AND ($3::date IS NULL OR data <= $3)
            ORDER BY data DESC, created_at DESC
            "#
        ))
        .bind(empresa_id)
        .bind(periodo.de)
        .bind(periodo.ate)
        .fetch_all(executor)
        .await?;
        Ok(vendas)
    }

    pub async fn delete_venda_perdida<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM vendas_perdidas WHERE empresa_id = $1 AND id = $2")
            .bind(empresa_id)
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("Venda perdida {}", id)));
        }
        Ok(())
    }

    pub async fn vendas_perdidas_por_motivo<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        periodo: &PeriodoFiltro,
    ) -> Result<Vec<AgrupamentoVendaPerdida>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let grupos = sqlx::query_as::<_, AgrupamentoVendaPerdida>(
            r#"
            SELECT motivo AS chave,
                   COUNT(*) AS registros,
                   COALESCE(SUM(quantidade), 0)::bigint AS quantidade,
                   COALESCE(SUM(valor_estimado), 0) AS valor
            FROM vendas_perdidas
            WHERE empresa_id = $1
              AND ($2::date IS NULL OR data >= $2)
              AND ($3::date IS NULL OR data <= $3)
            GROUP BY motivo
            ORDER BY valor DESC, chave
            "#,
        )
        .bind(empresa_id)
        .bind(periodo.de)
        .bind(periodo.ate)
        .fetch_all(executor)
        .await?;
        Ok(grupos)
    }

    /// Vendas sem produto ficam agrupadas como "Sem produto".
    pub async fn vendas_perdidas_por_produto<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        periodo: &PeriodoFiltro,
    ) -> Result<Vec<AgrupamentoVendaPerdida>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let grupos = sqlx::query_as::<_, AgrupamentoVendaPerdida>(
            r#"
            SELECT COALESCE(p.nome, 'Sem produto') AS chave,
                   COUNT(*) AS registros,
                   COALESCE(SUM(v.quantidade), 0)::bigint AS quantidade,
                   COALESCE(SUM(v.valor_estimado), 0) AS valor
            FROM vendas_perdidas v
            LEFT JOIN produtos p ON p.id = v.produto_id
            WHERE v.empresa_id = $1
              AND ($2::date IS NULL OR v.data >= $2)
              AND ($3::date IS NULL OR v.data <= $3)
            GROUP BY COALESCE(p.nome, 'Sem produto')
            ORDER BY valor DESC, chave
            "#,
        )
        .bind(empresa_id)
        .bind(periodo.de)
        .bind(periodo.ate)
        .fetch_all(executor)
        .await?;
        Ok(grupos)
    }
}
