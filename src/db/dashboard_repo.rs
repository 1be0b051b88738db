// src/db/dashboard_repo.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::dashboard::{DashboardSummary, ProductionChartEntry, TopProductEntry},
};

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Resumo Geral
    pub async fn get_summary<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
    ) -> Result<DashboardSummary, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        // Transação só para ler um retrato consistente dos números.
        let mut tx = executor.begin().await?;

        // A. Lotes por status
        let (lotes_pendentes, lotes_em_producao, lotes_concluidos_mes): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*) FILTER (WHERE status = 'PENDENTE'),
                    COUNT(*) FILTER (WHERE status = 'EM_PRODUCAO'),
                    COUNT(*) FILTER (
                        WHERE status = 'CONCLUIDO'
                          AND date_trunc('month', data_conclusao) = date_trunc('month', CURRENT_DATE)
                    )
                FROM lotes
                WHERE empresa_id = $1
                "#,
            )
            .bind(empresa_id)
            .fetch_one(&mut *tx)
            .await?;

        // B. Unidades apontadas hoje e no mês
        let (unidades_produzidas_hoje, unidades_produzidas_mes): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(quantidade) FILTER (WHERE data = CURRENT_DATE), 0)::bigint,
                COALESCE(SUM(quantidade), 0)::bigint
            FROM producoes
            WHERE empresa_id = $1
              AND date_trunc('month', data) = date_trunc('month', CURRENT_DATE)
            "#,
        )
        .bind(empresa_id)
        .fetch_one(&mut *tx)
        .await?;

        // C. Vendas perdidas no mês
        let vendas_perdidas_mes: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(valor_estimado), 0)
            FROM vendas_perdidas
            WHERE empresa_id = $1
              AND date_trunc('month', data) = date_trunc('month', CURRENT_DATE)
            "#,
        )
        .bind(empresa_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DashboardSummary {
            lotes_pendentes,
            lotes_em_producao,
            lotes_concluidos_mes,
            unidades_produzidas_hoje,
            unidades_produzidas_mes,
            vendas_perdidas_mes,
        })
    }

    // 2. Gráfico de Linha (Últimos 30 dias)
    pub async fn get_production_last_30_days<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
    ) -> Result<Vec<ProductionChartEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let data = sqlx::query_as::<_, ProductionChartEntry>(
            r#"
            SELECT
                to_char(data, 'YYYY-MM-DD') AS "date",
                SUM(quantidade)::bigint AS "total"
            FROM producoes
            WHERE empresa_id = $1
              AND data >= (CURRENT_DATE - INTERVAL '30 days')
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .bind(empresa_id)
        .fetch_all(executor)
        .await?;

        Ok(data)
    }

    // 3. Top 5 produtos em lotes concluídos
    pub async fn get_top_products<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
    ) -> Result<Vec<TopProductEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let data = sqlx::query_as::<_, TopProductEntry>(
            r#"
            SELECT
                p.nome AS produto_nome,
                COUNT(l.id) AS lotes,
                SUM(l.quantidade)::bigint AS total_quantidade
            FROM lotes l
            JOIN produtos p ON p.id = l.produto_id
            WHERE l.empresa_id = $1
              AND l.status = 'CONCLUIDO'
            GROUP BY p.id, p.nome
            ORDER BY total_quantidade DESC
            LIMIT 5
            "#,
        )
        .bind(empresa_id)
        .fetch_all(executor)
        .await?;

        Ok(data)
    }
}
