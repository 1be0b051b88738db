// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// 1. Resumo (os cards do topo)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub lotes_pendentes: i64,
    pub lotes_em_producao: i64,
    pub lotes_concluidos_mes: i64,
    pub unidades_produzidas_hoje: i64,
    pub unidades_produzidas_mes: i64,
    pub vendas_perdidas_mes: Decimal,
}

// 2. Gráfico de produção (últimos 30 dias)
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductionChartEntry {
    pub date: Option<String>, // YYYY-MM-DD
    pub total: Option<i64>,
}

// 3. Produtos mais produzidos em lotes concluídos
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopProductEntry {
    pub produto_nome: String,
    pub lotes: i64,
    pub total_quantidade: Option<i64>,
}
