// src/models/comercial.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::validate_not_negative;

// --- Projeção de vendas (produto × mês) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Projecao {
    pub id: Uuid,
    #[schema(ignore)]
    pub empresa_id: Uuid,
    pub produto_id: Uuid,
    /// Sempre o primeiro dia do mês.
    #[schema(example = "2025-04-01")]
    pub mes: NaiveDate,
    #[schema(example = 300)]
    pub quantidade: i32,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Venda perdida ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendaPerdida {
    pub id: Uuid,
    #[schema(ignore)]
    pub empresa_id: Uuid,
    pub produto_id: Option<Uuid>,
    #[schema(example = "Loja do Centro")]
    pub cliente: Option<String>,
    #[schema(example = 20)]
    pub quantidade: i32,
    #[schema(example = "3798.00")]
    pub valor_estimado: Decimal,
    #[schema(example = "Prazo de entrega")]
    pub motivo: String,
    pub data: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgrupamentoVendaPerdida {
    /// Motivo ou nome do produto, conforme o agrupamento.
    pub chave: String,
    pub registros: i64,
    pub quantidade: i64,
    pub valor: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResumoVendasPerdidas {
    pub por_motivo: Vec<AgrupamentoVendaPerdida>,
    pub por_produto: Vec<AgrupamentoVendaPerdida>,
    pub total_quantidade: i64,
    pub total_valor: Decimal,
}

impl ResumoVendasPerdidas {
    /// Os totais saem do agrupamento por motivo, que cobre todos os registros.
    pub fn from_grupos(
        por_motivo: Vec<AgrupamentoVendaPerdida>,
        por_produto: Vec<AgrupamentoVendaPerdida>,
    ) -> Self {
        let total_quantidade = por_motivo.iter().map(|g| g.quantidade).sum();
        let total_valor = por_motivo.iter().map(|g| g.valor).sum();
        Self { por_motivo, por_produto, total_quantidade, total_valor }
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjecaoPayload {
    pub produto_id: Uuid,
    /// Qualquer dia do mês; é normalizado para o dia 1.
    pub mes: NaiveDate,
    #[validate(range(min = 0, max = 1000000, message = "A quantidade deve estar entre 0 e 1.000.000."))]
    pub quantidade: i32,
    pub observacoes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendaPerdidaPayload {
    pub produto_id: Option<Uuid>,
    pub cliente: Option<String>,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantidade: i32,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub valor_estimado: Decimal,
    #[validate(length(min = 1, message = "O motivo é obrigatório."))]
    pub motivo: String,
    pub data: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PeriodoFiltro {
    pub de: Option<NaiveDate>,
    pub ate: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProjecaoFiltro {
    /// Qualquer dia do mês desejado.
    pub mes: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn grupo(chave: &str, quantidade: i64, valor: &str) -> AgrupamentoVendaPerdida {
        AgrupamentoVendaPerdida {
            chave: chave.into(),
            registros: 1,
            quantidade,
            valor: Decimal::from_str(valor).unwrap(),
        }
    }

    #[test]
    fn totals_come_from_motivo_groups() {
        let resumo = ResumoVendasPerdidas::from_grupos(
            vec![grupo("Prazo", 10, "500.00"), grupo("Preço", 3, "120.50")],
            vec![grupo("Cadeira", 13, "620.50")],
        );

        assert_eq!(resumo.total_quantidade, 13);
        assert_eq!(resumo.total_valor, Decimal::from_str("620.50").unwrap());
        assert_eq!(resumo.por_produto.len(), 1);
    }

    #[test]
    fn empty_summary_is_zeroed() {
        let resumo = ResumoVendasPerdidas::from_grupos(vec![], vec![]);
        assert_eq!(resumo.total_quantidade, 0);
        assert_eq!(resumo.total_valor, Decimal::ZERO);
    }

    #[test]
    fn projecao_limita_a_quantidade() {
        let projecao = |quantidade| ProjecaoPayload {
            produto_id: Uuid::new_v4(),
            mes: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            quantidade,
            observacoes: None,
        };
        assert!(projecao(0).validate().is_ok());
        assert!(projecao(1_000_000).validate().is_ok());
        assert!(projecao(1_000_001).validate().is_err());
    }
}
