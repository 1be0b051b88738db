// src/models/lote.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::validate_not_negative;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lote_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoteStatus {
    Pendente,
    EmProducao,
    Concluido,
    Cancelado,
}

impl LoteStatus {
    /// Lotes encerrados não aceitam novos apontamentos.
    pub fn is_closed(&self) -> bool {
        matches!(self, LoteStatus::Concluido | LoteStatus::Cancelado)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lote {
    pub id: Uuid,
    #[schema(ignore)]
    pub empresa_id: Uuid,
    pub produto_id: Uuid,
    #[schema(example = "L-2025-001")]
    pub codigo: String,
    #[schema(example = 150)]
    pub quantidade: i32,
    pub status: LoteStatus,
    pub data_inicio: NaiveDate,
    pub data_prevista: Option<NaiveDate>,
    pub data_conclusao: Option<NaiveDate>,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Apontamento de produção: quanto de uma etapa foi feito, por quem e em quanto tempo
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Producao {
    pub id: Uuid,
    #[schema(ignore)]
    pub empresa_id: Uuid,
    pub lote_id: Uuid,
    pub etapa_id: Uuid,
    pub subetapa_id: Option<Uuid>,
    pub colaborador_id: Option<Uuid>,
    #[schema(example = 40)]
    pub quantidade: i32,
    #[schema(example = "95.0")]
    pub tempo_gasto_min: Decimal,
    pub data: NaiveDate,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- Detalhes do lote (agregação de progresso) ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressoSubetapa {
    pub subetapa_id: Uuid,
    pub nome: String,
    pub quantidade_produzida: i64,
    pub tempo_gasto_min: Decimal,
    pub registros: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressoEtapa {
    pub etapa_id: Uuid,
    pub nome: String,
    pub ordem: i32,
    pub quantidade_produzida: i64,
    pub tempo_gasto_min: Decimal,
    pub tempo_previsto_min: Decimal,
    pub registros: usize,
    /// min(100, produzido / quantidade do lote × 100)
    pub percentual: Decimal,
    pub subetapas: Vec<ProgressoSubetapa>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumoAgregado {
    pub material_id: Uuid,
    pub material_nome: String,
    pub unidade: String,
    pub quantidade: Decimal,
    pub custo_total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetalhesLote {
    pub lote: Lote,
    pub produto_nome: String,
    pub etapas: Vec<ProgressoEtapa>,
    /// Média dos percentuais de todas as etapas do produto.
    pub percentual_geral: Decimal,
    pub tempo_gasto_min: Decimal,
    pub tempo_previsto_min: Decimal,
    /// Tempo previsto para o que já foi produzido ÷ tempo gasto.
    pub eficiencia: Option<Decimal>,
    pub consumos: Vec<ConsumoAgregado>,
    pub custo_materiais: Decimal,
    pub dias_uteis_decorridos: i64,
    pub atrasado: bool,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLotePayload {
    pub produto_id: Uuid,
    #[validate(length(min = 1, message = "O código do lote é obrigatório."))]
    pub codigo: String,
    #[validate(range(min = 1, max = 1000000, message = "A quantidade deve estar entre 1 e 1.000.000."))]
    pub quantidade: i32,
    /// Padrão: hoje.
    pub data_inicio: Option<NaiveDate>,
    /// Quando ausente, vem da previsão de produção.
    pub data_prevista: Option<NaiveDate>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLotePayload {
    pub status: Option<LoteStatus>,
    pub data_prevista: Option<NaiveDate>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrarProducaoPayload {
    pub etapa_id: Uuid,
    pub subetapa_id: Option<Uuid>,
    pub colaborador_id: Option<Uuid>,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantidade: i32,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub tempo_gasto_min: Decimal,
    pub data: Option<NaiveDate>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LoteFiltro {
    pub status: Option<LoteStatus>,
    pub produto_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(quantidade: i32) -> CreateLotePayload {
        CreateLotePayload {
            produto_id: Uuid::new_v4(),
            codigo: "L-001".into(),
            quantidade,
            data_inicio: None,
            data_prevista: None,
            observacoes: None,
        }
    }

    #[test]
    fn quantidade_do_lote_tem_limite() {
        assert!(payload(1).validate().is_ok());
        assert!(payload(1_000_000).validate().is_ok());
        assert!(payload(0).validate().is_err());
        assert!(payload(i32::MAX).validate().is_err());
    }
}
