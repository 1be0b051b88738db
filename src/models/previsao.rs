// src/models/previsao.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrevisaoEtapa {
    pub etapa_id: Uuid,
    pub nome: String,
    pub ordem: i32,
    /// Etapa + subetapas, por unidade.
    pub minutos_por_unidade: Decimal,
    pub minutos_totais: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialNecessario {
    pub material_id: Uuid,
    pub nome: String,
    pub unidade: String,
    pub quantidade_total: Decimal,
    pub custo_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrevisaoProducao {
    pub produto_id: Uuid,
    pub quantidade: i32,
    pub etapas: Vec<PrevisaoEtapa>,
    pub minutos_totais: Decimal,
    pub horas_totais: Decimal,
    pub colaboradores: i64,
    pub horas_por_dia_equipe: Decimal,
    pub dias_uteis: i64,
    pub data_inicio: NaiveDate,
    pub data_termino_prevista: NaiveDate,
    pub custo_hora: Decimal,
    pub custo_material_unitario: Decimal,
    pub custo_mao_obra_unitario: Decimal,
    pub custo_unitario: Decimal,
    pub custo_total: Decimal,
    pub receita: Decimal,
    pub margem: Decimal,
    pub margem_percentual: Option<Decimal>,
    pub materiais: Vec<MaterialNecessario>,
}

// --- Detalhamento de custos por unidade ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinhaCustoMaterial {
    pub material_id: Uuid,
    pub nome: String,
    pub unidade: String,
    pub quantidade_por_unidade: Decimal,
    pub custo_unitario: Decimal,
    pub custo: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinhaCustoEtapa {
    pub etapa_id: Uuid,
    pub nome: String,
    pub minutos_por_unidade: Decimal,
    pub custo: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetalhamentoCustos {
    pub produto_id: Uuid,
    pub preco_venda: Decimal,
    pub custo_hora: Decimal,
    pub materiais: Vec<LinhaCustoMaterial>,
    pub etapas: Vec<LinhaCustoEtapa>,
    pub custo_materiais: Decimal,
    pub custo_mao_obra: Decimal,
    pub custo_unitario: Decimal,
    pub margem_unitaria: Decimal,
    pub margem_percentual: Option<Decimal>,
}

// --- Resumo das projeções do mês ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemResumoPrevisao {
    pub projecao_id: Uuid,
    pub produto_id: Uuid,
    pub produto_nome: String,
    pub quantidade: i32,
    pub horas: Decimal,
    pub custo_total: Decimal,
    pub receita: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResumoPrevisao {
    pub mes: NaiveDate,
    pub itens: Vec<ItemResumoPrevisao>,
    pub total_quantidade: i64,
    pub total_horas: Decimal,
    pub total_custo: Decimal,
    pub total_receita: Decimal,
    pub margem: Decimal,
    pub dias_uteis: i64,
    pub capacidade_horas: Decimal,
    pub utilizacao_percentual: Option<Decimal>,
}

// --- Parâmetros de consulta ---

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PrevisaoQuery {
    pub produto_id: Uuid,
    #[validate(range(min = 0, max = 1000000, message = "A quantidade deve estar entre 0 e 1.000.000."))]
    pub quantidade: i32,
    /// Padrão: hoje.
    pub data_inicio: Option<NaiveDate>,
    /// Padrão: colaboradores ativos.
    pub colaboradores: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ResumoQuery {
    /// Qualquer dia do mês.
    pub mes: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previsao_query_limita_a_quantidade() {
        let query = |quantidade| PrevisaoQuery {
            produto_id: Uuid::new_v4(),
            quantidade,
            data_inicio: None,
            colaboradores: None,
        };
        assert!(query(0).validate().is_ok());
        assert!(query(1_000_000).validate().is_ok());
        assert!(query(-1).validate().is_err());
        assert!(query(i32::MAX).validate().is_err());
    }
}
