// src/models/produto.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_not_negative, validate_positive};

// --- 1. Produto (catálogo) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Produto {
    pub id: Uuid,
    #[schema(ignore)]
    pub empresa_id: Uuid,
    #[schema(example = "CAD-001")]
    pub codigo: String,
    #[schema(example = "Cadeira de aço")]
    pub nome: String,
    pub descricao: Option<String>,
    #[schema(example = "189.90")]
    pub preco_venda: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- 2. Etapa de fabricação ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Etapa {
    pub id: Uuid,
    #[schema(ignore)]
    pub empresa_id: Uuid,
    pub produto_id: Uuid,
    #[schema(example = "Corte")]
    pub nome: String,
    #[schema(example = 1)]
    pub ordem: i32,
    /// Minutos de trabalho por unidade produzida.
    #[schema(example = "12.5")]
    pub tempo_por_unidade_min: Decimal,
    pub created_at: DateTime<Utc>,
}

// --- 3. Subetapa ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subetapa {
    pub id: Uuid,
    #[schema(ignore)]
    pub empresa_id: Uuid,
    pub etapa_id: Uuid,
    #[schema(example = "Rebarbar")]
    pub nome: String,
    pub ordem: i32,
    pub tempo_por_unidade_min: Decimal,
    pub created_at: DateTime<Utc>,
}

// Etapa com as suas subetapas, como a tela de roteiro mostra.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EtapaComSubetapas {
    #[serde(flatten)]
    pub etapa: Etapa,
    pub subetapas: Vec<Subetapa>,
}

impl EtapaComSubetapas {
    /// Encaixa cada subetapa na sua etapa, mantendo a ordem recebida.
    pub fn agrupar(etapas: Vec<Etapa>, subetapas: Vec<Subetapa>) -> Vec<Self> {
        let mut roteiro: Vec<Self> = etapas
            .into_iter()
            .map(|etapa| Self { etapa, subetapas: Vec::new() })
            .collect();

        for sub in subetapas {
            if let Some(item) = roteiro.iter_mut().find(|i| i.etapa.id == sub.etapa_id) {
                item.subetapas.push(sub);
            }
        }
        roteiro
    }
}

// --- 4. Ficha técnica (BOM): material consumido por unidade ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDoProduto {
    pub id: Uuid,
    pub produto_id: Uuid,
    pub material_id: Uuid,
    pub material_nome: String,
    pub unidade: String,
    pub custo_unitario: Decimal,
    #[schema(example = "2.5")]
    pub quantidade_por_unidade: Decimal,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProdutoPayload {
    #[validate(length(min = 1, message = "O código é obrigatório."))]
    pub codigo: String,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome: String,
    pub descricao: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub preco_venda: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EtapaPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome: String,
    #[validate(range(min = 1, message = "A ordem começa em 1."))]
    pub ordem: i32,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub tempo_por_unidade_min: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDoProdutoPayload {
    pub material_id: Uuid,
    #[validate(custom(function = "validate_positive"))]
    pub quantidade_por_unidade: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn etapa(nome: &str, ordem: i32) -> Etapa {
        Etapa {
            id: Uuid::new_v4(),
            empresa_id: Uuid::nil(),
            produto_id: Uuid::nil(),
            nome: nome.into(),
            ordem,
            tempo_por_unidade_min: Decimal::ONE,
            created_at: Utc::now(),
        }
    }

    fn subetapa(etapa_id: Uuid, nome: &str) -> Subetapa {
        Subetapa {
            id: Uuid::new_v4(),
            empresa_id: Uuid::nil(),
            etapa_id,
            nome: nome.into(),
            ordem: 1,
            tempo_por_unidade_min: Decimal::ONE,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn groups_subetapas_under_their_etapa() {
        let corte = etapa("Corte", 1);
        let montagem = etapa("Montagem", 2);
        let subs = vec![
            subetapa(montagem.id, "Parafusar"),
            subetapa(corte.id, "Medir"),
            subetapa(Uuid::new_v4(), "Órfã"),
        ];

        let roteiro = EtapaComSubetapas::agrupar(vec![corte, montagem], subs);

        assert_eq!(roteiro.len(), 2);
        assert_eq!(roteiro[0].etapa.nome, "Corte");
        assert_eq!(roteiro[0].subetapas[0].nome, "Medir");
        assert_eq!(roteiro[1].subetapas.len(), 1);
        assert_eq!(roteiro[1].subetapas[0].nome, "Parafusar");
    }
}
