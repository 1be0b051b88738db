// src/models/colaborador.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::validate_not_negative;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Colaborador {
    pub id: Uuid,
    #[schema(ignore)]
    pub empresa_id: Uuid,
    #[schema(example = "João Pereira")]
    pub nome: String,
    #[schema(example = "Soldador")]
    pub funcao: Option<String>,
    #[schema(example = "32.50")]
    pub custo_hora: Decimal,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Usado tanto na criação quanto na atualização (PUT substitui tudo)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColaboradorPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome: String,
    pub funcao: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub custo_hora: Decimal,
    #[serde(default = "default_true")]
    pub ativo: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ColaboradorFiltro {
    #[serde(default)]
    pub somente_ativos: bool,
}
