// src/models/material.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_not_negative, validate_positive};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: Uuid,
    #[schema(ignore)]
    pub empresa_id: Uuid,
    #[schema(example = "Tubo de aço 20mm")]
    pub nome: String,
    #[schema(example = "m")]
    pub unidade: String,
    #[schema(example = "14.90")]
    pub custo_unitario: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Consumo de material registrado em um lote, já com nome e custo do material
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumoMaterial {
    pub id: Uuid,
    pub lote_id: Uuid,
    pub material_id: Uuid,
    pub material_nome: String,
    pub unidade: String,
    pub custo_unitario: Decimal,
    pub quantidade: Decimal,
    pub data: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome: String,
    #[validate(length(min = 1, message = "A unidade é obrigatória."))]
    pub unidade: String,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub custo_unitario: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumoPayload {
    pub material_id: Uuid,
    #[validate(custom(function = "validate_positive"))]
    pub quantidade: Decimal,
    pub data: Option<NaiveDate>,
}
