// src/models/settings.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::validation::validate_not_negative;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguracoesEmpresa {
    #[schema(ignore)] // O contexto (Header) já define a empresa
    pub empresa_id: Uuid,

    /// Jornada de cada colaborador, em horas por dia útil.
    #[schema(example = "8.0")]
    pub horas_por_dia: Decimal,

    /// Custo/hora usado quando não há colaboradores ativos com custo.
    #[schema(example = "25.00")]
    pub custo_hora_padrao: Decimal,

    /// Margem alvo, em percentual.
    #[schema(example = "30.0")]
    pub margem_alvo: Decimal,

    pub updated_at: Option<DateTime<Utc>>,
}

impl ConfiguracoesEmpresa {
    pub fn padrao(empresa_id: Uuid) -> Self {
        Self {
            empresa_id,
            horas_por_dia: Decimal::from(8),
            custo_hora_padrao: Decimal::ZERO,
            margem_alvo: Decimal::ZERO,
            updated_at: None,
        }
    }
}

fn validate_horas_por_dia(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO || *val > Decimal::from(24) {
        let mut err = ValidationError::new("range");
        err.message = Some("A jornada deve estar entre 0 e 24 horas.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[validate(custom(function = "validate_horas_por_dia"))]
    #[schema(example = "8.0")]
    pub horas_por_dia: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "25.00")]
    pub custo_hora_padrao: Decimal,

    #[schema(example = "30.0")]
    pub margem_alvo: Decimal,
}
