// src/models/realtime.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Notificação de alteração publicada pelos triggers do banco.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    #[schema(example = "lotes")]
    pub tabela: String,
    #[schema(example = "UPDATE")]
    pub operacao: String,
    pub empresa_id: Uuid,
    pub registro_id: Uuid,
}
