// src/models/empresa.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Papel do usuário dentro de uma empresa.
// A ordem importa: ADMIN > GESTOR > OPERADOR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "papel_membro", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PapelMembro {
    Operador,
    Gestor,
    Admin,
}

impl PapelMembro {
    pub fn as_str(&self) -> &'static str {
        match self {
            PapelMembro::Operador => "OPERADOR",
            PapelMembro::Gestor => "GESTOR",
            PapelMembro::Admin => "ADMIN",
        }
    }
}

// ---
// Empresa (o tenant)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Empresa {
    pub id: Uuid,
    #[schema(example = "Metalúrgica Exemplo")]
    pub nome: String,
    #[schema(example = "12.345.678/0001-99")]
    pub cnpj: Option<String>,
    pub descricao: Option<String>,
    pub assinatura_ativa: bool,
    pub checkout_concluido_em: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// Vínculo usuário <-> empresa
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmpresaMembro {
    pub empresa_id: Uuid,
    pub user_id: Uuid,
    pub papel: PapelMembro,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// Membro com os dados do usuário, para a tela de equipe
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembroDetalhe {
    pub user_id: Uuid,
    pub email: String,
    pub nome: String,
    pub papel: PapelMembro,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Resultado da exclusão em cascata de uma empresa.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExclusaoEmpresaReport {
    pub empresa_id: Uuid,
    /// Linhas removidas por tabela, na ordem em que foram apagadas.
    pub removidos: Vec<TabelaRemovida>,
    /// Tabelas cuja exclusão falhou (o erro fica no log).
    pub falhas: Vec<String>,
    pub empresa_removida: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TabelaRemovida {
    pub tabela: String,
    pub linhas: u64,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmpresaPayload {
    #[validate(length(min = 1, message = "O nome da empresa é obrigatório."))]
    pub nome: String,
    pub cnpj: Option<String>,
    pub descricao: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    pub ativa: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    pub papel: PapelMembro,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetPapelPayload {
    pub papel: PapelMembro,
}

// Criação de empresa já com o seu administrador (superadmin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmpresaComAdminPayload {
    #[validate(length(min = 1, message = "O nome da empresa é obrigatório."))]
    pub nome: String,
    pub cnpj: Option<String>,
    pub descricao: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub admin_email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub admin_password: String,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub admin_nome: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetMemberPasswordPayload {
    /// Senha do ADMIN que está executando a troca.
    #[validate(length(min = 1, message = "A senha do administrador é obrigatória."))]
    pub admin_password: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmpresaCriada {
    pub empresa: Empresa,
    pub admin_user_id: Uuid,
    /// `false` quando o e-mail já pertencia a um usuário existente.
    pub admin_criado: bool,
}
