// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::UserEmpresa,
        empresa::{Empresa, EmpresaMembro, MembroDetalhe, PapelMembro},
    },
};

const EMPRESA_COLUMNS: &str =
    "id, nome, cnpj, descricao, assinatura_ativa, checkout_concluido_em, created_at, updated_at";

#[derive(Clone)]
pub struct EmpresaRepository {
    pool: PgPool,
}

impl EmpresaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Busca o vínculo ATIVO de um usuário com uma empresa.
    /// Esta é a verificação de autorização mais importante.
    pub async fn find_active_membership(
        &self,
        user_id: Uuid,
        empresa_id: Uuid,
    ) -> Result<Option<EmpresaMembro>, AppError> {
        let membro = sqlx::query_as::<_, EmpresaMembro>(
            r#"
            SELECT empresa_id, user_id, papel, is_active, created_at
            FROM empresa_membros
            WHERE user_id = $1 AND empresa_id = $2 AND is_active = true
            "#,
        )
        .bind(user_id)
        .bind(empresa_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membro)
    }

    pub async fn find_by_id(&self, empresa_id: Uuid) -> Result<Option<Empresa>, AppError> {
        let empresa = sqlx::query_as::<_, Empresa>(&format!(
            "SELECT {EMPRESA_COLUMNS} FROM empresas WHERE id = $1"
        ))
        .bind(empresa_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(empresa)
    }

    /// Verifica se o usuário já é ADMIN de uma empresa com esse nome.
    pub async fn user_has_empresa_with_name(
        &self,
        user_id: Uuid,
        nome: &str,
    ) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM empresas e
                JOIN empresa_membros m ON m.empresa_id = e.id
                WHERE m.user_id = $1
                  AND m.papel = 'ADMIN'
                  AND lower(e.nome) = lower($2)
            )
            "#,
        )
        .bind(user_id)
        .bind(nome)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Cria uma nova empresa (tenant).
    pub async fn create_empresa<'e, E>(
        &self,
        executor: E,
        nome: &str,
        cnpj: Option<&str>,
        descricao: Option<&str>,
    ) -> Result<Empresa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Empresa>(&format!(
            r#"
            INSERT INTO empresas (nome, cnpj, descricao)
            VALUES ($1, $2, $3)
            RETURNING {EMPRESA_COLUMNS}
            "#
        ))
        .bind(nome)
        .bind(cnpj)
        .bind(descricao)
        .fetch_one(executor)
        .await
        .map_err(|e| crate::common::error::map_unique_violation(e, "cnpj"))
    }

    /// Liga um usuário a uma empresa com um papel. Reativa o vínculo se já existir.
    pub async fn add_member<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        user_id: Uuid,
        papel: PapelMembro,
    ) -> Result<EmpresaMembro, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let membro = sqlx::query_as::<_, EmpresaMembro>(
            r#"
            INSERT INTO empresa_membros (empresa_id, user_id, papel)
            VALUES ($1, $2, $3)
            ON CONFLICT (empresa_id, user_id)
            DO UPDATE SET papel = EXCLUDED.papel, is_active = true
            RETURNING empresa_id, user_id, papel, is_active, created_at
            "#,
        )
        .bind(empresa_id)
        .bind(user_id)
        .bind(papel)
        .fetch_one(executor)
        .await?;
        Ok(membro)
    }

    pub async fn get_empresas_for_user(&self, user_id: Uuid) -> Result<Vec<UserEmpresa>, AppError> {
        let empresas = sqlx::query_as::<_, UserEmpresa>(
            r#"
            SELECT e.id, e.nome, e.cnpj, e.assinatura_ativa, m.papel
            FROM empresas e
            JOIN empresa_membros m ON m.empresa_id = e.id
            WHERE m.user_id = $1 AND m.is_active = true
            ORDER BY e.nome
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(empresas)
    }

    pub async fn list_members(&self, empresa_id: Uuid) -> Result<Vec<MembroDetalhe>, AppError> {
        let membros = sqlx::query_as::<_, MembroDetalhe>(
            r#"
            SELECT m.user_id, u.email, u.nome, m.papel, m.is_active, m.created_at
            FROM empresa_membros m
            JOIN users u ON u.id = m.user_id
            WHERE m.empresa_id = $1
            ORDER BY u.nome
            "#,
        )
        .bind(empresa_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(membros)
    }

    pub async fn set_member_papel<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        user_id: Uuid,
        papel: PapelMembro,
    ) -> Result<EmpresaMembro, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, EmpresaMembro>(
            r#"
            UPDATE empresa_membros SET papel = $3
            WHERE empresa_id = $1 AND user_id = $2
            RETURNING empresa_id, user_id, papel, is_active, created_at
            "#,
        )
        .bind(empresa_id)
        .bind(user_id)
        .bind(papel)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound(format!("Membro {}", user_id)))
    }

    pub async fn deactivate_member<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE empresa_membros SET is_active = false WHERE empresa_id = $1 AND user_id = $2",
        )
        .bind(empresa_id)
        .bind(user_id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("Membro {}", user_id)));
        }
        Ok(())
    }

    /// Trava as linhas dos ADMINs ativos até o fim da transação e devolve seus ids.
    /// Duas remoções concorrentes de ADMIN ficam serializadas aqui.
    pub async fn lock_active_admins<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
    ) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let admins: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT user_id FROM empresa_membros
            WHERE empresa_id = $1 AND papel = 'ADMIN' AND is_active = true
            ORDER BY user_id
            FOR UPDATE
            "#,
        )
        .bind(empresa_id)
        .fetch_all(executor)
        .await?;
        Ok(admins)
    }

    /// Liga/desliga a assinatura (flag do checkout).
    pub async fn update_checkout(&self, empresa_id: Uuid, ativa: bool) -> Result<Empresa, AppError> {
        sqlx::query_as::<_, Empresa>(&format!(
            r#"
            UPDATE empresas
            SET assinatura_ativa = $2,
                checkout_concluido_em = CASE WHEN $2 THEN NOW() ELSE NULL END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {EMPRESA_COLUMNS}
            "#
        ))
        .bind(empresa_id)
        .bind(ativa)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound(format!("Empresa {}", empresa_id)))
    }

    // --- Exclusão em cascata ---

    /// Apaga as linhas da empresa numa tabela. O nome da tabela vem sempre
    /// da lista fixa do serviço de administração, nunca do cliente.
    pub async fn delete_rows_from<'e, E>(
        &self,
        executor: E,
        tabela: &str,
        empresa_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(&format!("DELETE FROM {tabela} WHERE empresa_id = $1"))
            .bind(empresa_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_empresa<'e, E>(&self, executor: E, empresa_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM empresas WHERE id = $1")
            .bind(empresa_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
