use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::settings::{ConfiguracoesEmpresa, UpdateSettingsRequest},
};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_settings<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
    ) -> Result<ConfiguracoesEmpresa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, ConfiguracoesEmpresa>(
            r#"
            SELECT empresa_id, horas_por_dia, custo_hora_padrao, margem_alvo, updated_at
            FROM configuracoes_empresa
            WHERE empresa_id = $1
            "#,
        )
        .bind(empresa_id)
        .fetch_optional(executor)
        .await?;

        // Empresa sem linha de configuração usa os padrões.
        Ok(settings.unwrap_or_else(|| ConfiguracoesEmpresa::padrao(empresa_id)))
    }

    /// Cria a linha padrão (usado na criação da empresa).
    pub async fn create_default<'e, E>(&self, executor: E, empresa_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO configuracoes_empresa (empresa_id)
            VALUES ($1)
            ON CONFLICT (empresa_id) DO NOTHING
            "#,
        )
        .bind(empresa_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn update_settings<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        input: &UpdateSettingsRequest,
    ) -> Result<ConfiguracoesEmpresa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // UPSERT (Insert or Update)
        let settings = sqlx::query_as::<_, ConfiguracoesEmpresa>(
            r#"
            INSERT INTO configuracoes_empresa (empresa_id, horas_por_dia, custo_hora_padrao, margem_alvo)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (empresa_id)
            DO UPDATE SET
                horas_por_dia = EXCLUDED.horas_por_dia,
                custo_hora_padrao = EXCLUDED.custo_hora_padrao,
                margem_alvo = EXCLUDED.margem_alvo,
                updated_at = NOW()
            RETURNING empresa_id, horas_por_dia, custo_hora_padrao, margem_alvo, updated_at
            "#,
        )
        .bind(empresa_id)
        .bind(input.horas_por_dia)
        .bind(input.custo_hora_padrao)
        .bind(input.margem_alvo)
        .fetch_one(executor)
        .await?;

        Ok(settings)
    }
}
