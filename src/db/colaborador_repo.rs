// src/db/colaborador_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::colaborador::{Colaborador, ColaboradorPayload},
};

const COLUMNS: &str = "id, empresa_id, nome, funcao, custo_hora, ativo, created_at, updated_at";

#[derive(Clone)]
pub struct ColaboradorRepository {
    pool: PgPool,
}

impl ColaboradorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        input: &ColaboradorPayload,
    ) -> Result<Colaborador, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let colaborador = sqlx::query_as::<_, Colaborador>(&format!(
            r#"
            INSERT INTO colaboradores (empresa_id, nome, funcao, custo_hora, ativo)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(empresa_id)
        .bind(&input.nome)
        .bind(input.funcao.as_deref())
        .bind(input.custo_hora)
        .bind(input.ativo)
        .fetch_one(executor)
        .await?;
        Ok(colaborador)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        somente_ativos: bool,
    ) -> Result<Vec<Colaborador>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let colaboradores = sqlx::query_as::<_, Colaborador>(&format!(
            r#"
            SELECT {COLUMNS} FROM colaboradores
            WHERE empresa_id = $1 AND ($2 = false OR ativo = true)
            ORDER BY nome
            "#
        ))
        .bind(empresa_id)
        .bind(somente_ativos)
        .fetch_all(executor)
        .await?;
        Ok(colaboradores)
    }

    pub async fn get<'e, E>(&self, executor: E, empresa_id: Uuid, id: Uuid) -> Result<Colaborador, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Colaborador>(&format!(
            "SELECT {COLUMNS} FROM colaboradores WHERE empresa_id = $1 AND id = $2"
        ))
        .bind(empresa_id)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound(format!("Colaborador {}", id)))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        id: Uuid,
        input: &ColaboradorPayload,
    ) -> Result<Colaborador, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Colaborador>(&format!(
            r#"
            UPDATE colaboradores
            SET nome = $3, funcao = $4, custo_hora = $5, ativo = $6, updated_at = NOW()
            WHERE empresa_id = $1 AND id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(empresa_id)
        .bind(id)
        .bind(&input.nome)
        .bind(input.funcao.as_deref())
        .bind(input.custo_hora)
        .bind(input.ativo)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound(format!("Colaborador {}", id)))
    }

    pub async fn delete<'e, E>(&self, executor: E, empresa_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM colaboradores WHERE empresa_id = $1 AND id = $2")
            .bind(empresa_id)
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| {
                // Colaborador com apontamentos não pode sumir; desative-o.
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::BusinessRule(
                            "colaborador possui apontamentos; desative-o em vez de excluir".into(),
                        );
                    }
                }
                e.into()
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("Colaborador {}", id)));
        }
        Ok(())
    }

    /// Quantidade de colaboradores ativos e a média do custo/hora deles
    /// (apenas os que têm custo informado).
    pub async fn equipe_ativa<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
    ) -> Result<(i64, Option<Decimal>), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row: (i64, Option<Decimal>) = sqlx::query_as(
            r#"
            SELECT COUNT(*), AVG(custo_hora) FILTER (WHERE custo_hora > 0)
            FROM colaboradores
            WHERE empresa_id = $1 AND ativo = true
            "#,
        )
        .bind(empresa_id)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }
}
