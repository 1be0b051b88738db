// src/db/material_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::material::{ConsumoMaterial, ConsumoPayload, Material, MaterialPayload},
};

const COLUMNS: &str = "id, empresa_id, nome, unidade, custo_unitario, created_at, updated_at";

#[derive(Clone)]
pub struct MaterialRepository {
    pool: PgPool,
}

impl MaterialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        input: &MaterialPayload,
    ) -> Result<Material, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let material = sqlx::query_as::<_, Material>(&format!(
            r#"
            INSERT INTO materiais (empresa_id, nome, unidade, custo_unitario)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(empresa_id)
        .bind(&input.nome)
        .bind(&input.unidade)
        .bind(input.custo_unitario)
        .fetch_one(executor)
        .await?;
        Ok(material)
    }

    pub async fn list<'e, E>(&self, executor: E, empresa_id: Uuid) -> Result<Vec<Material>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let materiais = sqlx::query_as::<_, Material>(&format!(
            "SELECT {COLUMNS} FROM materiais WHERE empresa_id = $1 ORDER BY nome"
        ))
        .bind(empresa_id)
        .fetch_all(executor)
        .await?;
        Ok(materiais)
    }

    pub async fn get<'e, E>(&self, executor: E, empresa_id: Uuid, id: Uuid) -> Result<Material, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Material>(&format!(
            "SELECT {COLUMNS} FROM materiais WHERE empresa_id = $1 AND id = $2"
        ))
        .bind(empresa_id)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound(format!("Material {}", id)))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        id: Uuid,
        input: &MaterialPayload,
    ) -> Result<Material, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Material>(&format!(
            r#"
            UPDATE materiais
            SET nome = $3, unidade = $4, custo_unitario = $5, updated_at = NOW()
            WHERE empresa_id = $1 AND id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(empresa_id)
        .bind(id)
        .bind(&input.nome)
        .bind(&input.unidade)
        .bind(input.custo_unitario)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound(format!("Material {}", id)))
    }

    pub async fn delete<'e, E>(&self, executor: E, empresa_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM materiais WHERE empresa_id = $1 AND id = $2")
            .bind(empresa_id)
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::BusinessRule(
                            "material em uso em fichas técnicas ou consumos".into(),
                        );
                    }
                }
                e.into()
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("Material {}", id)));
        }
        Ok(())
    }

    // =========================================================================
    //  CONSUMO POR LOTE
    // =========================================================================

    pub async fn registrar_consumo<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        lote_id: Uuid,
        input: &ConsumoPayload,
        data: NaiveDate,
    ) -> Result<ConsumoMaterial, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let consumo = sqlx::query_as::<_, ConsumoMaterial>(
            r#"
            WITH novo AS (
                INSERT INTO consumos_material (empresa_id, lote_id, material_id, quantidade, data)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, lote_id, material_id, quantidade, data, created_at
            )
            SELECT novo.id, novo.lote_id, novo.material_id,
                   m.nome AS material_nome, m.unidade, m.custo_unitario,
                   novo.quantidade, novo.data, novo.created_at
            FROM novo
            JOIN materiais m ON m.id = novo.material_id
            "#,
        )
        .bind(empresa_id)
        .bind(lote_id)
        .bind(input.material_id)
        .bind(input.quantidade)
        .bind(data)
        .fetch_one(executor)
        .await?;
        Ok(consumo)
    }

    pub async fn list_consumos<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        lote_id: Uuid,
    ) -> Result<Vec<ConsumoMaterial>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let consumos = sqlx::query_as::<_, ConsumoMaterial>(
            r#"
            SELECT c.id, c.lote_id, c.material_id,
                   m.nome AS material_nome, m.unidade, m.custo_unitario,
                   c.quantidade, c.data, c.created_at
            FROM consumos_material c
            JOIN materiais m ON m.id = c.material_id
            WHERE c.empresa_id = $1 AND c.lote_id = $2
            ORDER BY c.data, c.created_at
            "#,
        )
        .bind(empresa_id)
        .bind(lote_id)
        .fetch_all(executor)
        .await?;
        Ok(consumos)
    }

    pub async fn delete_consumo<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        lote_id: Uuid,
        id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM consumos_material WHERE empresa_id = $1 AND lote_id = $2 AND id = $3",
        )
        .bind(empresa_id)
        .bind(lote_id)
        .bind(id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("Consumo {}", id)));
        }
        Ok(())
    }
}
