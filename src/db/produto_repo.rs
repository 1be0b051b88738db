// src/db/produto_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::produto::{
        Etapa, EtapaPayload, MaterialDoProduto, MaterialDoProdutoPayload, Produto, ProdutoPayload,
        Subetapa,
    },
};

const PRODUTO_COLUMNS: &str =
    "id, empresa_id, codigo, nome, descricao, preco_venda, created_at, updated_at";
const ETAPA_COLUMNS: &str =
    "id, empresa_id, produto_id, nome, ordem, tempo_por_unidade_min, created_at";
const SUBETAPA_COLUMNS: &str =
    "id, empresa_id, etapa_id, nome, ordem, tempo_por_unidade_min, created_at";

#[derive(Clone)]
pub struct ProdutoRepository {
    pool: PgPool,
}

impl ProdutoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PRODUTOS
    // =========================================================================

    pub async fn create<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        input: &ProdutoPayload,
    ) -> Result<Produto, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Produto>(&format!(
            r#"
            INSERT INTO produtos (empresa_id, codigo, nome, descricao, preco_venda)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUTO_COLUMNS}
            "#
        ))
        .bind(empresa_id)
        .bind(&input.codigo)
        .bind(&input.nome)
        .bind(input.descricao.as_deref())
        .bind(input.preco_venda)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, &format!("código {}", input.codigo)))
    }

    pub async fn list<'e, E>(&self, executor: E, empresa_id: Uuid) -> Result<Vec<Produto>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let produtos = sqlx::query_as::<_, Produto>(&format!(
            "SELECT {PRODUTO_COLUMNS} FROM produtos WHERE empresa_id = $1 ORDER BY nome"
        ))
        .bind(empresa_id)
        .fetch_all(executor)
        .await?;
        Ok(produtos)
    }

    pub async fn get<'e, E>(&self, executor: E, empresa_id: Uuid, id: Uuid) -> Result<Produto, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Produto>(&format!(
            "SELECT {PRODUTO_COLUMNS} FROM produtos WHERE empresa_id = $1 AND id = $2"
        ))
        .bind(empresa_id)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound(format!("Produto {}", id)))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        id: Uuid,
        input: &ProdutoPayload,
    ) -> Result<Produto, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Produto>(&format!(
            r#"
            UPDATE produtos
            SET codigo = $3, nome = $4, descricao = $5, preco_venda = $6, updated_at = NOW()
            WHERE empresa_id = $1 AND id = $2
            RETURNING {PRODUTO_COLUMNS}
            "#
        ))
        .bind(empresa_id)
        .bind(id)
        .bind(&input.codigo)
        .bind(&input.nome)
        .bind(input.descricao.as_deref())
        .bind(input.preco_venda)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_unique_violation(e, &format!("código {}", input.codigo)))?
        .ok_or_else(|| AppError::ResourceNotFound(format!("Produto {}", id)))
    }

    pub async fn delete<'e, E>(&self, executor: E, empresa_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM produtos WHERE empresa_id = $1 AND id = $2")
            .bind(empresa_id)
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::BusinessRule(
                            "produto possui lotes, projeções ou vendas registradas".into(),
                        );
                    }
                }
                e.into()
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("Produto {}", id)));
        }
        Ok(())
    }

    // =========================================================================
    //  ETAPAS & SUBETAPAS
    // =========================================================================

    pub async fn add_etapa<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        produto_id: Uuid,
        input: &EtapaPayload,
    ) -> Result<Etapa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Etapa>(&format!(
            r#"
            INSERT INTO etapas (empresa_id, produto_id, nome, ordem, tempo_por_unidade_min)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ETAPA_COLUMNS}
            "#
        ))
        .bind(empresa_id)
        .bind(produto_id)
        .bind(&input.nome)
        .bind(input.ordem)
        .bind(input.tempo_por_unidade_min)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, &format!("ordem {}", input.ordem)))
    }

    pub async fn list_etapas<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        produto_id: Uuid,
    ) -> Result<Vec<Etapa>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let etapas = sqlx::query_as::<_, Etapa>(&format!(
            r#"
            SELECT {ETAPA_COLUMNS} FROM etapas
            WHERE empresa_id = $1 AND produto_id = $2
            ORDER BY ordem
            "#
        ))
        .bind(empresa_id)
        .bind(produto_id)
        .fetch_all(executor)
        .await?;
        Ok(etapas)
    }

    pub async fn get_etapa<'e, E>(&self, executor: E, empresa_id: Uuid, id: Uuid) -> Result<Etapa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Etapa>(&format!(
            "SELECT {ETAPA_COLUMNS} FROM etapas WHERE empresa_id = $1 AND id = $2"
        ))
        .bind(empresa_id)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound(format!("Etapa {}", id)))
    }

    pub async fn update_etapa<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        id: Uuid,
        input: &EtapaPayload,
    ) -> Result<Etapa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Etapa>(&format!(
            r#"
            UPDATE etapas SET nome = $3, ordem = $4, tempo_por_unidade_min = $5
            WHERE empresa_id = $1 AND id = $2
            RETURNING {ETAPA_COLUMNS}
            "#
        ))
        .bind(empresa_id)
        .bind(id)
        .bind(&input.nome)
        .bind(input.ordem)
        .bind(input.tempo_por_unidade_min)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_unique_violation(e, &format!("ordem {}", input.ordem)))?
        .ok_or_else(|| AppError::ResourceNotFound(format!("Etapa {}", id)))
    }

    pub async fn delete_etapa<'e, E>(&self, executor: E, empresa_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM etapas WHERE empresa_id = $1 AND id = $2")
            .bind(empresa_id)
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::BusinessRule("etapa possui apontamentos de produção".into());
                    }
                }
                e.into()
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("Etapa {}", id)));
        }
        Ok(())
    }

    pub async fn add_subetapa<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        etapa_id: Uuid,
        input: &EtapaPayload,
    ) -> Result<Subetapa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Subetapa>(&format!(
            r#"
            INSERT INTO subetapas (empresa_id, etapa_id, nome, ordem, tempo_por_unidade_min)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SUBETAPA_COLUMNS}
            "#
        ))
        .bind(empresa_id)
        .bind(etapa_id)
        .bind(&input.nome)
        .bind(input.ordem)
        .bind(input.tempo_por_unidade_min)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, &format!("ordem {}", input.ordem)))
    }

    /// Todas as subetapas das etapas de um produto.
    pub async fn list_subetapas_do_produto<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        produto_id: Uuid,
    ) -> Result<Vec<Subetapa>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let subetapas = sqlx::query_as::<_, Subetapa>(
            r#"
            SELECT s.id, s.empresa_id, s.etapa_id, s.nome, s.ordem, s.tempo_por_unidade_min, s.created_at
            FROM subetapas s
            JOIN etapas e ON e.id = s.etapa_id
            WHERE s.empresa_id = $1 AND e.produto_id = $2
            ORDER BY e.ordem, s.ordem
            "#,
        )
        .bind(empresa_id)
        .bind(produto_id)
        .fetch_all(executor)
        .await?;
        Ok(subetapas)
    }

    pub async fn delete_subetapa<'e, E>(&self, executor: E, empresa_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM subetapas WHERE empresa_id = $1 AND id = $2")
            .bind(empresa_id)
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::BusinessRule("subetapa possui apontamentos de produção".into());
                    }
                }
                e.into()
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("Subetapa {}", id)));
        }
        Ok(())
    }

    // =========================================================================
    //  FICHA TÉCNICA (BOM)
    // =========================================================================

    pub async fn set_material<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        produto_id: Uuid,
        input: &MaterialDoProdutoPayload,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO produto_materiais (empresa_id, produto_id, material_id, quantidade_por_unidade)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (produto_id, material_id)
            DO UPDATE SET quantidade_por_unidade = EXCLUDED.quantidade_por_unidade
            RETURNING id
            "#,
        )
        .bind(empresa_id)
        .bind(produto_id)
        .bind(input.material_id)
        .bind(input.quantidade_por_unidade)
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    pub async fn list_materiais<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        produto_id: Uuid,
    ) -> Result<Vec<MaterialDoProduto>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let materiais = sqlx::query_as::<_, MaterialDoProduto>(
            r#"
            SELECT pm.id, pm.produto_id, pm.material_id,
                   m.nome AS material_nome, m.unidade, m.custo_unitario,
                   pm.quantidade_por_unidade
            FROM produto_materiais pm
            JOIN materiais m ON m.id = pm.material_id
            WHERE pm.empresa_id = $1 AND pm.produto_id = $2
            ORDER BY m.nome
            "#,
        )
        .bind(empresa_id)
        .bind(produto_id)
        .fetch_all(executor)
        .await?;
        Ok(materiais)
    }

    pub async fn remove_material<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        produto_id: Uuid,
        material_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM produto_materiais WHERE empresa_id = $1 AND produto_id = $2 AND material_id = $3",
        )
        .bind(empresa_id)
        .bind(produto_id)
        .bind(material_id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("Material {} no produto", material_id)));
        }
        Ok(())
    }
}
