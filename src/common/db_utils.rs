use sqlx::{pool::PoolConnection, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::tenancy::TenantContext;

// ---
// Helper RLS: A "Chave" para o Banco de Dados
// ---
/// Adquire uma conexão da pool e define as variáveis RLS da empresa e do usuário.
pub(crate) async fn get_rls_connection(
    app_state: &AppState,
    tenant_ctx: &TenantContext,
    user: &AuthenticatedUser,
) -> Result<PoolConnection<Postgres>, AppError> {
    let mut conn = acquire_tenant_connection(&app_state.db_pool, tenant_ctx.0).await?;

    sqlx::query("SELECT set_config('app.user_id', $1, false)")
        .bind(user.0.id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(conn)
}

/// Conexão com `app.tenant_id` definido, para rotinas fora de uma requisição
/// de empresa (administração).
pub(crate) async fn acquire_tenant_connection(
    pool: &PgPool,
    empresa_id: Uuid,
) -> Result<PoolConnection<Postgres>, AppError> {
    let mut conn = pool.acquire().await?;

    // `false`: vale para a sessão inteira da conexão, não só para a transação corrente.
    sqlx::query("SELECT set_config('app.tenant_id', $1, false)")
        .bind(empresa_id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(conn)
}

/// Define a empresa corrente dentro de uma transação já aberta.
pub(crate) async fn set_tenant_in_tx<'e, E>(executor: E, empresa_id: Uuid) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
        .bind(empresa_id.to_string())
        .execute(executor)
        .await?;
    Ok(())
}
