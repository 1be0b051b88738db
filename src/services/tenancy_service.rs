// src/services/tenancy_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::set_tenant_in_tx, error::AppError},
    db::{EmpresaRepository, SettingsRepository, UserRepository},
    models::{
        auth::UserEmpresa,
        empresa::{Empresa, EmpresaMembro, MembroDetalhe, PapelMembro},
    },
};

#[derive(Clone)]
pub struct EmpresaService {
    empresa_repo: EmpresaRepository,
    settings_repo: SettingsRepository,
    user_repo: UserRepository,
    pool: PgPool, // Usamos a pool para iniciar transações
}

impl EmpresaService {
    pub fn new(
        empresa_repo: EmpresaRepository,
        settings_repo: SettingsRepository,
        user_repo: UserRepository,
        pool: PgPool,
    ) -> Self {
        Self { empresa_repo, settings_repo, user_repo, pool }
    }

    /// Cria a empresa e, na mesma transação, torna o criador ADMIN
    /// e grava a configuração padrão.
    pub async fn create_empresa_with_owner(
        &self,
        nome: &str,
        cnpj: Option<&str>,
        descricao: Option<&str>,
        owner_id: Uuid,
    ) -> Result<Empresa, AppError> {
        let nome = nome.trim();
        if self.empresa_repo.user_has_empresa_with_name(owner_id, nome).await? {
            return Err(AppError::EmpresaNameAlreadyExists(nome.to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let empresa = self
            .empresa_repo
            .create_empresa(&mut *tx, nome, cnpj, descricao)
            .await?;

        self.empresa_repo
            .add_member(&mut *tx, empresa.id, owner_id, PapelMembro::Admin)
            .await?;

        // configuracoes_empresa está sob RLS.
        set_tenant_in_tx(&mut *tx, empresa.id).await?;
        self.settings_repo.create_default(&mut *tx, empresa.id).await?;

        tx.commit().await?;

        tracing::info!("Empresa {} criada por {}", empresa.id, owner_id);
        Ok(empresa)
    }

    pub async fn list_user_empresas(&self, user_id: Uuid) -> Result<Vec<UserEmpresa>, AppError> {
        self.empresa_repo.get_empresas_for_user(user_id).await
    }

    pub async fn update_checkout(&self, empresa_id: Uuid, ativa: bool) -> Result<Empresa, AppError> {
        let empresa = self.empresa_repo.update_checkout(empresa_id, ativa).await?;
        tracing::info!("Assinatura da empresa {} ativa={}", empresa_id, ativa);
        Ok(empresa)
    }

    // --- Membros ---

    pub async fn list_members(&self, empresa_id: Uuid) -> Result<Vec<MembroDetalhe>, AppError> {
        self.empresa_repo.list_members(empresa_id).await
    }

    pub async fn add_member(
        &self,
        empresa_id: Uuid,
        email: &str,
        papel: PapelMembro,
    ) -> Result<EmpresaMembro, AppError> {
        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::UserNotFound)?;

        self.empresa_repo
            .add_member(&self.pool, empresa_id, user.id, papel)
            .await
    }

    pub async fn set_member_papel(
        &self,
        empresa_id: Uuid,
        user_id: Uuid,
        papel: PapelMembro,
    ) -> Result<EmpresaMembro, AppError> {
        let mut tx = self.pool.begin().await?;
        if papel != PapelMembro::Admin {
            let admins = self.empresa_repo.lock_active_admins(&mut *tx, empresa_id).await?;
            garantir_outro_admin(&admins, user_id)?;
        }
        let membro = self
            .empresa_repo
            .set_member_papel(&mut *tx, empresa_id, user_id, papel)
            .await?;
        tx.commit().await?;
        Ok(membro)
    }

    pub async fn deactivate_member(&self, empresa_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let admins = self.empresa_repo.lock_active_admins(&mut *tx, empresa_id).await?;
        garantir_outro_admin(&admins, user_id)?;
        self.empresa_repo
            .deactivate_member(&mut *tx, empresa_id, user_id)
            .await?;
        tx.commit().await?;

        tracing::info!("Membro {} desativado na empresa {}", user_id, empresa_id);
        Ok(())
    }
}

/// A empresa nunca fica sem um ADMIN ativo: o único ADMIN não pode sair do papel.
fn garantir_outro_admin(admins_ativos: &[Uuid], user_id: Uuid) -> Result<(), AppError> {
    if admins_ativos.contains(&user_id) && admins_ativos.len() <= 1 {
        return Err(AppError::BusinessRule(
            "a empresa precisa de pelo menos um ADMIN ativo".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_only_admin_cannot_step_down() {
        let admin = Uuid::new_v4();
        assert!(matches!(
            garantir_outro_admin(&[admin], admin),
            Err(AppError::BusinessRule(_))
        ));
    }

    #[test]
    fn an_admin_can_leave_when_another_remains() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert!(garantir_outro_admin(&[a, b], a).is_ok());
    }

    #[test]
    fn non_admins_are_never_blocked() {
        let admin = Uuid::new_v4();
        assert!(garantir_outro_admin(&[admin], Uuid::new_v4()).is_ok());
        assert!(garantir_outro_admin(&[], Uuid::new_v4()).is_ok());
    }
}
