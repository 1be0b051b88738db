// src/services/admin_service.rs

use std::future::Future;

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{acquire_tenant_connection, set_tenant_in_tx},
        error::AppError,
    },
    db::{EmpresaRepository, SettingsRepository, UserRepository},
    models::{
        auth::User,
        empresa::{
            CreateEmpresaComAdminPayload, EmpresaCriada, ExclusaoEmpresaReport, PapelMembro,
            TabelaRemovida,
        },
    },
    services::auth::{check_password, hash_password},
};

/// Tabelas com `empresa_id`, filhas antes das mães.
pub(crate) const TABELAS_EMPRESA: &[&str] = &[
    "producoes",
    "consumos_material",
    "lotes",
    "produto_materiais",
    "subetapas",
    "etapas",
    "projecoes",
    "vendas_perdidas",
    "documentos",
    "produtos",
    "materiais",
    "colaboradores",
    "configuracoes_empresa",
    "password_reset_logs",
    "empresa_membros",
];

// Usuário que vira ADMIN: um já cadastrado, ou um novo com o hash da senha.
enum AdminAlvo {
    Existente(Uuid),
    Novo(String),
}

#[derive(Clone)]
pub struct AdminService {
    empresa_repo: EmpresaRepository,
    settings_repo: SettingsRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl AdminService {
    pub fn new(
        empresa_repo: EmpresaRepository,
        settings_repo: SettingsRepository,
        user_repo: UserRepository,
        pool: PgPool,
    ) -> Self {
        Self { empresa_repo, settings_repo, user_repo, pool }
    }

    /// Superadmin: cria a empresa com o seu ADMIN. Um e-mail já cadastrado
    /// reaproveita o usuário existente (a senha informada é ignorada).
    pub async fn create_empresa_with_admin(
        &self,
        actor: &User,
        input: &CreateEmpresaComAdminPayload,
    ) -> Result<EmpresaCriada, AppError> {
        if !actor.is_superadmin {
            return Err(AppError::SuperadminRequired);
        }

        let alvo = match self.user_repo.find_by_email(input.admin_email.trim()).await? {
            Some(user) => AdminAlvo::Existente(user.id),
            None => AdminAlvo::Novo(hash_password(&input.admin_password).await?),
        };

        let mut tx = self.pool.begin().await?;

        let (admin_user_id, admin_criado) = match alvo {
            AdminAlvo::Existente(id) => (id, false),
            AdminAlvo::Novo(password_hash) => {
                let user = self
                    .user_repo
                    .create_user(
                        &mut *tx,
                        input.admin_email.trim(),
                        &password_hash,
                        input.admin_nome.trim(),
                    )
                    .await?;
                (user.id, true)
            }
        };

        let empresa = self
            .empresa_repo
            .create_empresa(
                &mut *tx,
                input.nome.trim(),
                input.cnpj.as_deref(),
                input.descricao.as_deref(),
            )
            .await?;

        self.empresa_repo
            .add_member(&mut *tx, empresa.id, admin_user_id, PapelMembro::Admin)
            .await?;

        set_tenant_in_tx(&mut *tx, empresa.id).await?;
        self.settings_repo.create_default(&mut *tx, empresa.id).await?;

        tx.commit().await?;

        tracing::info!(
            "Superadmin {} criou a empresa {} (admin {})",
            actor.id,
            empresa.id,
            admin_user_id
        );
        Ok(EmpresaCriada { empresa, admin_user_id, admin_criado })
    }

    /// ADMIN da empresa troca a senha de um membro, confirmando a própria senha.
    pub async fn reset_member_password(
        &self,
        empresa_id: Uuid,
        admin: &User,
        target_user_id: Uuid,
        admin_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        self.empresa_repo
            .find_active_membership(target_user_id, empresa_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Membro {}", target_user_id)))?;

        let check = check_password(admin_password, &admin.password_hash).await?;
        if !check.valid {
            return Err(AppError::InvalidCredentials);
        }

        let new_hash = hash_password(new_password).await?;

        let mut tx = self.pool.begin().await?;
        self.user_repo
            .update_password(&mut *tx, target_user_id, &new_hash)
            .await?;
        self.user_repo
            .insert_password_log(&mut *tx, Some(empresa_id), target_user_id, admin.id, "ADMIN_RESET")
            .await?;
        tx.commit().await?;

        tracing::info!(
            "Senha do usuário {} redefinida por {} na empresa {}",
            target_user_id,
            admin.id,
            empresa_id
        );
        Ok(())
    }

    /// Exclusão em cascata, melhor esforço: cada tabela é tentada mesmo que
    /// uma anterior falhe. A empresa só sai quando todas as filhas saíram.
    pub async fn delete_empresa(
        &self,
        actor: &User,
        empresa_id: Uuid,
    ) -> Result<ExclusaoEmpresaReport, AppError> {
        if !actor.is_superadmin {
            let membro = self
                .empresa_repo
                .find_active_membership(actor.id, empresa_id)
                .await?;
            if !matches!(membro, Some(m) if m.papel == PapelMembro::Admin) {
                return Err(AppError::ForbiddenRole(PapelMembro::Admin.as_str()));
            }
        }

        self.empresa_repo
            .find_by_id(empresa_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Empresa {}", empresa_id)))?;

        let mut conn = acquire_tenant_connection(&self.pool, empresa_id).await?;
        let mut alvo = CascataPostgres {
            repo: &self.empresa_repo,
            conn: &mut *conn,
            empresa_id,
        };
        let report = executar_cascata(&mut alvo, empresa_id, TABELAS_EMPRESA).await;

        tracing::info!(
            "Exclusão da empresa {} por {}: {} tabelas limpas, {} falhas",
            empresa_id,
            actor.id,
            report.removidos.len(),
            report.falhas.len()
        );
        Ok(report)
    }
}

/// Passos da exclusão em cascata de uma empresa.
trait Cascata {
    fn limpar(&mut self, tabela: &'static str) -> impl Future<Output = Result<u64, AppError>> + Send;
    fn remover_empresa(&mut self) -> impl Future<Output = Result<bool, AppError>> + Send;
}

struct CascataPostgres<'a> {
    repo: &'a EmpresaRepository,
    conn: &'a mut PgConnection,
    empresa_id: Uuid,
}

impl Cascata for CascataPostgres<'_> {
    async fn limpar(&mut self, tabela: &'static str) -> Result<u64, AppError> {
        self.repo
            .delete_rows_from(&mut *self.conn, tabela, self.empresa_id)
            .await
    }

    async fn remover_empresa(&mut self) -> Result<bool, AppError> {
        self.repo.delete_empresa(&mut *self.conn, self.empresa_id).await
    }
}

/// Tenta cada tabela mesmo após falhas; a empresa só sai sem nenhuma falha.
async fn executar_cascata<C>(alvo: &mut C, empresa_id: Uuid, tabelas: &[&'static str]) -> ExclusaoEmpresaReport
where
    C: Cascata + Send,
{
    let mut report = ExclusaoEmpresaReport { empresa_id, ..Default::default() };

    for &tabela in tabelas {
        match alvo.limpar(tabela).await {
            Ok(linhas) => report.removidos.push(TabelaRemovida {
                tabela: tabela.to_string(),
                linhas,
            }),
            Err(e) => {
                tracing::warn!("Falha ao limpar {} da empresa {}: {}", tabela, empresa_id, e);
                report.falhas.push(tabela.to_string());
            }
        }
    }

    if report.falhas.is_empty() {
        match alvo.remover_empresa().await {
            Ok(removida) => report.empresa_removida = removida,
            Err(e) => {
                tracing::warn!("Falha ao excluir a empresa {}: {}", empresa_id, e);
                report.falhas.push("empresas".to_string());
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(tabela: &str) -> usize {
        TABELAS_EMPRESA
            .iter()
            .position(|t| *t == tabela)
            .unwrap_or_else(|| panic!("{} fora da lista", tabela))
    }

    #[test]
    fn children_are_deleted_before_their_parents() {
        // (filha, mãe) conforme as chaves estrangeiras do esquema.
        let fks = [
            ("producoes", "lotes"),
            ("producoes", "etapas"),
            ("producoes", "subetapas"),
            ("producoes", "colaboradores"),
            ("consumos_material", "lotes"),
            ("consumos_material", "materiais"),
            ("lotes", "produtos"),
            ("produto_materiais", "produtos"),
            ("produto_materiais", "materiais"),
            ("subetapas", "etapas"),
            ("etapas", "produtos"),
            ("projecoes", "produtos"),
            ("vendas_perdidas", "produtos"),
        ];
        for (filha, mae) in fks {
            assert!(pos(filha) < pos(mae), "{} deveria sair antes de {}", filha, mae);
        }
    }

    #[test]
    fn every_table_appears_once() {
        let mut tabelas = TABELAS_EMPRESA.to_vec();
        tabelas.sort();
        tabelas.dedup();
        assert_eq!(tabelas.len(), TABELAS_EMPRESA.len());
        assert!(!TABELAS_EMPRESA.contains(&"empresas"));
    }

    #[derive(Default)]
    struct CascataFalsa {
        falhar: Vec<&'static str>,
        falhar_empresa: bool,
        tentadas: Vec<&'static str>,
        empresa_removida: bool,
    }

    impl Cascata for CascataFalsa {
        async fn limpar(&mut self, tabela: &'static str) -> Result<u64, AppError> {
            self.tentadas.push(tabela);
            if self.falhar.contains(&tabela) {
                Err(AppError::BusinessRule(format!("falha em {}", tabela)))
            } else {
                Ok(2)
            }
        }

        async fn remover_empresa(&mut self) -> Result<bool, AppError> {
            if self.falhar_empresa {
                return Err(AppError::BusinessRule("empresa presa".into()));
            }
            self.empresa_removida = true;
            Ok(true)
        }
    }

    #[tokio::test]
    async fn cascade_removes_the_empresa_when_every_table_succeeds() {
        let mut alvo = CascataFalsa::default();
        let report = executar_cascata(&mut alvo, Uuid::new_v4(), TABELAS_EMPRESA).await;

        assert_eq!(alvo.tentadas, TABELAS_EMPRESA.to_vec());
        assert_eq!(report.removidos.len(), TABELAS_EMPRESA.len());
        assert!(report.removidos.iter().all(|r| r.linhas == 2));
        assert!(report.falhas.is_empty());
        assert!(report.empresa_removida);
    }

    #[tokio::test]
    async fn cascade_keeps_going_after_a_failure_and_keeps_the_empresa() {
        let mut alvo = CascataFalsa { falhar: vec!["etapas"], ..Default::default() };
        let report = executar_cascata(&mut alvo, Uuid::new_v4(), TABELAS_EMPRESA).await;

        // As tabelas depois de "etapas" também foram tentadas.
        assert_eq!(alvo.tentadas, TABELAS_EMPRESA.to_vec());
        assert_eq!(report.falhas, vec!["etapas".to_string()]);
        assert_eq!(report.removidos.len(), TABELAS_EMPRESA.len() - 1);
        assert!(!report.removidos.iter().any(|r| r.tabela == "etapas"));
        assert!(!report.empresa_removida);
        assert!(!alvo.empresa_removida);
    }

    #[tokio::test]
    async fn failure_on_the_empresa_row_is_reported() {
        let mut alvo = CascataFalsa { falhar_empresa: true, ..Default::default() };
        let report = executar_cascata(&mut alvo, Uuid::new_v4(), TABELAS_EMPRESA).await;

        assert_eq!(report.falhas, vec!["empresas".to_string()]);
        assert!(!report.empresa_removida);
    }
}
