// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        ColaboradorRepository, ComercialRepository, DashboardRepository, DocumentoRepository,
        EmpresaRepository, LoteRepository, MaterialRepository, ProdutoRepository,
        SettingsRepository, UserRepository,
    },
    services::{
        admin_service::AdminService, auth::AuthService, dashboard_service::DashboardService,
        document_service::DocumentService, lote_service::LoteService,
        previsao_service::PrevisaoService, realtime::RealtimeHub,
        tenancy_service::EmpresaService,
    },
};

/// Configuração lida do ambiente (`.env` incluso).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub database_max_connections: u32,
    pub cors_allowed_origin: String,
    pub fonts_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let database_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS inválido: {}", raw))?,
            Err(_) => 5,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            database_max_connections,
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            fonts_dir: env::var("FONTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./fonts")),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: Arc<I18nStore>,
    pub realtime: RealtimeHub,

    // Repositórios usados direto pelos handlers de CRUD simples
    pub empresa_repo: EmpresaRepository,
    pub settings_repo: SettingsRepository,
    pub colaborador_repo: ColaboradorRepository,
    pub produto_repo: ProdutoRepository,
    pub material_repo: MaterialRepository,
    pub comercial_repo: ComercialRepository,

    pub auth_service: AuthService,
    pub empresa_service: EmpresaService,
    pub admin_service: AdminService,
    pub previsao_service: PrevisaoService,
    pub lote_service: LoteService,
    pub dashboard_service: DashboardService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, config))
    }

    /// Monta o gráfico de dependências sobre uma pool já criada.
    pub fn from_pool(db_pool: PgPool, config: &Config) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let empresa_repo = EmpresaRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());
        let colaborador_repo = ColaboradorRepository::new(db_pool.clone());
        let produto_repo = ProdutoRepository::new(db_pool.clone());
        let material_repo = MaterialRepository::new(db_pool.clone());
        let comercial_repo = ComercialRepository::new(db_pool.clone());
        let lote_repo = LoteRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());
        let documento_repo = DocumentoRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            empresa_repo.clone(),
            config.jwt_secret.clone(),
            db_pool.clone(),
        );
        let empresa_service = EmpresaService::new(
            empresa_repo.clone(),
            settings_repo.clone(),
            user_repo.clone(),
            db_pool.clone(),
        );
        let admin_service = AdminService::new(
            empresa_repo.clone(),
            settings_repo.clone(),
            user_repo,
            db_pool.clone(),
        );
        let previsao_service = PrevisaoService::new(
            produto_repo.clone(),
            colaborador_repo.clone(),
            settings_repo.clone(),
            comercial_repo.clone(),
        );
        let lote_service = LoteService::new(
            lote_repo,
            produto_repo.clone(),
            material_repo.clone(),
            colaborador_repo.clone(),
            previsao_service.clone(),
        );
        let dashboard_service = DashboardService::new(dashboard_repo);
        let document_service = DocumentService::new(
            documento_repo,
            empresa_repo.clone(),
            lote_service.clone(),
            config.fonts_dir.clone(),
        );

        Self {
            db_pool,
            i18n_store: Arc::new(I18nStore::embedded()),
            realtime: RealtimeHub::new(),
            empresa_repo,
            settings_repo,
            colaborador_repo,
            produto_repo,
            material_repo,
            comercial_repo,
            auth_service,
            empresa_service,
            admin_service,
            previsao_service,
            lote_service,
            dashboard_service,
            document_service,
        }
    }
}
