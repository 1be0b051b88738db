pub mod colaborador_repo;
pub mod comercial_repo;
pub mod dashboard_repo;
pub mod documento_repo;
pub mod lote_repo;
pub mod material_repo;
pub mod produto_repo;
pub mod settings_repo;
pub mod tenancy_repo;
pub mod user_repo;

pub use colaborador_repo::ColaboradorRepository;
pub use comercial_repo::ComercialRepository;
pub use dashboard_repo::DashboardRepository;
pub use documento_repo::DocumentoRepository;
pub use lote_repo::LoteRepository;
pub use material_repo::MaterialRepository;
pub use produto_repo::ProdutoRepository;
pub use settings_repo::SettingsRepository;
pub use tenancy_repo::EmpresaRepository;
pub use user_repo::UserRepository;
