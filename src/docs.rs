// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(title = "Produção API", description = "Controle de produção por lotes, custos e previsão"),
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::get_my_empresas,
        handlers::auth::change_password,

        // --- Empresas ---
        handlers::tenancy::create_empresa,
        handlers::tenancy::list_my_empresas,
        handlers::tenancy::update_checkout,
        handlers::tenancy::list_members,
        handlers::tenancy::add_member,
        handlers::tenancy::set_member_papel,
        handlers::tenancy::deactivate_member,

        // --- Admin ---
        handlers::admin::create_empresa_with_admin,
        handlers::admin::delete_empresa,
        handlers::admin::reset_member_password,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,

        // --- Colaboradores ---
        handlers::colaboradores::create_colaborador,
        handlers::colaboradores::list_colaboradores,
        handlers::colaboradores::get_colaborador,
        handlers::colaboradores::update_colaborador,
        handlers::colaboradores::delete_colaborador,

        // --- Produtos ---
        handlers::produtos::create_produto,
        handlers::produtos::list_produtos,
        handlers::produtos::get_produto,
        handlers::produtos::update_produto,
        handlers::produtos::delete_produto,
        handlers::produtos::detalhamento_custos,
        handlers::produtos::add_etapa,
        handlers::produtos::list_etapas,
        handlers::produtos::update_etapa,
        handlers::produtos::delete_etapa,
        handlers::produtos::add_subetapa,
        handlers::produtos::list_subetapas,
        handlers::produtos::delete_subetapa,
        handlers::produtos::set_material,
        handlers::produtos::list_materiais,
        handlers::produtos::remove_material,

        // --- Materiais ---
        handlers::materiais::create_material,
        handlers::materiais::list_materiais,
        handlers::materiais::get_material,
        handlers::materiais::update_material,
        handlers::materiais::delete_material,

        // --- Lotes ---
        handlers::lotes::create_lote,
        handlers::lotes::list_lotes,
        handlers::lotes::get_lote,
        handlers::lotes::update_lote,
        handlers::lotes::delete_lote,
        handlers::lotes::detalhes_lote,
        handlers::lotes::registrar_producao,
        handlers::lotes::list_producoes,
        handlers::lotes::delete_producao,
        handlers::lotes::registrar_consumo,
        handlers::lotes::list_consumos,
        handlers::lotes::delete_consumo,

        // --- Comercial ---
        handlers::comercial::create_projecao,
        handlers::comercial::list_projecoes,
        handlers::comercial::update_projecao,
        handlers::comercial::delete_projecao,
        handlers::comercial::create_venda_perdida,
        handlers::comercial::list_vendas_perdidas,
        handlers::comercial::delete_venda_perdida,
        handlers::comercial::resumo_vendas_perdidas,

        // --- Previsão ---
        handlers::previsao::calcular_previsao,
        handlers::previsao::resumo_previsao,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
        handlers::dashboard::get_production_chart,
        handlers::dashboard::get_top_products,

        // --- Documentos ---
        handlers::documents::upload_documento,
        handlers::documents::list_documentos,
        handlers::documents::ficha_lote_pdf,

        // --- Realtime ---
        handlers::realtime::stream_alteracoes,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::UserEmpresa,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::ChangePasswordPayload,
            models::auth::AuthResponse,

            // --- Empresas ---
            models::empresa::PapelMembro,
            models::empresa::Empresa,
            models::empresa::EmpresaMembro,
            models::empresa::MembroDetalhe,
            models::empresa::EmpresaCriada,
            models::empresa::ExclusaoEmpresaReport,
            models::empresa::TabelaRemovida,
            models::empresa::CreateEmpresaPayload,
            models::empresa::CheckoutPayload,
            models::empresa::AddMemberPayload,
            models::empresa::SetPapelPayload,
            models::empresa::CreateEmpresaComAdminPayload,
            models::empresa::ResetMemberPasswordPayload,

            // --- Settings ---
            models::settings::ConfiguracoesEmpresa,
            models::settings::UpdateSettingsRequest,

            // --- Cadastros ---
            models::colaborador::Colaborador,
            models::colaborador::ColaboradorPayload,
            models::produto::Produto,
            models::produto::Etapa,
            models::produto::Subetapa,
            models::produto::EtapaComSubetapas,
            models::produto::MaterialDoProduto,
            models::produto::ProdutoPayload,
            models::produto::EtapaPayload,
            models::produto::MaterialDoProdutoPayload,
            models::material::Material,
            models::material::ConsumoMaterial,
            models::material::MaterialPayload,
            models::material::ConsumoPayload,

            // --- Lotes ---
            models::lote::LoteStatus,
            models::lote::Lote,
            models::lote::Producao,
            models::lote::ProgressoSubetapa,
            models::lote::ProgressoEtapa,
            models::lote::ConsumoAgregado,
            models::lote::DetalhesLote,
            models::lote::CreateLotePayload,
            models::lote::UpdateLotePayload,
            models::lote::RegistrarProducaoPayload,

            // --- Comercial ---
            models::comercial::Projecao,
            models::comercial::ProjecaoPayload,
            models::comercial::VendaPerdida,
            models::comercial::VendaPerdidaPayload,
            models::comercial::AgrupamentoVendaPerdida,
            models::comercial::ResumoVendasPerdidas,

            // --- Previsão ---
            models::previsao::PrevisaoProducao,
            models::previsao::PrevisaoEtapa,
            models::previsao::MaterialNecessario,
            models::previsao::DetalhamentoCustos,
            models::previsao::LinhaCustoMaterial,
            models::previsao::LinhaCustoEtapa,
            models::previsao::ResumoPrevisao,
            models::previsao::ItemResumoPrevisao,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,
            models::dashboard::ProductionChartEntry,
            models::dashboard::TopProductEntry,

            // --- Documentos e tempo real ---
            models::documento::Documento,
            models::realtime::ChangeEvent,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Empresas", description = "Empresas, membros e papéis"),
        (name = "Admin", description = "Provisionamento e exclusão de empresas"),
        (name = "Settings", description = "Configurações da Empresa"),
        (name = "Colaboradores", description = "Equipe e custo por hora"),
        (name = "Produtos", description = "Produtos, roteiro de etapas e ficha técnica"),
        (name = "Materiais", description = "Cadastro de materiais"),
        (name = "Lotes", description = "Lotes, apontamentos de produção e consumo"),
        (name = "Comercial", description = "Projeções de venda e vendas perdidas"),
        (name = "Previsão", description = "Previsão de prazo e custo"),
        (name = "Dashboard", description = "Indicadores e Gráficos Gerenciais"),
        (name = "Documentos", description = "Upload de arquivos e ficha do lote em PDF"),
        (name = "Realtime", description = "Alterações em tempo real via SSE")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
