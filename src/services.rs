pub mod admin_service;
pub mod auth;
pub mod dashboard_service;
pub mod document_service;
pub mod lote_service;
pub mod previsao_service;
pub mod realtime;
pub mod tenancy_service;
