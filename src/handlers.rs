pub mod admin;
pub mod auth;
pub mod colaboradores;
pub mod comercial;
pub mod dashboard;
pub mod documents;
pub mod lotes;
pub mod materiais;
pub mod previsao;
pub mod produtos;
pub mod realtime;
pub mod settings;
pub mod tenancy;
