pub mod auth;
pub mod colaborador;
pub mod comercial;
pub mod dashboard;
pub mod documento;
pub mod empresa;
pub mod lote;
pub mod material;
pub mod previsao;
pub mod produto;
pub mod realtime;
pub mod settings;
