// src/handlers/realtime.rs

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

use crate::{config::AppState, middleware::tenancy::TenantContext, models::realtime::ChangeEvent};

// GET /api/realtime
#[utoipa::path(
    get,
    path = "/api/realtime",
    tag = "Realtime",
    responses(
        (status = 200, description = "Fluxo SSE; o nome do evento é a tabela alterada", body = ChangeEvent, content_type = "text/event-stream")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Empresa")),
    security(("api_jwt" = []))
)]
pub async fn stream_alteracoes(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Termina junto com o hub, senão o desligamento gracioso espera para sempre.
    let stream = app_state
        .realtime
        .alteracoes_da_empresa(tenant.0)
        .filter_map(|event| {
            let sse = Event::default().event(event.tabela.clone()).json_data(&event).ok()?;
            Some(Ok(sse))
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
