// src/services/realtime.rs
//
// Repassa as notificações `alteracoes` do Postgres para os clientes SSE.

use std::time::Duration;

use sqlx::{postgres::PgListener, PgPool};
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::realtime::ChangeEvent;

pub const CANAL_ALTERACOES: &str = "alteracoes";

const CAPACIDADE_CANAL: usize = 256;
const ESPERA_RECONEXAO: Duration = Duration::from_secs(5);

/// Canal em memória das alterações. Clones compartilham o mesmo canal e o
/// mesmo token de desligamento.
#[derive(Clone)]
pub struct RealtimeHub {
    sender: broadcast::Sender<ChangeEvent>,
    shutdown: CancellationToken,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CAPACIDADE_CANAL);
        Self { sender, shutdown: CancellationToken::new() }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Publica um evento. Sem assinantes o evento é descartado.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Eventos de uma empresa até o desligamento do hub.
    pub fn alteracoes_da_empresa(&self, empresa_id: Uuid) -> impl Stream<Item = ChangeEvent> + Send + 'static + use<> {
        // Assinante atrasado (Lagged) só perde os eventos que ficaram para trás.
        let eventos = BroadcastStream::new(self.subscribe())
            .filter_map(move |result| result.ok().filter(|e| pertence_a(e, empresa_id)));
        futures::StreamExt::take_until(eventos, self.shutdown.clone().cancelled_owned())
    }

    /// Encerra o listener e todos os fluxos abertos.
    pub fn encerrar(&self) {
        self.shutdown.cancel();
    }

    /// Sobe a task que escuta o canal do banco até `encerrar` ser chamado.
    pub fn spawn_listener(&self, pool: PgPool) -> tokio::task::JoinHandle<()> {
        let hub = self.clone();
        tokio::spawn(async move { hub.run_listener(pool).await })
    }

    async fn run_listener(self, pool: PgPool) {
        let shutdown = self.shutdown.clone();
        'outer: loop {
            let mut listener = match connect_listener(&pool).await {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::warn!("Falha ao escutar '{}': {}", CANAL_ALTERACOES, e);
                    if wait_or_shutdown(&shutdown).await {
                        break 'outer;
                    }
                    continue;
                }
            };
            tracing::info!("Escutando notificações em '{}'", CANAL_ALTERACOES);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::info!("Encerrando listener de alterações");
                        break 'outer;
                    }
                    recebido = listener.recv() => match recebido {
                        Ok(notification) => match parse_payload(notification.payload()) {
                            Some(event) => {
                                tracing::debug!("{} em {} ({})", event.operacao, event.tabela, event.registro_id);
                                self.publish(event);
                            }
                            None => tracing::warn!("Payload de alteração inválido: {}", notification.payload()),
                        },
                        Err(e) => {
                            tracing::warn!("Erro no listener de alterações: {}", e);
                            if wait_or_shutdown(&shutdown).await {
                                break 'outer;
                            }
                            continue 'outer;
                        }
                    }
                }
            }
        }
    }
}

async fn connect_listener(pool: &PgPool) -> Result<PgListener, sqlx::Error> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(CANAL_ALTERACOES).await?;
    Ok(listener)
}

// `true` quando o desligamento chegou durante a espera.
async fn wait_or_shutdown(shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => true,
        _ = tokio::time::sleep(ESPERA_RECONEXAO) => false,
    }
}

pub fn parse_payload(payload: &str) -> Option<ChangeEvent> {
    serde_json::from_str(payload).ok()
}

pub fn pertence_a(event: &ChangeEvent, empresa_id: Uuid) -> bool {
    event.empresa_id == empresa_id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evento(empresa_id: Uuid) -> ChangeEvent {
        ChangeEvent {
            tabela: "lotes".into(),
            operacao: "INSERT".into(),
            empresa_id,
            registro_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn parses_trigger_payload() {
        let empresa = Uuid::new_v4();
        let registro = Uuid::new_v4();
        let raw = format!(
            r#"{{"tabela":"producoes","operacao":"DELETE","empresaId":"{}","registroId":"{}"}}"#,
            empresa, registro
        );

        let event = parse_payload(&raw).expect("payload válido");
        assert_eq!(event.tabela, "producoes");
        assert_eq!(event.operacao, "DELETE");
        assert_eq!(event.empresa_id, empresa);
        assert_eq!(event.registro_id, registro);
    }

    #[test]
    fn rejects_malformed_payload() {
        assert!(parse_payload("nao é json").is_none());
        assert!(parse_payload(r#"{"tabela":"lotes"}"#).is_none());
    }

    #[test]
    fn filters_by_empresa() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(pertence_a(&evento(a), a));
        assert!(!pertence_a(&evento(a), b));
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let hub = RealtimeHub::new();
        let mut rx = hub.subscribe();
        let event = evento(Uuid::new_v4());

        assert_eq!(hub.publish(event.clone()), 1);
        assert_eq!(rx.recv().await.expect("evento"), event);
    }

    #[test]
    fn publishing_without_subscribers_is_dropped() {
        let hub = RealtimeHub::new();
        assert_eq!(hub.publish(evento(Uuid::new_v4())), 0);
    }

    #[tokio::test]
    async fn listener_stops_on_shutdown() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(500))
            .connect_lazy("postgres://ninguem@127.0.0.1:1/nada")
            .expect("url válida");
        let hub = RealtimeHub::new();
        let handle = hub.spawn_listener(pool);

        hub.encerrar();
        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("listener encerrou")
            .expect("task sem pânico");
    }

    #[tokio::test]
    async fn company_stream_filters_and_ends_on_shutdown() {
        let hub = RealtimeHub::new();
        let minha = Uuid::new_v4();
        let mut stream = Box::pin(hub.alteracoes_da_empresa(minha));

        hub.publish(evento(Uuid::new_v4()));
        hub.publish(evento(minha));

        let recebido = stream.next().await.expect("evento da empresa");
        assert_eq!(recebido.empresa_id, minha);

        hub.encerrar();
        let fim = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("fluxo encerrou");
        assert!(fim.is_none());
    }
}
