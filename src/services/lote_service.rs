// src/services/lote_service.rs

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::{business_days::count_business_days, error::AppError},
    db::{ColaboradorRepository, LoteRepository, MaterialRepository, ProdutoRepository},
    models::{
        lote::{
            ConsumoAgregado, CreateLotePayload, DetalhesLote, Lote, LoteFiltro, LoteStatus,
            Producao, ProgressoEtapa, ProgressoSubetapa, RegistrarProducaoPayload,
            UpdateLotePayload,
        },
        material::{ConsumoMaterial, ConsumoPayload},
        produto::{Etapa, Subetapa},
    },
    services::previsao_service::{calcular_previsao, minutos_por_unidade, PrevisaoService},
};

#[derive(Clone)]
pub struct LoteService {
    lote_repo: LoteRepository,
    produto_repo: ProdutoRepository,
    material_repo: MaterialRepository,
    colaborador_repo: ColaboradorRepository,
    previsao_service: PrevisaoService,
}

impl LoteService {
    pub fn new(
        lote_repo: LoteRepository,
        produto_repo: ProdutoRepository,
        material_repo: MaterialRepository,
        colaborador_repo: ColaboradorRepository,
        previsao_service: PrevisaoService,
    ) -> Self {
        Self { lote_repo, produto_repo, material_repo, colaborador_repo, previsao_service }
    }

    // --- LOTES ---

    /// Cria o lote como PENDENTE. Sem `dataPrevista`, usa o término da previsão.
    pub async fn create_lote<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        input: &CreateLotePayload,
    ) -> Result<Lote, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let data_inicio = input.data_inicio.unwrap_or_else(|| Utc::now().date_naive());

        let data_prevista = match input.data_prevista {
            Some(data) => Some(data),
            None => {
                let base = self
                    .previsao_service
                    .carregar_base(&mut *tx, empresa_id, input.produto_id)
                    .await?;
                let equipe = self.previsao_service.carregar_equipe(&mut *tx, empresa_id).await?;
                let previsao = calcular_previsao(&base, input.quantidade, data_inicio, &equipe)?;
                // Produto sem roteiro não tem como prever.
                (previsao.dias_uteis > 0).then_some(previsao.data_termino_prevista)
            }
        };

        // Garante que o produto é desta empresa mesmo com data informada.
        self.produto_repo.get(&mut *tx, empresa_id, input.produto_id).await?;

        let lote = self
            .lote_repo
            .create(
                &mut *tx,
                empresa_id,
                input.produto_id,
                input.codigo.trim(),
                input.quantidade,
                data_inicio,
                data_prevista,
                input.observacoes.as_deref(),
            )
            .await?;

        tx.commit().await?;

        tracing::info!("Lote {} criado ({} un.)", lote.codigo, lote.quantidade);
        Ok(lote)
    }

    pub async fn list_lotes<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        filtro: &LoteFiltro,
    ) -> Result<Vec<Lote>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.lote_repo.list(executor, empresa_id, filtro).await
    }

    pub async fn get_lote<'e, E>(&self, executor: E, empresa_id: Uuid, id: Uuid) -> Result<Lote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.lote_repo.get(executor, empresa_id, id).await
    }

    /// Atualiza observações, data prevista e status. Lote encerrado não muda de status.
    pub async fn update_lote<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        id: Uuid,
        input: &UpdateLotePayload,
    ) -> Result<Lote, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let atual = self.lote_repo.get_for_update(&mut *tx, empresa_id, id).await?;

        let status = input.status.unwrap_or(atual.status);
        validar_transicao(&atual.codigo, atual.status, status)?;

        let data_conclusao = match status {
            LoteStatus::Concluido => atual
                .data_conclusao
                .or_else(|| Some(Utc::now().date_naive())),
            _ => None,
        };

        let lote = self
            .lote_repo
            .update(
                &mut *tx,
                empresa_id,
                id,
                status,
                input.data_prevista.or(atual.data_prevista),
                data_conclusao,
                input.observacoes.as_deref().or(atual.observacoes.as_deref()),
            )
            .await?;

        tx.commit().await?;

        if lote.status != atual.status {
            tracing::info!("Lote {}: {:?} -> {:?}", lote.codigo, atual.status, lote.status);
        }
        Ok(lote)
    }

    pub async fn delete_lote<'e, E>(&self, executor: E, empresa_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.lote_repo.delete(executor, empresa_id, id).await
    }

    // --- PRODUÇÕES ---

    /// Registra um apontamento e recalcula o status do lote na mesma transação.
    pub async fn registrar_producao<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        lote_id: Uuid,
        input: &RegistrarProducaoPayload,
    ) -> Result<Producao, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // Trava o lote: apontamentos concorrentes no mesmo lote entram em fila.
        let lote = self.lote_repo.get_for_update(&mut *tx, empresa_id, lote_id).await?;
        validar_apontamento(&lote.codigo, lote.status)?;

        let etapa = self.produto_repo.get_etapa(&mut *tx, empresa_id, input.etapa_id).await?;
        if etapa.produto_id != lote.produto_id {
            return Err(AppError::BusinessRule(
                "a etapa não pertence ao produto do lote".into(),
            ));
        }

        let etapas = self
            .produto_repo
            .list_etapas(&mut *tx, empresa_id, lote.produto_id)
            .await?;
        let subetapas = self
            .produto_repo
            .list_subetapas_do_produto(&mut *tx, empresa_id, lote.produto_id)
            .await?;

        if let Some(subetapa_id) = input.subetapa_id {
            if !subetapas.iter().any(|s| s.id == subetapa_id && s.etapa_id == etapa.id) {
                return Err(AppError::BusinessRule(
                    "a subetapa não pertence à etapa informada".into(),
                ));
            }
        }

        if let Some(colaborador_id) = input.colaborador_id {
            self.colaborador_repo.get(&mut *tx, empresa_id, colaborador_id).await?;
        }

        let hoje = Utc::now().date_naive();
        let producao = self
            .lote_repo
            .insert_producao(&mut *tx, empresa_id, lote_id, input, input.data.unwrap_or(hoje))
            .await?;

        let producoes = self.lote_repo.list_producoes(&mut *tx, empresa_id, lote_id).await?;
        let progresso = agregar_progresso(lote.quantidade, &etapas, &subetapas, &producoes);
        let novo_status = proximo_status(lote.status, &progresso, lote.quantidade);

        if novo_status != lote.status {
            let data_conclusao = (novo_status == LoteStatus::Concluido).then_some(hoje);
            self.lote_repo
                .set_status(&mut *tx, empresa_id, lote_id, novo_status, data_conclusao)
                .await?;
            tracing::info!("Lote {}: {:?} -> {:?}", lote.codigo, lote.status, novo_status);
        }

        tx.commit().await?;
        Ok(producao)
    }

    pub async fn list_producoes(
        &self,
        conn: &mut PgConnection,
        empresa_id: Uuid,
        lote_id: Uuid,
    ) -> Result<Vec<Producao>, AppError> {
        // 404 para lote inexistente, em vez de lista vazia.
        self.lote_repo.get(&mut *conn, empresa_id, lote_id).await?;
        self.lote_repo.list_producoes(&mut *conn, empresa_id, lote_id).await
    }

    pub async fn delete_producao<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        lote_id: Uuid,
        producao_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let lote = self.lote_repo.get_for_update(&mut *tx, empresa_id, lote_id).await?;
        if lote.status.is_closed() {
            return Err(AppError::BusinessRule(format!(
                "lote {} encerrado não permite excluir apontamentos",
                lote.codigo
            )));
        }
        self.lote_repo
            .delete_producao(&mut *tx, empresa_id, lote_id, producao_id)
            .await?;

        let restantes = self.lote_repo.list_producoes(&mut *tx, empresa_id, lote_id).await?;
        let novo_status = status_apos_exclusao(lote.status, restantes.len());
        if novo_status != lote.status {
            self.lote_repo
                .set_status(&mut *tx, empresa_id, lote_id, novo_status, None)
                .await?;
            tracing::info!("Lote {}: {:?} -> {:?}", lote.codigo, lote.status, novo_status);
        }

        tx.commit().await?;
        Ok(())
    }

    // --- CONSUMO DE MATERIAL ---

    pub async fn registrar_consumo<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        lote_id: Uuid,
        input: &ConsumoPayload,
    ) -> Result<ConsumoMaterial, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let lote = self.lote_repo.get_for_update(&mut *tx, empresa_id, lote_id).await?;
        if lote.status == LoteStatus::Cancelado {
            return Err(AppError::BusinessRule(format!("lote {} cancelado", lote.codigo)));
        }
        self.material_repo.get(&mut *tx, empresa_id, input.material_id).await?;

        let data = input.data.unwrap_or_else(|| Utc::now().date_naive());
        let consumo = self
            .material_repo
            .registrar_consumo(&mut *tx, empresa_id, lote_id, input, data)
            .await?;

        tx.commit().await?;
        Ok(consumo)
    }

    pub async fn list_consumos(
        &self,
        conn: &mut PgConnection,
        empresa_id: Uuid,
        lote_id: Uuid,
    ) -> Result<Vec<ConsumoMaterial>, AppError> {
        self.lote_repo.get(&mut *conn, empresa_id, lote_id).await?;
        self.material_repo.list_consumos(&mut *conn, empresa_id, lote_id).await
    }

    pub async fn delete_consumo<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        lote_id: Uuid,
        consumo_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.material_repo
            .delete_consumo(executor, empresa_id, lote_id, consumo_id)
            .await
    }

    // --- DETALHES ---

    pub async fn detalhes_lote<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        lote_id: Uuid,
    ) -> Result<DetalhesLote, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        // Leitura consistente de todas as partes.
        let mut tx = executor.begin().await?;

        let lote = self.lote_repo.get(&mut *tx, empresa_id, lote_id).await?;
        let produto = self.produto_repo.get(&mut *tx, empresa_id, lote.produto_id).await?;
        let etapas = self
            .produto_repo
            .list_etapas(&mut *tx, empresa_id, lote.produto_id)
            .await?;
        let subetapas = self
            .produto_repo
            .list_subetapas_do_produto(&mut *tx, empresa_id, lote.produto_id)
            .await?;
        let producoes = self.lote_repo.list_producoes(&mut *tx, empresa_id, lote_id).await?;
        let consumos = self.material_repo.list_consumos(&mut *tx, empresa_id, lote_id).await?;

        tx.commit().await?;

        Ok(montar_detalhes(
            lote,
            produto.nome,
            &etapas,
            &subetapas,
            &producoes,
            &consumos,
            Utc::now().date_naive(),
        ))
    }
}

// ---
// Agregação do progresso (funções puras)
// ---

#[derive(Default)]
struct Soma {
    quantidade: i64,
    tempo: Decimal,
    registros: usize,
}

impl Soma {
    fn add(&mut self, p: &Producao) {
        self.quantidade += i64::from(p.quantidade);
        self.tempo += p.tempo_gasto_min;
        self.registros += 1;
    }
}

fn percentual_etapa(produzido: i64, quantidade_lote: i32) -> Decimal {
    if quantidade_lote <= 0 {
        return Decimal::ZERO;
    }
    let pct = Decimal::from(produzido) / Decimal::from(quantidade_lote) * Decimal::ONE_HUNDRED;
    pct.min(Decimal::ONE_HUNDRED).round_dp(2)
}

/// Agrupa os apontamentos por etapa e subetapa.
///
/// Apontamentos sem subetapa contam direto na etapa. Numa etapa com
/// subetapas, uma unidade só conta quando passou por todas elas, então a
/// etapa soma o menor total entre as subetapas.
pub fn agregar_progresso(
    quantidade_lote: i32,
    etapas: &[Etapa],
    subetapas: &[Subetapa],
    producoes: &[Producao],
) -> Vec<ProgressoEtapa> {
    let mut por_etapa: HashMap<Uuid, Soma> = HashMap::new();
    let mut por_subetapa: HashMap<Uuid, Soma> = HashMap::new();

    for p in producoes {
        match p.subetapa_id {
            Some(sub) => por_subetapa.entry(sub).or_default().add(p),
            None => por_etapa.entry(p.etapa_id).or_default().add(p),
        }
    }

    let mut etapas: Vec<&Etapa> = etapas.iter().collect();
    etapas.sort_by_key(|e| e.ordem);

    etapas
        .into_iter()
        .map(|etapa| {
            let mut subs: Vec<&Subetapa> =
                subetapas.iter().filter(|s| s.etapa_id == etapa.id).collect();
            subs.sort_by_key(|s| s.ordem);

            let progresso_subs: Vec<ProgressoSubetapa> = subs
                .iter()
                .map(|s| {
                    let soma = por_subetapa.get(&s.id);
                    ProgressoSubetapa {
                        subetapa_id: s.id,
                        nome: s.nome.clone(),
                        quantidade_produzida: soma.map_or(0, |x| x.quantidade),
                        tempo_gasto_min: soma.map_or(Decimal::ZERO, |x| x.tempo),
                        registros: soma.map_or(0, |x| x.registros),
                    }
                })
                .collect();

            let direto = por_etapa.get(&etapa.id);
            let via_subetapas = progresso_subs
                .iter()
                .map(|s| s.quantidade_produzida)
                .min()
                .unwrap_or(0);

            let quantidade_produzida = direto.map_or(0, |x| x.quantidade) + via_subetapas;
            let tempo_gasto_min = direto.map_or(Decimal::ZERO, |x| x.tempo)
                + progresso_subs.iter().map(|s| s.tempo_gasto_min).sum::<Decimal>();
            let registros = direto.map_or(0, |x| x.registros)
                + progresso_subs.iter().map(|s| s.registros).sum::<usize>();

            let por_unidade = minutos_por_unidade(etapa, subetapas);

            ProgressoEtapa {
                etapa_id: etapa.id,
                nome: etapa.nome.clone(),
                ordem: etapa.ordem,
                quantidade_produzida,
                tempo_gasto_min,
                tempo_previsto_min: por_unidade * Decimal::from(quantidade_lote),
                registros,
                percentual: percentual_etapa(quantidade_produzida, quantidade_lote),
                subetapas: progresso_subs,
            }
        })
        .collect()
}

/// Média dos percentuais de todas as etapas; produto sem etapas fica em 0.
pub fn percentual_geral(etapas: &[ProgressoEtapa]) -> Decimal {
    if etapas.is_empty() {
        return Decimal::ZERO;
    }
    let soma: Decimal = etapas.iter().map(|e| e.percentual).sum();
    (soma / Decimal::from(etapas.len())).round_dp(2)
}

/// Toda etapa atingiu a quantidade do lote.
fn lote_completo(etapas: &[ProgressoEtapa], quantidade_lote: i32) -> bool {
    !etapas.is_empty()
        && etapas
            .iter()
            .all(|e| e.quantidade_produzida >= i64::from(quantidade_lote))
}

/// Mudança manual de status: lote encerrado não sai do status em que está.
pub fn validar_transicao(codigo: &str, atual: LoteStatus, novo: LoteStatus) -> Result<(), AppError> {
    if novo != atual && atual.is_closed() {
        return Err(AppError::BusinessRule(format!("lote {} já está encerrado", codigo)));
    }
    Ok(())
}

pub fn validar_apontamento(codigo: &str, status: LoteStatus) -> Result<(), AppError> {
    if status.is_closed() {
        return Err(AppError::BusinessRule(format!(
            "lote {} encerrado não aceita apontamentos",
            codigo
        )));
    }
    Ok(())
}

/// Sem nenhum apontamento restante o lote volta a `PENDENTE`.
pub fn status_apos_exclusao(atual: LoteStatus, apontamentos_restantes: usize) -> LoteStatus {
    if atual == LoteStatus::EmProducao && apontamentos_restantes == 0 {
        LoteStatus::Pendente
    } else {
        atual
    }
}

pub fn proximo_status(
    atual: LoteStatus,
    etapas: &[ProgressoEtapa],
    quantidade_lote: i32,
) -> LoteStatus {
    if atual.is_closed() {
        return atual;
    }
    if lote_completo(etapas, quantidade_lote) {
        return LoteStatus::Concluido;
    }
    if atual == LoteStatus::Pendente && etapas.iter().any(|e| e.registros > 0) {
        return LoteStatus::EmProducao;
    }
    atual
}

fn agregar_consumos(consumos: &[ConsumoMaterial]) -> Vec<ConsumoAgregado> {
    let mut ordem: Vec<Uuid> = Vec::new();
    let mut por_material: HashMap<Uuid, ConsumoAgregado> = HashMap::new();

    for c in consumos {
        let entry = por_material.entry(c.material_id).or_insert_with(|| {
            ordem.push(c.material_id);
            ConsumoAgregado {
                material_id: c.material_id,
                material_nome: c.material_nome.clone(),
                unidade: c.unidade.clone(),
                quantidade: Decimal::ZERO,
                custo_total: Decimal::ZERO,
            }
        });
        entry.quantidade += c.quantidade;
        entry.custo_total += c.quantidade * c.custo_unitario;
    }

    ordem
        .into_iter()
        .filter_map(|id| por_material.remove(&id))
        .map(|mut c| {
            c.custo_total = c.custo_total.round_dp(2);
            c
        })
        .collect()
}

pub fn montar_detalhes(
    lote: Lote,
    produto_nome: String,
    etapas: &[Etapa],
    subetapas: &[Subetapa],
    producoes: &[Producao],
    consumos: &[ConsumoMaterial],
    hoje: NaiveDate,
) -> DetalhesLote {
    let progresso = agregar_progresso(lote.quantidade, etapas, subetapas, producoes);

    let tempo_gasto_min: Decimal = progresso.iter().map(|e| e.tempo_gasto_min).sum();
    let tempo_previsto_min: Decimal = progresso.iter().map(|e| e.tempo_previsto_min).sum();

    // Tempo que o que já foi feito deveria ter levado.
    let previsto_do_produzido: Decimal = etapas
        .iter()
        .filter_map(|etapa| {
            let feito = progresso.iter().find(|p| p.etapa_id == etapa.id)?;
            Some(minutos_por_unidade(etapa, subetapas) * Decimal::from(feito.quantidade_produzida))
        })
        .sum();

    let eficiencia = if tempo_gasto_min > Decimal::ZERO {
        Some((previsto_do_produzido / tempo_gasto_min).round_dp(2))
    } else {
        None
    };

    let consumos = agregar_consumos(consumos);
    let custo_materiais = consumos.iter().map(|c| c.custo_total).sum();

    // Conta o dia de início e o dia final.
    let fim = lote.data_conclusao.unwrap_or(hoje);
    let dias_uteis_decorridos = count_business_days(lote.data_inicio, fim + Duration::days(1));

    let atrasado = !lote.status.is_closed() && lote.data_prevista.is_some_and(|d| d < hoje);

    DetalhesLote {
        percentual_geral: percentual_geral(&progresso),
        produto_nome,
        etapas: progresso,
        tempo_gasto_min,
        tempo_previsto_min,
        eficiencia,
        consumos,
        custo_materiais,
        dias_uteis_decorridos,
        atrasado,
        lote,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn etapa(nome: &str, ordem: i32, minutos: &str) -> Etapa {
        Etapa {
            id: Uuid::new_v4(),
            empresa_id: Uuid::nil(),
            produto_id: Uuid::nil(),
            nome: nome.into(),
            ordem,
            tempo_por_unidade_min: dec(minutos),
            created_at: Utc::now(),
        }
    }

    fn subetapa(etapa: &Etapa, nome: &str, ordem: i32) -> Subetapa {
        Subetapa {
            id: Uuid::new_v4(),
            empresa_id: Uuid::nil(),
            etapa_id: etapa.id,
            nome: nome.into(),
            ordem,
            tempo_por_unidade_min: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    fn producao(etapa_id: Uuid, subetapa_id: Option<Uuid>, quantidade: i32, minutos: &str) -> Producao {
        Producao {
            id: Uuid::new_v4(),
            empresa_id: Uuid::nil(),
            lote_id: Uuid::nil(),
            etapa_id,
            subetapa_id,
            colaborador_id: None,
            quantidade,
            tempo_gasto_min: dec(minutos),
            data: d(2025, 3, 3),
            observacoes: None,
            created_at: Utc::now(),
        }
    }

    fn lote(quantidade: i32, status: LoteStatus) -> Lote {
        Lote {
            id: Uuid::new_v4(),
            empresa_id: Uuid::nil(),
            produto_id: Uuid::nil(),
            codigo: "L-001".into(),
            quantidade,
            status,
            data_inicio: d(2025, 3, 3),
            data_prevista: Some(d(2025, 3, 7)),
            data_conclusao: None,
            observacoes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn consumo(material_id: Uuid, nome: &str, quantidade: &str, custo: &str) -> ConsumoMaterial {
        ConsumoMaterial {
            id: Uuid::new_v4(),
            lote_id: Uuid::nil(),
            material_id,
            material_nome: nome.into(),
            unidade: "m".into(),
            custo_unitario: dec(custo),
            quantidade: dec(quantidade),
            data: d(2025, 3, 3),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn groups_records_by_stage_in_route_order() {
        let corte = etapa("Corte", 1, "10");
        let solda = etapa("Solda", 2, "20");
        // Fora de ordem de propósito.
        let etapas = vec![solda.clone(), corte.clone()];
        let producoes = vec![
            producao(corte.id, None, 30, "300"),
            producao(corte.id, None, 20, "150"),
            producao(solda.id, None, 10, "200"),
        ];

        let progresso = agregar_progresso(100, &etapas, &[], &producoes);

        assert_eq!(progresso[0].nome, "Corte");
        assert_eq!(progresso[0].quantidade_produzida, 50);
        assert_eq!(progresso[0].tempo_gasto_min, dec("450"));
        assert_eq!(progresso[0].registros, 2);
        assert_eq!(progresso[0].percentual, dec("50"));
        assert_eq!(progresso[0].tempo_previsto_min, dec("1000"));
        assert_eq!(progresso[1].percentual, dec("10"));
    }

    #[test]
    fn stage_percent_is_capped_at_100() {
        let corte = etapa("Corte", 1, "10");
        let producoes = vec![producao(corte.id, None, 150, "10")];

        let progresso = agregar_progresso(100, &[corte], &[], &producoes);
        assert_eq!(progresso[0].quantidade_produzida, 150);
        assert_eq!(progresso[0].percentual, dec("100"));
    }

    #[test]
    fn stage_with_substages_counts_the_slowest_substage() {
        let pintura = etapa("Pintura", 1, "5");
        let lixar = subetapa(&pintura, "Lixar", 1);
        let pintar = subetapa(&pintura, "Pintar", 2);
        let producoes = vec![
            producao(pintura.id, Some(lixar.id), 40, "40"),
            producao(pintura.id, Some(pintar.id), 25, "50"),
        ];

        let progresso =
            agregar_progresso(50, &[pintura], &[lixar.clone(), pintar.clone()], &producoes);

        let p = &progresso[0];
        assert_eq!(p.subetapas.len(), 2);
        assert_eq!(p.subetapas[0].quantidade_produzida, 40);
        assert_eq!(p.subetapas[1].quantidade_produzida, 25);
        assert_eq!(p.quantidade_produzida, 25);
        assert_eq!(p.tempo_gasto_min, dec("90"));
        assert_eq!(p.registros, 2);
        assert_eq!(p.percentual, dec("50"));
    }

    #[test]
    fn overall_percent_is_the_mean_over_all_stages() {
        let corte = etapa("Corte", 1, "10");
        let solda = etapa("Solda", 2, "10");
        let pintura = etapa("Pintura", 3, "10");
        // Só o corte foi feito por inteiro; as outras etapas contam 0.
        let producoes = vec![producao(corte.id, None, 10, "100")];

        let progresso = agregar_progresso(10, &[corte, solda, pintura], &[], &producoes);
        assert_eq!(percentual_geral(&progresso), dec("33.33"));
        assert_eq!(percentual_geral(&[]), Decimal::ZERO);
    }

    #[test]
    fn status_moves_forward_with_production() {
        let corte = etapa("Corte", 1, "10");
        let solda = etapa("Solda", 2, "10");
        let etapas = vec![corte.clone(), solda.clone()];

        let parcial = agregar_progresso(
            10,
            &etapas,
            &[],
            &[producao(corte.id, None, 10, "1")],
        );
        assert_eq!(proximo_status(LoteStatus::Pendente, &parcial, 10), LoteStatus::EmProducao);
        assert_eq!(proximo_status(LoteStatus::EmProducao, &parcial, 10), LoteStatus::EmProducao);

        let completo = agregar_progresso(
            10,
            &etapas,
            &[],
            &[producao(corte.id, None, 10, "1"), producao(solda.id, None, 10, "1")],
        );
        assert_eq!(proximo_status(LoteStatus::EmProducao, &completo, 10), LoteStatus::Concluido);
        // Tudo no primeiro apontamento: vai direto para concluído.
        assert_eq!(proximo_status(LoteStatus::Pendente, &completo, 10), LoteStatus::Concluido);
    }

    #[test]
    fn closed_lots_keep_their_status() {
        let corte = etapa("Corte", 1, "10");
        let completo = agregar_progresso(5, &[corte.clone()], &[], &[producao(corte.id, None, 5, "1")]);

        assert_eq!(proximo_status(LoteStatus::Cancelado, &completo, 5), LoteStatus::Cancelado);
        assert_eq!(proximo_status(LoteStatus::Concluido, &completo, 5), LoteStatus::Concluido);
    }

    #[test]
    fn product_without_stages_never_completes() {
        assert_eq!(proximo_status(LoteStatus::Pendente, &[], 10), LoteStatus::Pendente);
    }

    #[test]
    fn details_efficiency_consumption_and_delay() {
        let corte = etapa("Corte", 1, "10");
        let solda = etapa("Solda", 2, "20");
        let producoes = vec![
            // 10 un. de corte deveriam levar 100 min; levaram 125.
            producao(corte.id, None, 10, "125"),
        ];
        let tubo = Uuid::new_v4();
        let tinta = Uuid::new_v4();
        let consumos = vec![
            consumo(tubo, "Tubo", "3", "5.00"),
            consumo(tinta, "Tinta", "0.5", "8.00"),
            consumo(tubo, "Tubo", "2", "5.00"),
        ];

        // Segunda a quarta da semana seguinte ao prazo.
        let detalhes = montar_detalhes(
            lote(20, LoteStatus::EmProducao),
            "Cadeira".into(),
            &[corte, solda],
            &[],
            &producoes,
            &consumos,
            d(2025, 3, 12),
        );

        assert_eq!(detalhes.produto_nome, "Cadeira");
        assert_eq!(detalhes.percentual_geral, dec("25"));
        assert_eq!(detalhes.tempo_gasto_min, dec("125"));
        assert_eq!(detalhes.tempo_previsto_min, dec("600"));
        assert_eq!(detalhes.eficiencia, Some(dec("0.8")));

        assert_eq!(detalhes.consumos.len(), 2);
        assert_eq!(detalhes.consumos[0].material_nome, "Tubo");
        assert_eq!(detalhes.consumos[0].quantidade, dec("5"));
        assert_eq!(detalhes.consumos[0].custo_total, dec("25"));
        assert_eq!(detalhes.consumos[1].custo_total, dec("4"));
        assert_eq!(detalhes.custo_materiais, dec("29"));

        // 03/03 (seg) a 12/03 (qua), inclusive: 8 dias úteis.
        assert_eq!(detalhes.dias_uteis_decorridos, 8);
        assert!(detalhes.atrasado);
    }

    #[test]
    fn details_without_records_have_no_efficiency() {
        let corte = etapa("Corte", 1, "10");
        let detalhes = montar_detalhes(
            lote(10, LoteStatus::Pendente),
            "Mesa".into(),
            &[corte],
            &[],
            &[],
            &[],
            d(2025, 3, 3),
        );

        assert_eq!(detalhes.eficiencia, None);
        assert_eq!(detalhes.percentual_geral, Decimal::ZERO);
        assert_eq!(detalhes.dias_uteis_decorridos, 1);
        assert!(!detalhes.atrasado);
    }

    #[test]
    fn concluded_lot_is_never_late_and_stops_counting_days() {
        let mut concluido = lote(10, LoteStatus::Concluido);
        concluido.data_conclusao = Some(d(2025, 3, 10));

        let detalhes = montar_detalhes(concluido, "Mesa".into(), &[], &[], &[], &[], d(2025, 3, 20));

        assert!(!detalhes.atrasado);
        // 03/03 a 10/03 inclusive: 6 dias úteis.
        assert_eq!(detalhes.dias_uteis_decorridos, 6);
    }

    #[test]
    fn closed_lots_reject_manual_status_changes() {
        assert!(validar_transicao("L-1", LoteStatus::Pendente, LoteStatus::Cancelado).is_ok());
        assert!(validar_transicao("L-1", LoteStatus::EmProducao, LoteStatus::Concluido).is_ok());
        // Reenviar o mesmo status não é mudança.
        assert!(validar_transicao("L-1", LoteStatus::Concluido, LoteStatus::Concluido).is_ok());

        let erro = validar_transicao("L-1", LoteStatus::Concluido, LoteStatus::EmProducao);
        assert!(matches!(erro, Err(AppError::BusinessRule(msg)) if msg.contains("L-1")));
        assert!(validar_transicao("L-1", LoteStatus::Cancelado, LoteStatus::Pendente).is_err());
    }

    #[test]
    fn closed_lots_reject_new_records() {
        assert!(validar_apontamento("L-2", LoteStatus::Pendente).is_ok());
        assert!(validar_apontamento("L-2", LoteStatus::EmProducao).is_ok());
        assert!(matches!(
            validar_apontamento("L-2", LoteStatus::Concluido),
            Err(AppError::BusinessRule(_))
        ));
        assert!(validar_apontamento("L-2", LoteStatus::Cancelado).is_err());
    }

    #[test]
    fn deleting_the_last_record_returns_the_lot_to_pending() {
        assert_eq!(status_apos_exclusao(LoteStatus::EmProducao, 0), LoteStatus::Pendente);
        assert_eq!(status_apos_exclusao(LoteStatus::EmProducao, 3), LoteStatus::EmProducao);
        assert_eq!(status_apos_exclusao(LoteStatus::Pendente, 0), LoteStatus::Pendente);
    }
}
