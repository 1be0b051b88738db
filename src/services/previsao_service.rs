// src/services/previsao_service.rs
//
// Previsão de produção e custos. Os cálculos são funções puras; o serviço
// só carrega os dados do produto, da equipe e da configuração.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::{
        business_days::{add_business_days, business_days_in_month, first_day_of_month, next_business_day},
        error::AppError,
    },
    db::{ColaboradorRepository, ComercialRepository, ProdutoRepository, SettingsRepository},
    models::{
        previsao::{
            DetalhamentoCustos, ItemResumoPrevisao, LinhaCustoEtapa, LinhaCustoMaterial,
            MaterialNecessario, PrevisaoEtapa, PrevisaoProducao, ResumoPrevisao,
        },
        produto::{Etapa, MaterialDoProduto, Produto, Subetapa},
    },
};

const MINUTOS_POR_HORA: Decimal = Decimal::from_parts(60, 0, 0, false, 0);

/// Tudo o que os cálculos precisam saber de um produto.
#[derive(Debug, Clone)]
pub struct BaseProduto {
    pub produto: Produto,
    pub etapas: Vec<Etapa>,
    pub subetapas: Vec<Subetapa>,
    pub materiais: Vec<MaterialDoProduto>,
}

/// Capacidade e custo da mão de obra da empresa.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equipe {
    pub colaboradores: i64,
    pub horas_por_dia: Decimal,
    pub custo_hora: Decimal,
}

#[derive(Clone)]
pub struct PrevisaoService {
    produto_repo: ProdutoRepository,
    colaborador_repo: ColaboradorRepository,
    settings_repo: SettingsRepository,
    comercial_repo: ComercialRepository,
}

impl PrevisaoService {
    pub fn new(
        produto_repo: ProdutoRepository,
        colaborador_repo: ColaboradorRepository,
        settings_repo: SettingsRepository,
        comercial_repo: ComercialRepository,
    ) -> Self {
        Self { produto_repo, colaborador_repo, settings_repo, comercial_repo }
    }

    pub async fn carregar_base(
        &self,
        conn: &mut PgConnection,
        empresa_id: Uuid,
        produto_id: Uuid,
    ) -> Result<BaseProduto, AppError> {
        let produto = self.produto_repo.get(&mut *conn, empresa_id, produto_id).await?;
        let etapas = self.produto_repo.list_etapas(&mut *conn, empresa_id, produto_id).await?;
        let subetapas = self
            .produto_repo
            .list_subetapas_do_produto(&mut *conn, empresa_id, produto_id)
            .await?;
        let materiais = self
            .produto_repo
            .list_materiais(&mut *conn, empresa_id, produto_id)
            .await?;

        Ok(BaseProduto { produto, etapas, subetapas, materiais })
    }

    /// Colaboradores ativos, jornada e custo/hora (média dos ativos com custo,
    /// ou o custo padrão da configuração).
    pub async fn carregar_equipe(
        &self,
        conn: &mut PgConnection,
        empresa_id: Uuid,
    ) -> Result<Equipe, AppError> {
        let settings = self.settings_repo.get_settings(&mut *conn, empresa_id).await?;
        let (colaboradores, media_custo) =
            self.colaborador_repo.equipe_ativa(&mut *conn, empresa_id).await?;

        let custo_hora = media_custo
            .filter(|c| *c > Decimal::ZERO)
            .unwrap_or(settings.custo_hora_padrao);

        Ok(Equipe { colaboradores, horas_por_dia: settings.horas_por_dia, custo_hora })
    }

    pub async fn calcular(
        &self,
        conn: &mut PgConnection,
        empresa_id: Uuid,
        produto_id: Uuid,
        quantidade: i32,
        data_inicio: Option<NaiveDate>,
        colaboradores: Option<i64>,
    ) -> Result<PrevisaoProducao, AppError> {
        if quantidade < 0 {
            return Err(AppError::BusinessRule("quantidade negativa".into()));
        }

        let base = self.carregar_base(&mut *conn, empresa_id, produto_id).await?;
        let mut equipe = self.carregar_equipe(&mut *conn, empresa_id).await?;
        if let Some(n) = colaboradores {
            equipe.colaboradores = n;
        }

        let inicio = data_inicio.unwrap_or_else(|| Utc::now().date_naive());
        calcular_previsao(&base, quantidade, inicio, &equipe)
    }

    pub async fn detalhamento(
        &self,
        conn: &mut PgConnection,
        empresa_id: Uuid,
        produto_id: Uuid,
    ) -> Result<DetalhamentoCustos, AppError> {
        let base = self.carregar_base(&mut *conn, empresa_id, produto_id).await?;
        let equipe = self.carregar_equipe(&mut *conn, empresa_id).await?;
        Ok(detalhamento_custos(&base, equipe.custo_hora))
    }

    pub async fn resumo(
        &self,
        conn: &mut PgConnection,
        empresa_id: Uuid,
        mes: NaiveDate,
    ) -> Result<ResumoPrevisao, AppError> {
        let mes = first_day_of_month(mes);
        let equipe = self.carregar_equipe(&mut *conn, empresa_id).await?;
        let projecoes = self
            .comercial_repo
            .list_projecoes(&mut *conn, empresa_id, Some(mes))
            .await?;

        let mut bases: HashMap<Uuid, BaseProduto> = HashMap::new();
        let mut itens = Vec::with_capacity(projecoes.len());

        for projecao in projecoes {
            if !bases.contains_key(&projecao.produto_id) {
                let base = self
                    .carregar_base(&mut *conn, empresa_id, projecao.produto_id)
                    .await?;
                bases.insert(projecao.produto_id, base);
            }
            let Some(base) = bases.get(&projecao.produto_id) else {
                continue;
            };

            let previsao = calcular_previsao(base, projecao.quantidade, mes, &equipe)?;
            itens.push(ItemResumoPrevisao {
                projecao_id: projecao.id,
                produto_id: projecao.produto_id,
                produto_nome: base.produto.nome.clone(),
                quantidade: projecao.quantidade,
                horas: previsao.horas_totais,
                custo_total: previsao.custo_total,
                receita: previsao.receita,
            });
        }

        Ok(resumo_previsao(mes, itens, equipe.horas_por_dia, equipe.colaboradores))
    }
}

// ---
// Cálculos
// ---

pub(crate) fn minutos_por_unidade(etapa: &Etapa, subetapas: &[Subetapa]) -> Decimal {
    etapa.tempo_por_unidade_min
        + subetapas
            .iter()
            .filter(|s| s.etapa_id == etapa.id)
            .map(|s| s.tempo_por_unidade_min)
            .sum::<Decimal>()
}

fn custo_material_unitario(materiais: &[MaterialDoProduto]) -> Decimal {
    materiais
        .iter()
        .map(|m| m.quantidade_por_unidade * m.custo_unitario)
        .sum()
}

fn percentual(parte: Decimal, todo: Decimal) -> Option<Decimal> {
    if todo.is_zero() {
        None
    } else {
        Some((parte / todo * Decimal::ONE_HUNDRED).round_dp(2))
    }
}

/// Dias úteis para cumprir `horas` com a equipe trabalhando `horas_por_dia_equipe`.
fn dias_necessarios(horas: Decimal, horas_por_dia_equipe: Decimal) -> i64 {
    if horas <= Decimal::ZERO || horas_por_dia_equipe <= Decimal::ZERO {
        return 0;
    }
    (horas / horas_por_dia_equipe).ceil().to_i64().unwrap_or(i64::MAX)
}

/// Início no próximo dia útil; o término é o último dia útil de trabalho.
/// `None` quando o prazo não cabe no calendário.
fn data_termino(inicio: NaiveDate, dias_uteis: i64) -> Option<NaiveDate> {
    if dias_uteis <= 1 {
        return Some(inicio);
    }
    let extra = u32::try_from(dias_uteis - 1).ok()?;
    add_business_days(inicio, extra)
}

pub fn calcular_previsao(
    base: &BaseProduto,
    quantidade: i32,
    data_inicio: NaiveDate,
    equipe: &Equipe,
) -> Result<PrevisaoProducao, AppError> {
    let qtd = Decimal::from(quantidade);

    let etapas: Vec<PrevisaoEtapa> = base
        .etapas
        .iter()
        .map(|etapa| {
            let por_unidade = minutos_por_unidade(etapa, &base.subetapas);
            PrevisaoEtapa {
                etapa_id: etapa.id,
                nome: etapa.nome.clone(),
                ordem: etapa.ordem,
                minutos_por_unidade: por_unidade,
                minutos_totais: por_unidade * qtd,
            }
        })
        .collect();

    let minutos_unidade: Decimal = etapas.iter().map(|e| e.minutos_por_unidade).sum();
    let minutos_totais: Decimal = etapas.iter().map(|e| e.minutos_totais).sum();
    let horas_totais = minutos_totais / MINUTOS_POR_HORA;

    let colaboradores = equipe.colaboradores.max(1);
    let horas_por_dia_equipe = equipe.horas_por_dia * Decimal::from(colaboradores);
    let dias_uteis = dias_necessarios(horas_totais, horas_por_dia_equipe);

    let inicio = next_business_day(data_inicio);
    let termino = data_termino(inicio, dias_uteis).ok_or_else(|| {
        AppError::BusinessRule(format!(
            "prazo de {} dias úteis fora do calendário; reduza a quantidade",
            dias_uteis
        ))
    })?;

    let custo_material = custo_material_unitario(&base.materiais);
    let custo_mao_obra = minutos_unidade / MINUTOS_POR_HORA * equipe.custo_hora;
    let custo_unitario = custo_material + custo_mao_obra;
    let custo_total = custo_unitario * qtd;
    let receita = base.produto.preco_venda * qtd;
    let margem = receita - custo_total;

    let materiais = base
        .materiais
        .iter()
        .map(|m| {
            let total = m.quantidade_por_unidade * qtd;
            MaterialNecessario {
                material_id: m.material_id,
                nome: m.material_nome.clone(),
                unidade: m.unidade.clone(),
                quantidade_total: total,
                custo_total: (total * m.custo_unitario).round_dp(2),
            }
        })
        .collect();

    Ok(PrevisaoProducao {
        produto_id: base.produto.id,
        quantidade,
        etapas,
        minutos_totais,
        horas_totais: horas_totais.round_dp(2),
        colaboradores,
        horas_por_dia_equipe,
        dias_uteis,
        data_inicio: inicio,
        data_termino_prevista: termino,
        custo_hora: equipe.custo_hora,
        custo_material_unitario: custo_material.round_dp(2),
        custo_mao_obra_unitario: custo_mao_obra.round_dp(2),
        custo_unitario: custo_unitario.round_dp(2),
        custo_total: custo_total.round_dp(2),
        receita: receita.round_dp(2),
        margem: margem.round_dp(2),
        margem_percentual: percentual(margem, receita),
        materiais,
    })
}

pub fn detalhamento_custos(base: &BaseProduto, custo_hora: Decimal) -> DetalhamentoCustos {
    let materiais: Vec<LinhaCustoMaterial> = base
        .materiais
        .iter()
        .map(|m| LinhaCustoMaterial {
            material_id: m.material_id,
            nome: m.material_nome.clone(),
            unidade: m.unidade.clone(),
            quantidade_por_unidade: m.quantidade_por_unidade,
            custo_unitario: m.custo_unitario,
            custo: (m.quantidade_por_unidade * m.custo_unitario).round_dp(2),
        })
        .collect();

    let etapas: Vec<LinhaCustoEtapa> = base
        .etapas
        .iter()
        .map(|etapa| {
            let minutos = minutos_por_unidade(etapa, &base.subetapas);
            LinhaCustoEtapa {
                etapa_id: etapa.id,
                nome: etapa.nome.clone(),
                minutos_por_unidade: minutos,
                custo: (minutos / MINUTOS_POR_HORA * custo_hora).round_dp(2),
            }
        })
        .collect();

    let custo_materiais = custo_material_unitario(&base.materiais);
    let minutos_unidade: Decimal = etapas.iter().map(|e| e.minutos_por_unidade).sum();
    let custo_mao_obra = minutos_unidade / MINUTOS_POR_HORA * custo_hora;
    let custo_unitario = custo_materiais + custo_mao_obra;
    let margem_unitaria = base.produto.preco_venda - custo_unitario;

    DetalhamentoCustos {
        produto_id: base.produto.id,
        preco_venda: base.produto.preco_venda,
        custo_hora,
        materiais,
        etapas,
        custo_materiais: custo_materiais.round_dp(2),
        custo_mao_obra: custo_mao_obra.round_dp(2),
        custo_unitario: custo_unitario.round_dp(2),
        margem_unitaria: margem_unitaria.round_dp(2),
        margem_percentual: percentual(margem_unitaria, base.produto.preco_venda),
    }
}

pub fn resumo_previsao(
    mes: NaiveDate,
    itens: Vec<ItemResumoPrevisao>,
    horas_por_dia: Decimal,
    colaboradores_ativos: i64,
) -> ResumoPrevisao {
    let mes = first_day_of_month(mes);
    let total_quantidade: i64 = itens.iter().map(|i| i64::from(i.quantidade)).sum();
    let total_horas: Decimal = itens.iter().map(|i| i.horas).sum();
    let total_custo: Decimal = itens.iter().map(|i| i.custo_total).sum();
    let total_receita: Decimal = itens.iter().map(|i| i.receita).sum();

    let dias_uteis = business_days_in_month(mes.year(), mes.month());
    let capacidade_horas =
        Decimal::from(dias_uteis) * horas_por_dia * Decimal::from(colaboradores_ativos.max(0));

    ResumoPrevisao {
        mes,
        itens,
        total_quantidade,
        total_horas,
        total_custo,
        total_receita,
        margem: total_receita - total_custo,
        dias_uteis,
        capacidade_horas,
        utilizacao_percentual: percentual(total_horas, capacidade_horas),
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

    fn etapa(produto_id: Uuid, nome: &str, ordem: i32, minutos: &str) -> Etapa {
        Etapa {
            id: Uuid::new_v4(),
            empresa_id: Uuid::nil(),
            produto_id,
            nome: nome.into(),
            ordem,
            tempo_por_unidade_min: dec(minutos),
            created_at: Utc::now(),
        }
    }

    fn material(produto_id: Uuid, nome: &str, qtd: &str, custo: &str) -> MaterialDoProduto {
        MaterialDoProduto {
            id: Uuid::new_v4(),
            produto_id,
            material_id: Uuid::new_v4(),
            material_nome: nome.into(),
            unidade: "un".into(),
            custo_unitario: dec(custo),
            quantidade_por_unidade: dec(qtd),
        }
    }

    /// Cadeira: Corte 10 min (+ Rebarbar 2 min) e Solda 18 min = 30 min/unidade.
    /// Materiais: 2 × 5,00 + 0,5 × 8,00 = 14,00/unidade. Preço 100,00.
    fn cadeira() -> BaseProduto {
        let produto = Produto {
            id: Uuid::new_v4(),
            empresa_id: Uuid::nil(),
            codigo: "CAD-001".into(),
            nome: "Cadeira".into(),
            descricao: None,
            preco_venda: dec("100.00"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let corte = etapa(produto.id, "Corte", 1, "10");
        let solda = etapa(produto.id, "Solda", 2, "18");
        let rebarbar = Subetapa {
            id: Uuid::new_v4(),
            empresa_id: Uuid::nil(),
            etapa_id: corte.id,
            nome: "Rebarbar".into(),
            ordem: 1,
            tempo_por_unidade_min: dec("2"),
            created_at: Utc::now(),
        };
        let materiais = vec![
            material(produto.id, "Tubo", "2", "5.00"),
            material(produto.id, "Tinta", "0.5", "8.00"),
        ];
        BaseProduto { produto, etapas: vec![corte, solda], subetapas: vec![rebarbar], materiais }
    }

    fn equipe(colaboradores: i64) -> Equipe {
        Equipe { colaboradores, horas_por_dia: dec("8"), custo_hora: dec("30") }
    }

    #[test]
    fn stage_minutes_include_substages() {
        let base = cadeira();
        let previsao = calcular_previsao(&base, 16, d(2025, 3, 3), &equipe(1)).unwrap();

        assert_eq!(previsao.etapas[0].minutos_por_unidade, dec("12"));
        assert_eq!(previsao.etapas[1].minutos_por_unidade, dec("18"));
        assert_eq!(previsao.etapas[0].minutos_totais, dec("192"));
        assert_eq!(previsao.minutos_totais, dec("480"));
        assert_eq!(previsao.horas_totais, dec("8"));
    }

    #[test]
    fn one_day_of_work_ends_on_the_start_day() {
        let previsao = calcular_previsao(&cadeira(), 16, d(2025, 3, 3), &equipe(1)).unwrap();

        assert_eq!(previsao.dias_uteis, 1);
        assert_eq!(previsao.data_inicio, d(2025, 3, 3));
        assert_eq!(previsao.data_termino_prevista, d(2025, 3, 3));
    }

    #[test]
    fn weekend_start_moves_to_monday_and_days_round_up() {
        // 40 un × 30 min = 20 h; 8 h/dia → 2,5 → 3 dias úteis.
        let previsao = calcular_previsao(&cadeira(), 40, d(2025, 3, 1), &equipe(1)).unwrap();

        assert_eq!(previsao.dias_uteis, 3);
        assert_eq!(previsao.data_inicio, d(2025, 3, 3));
        assert_eq!(previsao.data_termino_prevista, d(2025, 3, 5));
    }

    #[test]
    fn more_collaborators_shorten_the_forecast() {
        let previsao = calcular_previsao(&cadeira(), 40, d(2025, 3, 3), &equipe(2)).unwrap();

        assert_eq!(previsao.horas_por_dia_equipe, dec("16"));
        assert_eq!(previsao.dias_uteis, 2);
        assert_eq!(previsao.data_termino_prevista, d(2025, 3, 4));
    }

    #[test]
    fn forecast_crossing_a_weekend() {
        // Sexta-feira, 3 dias úteis: sexta, segunda e terça.
        let previsao = calcular_previsao(&cadeira(), 40, d(2025, 3, 7), &equipe(1)).unwrap();
        assert_eq!(previsao.data_termino_prevista, d(2025, 3, 11));
    }

    #[test]
    fn zero_collaborators_count_as_one() {
        let previsao = calcular_previsao(&cadeira(), 16, d(2025, 3, 3), &equipe(0)).unwrap();
        assert_eq!(previsao.colaboradores, 1);
        assert_eq!(previsao.dias_uteis, 1);
    }

    #[test]
    fn costs_revenue_and_margin() {
        let previsao = calcular_previsao(&cadeira(), 16, d(2025, 3, 3), &equipe(1)).unwrap();

        assert_eq!(previsao.custo_material_unitario, dec("14"));
        // 30 min a 30,00/h
        assert_eq!(previsao.custo_mao_obra_unitario, dec("15"));
        assert_eq!(previsao.custo_unitario, dec("29"));
        assert_eq!(previsao.custo_total, dec("464"));
        assert_eq!(previsao.receita, dec("1600"));
        assert_eq!(previsao.margem, dec("1136"));
        assert_eq!(previsao.margem_percentual, Some(dec("71")));

        let tubo = &previsao.materiais[0];
        assert_eq!(tubo.quantidade_total, dec("32"));
        assert_eq!(tubo.custo_total, dec("160"));
    }

    #[test]
    fn zero_quantity_needs_no_days_and_has_no_margin_percent() {
        let previsao = calcular_previsao(&cadeira(), 0, d(2025, 3, 3), &equipe(1)).unwrap();

        assert_eq!(previsao.dias_uteis, 0);
        assert_eq!(previsao.data_termino_prevista, d(2025, 3, 3));
        assert_eq!(previsao.receita, Decimal::ZERO);
        assert_eq!(previsao.margem_percentual, None);
    }

    #[test]
    fn huge_quantity_is_rejected_instead_of_overflowing_the_calendar() {
        // i32::MAX × 30 min passa de 130 milhões de dias úteis.
        let resultado = calcular_previsao(&cadeira(), i32::MAX, d(2025, 3, 3), &equipe(1));
        assert!(matches!(resultado, Err(AppError::BusinessRule(_))));
    }

    #[test]
    fn product_without_stages_has_only_material_cost() {
        let mut base = cadeira();
        base.etapas.clear();
        base.subetapas.clear();

        let previsao = calcular_previsao(&base, 10, d(2025, 3, 3), &equipe(1)).unwrap();
        assert_eq!(previsao.dias_uteis, 0);
        assert_eq!(previsao.custo_mao_obra_unitario, Decimal::ZERO);
        assert_eq!(previsao.custo_unitario, dec("14"));
    }

    #[test]
    fn cost_breakdown_per_unit() {
        let detalhe = detalhamento_custos(&cadeira(), dec("30"));

        assert_eq!(detalhe.materiais.len(), 2);
        assert_eq!(detalhe.materiais[0].custo, dec("10"));
        assert_eq!(detalhe.materiais[1].custo, dec("4"));
        assert_eq!(detalhe.etapas[0].custo, dec("6"));
        assert_eq!(detalhe.etapas[1].custo, dec("9"));
        assert_eq!(detalhe.custo_materiais, dec("14"));
        assert_eq!(detalhe.custo_mao_obra, dec("15"));
        assert_eq!(detalhe.custo_unitario, dec("29"));
        assert_eq!(detalhe.margem_unitaria, dec("71"));
        assert_eq!(detalhe.margem_percentual, Some(dec("71")));
    }

    #[test]
    fn cost_breakdown_without_price_has_no_margin_percent() {
        let mut base = cadeira();
        base.produto.preco_venda = Decimal::ZERO;

        let detalhe = detalhamento_custos(&base, dec("30"));
        assert_eq!(detalhe.margem_unitaria, dec("-29"));
        assert_eq!(detalhe.margem_percentual, None);
    }

    fn item(quantidade: i32, horas: &str, custo: &str, receita: &str) -> ItemResumoPrevisao {
        ItemResumoPrevisao {
            projecao_id: Uuid::new_v4(),
            produto_id: Uuid::new_v4(),
            produto_nome: "Produto".into(),
            quantidade,
            horas: dec(horas),
            custo_total: dec(custo),
            receita: dec(receita),
        }
    }

    #[test]
    fn month_summary_totals_and_utilisation() {
        let itens = vec![item(16, "8", "464", "1600"), item(40, "20", "1160", "4000")];
        // Qualquer dia do mês vale.
        let resumo = resumo_previsao(d(2025, 3, 17), itens, dec("8"), 2);

        assert_eq!(resumo.mes, d(2025, 3, 1));
        assert_eq!(resumo.total_quantidade, 56);
        assert_eq!(resumo.total_horas, dec("28"));
        assert_eq!(resumo.total_custo, dec("1624"));
        assert_eq!(resumo.total_receita, dec("5600"));
        assert_eq!(resumo.margem, dec("3976"));
        // Março/2025: 21 dias úteis × 8 h × 2 colaboradores.
        assert_eq!(resumo.dias_uteis, 21);
        assert_eq!(resumo.capacidade_horas, dec("336"));
        assert_eq!(resumo.utilizacao_percentual, Some(dec("8.33")));
    }

    #[test]
    fn month_summary_without_team_has_no_utilisation() {
        let resumo = resumo_previsao(d(2025, 3, 1), vec![item(1, "1", "1", "2")], dec("8"), 0);
        assert_eq!(resumo.capacidade_horas, Decimal::ZERO);
        assert_eq!(resumo.utilizacao_percentual, None);
    }
}
