// src/services/document_service.rs

use std::path::PathBuf;

use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{DocumentoRepository, EmpresaRepository},
    models::{documento::Documento, lote::DetalhesLote},
    services::lote_service::LoteService,
};

/// Tamanho máximo aceito no upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct DocumentService {
    documento_repo: DocumentoRepository,
    empresa_repo: EmpresaRepository,
    lote_service: LoteService,
    fonts_dir: PathBuf,
}

impl DocumentService {
    pub fn new(
        documento_repo: DocumentoRepository,
        empresa_repo: EmpresaRepository,
        lote_service: LoteService,
        fonts_dir: PathBuf,
    ) -> Self {
        Self { documento_repo, empresa_repo, lote_service, fonts_dir }
    }

    // --- Upload (stub: só os metadados ficam gravados) ---

    pub async fn registrar_upload<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        user_id: Uuid,
        nome_arquivo: &str,
        content_type: &str,
        tamanho: usize,
    ) -> Result<Documento, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        validar_upload(nome_arquivo, tamanho)?;

        let doc = self
            .documento_repo
            .insert(
                executor,
                empresa_id,
                user_id,
                nome_arquivo,
                content_type,
                tamanho as i64,
            )
            .await?;

        tracing::info!("Documento recebido: {} ({} bytes)", doc.nome_arquivo, doc.tamanho_bytes);
        Ok(doc)
    }

    pub async fn list_documentos<'e, E>(&self, executor: E, empresa_id: Uuid) -> Result<Vec<Documento>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.documento_repo.list(executor, empresa_id).await
    }

    // --- Ficha do lote ---

    pub async fn ficha_lote_pdf<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
        lote_id: Uuid,
    ) -> Result<Vec<u8>, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        // 1. Busca os Dados
        let detalhes = self.lote_service.detalhes_lote(executor, empresa_id, lote_id).await?;
        let empresa_nome = self
            .empresa_repo
            .find_by_id(empresa_id)
            .await?
            .map(|e| e.nome)
            .unwrap_or_default();

        // 2. Renderiza fora do runtime
        let fonts_dir = self.fonts_dir.clone();
        tokio::task::spawn_blocking(move || render_ficha(&empresa_nome, &detalhes, &fonts_dir))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task do PDF: {}", e))?
    }
}

pub fn validar_upload(nome_arquivo: &str, tamanho: usize) -> Result<(), AppError> {
    if nome_arquivo.trim().is_empty() {
        return Err(AppError::InvalidUpload("arquivo sem nome".into()));
    }
    if tamanho == 0 {
        return Err(AppError::InvalidUpload("arquivo vazio".into()));
    }
    if tamanho > MAX_UPLOAD_BYTES {
        return Err(AppError::InvalidUpload(format!(
            "o limite é de {} MiB",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

fn render_ficha(
    empresa_nome: &str,
    detalhes: &DetalhesLote,
    fonts_dir: &std::path::Path,
) -> Result<Vec<u8>, AppError> {
    // Carrega a fonte da pasta configurada
    let font_family = genpdf::fonts::from_files(fonts_dir, "Roboto", None)
        .map_err(|_| AppError::FontNotFound(fonts_dir.display().to_string()))?;

    let lote = &detalhes.lote;
    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(format!("Lote {}", lote.codigo));
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    // --- CABEÇALHO ---
    if !empresa_nome.is_empty() {
        doc.push(
            elements::Paragraph::new(empresa_nome)
                .styled(style::Style::new().bold().with_font_size(18)),
        );
        doc.push(elements::Break::new(1.5));
    }

    doc.push(
        elements::Paragraph::new(format!("FICHA DE PRODUÇÃO - LOTE {}", lote.codigo))
            .styled(style::Style::new().bold().with_font_size(14)),
    );
    doc.push(elements::Paragraph::new(format!("Produto: {}", detalhes.produto_nome)));
    doc.push(elements::Paragraph::new(format!("Quantidade: {}", lote.quantidade)));
    doc.push(elements::Paragraph::new(format!("Status: {:?}", lote.status)));
    doc.push(elements::Paragraph::new(format!(
        "Início: {}",
        lote.data_inicio.format("%d/%m/%Y")
    )));
    if let Some(prevista) = lote.data_prevista {
        doc.push(elements::Paragraph::new(format!(
            "Previsão de término: {}",
            prevista.format("%d/%m/%Y")
        )));
    }
    if let Some(conclusao) = lote.data_conclusao {
        doc.push(elements::Paragraph::new(format!(
            "Concluído em: {}",
            conclusao.format("%d/%m/%Y")
        )));
    }
    doc.push(elements::Paragraph::new(format!(
        "Progresso geral: {}%",
        detalhes.percentual_geral
    )));

    doc.push(elements::Break::new(2));

    // --- TABELA DE ETAPAS ---
    // Pesos das colunas: Etapa (4), Produzido (2), Minutos (2), % (1)
    let mut table = elements::TableLayout::new(vec![4, 2, 2, 1]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let style_bold = style::Style::new().bold();
    table
        .row()
        .element(elements::Paragraph::new("Etapa").styled(style_bold))
        .element(elements::Paragraph::new("Produzido").styled(style_bold))
        .element(elements::Paragraph::new("Minutos").styled(style_bold))
        .element(elements::Paragraph::new("%").styled(style_bold))
        .push()
        .map_err(pdf_error)?;

    for etapa in &detalhes.etapas {
        table
            .row()
            .element(elements::Paragraph::new(format!("{}. {}", etapa.ordem, etapa.nome)))
            .element(elements::Paragraph::new(format!(
                "{} / {}",
                etapa.quantidade_produzida, lote.quantidade
            )))
            .element(elements::Paragraph::new(format!("{:.1}", etapa.tempo_gasto_min)))
            .element(elements::Paragraph::new(format!("{:.0}", etapa.percentual)))
            .push()
            .map_err(pdf_error)?;
    }

    doc.push(table);
    doc.push(elements::Break::new(2));

    // --- QR CODE com o código do lote ---
    let code = QrCode::new(lote.codigo.as_bytes()).map_err(pdf_error)?;
    let image_buffer = code.render::<Luma<u8>>().build();
    let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);

    let pdf_image = elements::Image::from_dynamic_image(dynamic_image)
        .map_err(pdf_error)?
        .with_scale(genpdf::Scale::new(0.5, 0.5));
    doc.push(pdf_image);

    if let Some(obs) = &lote.observacoes {
        doc.push(elements::Break::new(1));
        doc.push(
            elements::Paragraph::new(obs.as_str())
                .styled(style::Style::new().italic().with_font_size(8)),
        );
    }

    // 3. Renderiza para Buffer (Memória)
    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(pdf_error)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lote::{Lote, LoteStatus};
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    #[test]
    fn upload_limits() {
        assert!(validar_upload("nota.pdf", 1).is_ok());
        assert!(validar_upload("nota.pdf", MAX_UPLOAD_BYTES).is_ok());
        assert!(matches!(
            validar_upload("nota.pdf", MAX_UPLOAD_BYTES + 1),
            Err(AppError::InvalidUpload(_))
        ));
        assert!(matches!(validar_upload("nota.pdf", 0), Err(AppError::InvalidUpload(_))));
        assert!(matches!(validar_upload("  ", 10), Err(AppError::InvalidUpload(_))));
    }

    #[test]
    fn missing_fonts_are_reported() {
        let lote = Lote {
            id: Uuid::new_v4(),
            empresa_id: Uuid::nil(),
            produto_id: Uuid::nil(),
            codigo: "L-001".into(),
            quantidade: 10,
            status: LoteStatus::Pendente,
            data_inicio: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            data_prevista: None,
            data_conclusao: None,
            observacoes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let detalhes = DetalhesLote {
            lote,
            produto_nome: "Mesa".into(),
            etapas: vec![],
            percentual_geral: Decimal::ZERO,
            tempo_gasto_min: Decimal::ZERO,
            tempo_previsto_min: Decimal::ZERO,
            eficiencia: None,
            consumos: vec![],
            custo_materiais: Decimal::ZERO,
            dias_uteis_decorridos: 0,
            atrasado: false,
        };

        let result = render_ficha("Fábrica", &detalhes, std::path::Path::new("/nao/existe"));
        assert!(matches!(result, Err(AppError::FontNotFound(_))));
    }
}
