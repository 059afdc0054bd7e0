// src/services/document_service.rs

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;

use crate::{
    common::error::AppError,
    models::{declaration::DeclarationDetail, station::Station},
};

const FONT_FAMILY: &str = "Roboto";
const MISSING: &str = "Non spécifiée";

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

fn or_missing(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(MISSING)
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

/// Recibo PDF de uma declaração de perda.
#[derive(Clone)]
pub struct DocumentService {
    fonts_dir: PathBuf,
}

impl DocumentService {
    pub fn new(fonts_dir: PathBuf) -> Self {
        Self { fonts_dir }
    }

    pub fn render_receipt(&self, declaration: &DeclarationDetail, station: Option<&Station>) -> Result<Vec<u8>, AppError> {
        // Carrega a fonte da pasta configurada
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, FONT_FAMILY, None)
            .map_err(|_| AppError::FontNotFound(self.fonts_dir.display().to_string()))?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Déclaration {}", declaration.reference));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO ---
        doc.push(elements::Paragraph::new("RÉPUBLIQUE DU MALI").styled(style::Style::new().bold().with_font_size(14)));
        if let Some(station) = station {
            doc.push(elements::Paragraph::new(station.name.clone()).styled(style::Style::new().bold().with_font_size(12)));
            doc.push(elements::Paragraph::new(station.address.clone()).styled(style::Style::new().with_font_size(10)));
            if let Some(phone) = &station.phone {
                doc.push(elements::Paragraph::new(format!("Tél : {}", phone)).styled(style::Style::new().with_font_size(10)));
            }
        }

        doc.push(elements::Break::new(1.5));
        doc.push(
            elements::Paragraph::new("RÉCÉPISSÉ DE DÉCLARATION DE PERTE")
                .aligned(genpdf::Alignment::Center)
                .styled(style::Style::new().bold().with_font_size(16)),
        );
        doc.push(
            elements::Paragraph::new(format!("N° {}", declaration.reference))
                .aligned(genpdf::Alignment::Center)
                .styled(style::Style::new().bold().with_font_size(12)),
        );
        doc.push(elements::Break::new(1.5));

        // --- DECLARANTE ---
        let d = &declaration.declarant;
        let bold = style::Style::new().bold();
        doc.push(elements::Paragraph::new("DÉCLARANT").styled(bold));
        let mut table = elements::TableLayout::new(vec![1, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
        let identity = [
            ("Nom", d.last_name.as_str()),
            ("Prénom", d.first_name.as_str()),
            ("Téléphone", d.phone.as_str()),
            ("E-mail", or_missing(d.email.as_deref())),
            ("Adresse", or_missing(d.address.as_deref())),
            ("N° NINA", or_missing(d.nina.as_deref())),
            ("N° carte d'identité", or_missing(d.id_card_number.as_deref())),
            ("N° passeport", or_missing(d.passport_number.as_deref())),
        ];
        for (name, value) in identity {
            table
                .row()
                .element(elements::Paragraph::new(name).styled(bold))
                .element(elements::Paragraph::new(value.to_string()))
                .push()
                .map_err(pdf_error)?;
        }
        table
            .row()
            .element(elements::Paragraph::new("Date de naissance").styled(bold))
            .element(elements::Paragraph::new(format_date(d.birth_date)))
            .push()
            .map_err(pdf_error)?;
        doc.push(table);
        doc.push(elements::Break::new(1));

        // --- DOCUMENTO PERDIDO ---
        doc.push(elements::Paragraph::new("DOCUMENT PERDU").styled(bold));
        let mut loss = elements::TableLayout::new(vec![1, 2]);
        loss.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
        let loss_rows = [
            ("Type de document", declaration.document_type_label.clone()),
            ("N° du document", or_missing(declaration.document_number.as_deref()).to_string()),
            ("Date de perte", format_date(declaration.loss_date)),
            ("Lieu de perte", or_missing(declaration.loss_place.as_deref()).to_string()),
            ("Circonstances", or_missing(declaration.circumstances.as_deref()).to_string()),
            ("Statut", declaration.status.label().to_string()),
            ("Date de déclaration", format_date(Some(declaration.declared_on))),
        ];
        for (name, value) in loss_rows {
            loss.row()
                .element(elements::Paragraph::new(name).styled(bold))
                .element(elements::Paragraph::new(value))
                .push()
                .map_err(pdf_error)?;
        }
        doc.push(loss);
        doc.push(elements::Break::new(1.5));

        // --- QR CODE com a referência ---
        let code = QrCode::new(declaration.reference.as_bytes()).map_err(pdf_error)?;
        let image_buffer = code.render::<Luma<u8>>().build();
        let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);
        let pdf_image = elements::Image::from_dynamic_image(dynamic_image)
            .map_err(pdf_error)?
            .with_alignment(genpdf::Alignment::Center)
            .with_scale(genpdf::Scale::new(0.5, 0.5));
        doc.push(pdf_image);

        // --- RODAPÉ ---
        doc.push(elements::Break::new(1));
        doc.push(
            elements::Paragraph::new(format!("Délivré le {}", Utc::now().format("%d/%m/%Y")))
                .aligned(genpdf::Alignment::Right)
                .styled(style::Style::new().italic().with_font_size(8)),
        );

        // Renderiza para Buffer (Memória)
        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_render_as_unspecified() {
        assert_eq!(format_date(None), "Non spécifiée");
        assert_eq!(or_missing(Some("   ")), "Non spécifiée");
        assert_eq!(or_missing(Some("Bamako")), "Bamako");
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2025, 3, 7)), "07/03/2025");
    }

    #[test]
    fn missing_fonts_are_reported() {
        use crate::models::{declarant::Declarant, declaration::DeclarationStatus};
        use uuid::Uuid;

        let service = DocumentService::new("./pasta-que-nao-existe".into());
        let detail = DeclarationDetail {
            id: Uuid::new_v4(),
            reference: "DECL-BKO-001".into(),
            document_type_id: Uuid::new_v4(),
            document_type_label: "Passeport".into(),
            document_number: None,
            loss_date: None,
            loss_place: None,
            circumstances: None,
            declared_on: Utc::now().date_naive(),
            status: DeclarationStatus::Enregistree,
            is_deleted: false,
            station_id: None,
            owner_id: None,
            owner_matricule: None,
            owner_last_name: None,
            owner_first_name: None,
            declarant: Declarant {
                id: Uuid::new_v4(),
                nina: None,
                id_card_number: None,
                passport_number: None,
                last_name: "Sissoko".into(),
                first_name: "Aminata".into(),
                birth_date: None,
                birth_place: None,
                email: None,
                phone: "+22370000000".into(),
                address: None,
            },
            creator_last_name: None,
            created_at: Utc::now(),
            modifier_last_name: None,
            modifier_first_name: None,
            modifier_matricule: None,
            modified_at: None,
            deleter_last_name: None,
            deleted_at: None,
        };

        assert!(matches!(service.render_receipt(&detail, None), Err(AppError::FontNotFound(_))));
    }
}
