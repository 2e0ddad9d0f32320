use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::domain::{Card, CoreMaterial};
use crate::error::{AppError, EXPORT_EMPTY_SELECTION};
use crate::render::{escape_html, render_cue_tags, UNKNOWN_SOURCE};
use crate::session::selected_cards;

const PDF_STYLE: &str = r#"<style>
  body { font-family: Arial, sans-serif; color: #333; }
  h1 { color: #667eea; border-bottom: 3px solid #667eea; padding-bottom: 10px; }
  h2 { color: #333; margin-top: 30px; margin-bottom: 15px; }
  .card { page-break-inside: avoid; border: 1px solid #ddd; padding: 20px; margin-bottom: 20px; border-radius: 8px; }
  .card-number { background: #f3f4f6; color: #667eea; padding: 4px 8px; border-radius: 4px; font-size: 0.85em; font-weight: 600; margin-bottom: 12px; display: inline-block; }
  .card-title { font-size: 1.2em; font-weight: bold; margin-bottom: 15px; }
  .section { margin-bottom: 12px; }
  .label { font-size: 0.9em; font-weight: bold; color: #667eea; text-transform: uppercase; margin-bottom: 4px; }
  .content { font-size: 0.95em; color: #666; line-height: 1.5; }
  .cues { display: flex; flex-wrap: wrap; gap: 8px; margin-top: 8px; }
  .cue-tag { background: #f3f4f6; color: #555; padding: 4px 10px; border-radius: 20px; font-size: 0.85em; }
  .outcome { background: #f0f4ff; border-left: 4px solid #667eea; padding: 15px; margin-bottom: 30px; }
  .card-image { max-width: 100%; height: auto; border-radius: 6px; margin: 10px 0; }
  .card-source { font-size: 0.85em; color: #666; margin-top: 8px; font-style: italic; }
</style>"#;

/// Layout options handed to the client-side HTML-to-PDF pipeline. Field names follow that
/// pipeline's option object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfOptions {
    /// Page margin in `unit`s.
    pub margin: u32,
    pub filename: String,
    pub image: PdfImageOptions,
    pub html2canvas: RasterOptions,
    #[serde(rename = "jsPDF")]
    pub js_pdf: PageOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfImageOptions {
    #[serde(rename = "type")]
    pub kind: String,
    pub quality: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterOptions {
    pub scale: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageOptions {
    pub orientation: String,
    pub unit: String,
    pub format: String,
}

impl PdfOptions {
    /// A4 portrait, 10mm margins, 2x raster scale.
    pub fn a4_portrait(filename: impl Into<String>) -> Self {
        Self {
            margin: 10,
            filename: filename.into(),
            image: PdfImageOptions {
                kind: "jpeg".to_string(),
                quality: 0.98,
            },
            html2canvas: RasterOptions { scale: 2 },
            js_pdf: PageOptions {
                orientation: "portrait".to_string(),
                unit: "mm".to_string(),
                format: "a4".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfExport {
    pub filename: String,
    pub html: String,
    pub options: PdfOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonExport {
    pub filename: String,
    pub contents: String,
}

/// Shape of the downloadable JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonExportDocument {
    pub outcome: String,
    pub generated_at: String,
    pub total_cards: usize,
    pub cards: Vec<Card>,
}

fn epoch_millis(now: OffsetDateTime) -> i128 {
    now.unix_timestamp_nanos() / 1_000_000
}

/// `sourcebook_<epoch-millis>.<ext>`
pub fn export_filename(now: OffsetDateTime, ext: &str) -> String {
    format!("sourcebook_{}.{ext}", epoch_millis(now))
}

fn require_selection<'a>(
    cards: &'a [Card],
    selection: &BTreeSet<String>,
) -> Result<Vec<&'a Card>, AppError> {
    let selected = selected_cards(cards, selection);
    if selected.is_empty() {
        return Err(AppError::new(
            EXPORT_EMPTY_SELECTION,
            "Select at least one card to export",
        ));
    }
    Ok(selected)
}

fn render_pdf_core_material(core: &CoreMaterial) -> String {
    match core {
        CoreMaterial::None => String::new(),
        CoreMaterial::Image(img) => {
            let mut out = String::from(r#"<div class="section"><div class="label">Core Material</div>"#);
            if !img.url.is_empty() {
                out.push_str(&format!(
                    r#"<img src="{}" alt="{}" class="card-image" style="max-width: 100%; height: auto;"/>"#,
                    escape_html(&img.url),
                    escape_html(&img.caption)
                ));
            }
            if !img.caption.is_empty() {
                out.push_str(&format!(
                    r#"<div class="content">{}</div>"#,
                    escape_html(&img.caption)
                ));
            }
            let source = if img.source.is_empty() {
                UNKNOWN_SOURCE
            } else {
                img.source.as_str()
            };
            out.push_str(&format!(
                r#"<div class="card-source">Source: {}</div></div>"#,
                escape_html(source)
            ));
            out
        }
        CoreMaterial::Text { content } => format!(
            r#"<div class="section"><div class="label">Core Material</div><div class="content">{}</div></div>"#,
            escape_html(content)
        ),
    }
}

/// Build the printable HTML fragment for the selected cards.
pub fn pdf_html(outcome: &str, selected: &[&Card]) -> String {
    let mut html = String::new();
    html.push_str(PDF_STYLE);
    html.push_str("\n<h1>Sourcebook</h1>\n");
    html.push_str(&format!(
        concat!(
            r#"<div class="outcome">"#,
            r#"<h3 style="margin-top: 0; color: #667eea;">Learning Outcome</h3>"#,
            r#"<p style="line-height: 1.6; white-space: pre-wrap;">{}</p>"#,
            "</div>\n"
        ),
        escape_html(outcome)
    ));

    for (idx, card) in selected.iter().enumerate() {
        html.push_str(&format!(
            concat!(
                r#"<div class="card">"#,
                r#"<div class="card-number">Card {number}</div>"#,
                r#"<div class="card-title">{title}</div>"#,
                "{core}",
                r#"<div class="section"><div class="label">Essential Question</div><div class="content">{question}</div></div>"#,
                r#"<div class="section"><div class="label">Search Cues</div><div class="cues">{cues}</div></div>"#,
                "</div>\n"
            ),
            number = idx + 1,
            title = escape_html(&card.title),
            core = render_pdf_core_material(&card.core),
            question = escape_html(&card.essential_question),
            cues = render_cue_tags(&card.search_cues),
        ));
    }
    html
}

/// Export the selection as a PDF-ready HTML document.
pub fn export_pdf(
    outcome: &str,
    cards: &[Card],
    selection: &BTreeSet<String>,
    now: OffsetDateTime,
) -> Result<PdfExport, AppError> {
    let selected = require_selection(cards, selection)?;
    let filename = export_filename(now, "pdf");
    Ok(PdfExport {
        html: pdf_html(outcome, &selected),
        options: PdfOptions::a4_portrait(filename.clone()),
        filename,
    })
}

/// Export the selection as a pretty-printed JSON download.
pub fn export_json(
    outcome: &str,
    cards: &[Card],
    selection: &BTreeSet<String>,
    now: OffsetDateTime,
) -> Result<JsonExport, AppError> {
    let selected = require_selection(cards, selection)?;
    let generated_at = now.to_offset(UtcOffset::UTC).format(&Rfc3339).map_err(|e| {
        AppError::new("EXPORT_TIME_FAILED", "Failed to format export time")
            .with_details(e.to_string())
    })?;

    let doc = JsonExportDocument {
        outcome: outcome.to_string(),
        generated_at,
        total_cards: selected.len(),
        cards: selected.into_iter().cloned().collect(),
    };
    let contents = serde_json::to_string_pretty(&doc).map_err(|e| {
        AppError::new("EXPORT_JSON_FAILED", "Failed to serialize export")
            .with_details(e.to_string())
    })?;

    Ok(JsonExport {
        filename: export_filename(now, "json"),
        contents,
    })
}
