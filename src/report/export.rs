//! PDF and XLSX exports of the projected report table.
//!
//! Both formats are rendered from the same [`ExportTable`], so for a
//! given report and preferences they always carry the same rows and
//! columns. Each artifact records the counts it actually wrote.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::*;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use super::view::ExportTable;
use crate::models::{ComplianceType, ReportColumn};

/// Header fill of the PDF table (forest green).
const HEADER_RGB: (f32, f32, f32) = (34.0 / 255.0, 139.0 / 255.0, 34.0 / 255.0);
/// Fill of every other body row in the PDF table.
const STRIPE_RGB: (f32, f32, f32) = (0.94, 0.94, 0.94);

// A4 landscape, millimetres.
const PAGE_W: f32 = 297.0;
const PAGE_H: f32 = 210.0;
const MARGIN: f32 = 15.0;
const FONT_SIZE: f32 = 8.0;
const LINE_H: f32 = 3.8;
const CELL_PAD: f32 = 1.5;
/// Rough Helvetica advance at 8pt, used to wrap cell text.
const CHAR_W: f32 = 1.45;

const SHEET_NAME: &str = "Report";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("Cannot write export: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Xlsx => "xlsx",
        }
    }
}

/// A rendered export, ready to be saved.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Body rows written (header excluded).
    pub rows: usize,
    pub columns: usize,
}

/// `<complianceType>_compliance_report.<ext>`
pub fn export_file_name(compliance_type: ComplianceType, format: ExportFormat) -> String {
    format!("{}_compliance_report.{}", compliance_type.as_str(), format.extension())
}

// ─── PDF ──────────────────────────────────────────────────────────────────────

/// Paginated PDF: title line, green header row, striped body rows.
/// The header is repeated on every page.
pub fn export_pdf(
    table: &ExportTable,
    compliance_type: ComplianceType,
) -> Result<ExportArtifact, ExportError> {
    let title = format!("{} Compliance Report", compliance_type.as_str());
    let (doc, page1, layer1) = PdfDocument::new(&title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(format!("font error: {e}")))?;

    let usable_w = PAGE_W - 2.0 * MARGIN;
    let col_w = if table.columns.is_empty() {
        usable_w
    } else {
        usable_w / table.columns.len() as f32
    };
    let max_chars = (((col_w - 2.0 * CELL_PAD) / CHAR_W).floor() as usize).max(4);
    let max_lines = max_row_lines();

    let mut layer = doc.get_page(page1).get_layer(layer1);
    let mut y = PAGE_H - MARGIN;

    set_fill(&layer, (0.0, 0.0, 0.0));
    layer.use_text(&title, 14.0, Mm(MARGIN), Mm(y), &bold);
    y -= 10.0;

    y = draw_header(&layer, &table.columns, col_w, max_chars, y, &bold);

    for (i, row) in table.rows.iter().enumerate() {
        let cells: Vec<Vec<String>> = row
            .cells
            .iter()
            .map(|cell| clip_lines(wrap_text(cell, max_chars), max_chars, max_lines))
            .collect();
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let row_h = lines as f32 * LINE_H + 2.0 * CELL_PAD;

        if y - row_h < MARGIN {
            let (page, layer_idx) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            layer = doc.get_page(page).get_layer(layer_idx);
            y = draw_header(&layer, &table.columns, col_w, max_chars, PAGE_H - MARGIN, &bold);
        }

        if i % 2 == 1 {
            set_fill(&layer, STRIPE_RGB);
            layer.add_rect(Rect::new(
                Mm(MARGIN),
                Mm(y - row_h),
                Mm(MARGIN + usable_w),
                Mm(y),
            ));
        }

        set_fill(&layer, (0.0, 0.0, 0.0));
        for (c, lines) in cells.iter().enumerate() {
            let x = MARGIN + c as f32 * col_w + CELL_PAD;
            let mut line_y = y - CELL_PAD - LINE_H + 1.0;
            for line in lines {
                layer.use_text(line, FONT_SIZE, Mm(x), Mm(line_y), &font);
                line_y -= LINE_H;
            }
        }
        y -= row_h;
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ExportError::Pdf(format!("save error: {e}")))?;
    let bytes = buf
        .into_inner()
        .map_err(|e| ExportError::Pdf(format!("buffer error: {e}")))?;

    tracing::debug!(rows = table.row_count(), bytes = bytes.len(), "PDF report rendered");
    Ok(ExportArtifact {
        format: ExportFormat::Pdf,
        file_name: export_file_name(compliance_type, ExportFormat::Pdf),
        bytes,
        rows: table.row_count(),
        columns: table.column_count(),
    })
}

/// Draws the header band and returns the y below it.
fn draw_header(
    layer: &PdfLayerReference,
    columns: &[ReportColumn],
    col_w: f32,
    max_chars: usize,
    top: f32,
    bold: &IndirectFontRef,
) -> f32 {
    let header_h = LINE_H + 2.0 * CELL_PAD;
    set_fill(layer, HEADER_RGB);
    layer.add_rect(Rect::new(
        Mm(MARGIN),
        Mm(top - header_h),
        Mm(PAGE_W - MARGIN),
        Mm(top),
    ));

    set_fill(layer, (1.0, 1.0, 1.0));
    for (c, column) in columns.iter().enumerate() {
        let x = MARGIN + c as f32 * col_w + CELL_PAD;
        let label = clip(column.as_str(), max_chars);
        layer.use_text(label, FONT_SIZE, Mm(x), Mm(top - CELL_PAD - LINE_H + 1.0), bold);
    }
    top - header_h
}

fn set_fill(layer: &PdfLayerReference, (r, g, b): (f32, f32, f32)) {
    layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
}

/// Simple word-wrap helper for PDF text rendering.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.chars().count() + word.chars().count() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Hard-truncate lines that a single long word kept too wide.
/// Body lines that fit in one row on a fresh page below the header.
fn max_row_lines() -> usize {
    let header_h = LINE_H + 2.0 * CELL_PAD;
    let body_h = PAGE_H - 2.0 * MARGIN - header_h - 2.0 * CELL_PAD;
    ((body_h / LINE_H).floor() as usize).max(1)
}

/// Clips each line to `max_chars` and the cell to `max_lines`; a cut
/// cell ends in `~`.
fn clip_lines(mut lines: Vec<String>, max_chars: usize, max_lines: usize) -> Vec<String> {
    let cut = lines.len() > max_lines;
    lines.truncate(max_lines);
    let mut lines: Vec<String> = lines.into_iter().map(|l| clip(&l, max_chars)).collect();
    if cut {
        if let Some(last) = lines.last_mut() {
            if last.chars().count() >= max_chars {
                last.pop();
            }
            last.push('~');
        }
    }
    lines
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    clipped.push('~');
    clipped
}

// ─── XLSX ─────────────────────────────────────────────────────────────────────

/// Single-sheet workbook: bold header row, one row per report row.
/// Compliance scores are stored as numbers.
pub fn export_xlsx(
    table: &ExportTable,
    compliance_type: ComplianceType,
) -> Result<ExportArtifact, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (c, column) in table.columns.iter().enumerate() {
        sheet.write_string_with_format(0, c as u16, column.as_str(), &header_format)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let sheet_row = r as u32 + 1;
        for (c, (column, cell)) in table.columns.iter().zip(&row.cells).enumerate() {
            if *column == ReportColumn::ComplianceScore {
                sheet.write_number(sheet_row, c as u16, row.score)?;
            } else {
                sheet.write_string(sheet_row, c as u16, cell)?;
            }
        }
    }

    let bytes = workbook.save_to_buffer()?;

    tracing::debug!(rows = table.row_count(), bytes = bytes.len(), "XLSX report rendered");
    Ok(ExportArtifact {
        format: ExportFormat::Xlsx,
        file_name: export_file_name(compliance_type, ExportFormat::Xlsx),
        bytes,
        rows: table.row_count(),
        columns: table.column_count(),
    })
}

// ─── Files ────────────────────────────────────────────────────────────────────

/// Save an artifact under `dir`, creating it if needed.
pub fn write_export(artifact: &ExportArtifact, dir: &Path) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(&artifact.file_name);
    std::fs::write(&path, &artifact.bytes)?;
    tracing::info!(
        path = %path.display(),
        rows = artifact.rows,
        columns = artifact.columns,
        "Report exported"
    );
    Ok(path)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
