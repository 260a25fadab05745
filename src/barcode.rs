//! Barcode sheets: the work list as Code 39 labels on letter-size pages.
//!
//! Labels sit in a 3 × 10 grid, one identifier per cell, with the human
//! readable text under each code. Identifiers Code 39 cannot carry are
//! skipped and leave their cell blank.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use barcoders::sym::code39::Code39;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect};
use tracing::{debug, trace, warn};

use crate::pipeline::WorkList;

pub const COLUMNS: usize = 3;
pub const ROWS: usize = 10;
pub const PER_PAGE: usize = COLUMNS * ROWS;

// US letter, in millimetres.
const PAGE_WIDTH: f32 = 215.9;
const PAGE_HEIGHT: f32 = 279.4;
// Half an inch on every side.
const MARGIN: f32 = 12.7;
// A cell is 2.5 × 0.8 inches; the code takes 70 % of its width and 80 % of its height.
const CELL_WIDTH: f32 = 63.5;
const CELL_HEIGHT: f32 = 20.32;
const BAR_WIDTH: f32 = CELL_WIDTH * 0.7;
const BAR_HEIGHT: f32 = CELL_HEIGHT * 0.8;

const FONT_SIZE: f32 = 10.0;
const PT_TO_MM: f32 = 0.352_778;
// Helvetica digit advance, in em.
const GLYPH_EM: f32 = 0.556;

/// Where one label goes: its page and the lower-left corner of its cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub page: usize,
    pub column: usize,
    pub row: usize,
    pub x: f32,
    pub y: f32,
}

/// What [`write`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSummary {
    pub pages: usize,
    pub printed: usize,
    pub skipped: Vec<String>,
}

/// Pages needed for `count` labels.
pub fn page_count(count: usize) -> usize {
    count.div_ceil(PER_PAGE)
}

/// Grid position of the label at `index` (0-based, row-major per page).
pub fn slot(index: usize) -> Slot {
    let page = index / PER_PAGE;
    let on_page = index % PER_PAGE;
    let column = on_page % COLUMNS;
    let row = on_page / COLUMNS;
    let column_spacing = (PAGE_WIDTH - 2.0 * MARGIN) / COLUMNS as f32;
    let row_spacing = (PAGE_HEIGHT - 2.0 * MARGIN) / ROWS as f32;
    Slot {
        page,
        column,
        row,
        x: MARGIN + column as f32 * column_spacing,
        y: PAGE_HEIGHT - MARGIN - (row + 1) as f32 * row_spacing,
    }
}

/// File name used when no output path is given.
pub fn default_output(count: usize) -> PathBuf {
    PathBuf::from(format!("zero_export_{count}_items.pdf"))
}

/// Runs of dark modules as (start, width), both in modules.
pub fn bars(modules: &[u8]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, module) in modules.iter().enumerate() {
        match (*module == 1, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i - s));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, modules.len() - s));
    }
    runs
}

/// Code 39 modules for `identifier`, or `None` if it has characters the
/// symbology cannot carry. Lower-case letters are printed upper-case.
pub fn encode(identifier: &str) -> Option<Vec<u8>> {
    match Code39::new(identifier.to_ascii_uppercase()) {
        Ok(code) => Some(code.encode()),
        Err(e) => {
            warn!(identifier, error = %e, "cannot encode as Code 39, skipping");
            None
        }
    }
}

/// Renders one label sheet per [`PER_PAGE`] items and writes the PDF to `path`.
pub fn write(work: &WorkList, path: &Path) -> Result<SheetSummary> {
    let pages = page_count(work.len()).max(1);
    let (doc, first_page, first_layer) =
        PdfDocument::new("Zero quantity items", Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "labels");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("failed to load PDF font: {e}"))?;

    let mut layers = vec![doc.get_page(first_page).get_layer(first_layer)];
    for _ in 1..pages {
        let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "labels");
        layers.push(doc.get_page(page).get_layer(layer));
    }

    let mut skipped = Vec::new();
    for (index, identifier) in work.identifiers().enumerate() {
        let Some(modules) = encode(identifier) else {
            skipped.push(identifier.to_string());
            continue;
        };
        let slot = slot(index);
        draw_label(&layers[slot.page], &font, slot, identifier, &modules);
    }

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| anyhow!("failed to render PDF: {e}"))?;
    std::fs::write(path, bytes)
        .with_context(|| format!("failed to write barcode sheet to {}", path.display()))?;

    let summary = SheetSummary {
        pages,
        printed: work.len() - skipped.len(),
        skipped,
    };
    debug!(?summary, path = %path.display(), "barcode sheet written");
    Ok(summary)
}

fn draw_label(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    slot: Slot,
    identifier: &str,
    modules: &[u8],
) {
    trace!(identifier, page = slot.page, column = slot.column, row = slot.row, "placing label");
    let module = BAR_WIDTH / modules.len() as f32;
    let left = slot.x + (CELL_WIDTH - BAR_WIDTH) / 2.0;
    let bottom = slot.y + (CELL_HEIGHT - BAR_HEIGHT) / 2.0;
    for (start, width) in bars(modules) {
        let x = left + start as f32 * module;
        layer.add_rect(Rect::new(
            Mm(x),
            Mm(bottom),
            Mm(x + width as f32 * module),
            Mm(bottom + BAR_HEIGHT),
        ));
    }

    let text_width = identifier.chars().count() as f32 * GLYPH_EM * FONT_SIZE * PT_TO_MM;
    let text_x = slot.x + (CELL_WIDTH - text_width) / 2.0;
    let text_y = slot.y - FONT_SIZE * PT_TO_MM;
    layer.use_text(identifier, FONT_SIZE, Mm(text_x), Mm(text_y), font);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lists::IdentifierList;
    use crate::pipeline;

    fn work(ids: &[String]) -> WorkList {
        pipeline::filter(ids.to_vec(), &IdentifierList::default(), &IdentifierList::default())
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn thirty_one_items_need_two_pages() {
        assert_eq!(page_count(0), 0);
        assert_eq!(page_count(1), 1);
        assert_eq!(page_count(30), 1);
        assert_eq!(page_count(31), 2);
        assert_eq!(page_count(60), 2);
        assert_eq!(page_count(61), 3);
    }

    #[test]
    fn slots_fill_rows_left_to_right() {
        let first = slot(0);
        assert_eq!((first.page, first.column, first.row), (0, 0, 0));
        assert!(close(first.x, MARGIN));
        assert!(close(first.y, PAGE_HEIGHT - MARGIN - 25.4));

        let fourth = slot(3);
        assert_eq!((fourth.page, fourth.column, fourth.row), (0, 0, 1));

        let last = slot(29);
        assert_eq!((last.page, last.column, last.row), (0, 2, 9));
        assert!(close(last.x, MARGIN + 2.0 * 63.5));
        assert!(close(last.y, MARGIN));

        let overflow = slot(30);
        assert_eq!((overflow.page, overflow.column, overflow.row), (1, 0, 0));
        assert_eq!((overflow.x, overflow.y), (first.x, first.y));
    }

    #[test]
    fn bars_are_dark_runs() {
        assert_eq!(bars(&[1, 0, 1, 1, 0, 0, 1]), vec![(0, 1), (2, 2), (6, 1)]);
        assert!(bars(&[0, 0]).is_empty());
        assert_eq!(bars(&[1, 1, 1]), vec![(0, 3)]);
    }

    #[test]
    fn encode_accepts_digits_and_rejects_symbols() {
        let modules = encode("012345678905").unwrap();
        assert!(modules.contains(&1));
        assert!(modules.iter().all(|m| *m <= 1));
        assert!(encode("upc-1").is_some());
        assert!(encode("UPC#1").is_none());
    }

    #[test]
    fn default_output_names_item_count() {
        assert_eq!(default_output(31), PathBuf::from("zero_export_31_items.pdf"));
    }

    #[test]
    fn write_produces_pdf_and_reports_skips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.pdf");
        let mut ids: Vec<String> = (0..31).map(|i| format!("{:012}", i)).collect();
        ids.push("BAD#ID".into());

        let summary = write(&work(&ids), &path).unwrap();

        assert_eq!(summary.pages, 2);
        assert_eq!(summary.printed, 31);
        assert_eq!(summary.skipped, vec!["BAD#ID".to_string()]);
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
