//! Raw table loading.
//!
//! SAP "xls" exports are usually an HTML document with a `<table>` inside,
//! so the file is sniffed first: HTML goes through `scraper`, anything else is
//! handed to `calamine` as a real workbook. Both paths produce the same
//! [`Table`] of optional cell strings.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::ZeroEntryError;

/// Bytes inspected when deciding whether a file is HTML.
const SNIFF_LEN: usize = 1024;

/// Largest `colspan` honoured, as in browsers.
const MAX_COLSPAN: usize = 1000;

/// Rectangular view over parsed rows; missing cells are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    rows: Vec<Vec<Option<String>>>,
    width: usize,
}

impl Table {
    /// Builds a table, padding short rows so every row has the same width.
    pub fn from_rows(rows: Vec<Vec<Option<String>>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { rows, width }
    }

    /// Number of columns in the widest row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows, header included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of column `index`, top to bottom, skipping the first `skip` rows.
    pub fn column(&self, index: usize, skip: usize) -> impl Iterator<Item = Option<&str>> {
        self.rows
            .iter()
            .skip(skip)
            .map(move |row| row.get(index).and_then(|c| c.as_deref()))
    }

    /// Parses the first `<table>` in an HTML document.
    ///
    /// Only the table's own rows and cells are read; tables nested inside a
    /// cell contribute their text to that cell and nothing else.
    pub fn from_html(document: &str) -> Result<Self, ZeroEntryError> {
        let html = Html::parse_document(document);
        let table_sel = Selector::parse("table").expect("valid selector");

        let table = html
            .select(&table_sel)
            .next()
            .ok_or_else(|| ZeroEntryError::MalformedInput("no table found in document".into()))?;

        let rows = own_rows(table)
            .into_iter()
            .map(|tr| {
                let mut row = Vec::new();
                for cell in children_named(tr, &["th", "td"]) {
                    let value = cell_text(cell);
                    for _ in 0..colspan(cell) {
                        row.push(value.clone());
                    }
                }
                row
            })
            .filter(|row| !row.is_empty())
            .collect();

        Ok(Self::from_rows(rows))
    }

    /// Reads the first worksheet of an xls/xlsx/ods workbook.
    pub fn from_workbook(path: &Path) -> Result<Self, ZeroEntryError> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| ZeroEntryError::MalformedInput(format!("cannot open workbook: {e}")))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ZeroEntryError::MalformedInput("workbook has no worksheet".into()))?
            .map_err(|e| ZeroEntryError::MalformedInput(format!("cannot read worksheet: {e}")))?;

        // Ranges start at the first used cell; pad so column indices stay positional.
        let leading = range.start().map(|(_, col)| col as usize).unwrap_or(0);
        let rows = range
            .rows()
            .map(|cells| {
                let mut row = vec![None; leading];
                row.extend(cells.iter().map(cell_string));
                row
            })
            .collect();

        Ok(Self::from_rows(rows))
    }

    /// Loads `path`, choosing the HTML or workbook reader by content.
    pub fn load(path: &Path) -> Result<Self, ZeroEntryError> {
        if !path.is_file() {
            return Err(ZeroEntryError::FileNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        if looks_like_html(&bytes) {
            debug!(path = %path.display(), "parsing export as HTML table");
            let text = String::from_utf8_lossy(&bytes);
            Self::from_html(&text)
        } else {
            debug!(path = %path.display(), "parsing export as workbook");
            Self::from_workbook(path)
        }
    }
}

fn looks_like_html(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    let trimmed = head.trim_start_matches('\u{feff}').trim_start();
    trimmed.starts_with('<') && (head.contains("<html") || head.contains("<table"))
}

// Direct element children of `parent` whose tag is one of `names`.
fn children_named<'a>(parent: ElementRef<'a>, names: &[&str]) -> Vec<ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| names.contains(&el.value().name()))
        .collect()
}

// Rows of `table` itself, directly or through its row groups.
fn own_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in children_named(table, &["tr", "thead", "tbody", "tfoot"]) {
        if child.value().name() == "tr" {
            rows.push(child);
        } else {
            rows.extend(children_named(child, &["tr"]));
        }
    }
    rows
}

fn cell_text(cell: ElementRef<'_>) -> Option<String> {
    let text: String = cell.text().collect();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn colspan(cell: ElementRef<'_>) -> usize {
    cell.value()
        .attr("colspan")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .map(|n| n.min(MAX_COLSPAN))
        .unwrap_or(1)
}

fn cell_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => {
            let s = s.trim();
            if s.is_empty() { None } else { Some(s.to_string()) }
        }
        Data::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => Some(format!("{}", *v as i64)),
        Data::Float(v) => Some(format!("{v}")),
        Data::Int(v) => Some(format!("{v}")),
        Data::Bool(v) => Some(v.to_string()),
        Data::Error(_) => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EXPORT: &str = r#"<html><body>
        <table border="1">
          <tr><th>Plant</th><th>Loc</th><th>Material</th><th>UPC</th><th>Desc</th><th>Qty</th></tr>
          <tr><td>1000</td><td>0001</td><td>M-1</td><td>A1</td><td>Widget</td><td>0</td></tr>
          <tr><td>1000</td><td>0001</td><td>M-2</td><td> B2 </td><td>Gadget</td><td>1,250.000</td></tr>
          <tr><td>1000</td><td>0001</td><td>M-3</td><td>&nbsp;</td><td>Blank</td><td>0</td></tr>
        </table>
        <table><tr><td>ignored</td></tr></table>
    </body></html>"#;

    #[test]
    fn html_first_table_rows_and_width() {
        let table = Table::from_html(EXPORT).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.width(), 6);
        let upcs: Vec<_> = table.column(3, 1).collect();
        assert_eq!(upcs, vec![Some("A1"), Some("B2"), None]);
    }

    #[test]
    fn html_colspan_repeats_value() {
        let doc = "<table><tr><td colspan=\"3\">x</td><td>y</td></tr></table>";
        let table = Table::from_html(doc).unwrap();
        assert_eq!(table.width(), 4);
        assert_eq!(
            table.rows[0],
            vec![Some("x".into()), Some("x".into()), Some("x".into()), Some("y".into())]
        );
    }

    #[test]
    fn oversized_colspan_is_capped() {
        let doc = "<table><tr><td colspan=\"2000000\">x</td><td>y</td></tr></table>";
        let table = Table::from_html(doc).unwrap();
        assert_eq!(table.width(), MAX_COLSPAN + 1);
        assert_eq!(table.rows[0].last(), Some(&Some("y".to_string())));
    }

    #[test]
    fn nested_table_does_not_shift_columns() {
        let doc = r#"<table>
          <tr><th>P</th><th>L</th><th>M</th><th>UPC</th><th>D</th><th>Qty</th></tr>
          <tr><td>1000</td><td><table><tr><td>a</td><td>b</td></tr></table></td>
              <td>M-1</td><td>A1</td><td>d</td><td>0</td></tr>
        </table>"#;
        let table = Table::from_html(doc).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.width(), 6);
        let upcs: Vec<_> = table.column(3, 1).collect();
        assert_eq!(upcs, vec![Some("A1")]);
        let qtys: Vec<_> = table.column(5, 1).collect();
        assert_eq!(qtys, vec![Some("0")]);
    }

    #[test]
    fn thead_and_tbody_rows_are_read() {
        let doc = "<table><thead><tr><th>h</th></tr></thead>\
                   <tbody><tr><td>a</td></tr><tr><td>b</td></tr></tbody></table>";
        let table = Table::from_html(doc).unwrap();
        let col: Vec<_> = table.column(0, 0).collect();
        assert_eq!(col, vec![Some("h"), Some("a"), Some("b")]);
    }

    #[test]
    fn workbook_columns_stay_positional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        // Used range starts at column B; column A is never written.
        for (col, title) in ["Loc", "Mat", "UPC", "Desc", "Qty"].iter().enumerate() {
            sheet.write_string(0, col as u16 + 1, *title).unwrap();
        }
        sheet.write_string(1, 3, "C3").unwrap();
        sheet.write_number(1, 5, 0.0).unwrap();
        workbook.save(&path).unwrap();

        let table = Table::load(&path).unwrap();
        assert_eq!(table.width(), 6);
        assert_eq!(table.rows[0][0], None);
        assert_eq!(table.column(3, 1).collect::<Vec<_>>(), vec![Some("C3")]);
        assert_eq!(table.column(5, 1).collect::<Vec<_>>(), vec![Some("0")]);
    }

    #[test]
    fn html_without_table_is_malformed() {
        let err = Table::from_html("<html><body><p>nope</p></body></html>").unwrap_err();
        assert!(matches!(err, ZeroEntryError::MalformedInput(_)));
    }

    #[test]
    fn short_rows_are_padded() {
        let table = Table::from_rows(vec![
            vec![Some("a".into()), Some("b".into())],
            vec![Some("c".into())],
        ]);
        assert_eq!(table.width(), 2);
        assert_eq!(table.rows[1], vec![Some("c".into()), None]);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Table::load(&dir.path().join("stock.xls")).unwrap_err();
        assert!(matches!(err, ZeroEntryError::FileNotFound(_)));
    }

    #[test]
    fn load_sniffs_html_inside_xls() {
        let mut file = tempfile::Builder::new().suffix(".xls").tempfile().unwrap();
        write!(file, "\u{feff}  {EXPORT}").unwrap();
        let table = Table::load(file.path()).unwrap();
        assert_eq!(table.width(), 6);
    }

    #[test]
    fn load_garbage_is_malformed() {
        let mut file = tempfile::Builder::new().suffix(".xls").tempfile().unwrap();
        file.write_all(b"\x00\x01not a workbook at all").unwrap();
        let err = Table::load(file.path()).unwrap_err();
        assert!(matches!(err, ZeroEntryError::MalformedInput(_)));
    }

    #[test]
    fn numeric_cells_render_without_fraction() {
        assert_eq!(cell_string(&Data::Float(12345.0)), Some("12345".into()));
        assert_eq!(cell_string(&Data::Float(0.5)), Some("0.5".into()));
        assert_eq!(cell_string(&Data::Int(7)), Some("7".into()));
        assert_eq!(cell_string(&Data::String("  ".into())), None);
        assert_eq!(cell_string(&Data::Empty), None);
    }
}
