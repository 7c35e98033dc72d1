//! The `xlsx` container: one worksheet per table.
//!
//! Each worksheet is named after its table. Row 0 holds the column names of
//! the table descriptor, every following row one data row rendered as text.
//! NULL values leave the cell empty.
//!
//! Worksheets are read back by their used range, which ends at the last
//! non-empty row. A trailing row whose values are all NULL is therefore
//! lost on restore; the writer logs a warning when it produces one.

use std::borrow::Cow;

use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::{debug, warn};

use table_backup_core::{CoreError, Row, TableDescriptor, record_from_text};

use crate::codec::{
    ArchiveCodec, ArchiveFormat, Capabilities, DecodeContext, ReadSeek, RecordVisitor,
    TableWriter, WriteSeek,
};
use crate::error::Result;
use crate::notify::percent;
use crate::outcome::RestoreReport;

/// Codec for `xlsx` workbooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkbookCodec;

/// How worksheets are named and headers styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SheetStyle {
    /// Sheet named after the table, plain header.
    Table,
    /// Sheet named after the display label, bold header.
    Report,
}

/// Collects worksheets in memory and exports the workbook on finish.
pub(crate) struct WorkbookWriter<'w> {
    out: &'w mut dyn WriteSeek,
    style: SheetStyle,
    sheets: Vec<Worksheet>,
    names: Vec<String>,
    current: Option<OpenSheet>,
}

struct OpenSheet {
    name: String,
    sheet: Worksheet,
    columns: Vec<String>,
    next_row: u32,
    last_row_blank: bool,
}

impl<'w> WorkbookWriter<'w> {
    pub(crate) fn new(out: &'w mut dyn WriteSeek, style: SheetStyle) -> Self {
        Self {
            out,
            style,
            sheets: Vec::new(),
            names: Vec::new(),
            current: None,
        }
    }

    fn close_sheet(&mut self) {
        if let Some(open) = self.current.take() {
            if open.last_row_blank {
                warn!(sheet = %open.name, "last row has no values and will not survive a restore");
            }
            self.sheets.push(open.sheet);
        }
    }

    fn sheet_name(&self, table: &TableDescriptor) -> String {
        match self.style {
            SheetStyle::Table => table.name.clone(),
            SheetStyle::Report => unique_sheet_name(&table.display_label(), &self.names),
        }
    }
}

impl TableWriter for WorkbookWriter<'_> {
    fn begin_table(&mut self, table: &TableDescriptor) -> Result<()> {
        self.close_sheet();

        let name = self.sheet_name(table);
        let mut sheet = Worksheet::new();
        sheet.set_name(&name)?;
        let bold = Format::new().set_bold();
        for (col, column) in (0u16..).zip(&table.columns) {
            match self.style {
                SheetStyle::Table => sheet.write_string(0, col, &column.name)?,
                SheetStyle::Report => sheet.write_string_with_format(0, col, &column.name, &bold)?,
            };
        }
        debug!(sheet = %name, columns = table.columns.len(), "worksheet started");

        self.names.push(name.clone());
        self.current = Some(OpenSheet {
            name,
            sheet,
            columns: table.columns.iter().map(|c| c.name.clone()).collect(),
            next_row: 1,
            last_row_blank: false,
        });
        Ok(())
    }

    fn write_row(&mut self, row: &Row) -> Result<()> {
        let Some(open) = self.current.as_mut() else {
            return Ok(());
        };
        let mut blank = true;
        for (col, name) in (0u16..).zip(&open.columns) {
            if let Some(value) = row.get(name) {
                open.sheet.write_string(open.next_row, col, value.to_string())?;
                blank = false;
            }
        }
        open.last_row_blank = blank;
        open.next_row += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.close_sheet();
        let mut workbook = Workbook::new();
        for sheet in self.sheets.drain(..) {
            workbook.push_worksheet(sheet);
        }
        let bytes = workbook.save_to_buffer()?;
        self.out.write_all(&bytes)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Makes a label usable as a worksheet name: forbidden characters are
/// replaced, the name is cut to 31 characters and made unique among `taken`.
pub(crate) fn unique_sheet_name(label: &str, taken: &[String]) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('\'');
    let base = if cleaned.is_empty() { "Sheet" } else { cleaned };

    let mut candidate: String = base.chars().take(31).collect();
    let mut n = 2;
    while taken.iter().any(|t| t.eq_ignore_ascii_case(&candidate)) {
        let suffix = format!("~{n}");
        let keep = 31 - suffix.chars().count();
        candidate = base.chars().take(keep).collect::<String>() + &suffix;
        n += 1;
    }
    candidate
}

fn cell_text(cell: &Data) -> Option<Cow<'_, str>> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(Cow::Borrowed(s.as_str())),
        other => Some(Cow::Owned(other.to_string())),
    }
}

impl ArchiveCodec for WorkbookCodec {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Xlsx
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            encode: true,
            decode: true,
        }
    }

    fn writer<'w>(&self, out: &'w mut dyn WriteSeek) -> Result<Box<dyn TableWriter + 'w>> {
        Ok(Box::new(WorkbookWriter::new(out, SheetStyle::Table)))
    }

    fn decode(
        &self,
        input: &mut dyn ReadSeek,
        ctx: DecodeContext<'_>,
        visit: &mut RecordVisitor<'_>,
    ) -> Result<RestoreReport> {
        let mut workbook: Xlsx<_> = Xlsx::new(input)?;
        let sheets = workbook.worksheets();
        let total: u64 = sheets.iter().map(|(_, range)| range.height() as u64).sum();
        debug!(sheets = sheets.len(), rows = total, "workbook loaded");

        let mut report = RestoreReport::default();
        let mut position: u64 = 0;

        for (sheet_name, range) in &sheets {
            let height = range.height() as u64;
            let Some(table) = ctx.catalog.by_table_name(sheet_name) else {
                ctx.notifier.progress(percent(position, total), None);
                warn!(sheet = %sheet_name, "no live table for worksheet; skipping it");
                report.skip(sheet_name);
                position += height;
                continue;
            };
            let label = table.display_label();
            ctx.notifier.progress(percent(position, total), Some(&label));
            if height < 2 {
                position += height;
                continue;
            }

            let mut rows = range.rows();
            let header: Vec<Option<String>> = rows
                .next()
                .unwrap_or_default()
                .iter()
                .map(|cell| cell_text(cell).map(Cow::into_owned))
                .collect();
            position += 1;

            for cells in rows {
                position += 1;
                ctx.notifier.progress(percent(position, total), Some(&label));

                let pairs: Vec<(&str, Option<Cow<'_, str>>)> = header
                    .iter()
                    .zip(cells)
                    .filter_map(|(name, cell)| Some((name.as_deref()?, cell_text(cell))))
                    .collect();
                let record = record_from_text(
                    table,
                    pairs.iter().map(|(name, text)| (*name, text.as_deref())),
                )
                .map_err(|e| {
                    CoreError::serialization(row_payload(&pairs), &table.type_name, e)
                })?;
                report.count_record(&table.name, &table.type_name);
                visit(table, record)?;
            }
        }

        Ok(report)
    }
}

/// Renders a worksheet row as a JSON object for error messages.
fn row_payload(pairs: &[(&str, Option<Cow<'_, str>>)]) -> String {
    let object: serde_json::Map<String, serde_json::Value> = pairs
        .iter()
        .map(|(name, text)| {
            let value = match text {
                Some(text) => serde_json::Value::String(text.to_string()),
                None => serde_json::Value::Null,
            };
            (name.to_string(), value)
        })
        .collect();
    serde_json::Value::Object(object).to_string()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use table_backup_core::{Catalog, ColumnDescriptor, ColumnKind, Value};

    use super::*;
    use crate::d3b::D3bCodec;
    use crate::test_support::{books_and_users, decode_all, encode};

    #[test]
    fn test_round_trip_books() {
        let catalog = books_and_users();
        let books = catalog.by_table_name("Books").unwrap();
        let bytes = encode(
            &WorkbookCodec,
            &[(
                books,
                vec![
                    Row::new()
                        .with("Id", "B001")
                        .with("Name", "Book01")
                        .with("IsRead", false)
                        .with("ReadCount", 0)
                        .with("Price", Decimal::new(1999, 2)),
                    Row::new().with("Id", "B002").with("IsRead", true),
                ],
            )],
        );

        let (report, records) = decode_all(&WorkbookCodec, bytes, &catalog).unwrap();
        assert_eq!(report.count_for("demo.model.Book"), 2);
        assert_eq!(records[0].1.get("Price"), Some(&Value::Decimal(Decimal::new(1999, 2))));
        assert_eq!(records[0].1.get("ReadCount"), Some(&Value::Int32(0)));
        assert_eq!(records[1].1.get("IsRead"), Some(&Value::Bool(true)));
        assert_eq!(records[1].1.get("Name"), None);
    }

    #[test]
    fn test_trailing_blank_row_is_dropped() {
        let notes = TableDescriptor::new("Notes", "demo.model.Note")
            .with_column(ColumnDescriptor::new("Body", ColumnKind::Text))
            .with_column(ColumnDescriptor::new("Rank", ColumnKind::Int32));
        let catalog = Catalog::new(vec![notes.clone()]);
        let rows = vec![
            Row::new().with("Body", "a").with("Rank", 1),
            Row::new(),
            Row::new().with("Body", "c").with("Rank", 3),
            Row::new(),
        ];

        let bytes = encode(&WorkbookCodec, &[(&notes, rows.clone())]);
        let (report, records) = decode_all(&WorkbookCodec, bytes, &catalog).unwrap();
        assert_eq!(report.count_for("demo.model.Note"), 3);
        assert!(records[1].1.values().all(|v| v.is_none()));
        assert_eq!(records[2].1.get("Body"), Some(&Value::from("c")));

        let bytes = encode(&D3bCodec, &[(&notes, rows)]);
        let (report, _) = decode_all(&D3bCodec, bytes, &catalog).unwrap();
        assert_eq!(report.count_for("demo.model.Note"), 4);
    }

    #[test]
    fn test_unknown_and_header_only_sheets_are_skipped() {
        let mut workbook = Workbook::new();
        let gone = workbook.add_worksheet();
        gone.set_name("Gone").unwrap();
        gone.write_string(0, 0, "Id").unwrap();
        gone.write_string(1, 0, "G001").unwrap();
        let users = workbook.add_worksheet();
        users.set_name("Users").unwrap();
        users.write_string(0, 0, "Id").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let (report, records) = decode_all(&WorkbookCodec, bytes, &books_and_users()).unwrap();
        assert!(records.is_empty());
        assert_eq!(report.skipped, vec!["Gone"]);
    }

    #[test]
    fn test_unknown_header_columns_are_ignored() {
        let mut workbook = Workbook::new();
        let users = workbook.add_worksheet();
        users.set_name("Users").unwrap();
        users.write_string(0, 0, "Legacy").unwrap();
        users.write_string(0, 1, "Id").unwrap();
        users.write_string(1, 0, "whatever").unwrap();
        users.write_string(1, 1, "U001").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let (_, records) = decode_all(&WorkbookCodec, bytes, &books_and_users()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1.get("Id"), Some(&Value::from("U001")));
    }

    #[test]
    fn test_numeric_cells_are_coerced() {
        let mut workbook = Workbook::new();
        let books = workbook.add_worksheet();
        books.set_name("Books").unwrap();
        books.write_string(0, 0, "Id").unwrap();
        books.write_string(0, 1, "ReadCount").unwrap();
        books.write_string(1, 0, "B001").unwrap();
        books.write_number(1, 1, 42).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let (_, records) = decode_all(&WorkbookCodec, bytes, &books_and_users()).unwrap();
        assert_eq!(records[0].1.get("ReadCount"), Some(&Value::Int32(42)));
    }

    #[test]
    fn test_bad_cell_is_serialization_error() {
        let mut workbook = Workbook::new();
        let books = workbook.add_worksheet();
        books.set_name("Books").unwrap();
        books.write_string(0, 0, "IsRead").unwrap();
        books.write_string(1, 0, "yes").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let err = decode_all(&WorkbookCodec, bytes, &books_and_users()).unwrap_err();
        assert!(err.as_core().is_some_and(CoreError::is_serialization));
        assert!(err.to_string().contains("yes"));
    }

    #[test]
    fn test_not_a_workbook() {
        let err = decode_all(&WorkbookCodec, b"plain text".to_vec(), &books_and_users()).unwrap_err();
        assert!(matches!(err, crate::error::ArchiveError::WorkbookRead(_)));
    }

    #[test]
    fn test_unique_sheet_name() {
        assert_eq!(unique_sheet_name("Book list(Books)", &[]), "Book list(Books)");
        assert_eq!(unique_sheet_name("a/b:c", &[]), "a_b_c");
        let long = "x".repeat(40);
        assert_eq!(unique_sheet_name(&long, &[]).chars().count(), 31);
        let taken = vec!["User(Users)".to_string()];
        assert_eq!(unique_sheet_name("User(Users)", &taken), "User(Users)~2");
    }
}
