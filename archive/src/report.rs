//! Export-only workbook report.
//!
//! Same cells as the `xlsx` container, but each worksheet carries the
//! table's display label and the header row is bold. Sheet names no longer
//! identify tables, so a report cannot be restored.

use crate::codec::{
    ArchiveCodec, ArchiveFormat, Capabilities, DecodeContext, ReadSeek, RecordVisitor,
    TableWriter, WriteSeek,
};
use crate::error::{ArchiveError, Result};
use crate::outcome::RestoreReport;
use crate::workbook::{SheetStyle, WorkbookWriter};

/// Codec for `xlsx-report` workbooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportCodec;

impl ArchiveCodec for ReportCodec {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::XlsxReport
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            encode: true,
            decode: false,
        }
    }

    fn writer<'w>(&self, out: &'w mut dyn WriteSeek) -> Result<Box<dyn TableWriter + 'w>> {
        Ok(Box::new(WorkbookWriter::new(out, SheetStyle::Report)))
    }

    fn decode(
        &self,
        _input: &mut dyn ReadSeek,
        _ctx: DecodeContext<'_>,
        _visit: &mut RecordVisitor<'_>,
    ) -> Result<RestoreReport> {
        Err(ArchiveError::Unsupported {
            format: ArchiveFormat::XlsxReport,
            operation: "decoding",
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use calamine::{Reader, Xlsx};
    use table_backup_core::Row;

    use super::*;
    use crate::test_support::{books_and_users, decode_all, encode};

    #[test]
    fn test_sheets_are_named_by_display_label() {
        let catalog = books_and_users();
        let users = catalog.by_table_name("Users").unwrap();
        let books = catalog.by_table_name("Books").unwrap();
        let bytes = encode(
            &ReportCodec,
            &[
                (users, vec![Row::new().with("Id", "U001")]),
                (books, vec![Row::new().with("Id", "B001")]),
            ],
        );

        let workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["User(Users)", "Book list(Books)"]);
    }

    #[test]
    fn test_decode_is_unsupported() {
        let err = decode_all(&ReportCodec, Vec::new(), &books_and_users()).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Unsupported {
                format: ArchiveFormat::XlsxReport,
                ..
            }
        ));
    }
}
