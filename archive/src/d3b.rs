//! The `d3b` container: a zip archive with one deflated `DATA` entry.
//!
//! The entry is UTF-8 text, one item per line:
//!
//! ```text
//! #demo.model.User
//! {"Id":"U001","Name":"User01"}
//! {"Id":"U002","Name":"User02"}
//! #demo.model.Book
//! {"Id":"B001","Name":"Book01","IsRead":false}
//! ```
//!
//! A `#` line names the record type of the rows that follow; each `{` line is
//! one row as a JSON object with NULL columns omitted. Blank lines and other
//! zip entries are ignored on read.

use std::io::{BufRead, BufReader, Write};

use tracing::{debug, warn};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use table_backup_core::{CoreError, Row, TableDescriptor, record_from_json};

use crate::codec::{
    ArchiveCodec, ArchiveFormat, Capabilities, DecodeContext, ReadSeek, RecordVisitor,
    TableWriter, WriteSeek,
};
use crate::error::Result;
use crate::notify::percent;
use crate::outcome::RestoreReport;

/// Name of the zip entry holding the data lines.
pub const DATA_ENTRY: &str = "DATA";

/// Codec for `d3b` archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct D3bCodec;

struct D3bWriter<'w> {
    zip: ZipWriter<&'w mut dyn WriteSeek>,
}

impl TableWriter for D3bWriter<'_> {
    fn begin_table(&mut self, table: &TableDescriptor) -> Result<()> {
        writeln!(self.zip, "#{}", table.type_name)?;
        Ok(())
    }

    fn write_row(&mut self, row: &Row) -> Result<()> {
        serde_json::to_writer(&mut self.zip, row)?;
        self.zip.write_all(b"\n")?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let writer = *self;
        writer.zip.finish()?;
        Ok(())
    }
}

impl ArchiveCodec for D3bCodec {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::D3b
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            encode: true,
            decode: true,
        }
    }

    fn writer<'w>(&self, out: &'w mut dyn WriteSeek) -> Result<Box<dyn TableWriter + 'w>> {
        let mut zip = ZipWriter::new(out);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(DATA_ENTRY, options)?;
        Ok(Box::new(D3bWriter { zip }))
    }

    fn decode(
        &self,
        input: &mut dyn ReadSeek,
        ctx: DecodeContext<'_>,
        visit: &mut RecordVisitor<'_>,
    ) -> Result<RestoreReport> {
        let mut archive = ZipArchive::new(input)?;
        let entry = match archive.by_name(DATA_ENTRY) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                return Err(CoreError::NoData(ctx.texts.no_data.clone()).into());
            }
            Err(e) => return Err(e.into()),
        };
        let total = entry.size();
        debug!(total, "reading {DATA_ENTRY} entry");

        let mut report = RestoreReport::default();
        let mut current: Option<&TableDescriptor> = None;
        let mut position: u64 = 0;
        let mut label: Option<String> = None;

        for line in BufReader::new(entry).lines() {
            let line = line?;
            position += line.len() as u64 + 1;
            if line.trim().is_empty() {
                continue;
            }

            if let Some(type_name) = line.strip_prefix('#') {
                current = ctx.catalog.by_type_name(type_name);
                label = current.map(TableDescriptor::display_label);
                if current.is_none() {
                    warn!(marker = type_name, "no live table for archive marker; skipping its rows");
                    report.skip(type_name);
                }
                ctx.notifier.progress(percent(position, total), label.as_deref());
            } else if line.starts_with('{') {
                let Some(table) = current else {
                    continue;
                };
                ctx.notifier.progress(percent(position, total), label.as_deref());

                let object: serde_json::Map<String, serde_json::Value> =
                    serde_json::from_str(&line)
                        .map_err(|e| CoreError::serialization(line.as_str(), &table.type_name, e))?;
                let record = record_from_json(table, &object)
                    .map_err(|e| CoreError::serialization(line.as_str(), &table.type_name, e))?;
                report.count_record(&table.name, &table.type_name);
                visit(table, record)?;
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use table_backup_core::{Record, Value};

    use super::*;
    use crate::error::ArchiveError;
    use crate::test_support::{books_and_users, decode_all, encode};

    fn data_entry(bytes: Vec<u8>) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entry = archive.by_name(DATA_ENTRY).unwrap();
        let mut text = String::new();
        entry.read_to_string(&mut text).unwrap();
        text
    }

    fn archive_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(&mut out);
        for (name, content) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        out.into_inner()
    }

    #[test]
    fn test_encode_writes_markers_and_json_lines() {
        let catalog = books_and_users();
        let users = catalog.by_table_name("Users").unwrap();
        let bytes = encode(
            &D3bCodec,
            &[(
                users,
                vec![
                    Row::new().with("Id", "U001").with("Name", "User01"),
                    Row::new().with("Id", "U002"),
                ],
            )],
        );

        assert_eq!(
            data_entry(bytes),
            "#demo.model.User\n{\"Id\":\"U001\",\"Name\":\"User01\"}\n{\"Id\":\"U002\"}\n"
        );
    }

    #[test]
    fn test_empty_backup_still_has_data_entry() {
        let bytes = encode(&D3bCodec, &[]);
        assert_eq!(data_entry(bytes), "");
    }

    #[test]
    fn test_decode_skips_unknown_markers_and_blank_lines() {
        let bytes = archive_with(&[
            ("README", "not data"),
            (
                DATA_ENTRY,
                "#demo.model.Gone\n{\"X\":1}\n\n#demo.model.User\n{\"Id\":\"U001\",\"Name\":\"User01\"}\n",
            ),
        ]);

        let (report, records) = decode_all(&D3bCodec, bytes, &books_and_users()).unwrap();
        assert_eq!(report.skipped, vec!["demo.model.Gone"]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1.get("Name"), Some(&Value::from("User01")));
    }

    #[test]
    fn test_decode_without_data_entry_is_no_data_error() {
        let bytes = archive_with(&[("OTHER", "x")]);
        let err = decode_all(&D3bCodec, bytes, &books_and_users()).unwrap_err();
        match err {
            ArchiveError::Core(CoreError::NoData(text)) => {
                assert_eq!(text, "Database backup file has no data.")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_rejects_malformed_json_line() {
        let bytes = archive_with(&[(DATA_ENTRY, "#demo.model.User\n{\"Id\":\n")]);
        let err = decode_all(&D3bCodec, bytes, &books_and_users()).unwrap_err();
        assert!(err.as_core().is_some_and(CoreError::is_serialization));
        assert!(err.to_string().contains("demo.model.User"));
    }

    #[test]
    fn test_decode_rejects_uncoercible_value() {
        let bytes = archive_with(&[(
            DATA_ENTRY,
            "#demo.model.Book\n{\"Id\":\"B001\",\"IsRead\":\"maybe\"}\n",
        )]);
        let err = decode_all(&D3bCodec, bytes, &books_and_users()).unwrap_err();
        assert!(err.as_core().is_some_and(CoreError::is_serialization));
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_missing_and_null_fields_decode_to_null() {
        let bytes = archive_with(&[(
            DATA_ENTRY,
            "#demo.model.Book\n{\"Id\":\"B001\"}\n{\"Id\":\"B002\",\"ReadCount\":null}\n",
        )]);
        let (_, records) = decode_all(&D3bCodec, bytes, &books_and_users()).unwrap();
        let counts: Vec<Option<&Value>> = records
            .iter()
            .map(|(_, r): &(String, Record)| r.get("ReadCount"))
            .collect();
        assert_eq!(counts, vec![None, None]);
    }
}
