//! Fixtures shared by the codec and orchestrator tests.

use std::io::Cursor;

use table_backup_core::{Catalog, ColumnDescriptor, ColumnKind, Record, Row, TableDescriptor};

use crate::codec::{ArchiveCodec, DecodeContext};
use crate::error::Result;
use crate::notify::Notifier;
use crate::outcome::RestoreReport;
use crate::text::TextResource;

pub(crate) fn books_and_users() -> Catalog {
    Catalog::new(vec![
        TableDescriptor::new("Users", "demo.model.User")
            .with_column(ColumnDescriptor::new("Id", ColumnKind::Text).primary_key())
            .with_column(ColumnDescriptor::new("Name", ColumnKind::Text)),
        TableDescriptor::new("Books", "demo.model.Book")
            .with_display_name("Book list")
            .with_column(ColumnDescriptor::new("Id", ColumnKind::Text).primary_key())
            .with_column(ColumnDescriptor::new("Name", ColumnKind::Text))
            .with_column(ColumnDescriptor::new("IsRead", ColumnKind::Boolean))
            .with_column(ColumnDescriptor::new("ReadCount", ColumnKind::Int32))
            .with_column(ColumnDescriptor::new("Price", ColumnKind::Decimal)),
    ])
}

pub(crate) fn encode(codec: &dyn ArchiveCodec, groups: &[(&TableDescriptor, Vec<Row>)]) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    let mut writer = codec.writer(&mut out).unwrap();
    for (table, rows) in groups {
        writer.begin_table(table).unwrap();
        for row in rows {
            writer.write_row(row).unwrap();
        }
    }
    writer.finish().unwrap();
    out.into_inner()
}

pub(crate) fn decode_all(
    codec: &dyn ArchiveCodec,
    bytes: Vec<u8>,
    catalog: &Catalog,
) -> Result<(RestoreReport, Vec<(String, Record)>)> {
    let notifier = Notifier::default();
    let texts = TextResource::default();
    let ctx = DecodeContext {
        catalog,
        notifier: &notifier,
        texts: &texts,
    };
    let mut records = Vec::new();
    let report = codec.decode(&mut Cursor::new(bytes), ctx, &mut |table, record| {
        records.push((table.name.clone(), record));
        Ok(())
    })?;
    Ok((report, records))
}
