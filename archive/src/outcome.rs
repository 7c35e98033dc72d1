//! Summaries returned by backup, check and restore runs.

use serde::Serialize;

/// Number of rows written or records read for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub table: String,
    pub type_name: String,
    pub rows: usize,
}

/// A table that could not be queried during backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTable {
    pub table: String,
    pub reason: String,
}

/// Outcome of a backup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackupReport {
    /// Tables that contributed a group, in archive order.
    pub tables: Vec<TableCount>,
    /// Tables that were queried but had no rows.
    pub empty: Vec<String>,
    /// Tables whose query failed.
    pub skipped: Vec<SkippedTable>,
}

impl BackupReport {
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

/// Outcome of a check or restore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    /// Records reconstructed per table, in archive order.
    pub tables: Vec<TableCount>,
    /// Markers or worksheet names with no counterpart in the live schema.
    pub skipped: Vec<String>,
    /// Records committed by a restore. Always zero for a check.
    pub saved: usize,
}

impl RestoreReport {
    pub fn record_count(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }

    /// Records reconstructed for a record type, if any.
    pub fn count_for(&self, type_name: &str) -> usize {
        self.tables
            .iter()
            .filter(|t| t.type_name == type_name)
            .map(|t| t.rows)
            .sum()
    }

    pub(crate) fn count_record(&mut self, table: &str, type_name: &str) {
        match self.tables.last_mut() {
            Some(last) if last.type_name == type_name => last.rows += 1,
            _ => self.tables.push(TableCount {
                table: table.to_string(),
                type_name: type_name.to_string(),
                rows: 1,
            }),
        }
    }

    pub(crate) fn skip(&mut self, name: &str) {
        if !self.skipped.iter().any(|s| s == name) {
            self.skipped.push(name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_record_groups_consecutive_records() {
        let mut report = RestoreReport::default();
        report.count_record("Users", "demo.User");
        report.count_record("Users", "demo.User");
        report.count_record("Books", "demo.Book");
        report.count_record("Users", "demo.User");

        assert_eq!(report.tables.len(), 3);
        assert_eq!(report.count_for("demo.User"), 3);
        assert_eq!(report.record_count(), 4);
    }

    #[test]
    fn test_skip_is_deduplicated() {
        let mut report = RestoreReport::default();
        report.skip("demo.Gone");
        report.skip("demo.Gone");
        assert_eq!(report.skipped, vec!["demo.Gone"]);
    }
}
