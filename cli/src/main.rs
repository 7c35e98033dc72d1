use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use table_backup_archive::{ArchiveFormat, BackupContext, BackupOptions, TextResource};
use table_backup_core::{Catalog, SchemaLifecycle};
use table_backup_sqlite::SqliteDatabase;

/// CLI-specific archive format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliArchiveFormat {
    D3b,
    Xlsx,
    XlsxReport,
}

impl From<CliArchiveFormat> for ArchiveFormat {
    fn from(fmt: CliArchiveFormat) -> Self {
        match fmt {
            CliArchiveFormat::D3b => Self::D3b,
            CliArchiveFormat::Xlsx => Self::Xlsx,
            CliArchiveFormat::XlsxReport => Self::XlsxReport,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "table-backup")]
#[command(about = "Back up, check and restore the tables of a SQLite database")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write every table of the database to an archive file.
    Backup(BackupArgs),
    /// Parse an archive against the database schema without writing anything.
    Check(CheckArgs),
    /// Restore an archive into the database in one transaction.
    Restore(RestoreArgs),
    /// Show which tables exist and how many rows they hold.
    Status(StatusArgs),
    /// Drop and recreate the schema, keeping the data.
    UpdateSchema(UpdateSchemaArgs),
}

#[derive(Debug, Args)]
struct DatabaseArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Catalog file (YAML or JSON). The schema is read from the database when omitted.
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct BackupArgs {
    #[command(flatten)]
    database: DatabaseArgs,
    /// Archive file to write (default: backup_<timestamp>.<ext> in the current directory).
    #[arg(long)]
    output: Option<PathBuf>,
    /// Archive format (default: from the output extension, else d3b).
    #[arg(long)]
    format: Option<CliArchiveFormat>,
    /// Comma-separated table or type names to back up.
    #[arg(long)]
    tables: Option<String>,
    /// Prefix added to table names when querying.
    #[arg(long)]
    table_prefix: Option<String>,
    /// YAML file overriding the progress and state texts.
    #[arg(long)]
    texts: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CheckArgs {
    #[command(flatten)]
    database: DatabaseArgs,
    /// Archive file to read.
    #[arg(long)]
    input: PathBuf,
    /// Archive format (default: from the input extension, else d3b).
    #[arg(long)]
    format: Option<CliArchiveFormat>,
    /// Print every reconstructed record as JSON.
    #[arg(long)]
    verbose: bool,
    /// YAML file overriding the progress and state texts.
    #[arg(long)]
    texts: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RestoreArgs {
    #[command(flatten)]
    database: DatabaseArgs,
    /// Archive file to read.
    #[arg(long)]
    input: PathBuf,
    /// Archive format (default: from the input extension, else d3b).
    #[arg(long)]
    format: Option<CliArchiveFormat>,
    /// Drop and recreate the tables before restoring.
    #[arg(long)]
    recreate: bool,
    /// YAML file overriding the progress and state texts.
    #[arg(long)]
    texts: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct StatusArgs {
    #[command(flatten)]
    database: DatabaseArgs,
    /// Print the status as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct UpdateSchemaArgs {
    #[command(flatten)]
    database: DatabaseArgs,
    /// YAML file overriding the progress and state texts.
    #[arg(long)]
    texts: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Backup(args) => run_backup(args),
        Command::Check(args) => run_check(args),
        Command::Restore(args) => run_restore(args),
        Command::Status(args) => run_status(args),
        Command::UpdateSchema(args) => run_update_schema(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// backup command
// ---------------------------------------------------------------------------

fn run_backup(args: BackupArgs) -> Result<(), String> {
    let format = resolve_format(args.format, args.output.as_deref());
    let output = args
        .output
        .unwrap_or_else(|| default_output_path(format, chrono::Local::now()));

    let mut db = open_database(&args.database)?;
    let ctx = context(format, args.texts.as_deref())?;

    let mut options = BackupOptions::new();
    let tables = parse_csv_list(args.tables);
    if !tables.is_empty() {
        options = options.with_tables(tables);
    }
    if let Some(prefix) = args.table_prefix {
        options = options.with_table_prefix(prefix);
    }

    let report = ctx
        .backup_file(&mut db, &output, &options)
        .map_err(|e| format!("Backup to '{}' failed: {e}", output.display()))?;

    println!(
        "Backup complete: {} rows from {} tables written to '{}'.",
        report.row_count(),
        report.tables.len(),
        output.display()
    );
    if !report.empty.is_empty() {
        println!("  Empty tables: {}", report.empty.join(", "));
    }
    if !report.skipped.is_empty() {
        println!("Skipped tables:");
        for skipped in &report.skipped {
            println!("  {}: {}", skipped.table, skipped.reason);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// check command
// ---------------------------------------------------------------------------

fn run_check(args: CheckArgs) -> Result<(), String> {
    let format = resolve_format(args.format, Some(&args.input));
    let db = open_database(&args.database)?;
    let ctx = context(format, args.texts.as_deref())?;

    let verbose = args.verbose;
    let report = ctx
        .check_file(&db, &args.input, |table, record| {
            if verbose {
                println!("{} {}", table.type_name, record.to_pretty_json());
            }
        })
        .map_err(|e| format!("Check of '{}' failed: {e}", args.input.display()))?;

    println!(
        "Check complete: {} records for {} tables.",
        report.record_count(),
        report.tables.len()
    );
    for count in &report.tables {
        println!("  {} ({}): {}", count.table, count.type_name, count.rows);
    }
    print_ignored(&report.skipped);
    Ok(())
}

// ---------------------------------------------------------------------------
// restore command
// ---------------------------------------------------------------------------

fn run_restore(args: RestoreArgs) -> Result<(), String> {
    let format = resolve_format(args.format, Some(&args.input));
    let mut db = open_database(&args.database)?;
    let ctx = context(format, args.texts.as_deref())?;

    if args.recreate {
        db.ensure_deleted()
            .map_err(|e| format!("Failed to drop tables: {e}"))?;
    }
    db.ensure_created()
        .map_err(|e| format!("Failed to create tables: {e}"))?;

    let report = ctx
        .restore_file(&mut db, &args.input, |_, _| {})
        .map_err(|e| format!("Restore from '{}' failed: {e}", args.input.display()))?;

    println!(
        "Restore complete: {} records saved to '{}'.",
        report.saved,
        args.database.db.display()
    );
    print_ignored(&report.skipped);
    Ok(())
}

// ---------------------------------------------------------------------------
// status command
// ---------------------------------------------------------------------------

fn run_status(args: StatusArgs) -> Result<(), String> {
    let db = open_database(&args.database)?;
    let status = db
        .status()
        .map_err(|e| format!("Failed to get database status: {e}"))?;

    if args.json {
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| format!("Failed to serialize status: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    println!("Database Status:");
    println!(
        "  Tables exist: {}",
        if status.tables_exist { "yes" } else { "no" }
    );
    for table in &status.tables {
        if table.exists {
            println!("  {} ({}): {} rows", table.table, table.type_name, table.rows);
        } else {
            println!("  {} ({}): missing", table.table, table.type_name);
        }
    }
    println!("  Total rows: {}", status.total_rows());
    Ok(())
}

// ---------------------------------------------------------------------------
// update-schema command
// ---------------------------------------------------------------------------

fn run_update_schema(args: UpdateSchemaArgs) -> Result<(), String> {
    let mut db = open_database(&args.database)?;
    let ctx = context(ArchiveFormat::D3b, args.texts.as_deref())?;

    let report = ctx
        .update_schema(&mut db)
        .map_err(|e| format!("Schema update failed: {e}"))?;

    println!(
        "Schema update complete: {} records restored.",
        report.saved
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Opens the database, with the catalog from a file or from the database itself.
fn open_database(args: &DatabaseArgs) -> Result<SqliteDatabase, String> {
    tracing::debug!(db = %args.db.display(), catalog = ?args.catalog, "opening database");
    let conn = rusqlite::Connection::open(&args.db)
        .map_err(|e| format!("Failed to open database '{}': {e}", args.db.display()))?;
    match &args.catalog {
        Some(path) => {
            let catalog = Catalog::load(path)
                .map_err(|e| format!("Failed to load catalog '{}': {e}", path.display()))?;
            SqliteDatabase::new(conn, catalog)
                .map_err(|e| format!("Failed to initialize database: {e}"))
        }
        None => SqliteDatabase::introspect(conn)
            .map_err(|e| format!("Failed to read database schema: {e}")),
    }
}

/// Builds a context printing progress and state lines to stdout.
fn context(format: ArchiveFormat, texts: Option<&Path>) -> Result<BackupContext, String> {
    let texts = match texts {
        Some(path) => TextResource::load(path)
            .map_err(|e| format!("Failed to load texts '{}': {e}", path.display()))?,
        None => TextResource::default(),
    };
    Ok(BackupContext::for_format(format)
        .with_texts(texts)
        .with_progress(|percent, label| println!("{}", progress_line(percent, label)))
        .with_state(|text| println!("[State] {text}")))
}

fn progress_line(percent: u8, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("[Progress][{percent:02}%] {label}"),
        None => format!("[Progress][{percent:02}%]"),
    }
}

/// Picks the explicit format, else the one implied by the file extension, else d3b.
fn resolve_format(explicit: Option<CliArchiveFormat>, path: Option<&Path>) -> ArchiveFormat {
    explicit
        .map(ArchiveFormat::from)
        .or_else(|| path.and_then(|p| ArchiveFormat::from_path(p)))
        .unwrap_or(ArchiveFormat::D3b)
}

fn default_output_path<Tz: chrono::TimeZone>(
    format: ArchiveFormat,
    now: chrono::DateTime<Tz>,
) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    let extension = match format {
        ArchiveFormat::D3b => "d3b",
        ArchiveFormat::Xlsx | ArchiveFormat::XlsxReport => "xlsx",
    };
    PathBuf::from(format!(
        "backup_{}.{extension}",
        now.format("%Y%m%d_%H%M%S")
    ))
}

fn print_ignored(groups: &[String]) {
    if !groups.is_empty() {
        println!("Ignored archive groups (no matching table):");
        for group in groups {
            println!("  {group}");
        }
    }
}

/// Splits a comma-separated list, dropping blanks.
fn parse_csv_list(raw: Option<String>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect()
    })
    .unwrap_or_default()
}
