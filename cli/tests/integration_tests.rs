use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;

const CATALOG_YAML: &str = r#"tables:
  - name: Users
    type_name: demo.model.User
    columns:
      - name: Id
        kind: text
        primary_key: true
      - name: Name
        kind: text
  - name: Books
    type_name: demo.model.Book
    display_name: Book list
    columns:
      - name: Id
        kind: text
        primary_key: true
      - name: IsRead
        kind: boolean
      - name: Price
        kind: decimal
"#;

fn run(args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_table-backup"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run table-backup")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp path is not valid UTF-8")
}

fn write_catalog(dir: &Path) -> PathBuf {
    let path = dir.join("catalog.yaml");
    fs::write(&path, CATALOG_YAML).expect("failed to write catalog");
    path
}

/// Creates a database holding two users and one book.
fn write_seeded_db(dir: &Path) -> PathBuf {
    let path = dir.join("source.db");
    let conn = rusqlite::Connection::open(&path).expect("failed to open db");
    conn.execute_batch(
        r#"CREATE TABLE "Users" ("Id" TEXT, "Name" TEXT, PRIMARY KEY ("Id"));
           CREATE TABLE "Books" ("Id" TEXT, "IsRead" BOOLEAN, "Price" TEXT, PRIMARY KEY ("Id"));
           INSERT INTO "Users" VALUES ('U001', 'User01');
           INSERT INTO "Users" VALUES ('U002', NULL);
           INSERT INTO "Books" VALUES ('B001', 1, '10.50');"#,
    )
    .expect("failed to seed db");
    path
}

#[test]
fn test_status_of_empty_database() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(dir.path());
    let db = dir.path().join("empty.db");

    let out = run(&["status", "--db", path_str(&db), "--catalog", path_str(&catalog)]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("Tables exist: no"), "{text}");
    assert!(text.contains("Users (demo.model.User): missing"), "{text}");
}

#[test]
fn test_status_json() {
    let dir = tempfile::tempdir().unwrap();
    let db = write_seeded_db(dir.path());

    let out = run(&["status", "--db", path_str(&db), "--json"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let status: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(status["tables_exist"], true);
    assert_eq!(status["tables"][0]["table"], "Users");
    assert_eq!(status["tables"][0]["rows"], 2);
}

#[test]
fn test_backup_then_restore() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(dir.path());
    let source = write_seeded_db(dir.path());
    let archive = dir.path().join("backup.d3b");

    let out = run(&[
        "backup",
        "--db",
        path_str(&source),
        "--catalog",
        path_str(&catalog),
        "--output",
        path_str(&archive),
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("[State] Backing up data..."), "{text}");
    assert!(text.contains("[Progress][50%] (1/2) User(Users)"), "{text}");
    assert!(text.contains("[Progress][100%] (2/2) Book list(Books)"), "{text}");
    assert!(text.contains("Backup complete: 3 rows from 2 tables"), "{text}");
    assert!(archive.exists());

    let target = dir.path().join("target.db");
    let out = run(&[
        "restore",
        "--db",
        path_str(&target),
        "--catalog",
        path_str(&catalog),
        "--input",
        path_str(&archive),
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("[State] Restoring data..."), "{text}");
    assert!(text.contains("[State] Saving changes..."), "{text}");
    assert!(text.contains("Restore complete: 3 records saved"), "{text}");

    let conn = rusqlite::Connection::open(&target).unwrap();
    let price: String = conn
        .query_row("SELECT \"Price\" FROM \"Books\" WHERE \"Id\" = 'B001'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(price, "10.50");
    let name: Option<String> = conn
        .query_row("SELECT \"Name\" FROM \"Users\" WHERE \"Id\" = 'U002'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(name, None);
}

#[test]
fn test_xlsx_backup_and_check() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_seeded_db(dir.path());
    let archive = dir.path().join("backup.xlsx");

    let out = run(&["backup", "--db", path_str(&source), "--output", path_str(&archive)]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let out = run(&["check", "--db", path_str(&source), "--input", path_str(&archive)]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("Check complete: 3 records for 2 tables."), "{text}");
    assert!(text.contains("Users (Users): 2"), "{text}");
}

#[test]
fn test_backup_subset_of_tables() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(dir.path());
    let source = write_seeded_db(dir.path());
    let archive = dir.path().join("books.d3b");

    let out = run(&[
        "backup",
        "--db",
        path_str(&source),
        "--catalog",
        path_str(&catalog),
        "--output",
        path_str(&archive),
        "--tables",
        "demo.model.Book",
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("[Progress][100%] (1/1) Book list(Books)"), "{text}");
    assert!(text.contains("Backup complete: 1 rows from 1 tables"), "{text}");
}

#[test]
fn test_report_cannot_be_restored() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_seeded_db(dir.path());
    let report = dir.path().join("report.xlsx");

    let out = run(&[
        "backup",
        "--db",
        path_str(&source),
        "--output",
        path_str(&report),
        "--format",
        "xlsx-report",
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let out = run(&[
        "restore",
        "--db",
        path_str(&source),
        "--input",
        path_str(&report),
        "--format",
        "xlsx-report",
    ]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("xlsx-report archives do not support restore"));
}

#[test]
fn test_restore_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(dir.path());
    let db = dir.path().join("target.db");

    let out = run(&[
        "restore",
        "--db",
        path_str(&db),
        "--catalog",
        path_str(&catalog),
        "--input",
        path_str(&dir.path().join("missing.d3b")),
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("error: Restore from"));
}

#[test]
fn test_update_schema_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(dir.path());
    let db = write_seeded_db(dir.path());

    let out = run(&[
        "update-schema",
        "--db",
        path_str(&db),
        "--catalog",
        path_str(&catalog),
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("[State] Deleting table schema..."), "{text}");
    assert!(text.contains("[State] Creating table schema..."), "{text}");
    assert!(text.contains("Schema update complete: 3 records restored."), "{text}");
}

#[test]
fn test_custom_texts() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_seeded_db(dir.path());
    let texts = dir.path().join("texts.yaml");
    fs::write(&texts, "backing_up_data: Sicherung läuft...\n").unwrap();

    let out = run(&[
        "backup",
        "--db",
        path_str(&source),
        "--output",
        path_str(&dir.path().join("out.d3b")),
        "--texts",
        path_str(&texts),
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("[State] Sicherung läuft..."));
}
