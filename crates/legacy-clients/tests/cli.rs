use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../legacy-clients-parser/tests/data")
        .join(name)
        .display()
        .to_string()
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_legacy-clients"))
        .args(args)
        .env_remove("LEGACY_CLIENTS_INPUT")
        .env_remove("DATABASE_URL")
        .env_remove("LEGACY_CLIENTS_DATABASE_URL")
        .env("RUST_LOG", "warn")
        .output()
        .expect("run legacy-clients")
}

#[test]
fn emit_sql_writes_script_to_stdout() {
    let input = fixture("clients.csv");
    let output = run(&["emit-sql", "--input", &input, "--batch-size", "3"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let sql = String::from_utf8(output.stdout).expect("utf8 sql");
    assert!(sql.contains("BEGIN;"));
    assert!(sql.contains("COMMIT;"));
    assert_eq!(sql.matches("INSERT INTO").count(), 2);
    assert!(sql.contains("'O''Brien"));
    assert!(!sql.contains("-- Batch 3"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Skipped (missing id)"));
}

#[test]
fn emit_sql_split_dir_writes_batch_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("batches");
    let input = fixture("clients.csv");
    let output = run(&[
        "emit-sql",
        "--input",
        &input,
        "--batch-size",
        "2",
        "--split-dir",
        out.to_str().expect("utf8 path"),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(out.join("batch_001.sql").is_file());
    assert!(out.join("batch_002.sql").is_file());
    assert!(!out.join("batch_003.sql").exists());
}

#[test]
fn preview_prints_normalized_records() {
    let input = fixture("clients.csv");
    let output = run(&["preview", "--input", &input, "-n", "2"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Agro Forte"));
    assert!(stdout.contains("Cafe Santa Rita Ltda"));
    assert!(!stdout.contains("1860"));
    assert!(stdout.contains("2 record(s) shown"));
}

#[test]
fn missing_input_fails() {
    let output = run(&["emit-sql", "--input", &fixture("nope.csv")]);
    assert!(!output.status.success());
}

#[test]
fn zero_batch_size_is_rejected() {
    let input = fixture("clients.csv");
    let output = run(&["emit-sql", "--input", &input, "--batch-size", "0"]);
    assert!(!output.status.success());
}

#[test]
fn migrate_rejects_custom_destination_before_connecting() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("loader.toml");
    std::fs::write(&config, "[destination]\ntable = \"clientes_legado\"\n").expect("write config");

    let output = run(&["migrate", "--config", config.to_str().expect("utf8 path")]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("migrations only create"), "{stderr}");
}
