use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn aquabot_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("aquabot");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    fs::write(
        data_dir.join("faq.csv"),
        "Question,Réponse\n\
         Comment puis-je payer ma facture en ligne ?,Vous pouvez payer votre facture en ligne via notre site web.\n\
         Comment signaler une fuite d'eau ?,Veuillez contacter notre service client immédiatement.\n",
    )
    .unwrap();

    // Embedding provider deliberately disabled: structured flows run via
    // --intent; free-text routing is expected to fail cleanly.
    let config_content = format!(
        r#"[db]
path = "{root}/data/aquabot.sqlite"

[dataset]
path = "{root}/data/faq.csv"

[server]
bind = "127.0.0.1:7411"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("aquabot.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_aquabot(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = aquabot_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run aquabot binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_aquabot(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data").join("aquabot.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_aquabot(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_aquabot(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_seed_reports_row_counts() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_aquabot(&config_path, &["seed"]);
    assert!(success, "seed failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("consumption rows: 6"));
    assert!(stdout.contains("invoice rows: 4"));
}

#[test]
fn test_seed_appends_on_rerun() {
    let (_tmp, config_path) = setup_test_env();

    // No uniqueness constraint: a second seed appends and still succeeds.
    let (_, _, success1) = run_aquabot(&config_path, &["seed"]);
    assert!(success1);
    let (_, _, success2) = run_aquabot(&config_path, &["seed"]);
    assert!(success2, "Second seed should append, not fail");
}

#[test]
fn test_consumption_lookup_returns_seeded_value() {
    let (_tmp, config_path) = setup_test_env();

    run_aquabot(&config_path, &["seed"]);
    let (stdout, _, success) = run_aquabot(
        &config_path,
        &[
            "ask",
            "ma consommation",
            "--intent",
            "consumption",
            "--account",
            "123456",
            "--month",
            "2023-07",
        ],
    );
    assert!(success);
    assert!(
        stdout.contains("20.5"),
        "Expected seeded volume in reply, got: {}",
        stdout
    );
    assert!(stdout.contains("2023-07"));
}

#[test]
fn test_consumption_lookup_absent_pair() {
    let (_tmp, config_path) = setup_test_env();

    run_aquabot(&config_path, &["seed"]);
    let (stdout, _, success) = run_aquabot(
        &config_path,
        &[
            "ask",
            "ma consommation",
            "--intent",
            "consumption",
            "--account",
            "999999",
            "--month",
            "2023-07",
        ],
    );
    assert!(success, "Absent pair should answer, not crash");
    assert!(
        stdout.contains("incorrect"),
        "Expected the negative message, got: {}",
        stdout
    );
}

#[test]
fn test_consumption_lookup_missing_fields_prompts() {
    let (_tmp, config_path) = setup_test_env();

    run_aquabot(&config_path, &["seed"]);
    let (stdout, _, success) = run_aquabot(
        &config_path,
        &["ask", "ma consommation", "--intent", "consumption"],
    );
    assert!(success);
    assert!(
        stdout.contains("valides"),
        "Expected the missing-input prompt, got: {}",
        stdout
    );
}

#[test]
fn test_invoice_lookup_lists_all_rows() {
    let (_tmp, config_path) = setup_test_env();

    run_aquabot(&config_path, &["seed"]);
    let (stdout, _, success) = run_aquabot(
        &config_path,
        &["ask", "mes factures", "--intent", "invoice", "--account", "654321"],
    );
    assert!(success);
    assert!(stdout.contains("Voici vos factures"));
    assert!(stdout.contains("200.00"));
    assert!(stdout.contains("210.00"));
    assert!(stdout.contains("Non payée"));
    assert!(stdout.contains("2023-07-20"));
}

#[test]
fn test_invoice_lookup_month_filter() {
    let (_tmp, config_path) = setup_test_env();

    run_aquabot(&config_path, &["seed"]);
    let (stdout, _, success) = run_aquabot(
        &config_path,
        &[
            "ask",
            "ma facture",
            "--intent",
            "invoice",
            "--account",
            "654321",
            "--month",
            "2023-08",
        ],
    );
    assert!(success);
    assert!(stdout.contains("210.00"));
    assert!(stdout.contains("Non payée"));
    assert!(
        !stdout.contains("200.00"),
        "Month filter should exclude the other invoice, got: {}",
        stdout
    );
}

#[test]
fn test_invoice_lookup_unknown_account() {
    let (_tmp, config_path) = setup_test_env();

    run_aquabot(&config_path, &["seed"]);
    let (stdout, _, success) = run_aquabot(
        &config_path,
        &["ask", "mes factures", "--intent", "invoice", "--account", "000000"],
    );
    assert!(success);
    assert!(stdout.contains("Aucune facture"));
}

#[test]
fn test_unknown_intent_rejected() {
    let (_tmp, config_path) = setup_test_env();

    run_aquabot(&config_path, &["seed"]);
    let (_, stderr, success) = run_aquabot(
        &config_path,
        &["ask", "bonjour", "--intent", "telepathy"],
    );
    assert!(!success, "Unknown intent should fail");
    assert!(stderr.contains("Unknown intent"));
}

#[test]
fn test_ask_freeform_errors_when_embeddings_disabled() {
    let (_tmp, config_path) = setup_test_env();

    run_aquabot(&config_path, &["seed"]);
    let (_, stderr, success) = run_aquabot(&config_path, &["ask", "Combien dois-je payer ?"]);
    assert!(!success, "Free-text routing needs an embedding provider");
    assert!(
        stderr.contains("disabled"),
        "Should mention the disabled provider, got: {}",
        stderr
    );
}

#[test]
fn test_serve_errors_when_embeddings_disabled() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_aquabot(&config_path, &["serve"]);
    assert!(!success, "serve should fail fast without embeddings");
    assert!(
        stderr.contains("embeddings"),
        "Should mention embeddings, got: {}",
        stderr
    );
}

#[test]
fn test_faq_lists_dataset() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_aquabot(&config_path, &["faq"]);
    assert!(success);
    assert!(stdout.contains("2 entries"));
    assert!(stdout.contains("fuite d'eau"));
}

#[test]
fn test_faq_missing_dataset_fails() {
    let (tmp, config_path) = setup_test_env();

    fs::remove_file(tmp.path().join("data").join("faq.csv")).unwrap();
    let (_, stderr, success) = run_aquabot(&config_path, &["faq"]);
    assert!(!success, "Missing dataset should abort");
    assert!(stderr.contains("Failed to read FAQ dataset"));
}

#[test]
fn test_faq_missing_column_fails() {
    let (tmp, config_path) = setup_test_env();

    fs::write(
        tmp.path().join("data").join("faq.csv"),
        "Question,Answer\nQ1,R1\n",
    )
    .unwrap();
    let (_, stderr, success) = run_aquabot(&config_path, &["faq"]);
    assert!(!success, "Missing Réponse column should abort");
    assert!(stderr.contains("Réponse"));
}

#[test]
fn test_missing_config_fails() {
    let (tmp, _) = setup_test_env();

    let bogus = tmp.path().join("nope.toml");
    let binary = aquabot_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(bogus.to_str().unwrap())
        .arg("init")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read config file"));
}
