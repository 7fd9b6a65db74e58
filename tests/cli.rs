//! CLI test cases.
//!
//! These run entirely offline, using the `plain-text` OCR engine and the
//! `echo` enricher. Textract and Bedrock need real AWS credentials, so we
//! only exercise them by hand.

use std::{fs, process::Command};

use assert_cmd::prelude::*;
use predicates::prelude::*;

/// Create a new `Command` with our binary.
fn cmd() -> Command {
    Command::cargo_bin("menu-scaler").unwrap()
}

#[test]
fn test_help() {
    cmd().arg("--help").assert().success();
}

#[test]
fn test_version() {
    cmd().arg("--version").assert().success();
}

#[test]
fn test_extract_plain_text() {
    cmd()
        .arg("extract")
        .arg("tests/fixtures/menus/diner.txt")
        .arg("--engine")
        .arg("plain-text")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""text": "JOE'S DINER""#))
        .stdout(predicate::str::contains(r#""text": "STARTERS""#))
        .stdout(predicate::str::contains(r#""item": "Spring Rolls""#))
        .stdout(predicate::str::contains(r#""price": "$6.50""#))
        .stdout(predicate::str::contains(
            r#""description": "Crispy vegetable rolls with sweet chili sauce""#,
        ))
        .stdout(predicate::str::contains(r#""item": "Soup of the Day""#))
        .stdout(predicate::str::contains(r#""price": "5""#));
}

#[test]
fn test_extract_from_stdin_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("menu.json");
    assert_cmd::Command::cargo_bin("menu-scaler")
        .unwrap()
        .arg("extract")
        .arg("--engine")
        .arg("plain-text")
        .arg("-o")
        .arg(&out)
        .write_stdin("SOUPS\nPho 12\nBeef broth\n")
        .assert()
        .success();

    let records: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(
        records,
        serde_json::json!([
            { "type": "header", "text": "SOUPS" },
            { "item": "Pho", "price": "12", "description": "Beef broth" },
        ])
    );
}

#[test]
fn test_extract_strict_prices_from_config() {
    cmd()
        .arg("extract")
        .arg("tests/fixtures/menus/diner.txt")
        .arg("--engine")
        .arg("plain-text")
        .arg("--config")
        .arg("tests/fixtures/menus/config.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#""description": "Crispy vegetable rolls with sweet chili sauce Soup of the Day 5""#,
        ))
        .stdout(predicate::str::contains(r#""item": "Soup of the Day""#).not());
}

#[test]
fn test_extract_multiple_prices() {
    cmd()
        .arg("extract")
        .arg("tests/fixtures/menus/two_prices.txt")
        .arg("--engine")
        .arg("plain-text")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""price": "3""#));

    cmd()
        .arg("extract")
        .arg("tests/fixtures/menus/two_prices.txt")
        .arg("--engine")
        .arg("plain-text")
        .arg("--multiple-prices")
        .arg("treat-as-text")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""text": "Coffee 3 / 4""#))
        .stdout(predicate::str::contains(r#""item": "Tea""#));
}

#[test]
fn test_extract_missing_input() {
    cmd()
        .arg("extract")
        .arg("tests/fixtures/menus/no_such_menu.txt")
        .arg("--engine")
        .arg("plain-text")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no_such_menu.txt"));
}

#[test]
fn test_render_echo() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .arg("render")
        .arg("tests/fixtures/menus/diner.json")
        .arg("--out-dir")
        .arg(dir.path())
        .arg("--enricher")
        .arg("echo")
        .arg("-j")
        .arg("2")
        .arg("--rate-limit")
        .arg("100/s")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""html_key": "menu.html""#))
        .stdout(predicate::str::contains("images/spring_rolls.png"))
        .stdout(predicate::str::contains("images/pho_bo.png"))
        .stdout(predicate::str::contains("images/pho_bo_2.png"));

    assert!(dir.path().join("images/spring_rolls.png").exists());
    assert!(dir.path().join("images/pho_bo_2.png").exists());

    let html = fs::read_to_string(dir.path().join("menu.html")).unwrap();
    assert!(html.contains("<title>Our Menu</title>"));
    assert!(html.contains("<h2>STARTERS</h2>"));
    assert!(html.contains("Spring Rolls, as listed on the menu."));
    assert!(html.contains("Pho &lt;Bo&gt;"));
    assert!(html.contains(r#"src="images/pho_bo.png""#));

    let menu: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("menu.json")).unwrap())
            .unwrap();
    assert_eq!(menu[1]["status"], "ok");
    assert_eq!(menu[1]["menu_description"], "Crispy vegetable rolls");
    assert_eq!(menu[3]["image_key"], "images/pho_bo_2.png");
}

#[test]
fn test_render_inline_images() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .arg("render")
        .arg("tests/fixtures/menus/diner.json")
        .arg("--out-dir")
        .arg(dir.path())
        .arg("--enricher")
        .arg("echo")
        .arg("--inline-images")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""image_keys": []"#));

    assert!(!dir.path().join("images").exists());
    let html = fs::read_to_string(dir.path().join("menu.html")).unwrap();
    assert!(html.contains("data:image/png;base64,"));
}

#[test]
fn test_render_custom_template_and_config() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .arg("render")
        .arg("tests/fixtures/menus/diner.json")
        .arg("--out-dir")
        .arg(dir.path())
        .arg("--enricher")
        .arg("echo")
        .arg("--template")
        .arg("tests/fixtures/menus/cards.hbs")
        .arg("--config")
        .arg("tests/fixtures/menus/config.toml")
        .assert()
        .success();

    let html = fs::read_to_string(dir.path().join("menu.html")).unwrap();
    assert!(html.contains("Diner"));
    assert!(html.contains("Spring Rolls=$6.50"));
    assert!(html.contains("Pho &lt;Bo&gt;=$12.95"));
}

#[test]
fn test_render_rejects_bad_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[render]\nheading = \"typo\"\n").unwrap();
    cmd()
        .arg("render")
        .arg("tests/fixtures/menus/diner.json")
        .arg("--out-dir")
        .arg(dir.path())
        .arg("--enricher")
        .arg("echo")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure();
    assert!(!dir.path().join("menu.html").exists());
}

#[test]
fn test_schemas() {
    for (schema_type, field) in [
        ("MenuRecord", "price"),
        ("EnrichedRecord", "image_key"),
        ("MenuConfig", "strict_prices"),
    ] {
        cmd()
            .arg("schema")
            .arg(schema_type)
            .assert()
            .success()
            .stdout(predicate::str::contains(field));
    }
}

#[test]
fn test_extract_cli_relaxes_strict_config() {
    cmd()
        .arg("extract")
        .arg("tests/fixtures/menus/diner.txt")
        .arg("--engine")
        .arg("plain-text")
        .arg("--config")
        .arg("tests/fixtures/menus/config.toml")
        .arg("--no-strict-prices")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""item": "Soup of the Day""#));
}

#[test]
fn test_extract_config_without_extension() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("menu.conf");
    fs::write(&config, "[segment]\nstrict_prices = true\n").unwrap();
    cmd()
        .arg("extract")
        .arg("tests/fixtures/menus/diner.txt")
        .arg("--engine")
        .arg("plain-text")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""item": "Soup of the Day""#).not());
}

#[test]
fn test_render_rejects_malformed_prices() {
    let dir = tempfile::tempdir().unwrap();
    let menu = dir.path().join("menu.json");
    fs::write(
        &menu,
        r#"[{"item":"Soup","price":"$5"},{"item":"Tea","price":"free"}]"#,
    )
    .unwrap();
    cmd()
        .arg("render")
        .arg(&menu)
        .arg("--out-dir")
        .arg(dir.path().join("site"))
        .arg("--enricher")
        .arg("echo")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid price"));
    assert!(!dir.path().join("site").exists());
}

#[test]
fn test_render_image_base_url() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .arg("render")
        .arg("tests/fixtures/menus/diner.json")
        .arg("--out-dir")
        .arg(dir.path())
        .arg("--enricher")
        .arg("echo")
        .arg("--image-base-url")
        .arg("https://menus.example.com/lunch/")
        .assert()
        .success();

    let html = fs::read_to_string(dir.path().join("menu.html")).unwrap();
    assert!(html.contains(r#"src="https://menus.example.com/lunch/images/pho_bo.png""#));

    cmd()
        .arg("render")
        .arg("tests/fixtures/menus/diner.json")
        .arg("--out-dir")
        .arg(dir.path())
        .arg("--enricher")
        .arg("echo")
        .arg("--image-base-url")
        .arg("https://menus.example.com/lunch/")
        .arg("--inline-images")
        .assert()
        .failure();
}
