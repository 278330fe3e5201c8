use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

const OPERATIONS: &str = "\
Дата операции;Дата платежа;Номер карты;Статус;Сумма платежа;Кэшбэк;Категория;Описание;Бонусы (включая кэшбэк)
02.05.2023 10:01:00;02.05.2023;*7197;OK;-4000,00;40;Супермаркеты;Магнит;40
03.05.2023 12:30:00;03.05.2023;*7197;OK;-431,15;4;Аптеки;Аптека Вита;4
04.05.2023 18:00:00;04.05.2023;*5091;OK;200,00;;Пополнения;Перевод;
10.03.2023 09:00:00;10.03.2023;*5091;OK;-64,00;0,9;Аптеки;Аптека 36,6;0
01.11.2023 09:00:00;01.11.2023;*5091;OK;-1000,00;10;A;Shop A;10
03.11.2023 09:00:00;03.11.2023;*5091;OK;-500,00;5;A;Shop A;5
02.11.2023 09:00:00;02.11.2023;*5091;OK;-2000,00;20;B;Shop B;20
";

fn setup() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("operations.csv");
    std::fs::write(&input, OPERATIONS).unwrap();
    (dir, input)
}

fn cardwise(dir: &Path, input: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cardwise").unwrap();
    cmd.env("HOME", dir)
        .env("NO_COLOR", "1")
        .env_remove("CARDWISE_LOG")
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(dir)
        .arg("--input")
        .arg(input);
    cmd
}

#[test]
fn cashback_lists_categories_for_month() {
    let (dir, input) = setup();
    cardwise(dir.path(), &input)
        .args(["cashback", "--month", "2023-11"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cashback 2023-11"))
        .stdout(predicate::str::contains("15"))
        .stdout(predicate::str::contains("20"));
}

#[test]
fn cashback_rejects_bad_month() {
    let (dir, input) = setup();
    cardwise(dir.path(), &input)
        .args(["cashback", "--month", "2023-13"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Invalid month"));
}

#[test]
fn category_writes_single_line_json() {
    let (dir, input) = setup();
    cardwise(dir.path(), &input)
        .args(["category", "Аптеки", "--date", "2023-05-20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Spending by Category"));

    let written = std::fs::read_to_string(dir.path().join("category_report.json")).unwrap();
    assert_eq!(
        written,
        r#"{"category":"Аптеки","start_date":"20.02.2023","end_date":"20.05.2023","total_spending":-495.15}"#
    );

    cardwise(dir.path(), &input)
        .args(["category", "Супермаркеты", "--date", "2023-05-20"])
        .assert()
        .success();
    let rewritten = std::fs::read_to_string(dir.path().join("category_report.json")).unwrap();
    assert_eq!(
        rewritten,
        r#"{"category":"Супермаркеты","start_date":"20.02.2023","end_date":"20.05.2023","total_spending":-4000.0}"#
    );
}

#[test]
fn cards_show_net_debit_cards_only() {
    let (dir, input) = setup();
    cardwise(dir.path(), &input)
        .args(["cards", "--from", "2023-05-01", "--to", "20.05.2023"])
        .assert()
        .success()
        .stdout(predicate::str::contains("*7197"))
        .stdout(predicate::str::contains("4 431.15"))
        .stdout(predicate::str::contains("*5091").not());
}

#[test]
fn top_orders_by_amount() {
    let (dir, input) = setup();
    let output = cardwise(dir.path(), &input)
        .args(["top", "--from", "2023-05-01", "--to", "2023-05-31"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let first = text.find("Перевод").unwrap();
    let second = text.find("Аптека Вита").unwrap();
    let third = text.find("Магнит").unwrap();
    assert!(first < second && second < third);
}

#[test]
fn report_offline_with_empty_user_settings() {
    let (dir, input) = setup();
    std::fs::write(dir.path().join("user_settings.json"), "{}").unwrap();
    cardwise(dir.path(), &input)
        .args(["report", "2023-05-20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("    \"cards\": ["))
        .stdout(predicate::str::contains("\"cashback\": 44.31"));

    let saved = std::fs::read_to_string(dir.path().join("data").join("report.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(value["cards"][0]["last_digits"], "7197");
    assert_eq!(value["stock_prices"], serde_json::json!([]));
}

#[test]
fn report_fails_without_user_settings() {
    let (dir, input) = setup();
    cardwise(dir.path(), &input)
        .args(["report", "2023-05-20"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: IO error"));
    assert!(!dir.path().join("data").join("report.json").exists());
}

#[test]
fn missing_input_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("absent.xlsx");
    cardwise(dir.path(), &input)
        .args(["cashback", "--month", "2023-11"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
}

#[test]
fn init_creates_user_settings_template() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("books");
    Command::cargo_bin("cardwise")
        .unwrap()
        .env("HOME", dir.path())
        .arg("--data-dir")
        .arg(&data)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized cardwise"));

    let template = std::fs::read_to_string(data.join("user_settings.json")).unwrap();
    assert!(template.contains("user_currencies"));
    assert!(dir.path().join(".config").join("cardwise").join("settings.json").exists());
}
