//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ACCENTS: &str = "../../catalog/accents.toml";
const CATALOG_DIR: &str = "../../catalog";

fn spelltest() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("spelltest").unwrap();
    cmd.env_remove("SPELLTEST_SEED")
        .env_remove("SPELLTEST_MAX_QUESTIONS");
    cmd
}

/// An empty config file so tests never pick up a user's config.
fn empty_config(dir: &Path) -> PathBuf {
    let path = dir.join("spelltest.toml");
    std::fs::write(&path, "").unwrap();
    path
}

fn accents_sheet(student_id: u64, all_correct: bool) -> String {
    let multi = if all_correct {
        r#"["camión", "lápiz", "café"]"#
    } else {
        r#"["camión", "lápiz"]"#
    };
    format!(
        r#"student_id = {student_id}
module_id = 1

[[answers]]
question = 101
answer = {{ true_or_false = true }}

[[answers]]
question = 102
answer = {{ true_or_false = false }}

[[answers]]
question = 104
answer = {{ text_options = {multi} }}
"#
    )
}

#[test]
fn validate_catalog_file() {
    spelltest()
        .arg("validate")
        .arg("--catalog")
        .arg(ACCENTS)
        .assert()
        .success()
        .stdout(predicate::str::contains("5 questions"))
        .stdout(predicate::str::contains("All catalogs valid"));
}

#[test]
fn validate_directory() {
    spelltest()
        .arg("validate")
        .arg("--catalog")
        .arg(CATALOG_DIR)
        .assert()
        .success()
        .stdout(predicate::str::contains("Accents"))
        .stdout(predicate::str::contains("B and V"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("letters.toml");
    std::fs::write(
        &path,
        r#"
[module]
id = 5
title = "Letters"

[[questions]]
id = 1
text_root = "Pick a letter"
type = "multi_choice_abc"
select_mode = "single"
options = ["a", "b"]
correct = { text_options = ["b"] }
"#,
    )
    .unwrap();

    spelltest()
        .arg("validate")
        .arg("--catalog")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[1] WARNING"))
        .stdout(predicate::str::contains("unsupported question type"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    spelltest()
        .arg("validate")
        .arg("--catalog")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    spelltest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created spelltest.toml"))
        .stdout(predicate::str::contains("Created catalog/example.toml"))
        .stdout(predicate::str::contains("Created answers/example.toml"));

    assert!(dir.path().join("spelltest.toml").exists());
    assert!(dir.path().join("catalog/example.toml").exists());
    assert!(dir.path().join("answers/example.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    spelltest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    spelltest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn init_then_take_example() {
    let dir = TempDir::new().unwrap();

    spelltest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    // hielo + huevo expected, only hielo given: 10 + 5 + 10
    spelltest()
        .current_dir(dir.path())
        .arg("take")
        .arg("--answers")
        .arg("answers/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 25.00 / 30.00"));
}

#[test]
fn take_scores_answer_sheet() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(dir.path());
    let sheet = dir.path().join("sheet.toml");
    std::fs::write(&sheet, accents_sheet(7, false)).unwrap();

    spelltest()
        .arg("take")
        .arg("--answers")
        .arg(&sheet)
        .arg("--catalog")
        .arg(ACCENTS)
        .arg("--config")
        .arg(&config)
        .arg("--seed")
        .arg("3")
        .assert()
        .success()
        .stdout(predicate::str::contains("student 7 on module 1"))
        .stdout(predicate::str::contains("You missed 1 correct option"))
        .stdout(predicate::str::contains("Score: 26.67 / 50.00"))
        .stdout(predicate::str::contains("3 of 5 answered"));
}

#[test]
fn take_honours_env_question_limit() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(dir.path());
    let sheet = dir.path().join("sheet.toml");
    std::fs::write(&sheet, accents_sheet(7, true)).unwrap();

    spelltest()
        .env("SPELLTEST_MAX_QUESTIONS", "2")
        .env("SPELLTEST_SEED", "11")
        .arg("take")
        .arg("--answers")
        .arg(&sheet)
        .arg("--catalog")
        .arg(ACCENTS)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains(" / 20.00 ("))
        .stdout(predicate::str::contains(" of 2 answered"));
}

#[test]
fn take_rejects_zero_question_limit_from_env() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(dir.path());
    let sheet = dir.path().join("sheet.toml");
    std::fs::write(&sheet, accents_sheet(7, true)).unwrap();

    spelltest()
        .env("SPELLTEST_MAX_QUESTIONS", "0")
        .arg("take")
        .arg("--answers")
        .arg(&sheet)
        .arg("--catalog")
        .arg(ACCENTS)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_questions must be at least 1"));
}

#[test]
fn take_rejects_non_numeric_seed_from_env() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(dir.path());
    let sheet = dir.path().join("sheet.toml");
    std::fs::write(&sheet, accents_sheet(7, true)).unwrap();

    spelltest()
        .env("SPELLTEST_SEED", "abc")
        .arg("take")
        .arg("--answers")
        .arg(&sheet)
        .arg("--catalog")
        .arg(ACCENTS)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "SPELLTEST_SEED is not a number: abc",
        ));
}

#[test]
fn take_writes_json_result() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(dir.path());
    let sheet = dir.path().join("sheet.json");
    std::fs::write(
        &sheet,
        r#"{
    "student_id": 3,
    "module_id": 2,
    "answers": [
        {"question": 201, "answer": {"text_to_complete": ["b"]}},
        {"question": 202, "answer": {"text_to_complete": ["b"]}}
    ]
}"#,
    )
    .unwrap();
    let output = dir.path().join("results");

    spelltest()
        .arg("take")
        .arg("--answers")
        .arg(&sheet)
        .arg("--catalog")
        .arg(CATALOG_DIR)
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("Result saved to"));

    let files: Vec<_> = std::fs::read_dir(&output)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
    assert_eq!(json["finished"]["score"], 10.0);
    assert_eq!(json["finished"]["answered"], 2);
    assert_eq!(json["test"]["slots"].as_array().unwrap().len(), 3);
    assert_eq!(json["test"]["test"]["state"], "finished");
}

#[test]
fn take_reports_rejected_answers() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(dir.path());
    let sheet = dir.path().join("sheet.toml");
    std::fs::write(
        &sheet,
        r#"student_id = 1
module_id = 1

[[answers]]
question = 101
answer = { text_options = ["yes"] }

[[answers]]
question = 999
answer = { true_or_false = true }
"#,
    )
    .unwrap();

    spelltest()
        .arg("take")
        .arg("--answers")
        .arg(&sheet)
        .arg("--catalog")
        .arg(ACCENTS)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 0.00 / 50.00"))
        .stderr(predicate::str::contains("Rejected: question 101"))
        .stderr(predicate::str::contains(
            "question 999: not part of this test",
        ));
}

#[test]
fn take_unknown_module_fails() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(dir.path());
    let sheet = dir.path().join("sheet.toml");
    std::fs::write(&sheet, "student_id = 1\nmodule_id = 77\n").unwrap();

    spelltest()
        .arg("take")
        .arg("--answers")
        .arg(&sheet)
        .arg("--catalog")
        .arg(CATALOG_DIR)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn leaderboard_ranks_replayed_sheets() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(dir.path());
    let first = dir.path().join("first.toml");
    let second = dir.path().join("second.toml");
    let third = dir.path().join("third.toml");
    std::fs::write(&first, accents_sheet(1, false)).unwrap();
    std::fs::write(&second, accents_sheet(2, true)).unwrap();
    std::fs::write(&third, accents_sheet(1, true)).unwrap();

    spelltest()
        .arg("leaderboard")
        .arg("--answers")
        .arg(&first)
        .arg(&second)
        .arg(&third)
        .arg("--catalog")
        .arg(ACCENTS)
        .arg("--config")
        .arg(&config)
        .arg("--history")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Leaderboard"))
        .stdout(predicate::str::contains("56.67"))
        .stdout(predicate::str::contains("30.00"))
        .stdout(predicate::str::contains("History of student 1 in module 1"));
}

#[test]
fn leaderboard_respects_limit() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(dir.path());
    let first = dir.path().join("first.toml");
    let second = dir.path().join("second.toml");
    std::fs::write(&first, accents_sheet(1, false)).unwrap();
    std::fs::write(&second, accents_sheet(2, true)).unwrap();

    spelltest()
        .arg("leaderboard")
        .arg("--answers")
        .arg(&first)
        .arg(&second)
        .arg("--catalog")
        .arg(ACCENTS)
        .arg("--config")
        .arg(&config)
        .arg("--limit")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("30.00"))
        .stdout(predicate::str::contains("26.67").not());
}

#[test]
fn help_output() {
    spelltest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Spelling assessment engine"));
}

#[test]
fn version_output() {
    spelltest()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("spelltest"));
}
