//! TOML question catalog parser.
//!
//! Loads module catalogs from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    Answer, AnswerSpec, Catalog, Module, ModuleDifficulty, Question, QuestionContainer,
    QuestionType, SelectMode,
};
use crate::policy::ScoringPolicy;

/// Intermediate TOML structure for parsing catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    module: TomlModuleHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlModuleHeader {
    id: u64,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_difficulty")]
    difficulty: String,
    #[serde(default)]
    points_to_earn: u32,
}

fn default_difficulty() -> String {
    "easy".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: u64,
    text_root: String,
    #[serde(default)]
    difficulty: u8,
    #[serde(rename = "type")]
    question_type: String,
    #[serde(default)]
    select_mode: Option<String>,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    text_to_complete: String,
    #[serde(default)]
    hint: String,
    correct: Answer,
}

/// Parse a single TOML file into a `Catalog`.
pub fn parse_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    parse_catalog_str(&content, path)
}

/// Parse a TOML string into a `Catalog` (useful for testing).
pub fn parse_catalog_str(content: &str, source_path: &Path) -> Result<Catalog> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let difficulty: ModuleDifficulty = parsed
        .module
        .difficulty
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;

    let module_id = parsed.module.id;
    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let question_type: QuestionType = q
                .question_type
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {}: {}", q.id, e))?;

            let select_mode = q
                .select_mode
                .map(|m| m.parse::<SelectMode>())
                .transpose()
                .map_err(|e| anyhow::anyhow!("question {}: {}", q.id, e))?;
            anyhow::ensure!(
                select_mode.is_some() || !question_type.is_choice(),
                "question {}: the select mode cannot be empty",
                q.id
            );

            Ok(Question {
                id: q.id,
                container: QuestionContainer::Module(module_id),
                text_root: q.text_root,
                difficulty: q.difficulty,
                question_type,
                answer_spec: AnswerSpec {
                    select_mode: select_mode.unwrap_or_default(),
                    text_options: q.options,
                    text_to_complete: q.text_to_complete,
                    hint: q.hint,
                },
                correct_answer: q.correct,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Catalog {
        module: Module {
            id: module_id,
            title: parsed.module.title,
            description: parsed.module.description,
            difficulty,
            points_to_earn: parsed.module.points_to_earn,
        },
        questions,
    })
}

/// Recursively load all `.toml` catalog files from a directory.
pub fn load_catalog_directory(dir: &Path) -> Result<Vec<Catalog>> {
    let mut catalogs = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            catalogs.extend(load_catalog_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_catalog(&path) {
                Ok(catalog) => catalogs.push(catalog),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(catalogs)
}

/// A warning from catalog validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<u64>,
    /// Warning message.
    pub message: String,
}

/// Validate a catalog for common issues.
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if catalog.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "module has no questions; tests cannot be created for it".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for question in &catalog.questions {
        if !seen_ids.insert(question.id) {
            warnings.push(ValidationWarning {
                question_id: Some(question.id),
                message: format!("duplicate question ID: {}", question.id),
            });
        }
    }

    for question in &catalog.questions {
        if let Err(e) = question.validate() {
            warnings.push(ValidationWarning {
                question_id: Some(question.id),
                message: e.to_string(),
            });
        }
    }

    // Questions that can be selected but never scored
    for question in &catalog.questions {
        if let Err(e) =
            ScoringPolicy::for_type(question.question_type, question.answer_spec.select_mode)
        {
            warnings.push(ValidationWarning {
                question_id: Some(question.id),
                message: format!("{e}; this question is never selected into tests"),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[module]
id = 1
title = "Accents"
description = "Words with and without tilde"
difficulty = "medium"
points_to_earn = 50

[[questions]]
id = 1
text_root = "'Árbol' carries an accent mark"
type = "true_false"
correct = { true_or_false = true }

[[questions]]
id = 2
text_root = "Select the correctly spelled words"
type = "multi_choice_text"
select_mode = "multiple"
options = ["canción", "cancion", "camión", "camion"]
correct = { text_options = ["canción", "camión"] }

[[questions]]
id = 3
text_root = "Complete the word"
type = "complete_word"
text_to_complete = "ca_allo"
hint = "A horse"
correct = { text_to_complete = ["b"] }

[[questions]]
id = 4
text_root = "Order the sentence"
type = "order_word"
options = ["ladra", "el", "perro"]
correct = { text_options = ["el", "perro", "ladra"] }
"#;

    #[test]
    fn parse_valid_toml() {
        let catalog = parse_catalog_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(catalog.module.id, 1);
        assert_eq!(catalog.module.title, "Accents");
        assert_eq!(catalog.module.difficulty, ModuleDifficulty::Medium);
        assert_eq!(catalog.questions.len(), 4);
        assert_eq!(
            catalog.questions[1].answer_spec.select_mode,
            SelectMode::Multiple
        );
        assert_eq!(
            catalog.questions[2].correct_answer,
            Answer::TextToComplete(vec!["b".into()])
        );
        assert!(catalog.questions.iter().all(|q| q.belongs_to_module(1)));
        assert!(validate_catalog(&catalog).is_empty());
    }

    #[test]
    fn parse_rejects_unknown_type() {
        let toml = r#"
[module]
id = 2
title = "Bad"

[[questions]]
id = 1
text_root = "Write an essay"
type = "essay"
correct = { true_or_false = true }
"#;
        let err = parse_catalog_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("unknown question type"));
    }

    #[test]
    fn choice_questions_need_select_mode() {
        let toml = r#"
[module]
id = 2
title = "No mode"

[[questions]]
id = 1
text_root = "Pick one"
type = "multi_choice_text"
options = ["a", "b"]
correct = { text_options = ["a"] }
"#;
        let err = parse_catalog_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("select mode"));
    }

    #[test]
    fn validate_duplicate_ids_and_unscorable_types() {
        let toml = r#"
[module]
id = 3
title = "Dupes"

[[questions]]
id = 1
text_root = "First"
type = "true_false"
correct = { true_or_false = false }

[[questions]]
id = 1
text_root = "Pick a letter"
type = "multi_choice_abc"
select_mode = "single"
options = ["a", "b", "c"]
correct = { text_options = ["b"] }
"#;
        let catalog = parse_catalog_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_catalog(&catalog);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("unsupported question type")));
    }

    #[test]
    fn validate_reports_shape_errors() {
        let toml = r#"
[module]
id = 4
title = "Shapes"

[[questions]]
id = 9
text_root = "Is this right?"
type = "true_false"
correct = { text_options = ["yes"] }
"#;
        let catalog = parse_catalog_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_catalog(&catalog);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].question_id, Some(9));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        let result = parse_catalog_str(bad, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_directory_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("accents.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not [toml").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalogs = load_catalog_directory(dir.path()).unwrap();
        assert_eq!(catalogs.len(), 1);
        assert_eq!(catalogs[0].module.title, "Accents");
    }
}
