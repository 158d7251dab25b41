//! The `spelltest init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_once(Path::new("spelltest.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("catalog")?;
    write_once(Path::new("catalog/example.toml"), EXAMPLE_CATALOG)?;

    std::fs::create_dir_all("answers")?;
    write_once(Path::new("answers/example.toml"), EXAMPLE_SHEET)?;

    println!("\nNext steps:");
    println!("  1. Edit catalog/example.toml or add your own modules");
    println!("  2. Run: spelltest validate --catalog catalog");
    println!("  3. Run: spelltest take --answers answers/example.toml");

    Ok(())
}

fn write_once(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# spelltest configuration

catalog_dir = "./catalog"
output_dir = "./spelltest-results"
leaderboard_limit = 10

[engine]
# seed = 42

[engine.selection]
# max_questions = 10
shuffle = true
"#;

const EXAMPLE_CATALOG: &str = r#"[module]
id = 1
title = "Example module"
description = "A small module to get started"
difficulty = "easy"
points_to_earn = 20

[[questions]]
id = 1
text_root = "'Lápiz' carries a written accent"
difficulty = 1
type = "true_false"
correct = { true_or_false = true }

[[questions]]
id = 2
text_root = "Select the correctly spelled words"
difficulty = 2
type = "multi_choice_text"
select_mode = "multiple"
options = ["hielo", "yelo", "huevo", "guevo"]
correct = { text_options = ["hielo", "huevo"] }

[[questions]]
id = 3
text_root = "Complete the word"
difficulty = 2
type = "complete_word"
text_to_complete = "_ermano"
hint = "Family member"
correct = { text_to_complete = ["h"] }
"#;

const EXAMPLE_SHEET: &str = r#"student_id = 1
module_id = 1

[[answers]]
question = 1
answer = { true_or_false = true }

[[answers]]
question = 2
answer = { text_options = ["hielo"] }

[[answers]]
question = 3
answer = { text_to_complete = ["h"] }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::session::AnswerSheet;
    use spelltest_core::parser::{parse_catalog_str, validate_catalog};
    use spelltest_store::SpelltestConfig;

    #[test]
    fn sample_config_parses() {
        let config: SpelltestConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.leaderboard_limit, 10);
        assert!(config.engine.selection.shuffle);
    }

    #[test]
    fn example_catalog_is_clean() {
        let catalog = parse_catalog_str(EXAMPLE_CATALOG, Path::new("example.toml")).unwrap();
        assert_eq!(catalog.questions.len(), 3);
        assert!(validate_catalog(&catalog).is_empty());
    }

    #[test]
    fn example_sheet_matches_catalog() {
        let sheet: AnswerSheet = toml::from_str(EXAMPLE_SHEET).unwrap();
        assert_eq!(sheet.module_id, 1);
        assert_eq!(sheet.answers.len(), 3);
    }
}
