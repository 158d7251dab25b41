//! The `spelltest validate` command.

use std::path::PathBuf;

use anyhow::Result;

use spelltest_core::parser;

use super::session::load_catalogs;

pub fn execute(catalog_path: PathBuf) -> Result<()> {
    let catalogs = load_catalogs(&catalog_path)?;

    let mut total_warnings = 0;

    for catalog in &catalogs {
        println!(
            "Module {}: {} ({} questions, {}, {} points)",
            catalog.module.id,
            catalog.module.title,
            catalog.questions.len(),
            catalog.module.difficulty,
            catalog.module.points_to_earn
        );

        let warnings = parser::validate_catalog(catalog);
        for w in &warnings {
            let prefix = w
                .question_id
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All catalogs valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
