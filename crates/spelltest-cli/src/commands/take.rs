//! The `spelltest take` command.

use std::path::PathBuf;

use anyhow::Result;

use spelltest_core::model::{Answer, AnswerSlot};
use spelltest_store::load_config_from;

use super::session::{load_catalogs, load_sheet, Attempt, Session};

pub async fn execute(
    answers_path: PathBuf,
    catalog: Option<PathBuf>,
    seed: Option<u64>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;
    if seed.is_some() {
        config.engine.seed = seed;
    }

    let catalog_path = catalog.unwrap_or_else(|| config.catalog_dir.clone());
    let catalogs = load_catalogs(&catalog_path)?;
    let sheet = load_sheet(&answers_path)?;

    let session = Session::new(catalogs, config.engine)?;
    let attempt = session.replay(&sheet).await?;

    print_attempt(&attempt);

    if let Some(dir) = output {
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("test-{}.json", attempt.finished.test_id));
        let json = serde_json::to_string_pretty(&attempt)?;
        std::fs::write(&path, json)?;
        eprintln!("Result saved to: {}", path.display());
    }

    Ok(())
}

fn print_attempt(attempt: &Attempt) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "#", "Question", "Type", "Answer", "Correct", "Score", "Feedback",
    ]);

    for slot in &attempt.test.slots {
        table.add_row(vec![
            Cell::new(slot.position + 1),
            Cell::new(&slot.question.text_root),
            Cell::new(slot.question.question_type),
            Cell::new(render_answer(slot)),
            Cell::new(if slot.is_correct { "yes" } else { "no" }),
            Cell::new(format!("{:.2}", slot.score)),
            Cell::new(&slot.feedback),
        ]);
    }

    let tally = &attempt.finished.tally;
    println!(
        "Test {} for student {} on module {}",
        attempt.finished.test_id, attempt.finished.student_id, attempt.finished.module_id
    );
    println!("{table}");
    println!(
        "Score: {:.2} / {:.2} ({} of {} answered, {} correct)",
        tally.score, tally.max_score, tally.answered, tally.total_slots, tally.correct
    );

    for reason in &attempt.rejected {
        eprintln!("  Rejected: {reason}");
    }
}

fn render_answer(slot: &AnswerSlot) -> String {
    match &slot.answer {
        None => "-".to_string(),
        Some(Answer::TrueOrFalse(value)) => value.to_string(),
        Some(Answer::TextOptions(words) | Answer::TextToComplete(words)) => words.join(", "),
    }
}
