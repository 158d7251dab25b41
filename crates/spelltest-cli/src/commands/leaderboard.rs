//! The `spelltest leaderboard` command.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;

use spelltest_core::engine::default_leaderboard_window;
use spelltest_core::model::StudentId;
use spelltest_core::statistics::{StudentPoints, TestSummary};
use spelltest_store::load_config_from;

use super::session::{load_catalogs, load_sheet, Session};

pub async fn execute(
    answer_paths: Vec<PathBuf>,
    catalog: Option<PathBuf>,
    limit: Option<usize>,
    history: Option<StudentId>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let limit = limit.unwrap_or(config.leaderboard_limit);
    anyhow::ensure!(limit >= 1, "limit must be at least 1");

    let catalog_path = catalog.unwrap_or_else(|| config.catalog_dir.clone());
    let session = Session::new(load_catalogs(&catalog_path)?, config.engine)?;

    let mut modules = BTreeSet::new();
    for path in &answer_paths {
        let sheet = load_sheet(path)?;
        let attempt = session.replay(&sheet).await?;
        modules.insert(sheet.module_id);
        eprintln!(
            "  Replayed: {} -> student {} scored {:.2}",
            path.display(),
            sheet.student_id,
            attempt.finished.tally.score
        );
    }

    let (start, end) = default_leaderboard_window(Utc::now());
    let board = session.engine().leaderboard(start, end, limit).await?;
    print_leaderboard(&board);

    if let Some(student_id) = history {
        for module_id in modules {
            let tests = session.engine().student_tests(student_id, module_id).await?;
            if !tests.is_empty() {
                print_history(student_id, module_id, &tests);
            }
        }
    }

    Ok(())
}

fn print_leaderboard(board: &[StudentPoints]) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Rank", "Student", "Points", "Tests"]);
    for (rank, entry) in board.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(entry.student_id),
            Cell::new(format!("{:.2}", entry.points)),
            Cell::new(entry.tests_finished),
        ]);
    }

    println!("Leaderboard");
    println!("{table}");
}

fn print_history(student_id: StudentId, module_id: u64, tests: &[TestSummary]) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Test", "State", "Created", "Questions", "Score"]);
    for summary in tests {
        table.add_row(vec![
            Cell::new(summary.test_id),
            Cell::new(summary.state),
            Cell::new(summary.created_at.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(summary.question_count),
            Cell::new(format!("{:.2} / {:.2}", summary.score, summary.max_score)),
        ]);
    }

    println!("\nHistory of student {student_id} in module {module_id}");
    println!("{table}");
}
