//! spelltest CLI: validate catalogs, take tests from answer sheets, and
//! rank students.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "spelltest", version, about = "Spelling assessment engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a test from an answer sheet and print the scored result
    Take {
        /// Answer sheet (.toml or .json)
        #[arg(long)]
        answers: PathBuf,

        /// Catalog file or directory (default: catalog_dir from config)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Seed for question selection and feedback
        #[arg(long)]
        seed: Option<u64>,

        /// Write the scored test as JSON into this directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Replay answer sheets and rank students by points
    Leaderboard {
        /// Answer sheets (.toml or .json)
        #[arg(long, num_args = 1.., required = true)]
        answers: Vec<PathBuf>,

        /// Catalog file or directory (default: catalog_dir from config)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Number of students to show
        #[arg(long)]
        limit: Option<usize>,

        /// Also print this student's test history
        #[arg(long)]
        history: Option<u64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate question catalog TOML files
    Validate {
        /// Path to catalog file or directory
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Create starter config and example catalog
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("spelltest=info".parse().expect("static directive")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            answers,
            catalog,
            seed,
            output,
            config,
        } => commands::take::execute(answers, catalog, seed, output, config).await,
        Commands::Leaderboard {
            answers,
            catalog,
            limit,
            history,
            config,
        } => commands::leaderboard::execute(answers, catalog, limit, history, config).await,
        Commands::Validate { catalog } => commands::validate::execute(catalog),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
