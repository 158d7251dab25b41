//! Spelltest configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use spelltest_core::engine::{EngineConfig, DEFAULT_LEADERBOARD_LIMIT};

/// Top-level spelltest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpelltestConfig {
    /// Engine settings: selection policy and RNG seed.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Directory scanned for `.toml` module catalogs.
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: PathBuf,
    /// Where `take` writes result files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Number of students shown on the leaderboard.
    #[serde(default = "default_leaderboard_limit")]
    pub leaderboard_limit: usize,
}

fn default_catalog_dir() -> PathBuf {
    PathBuf::from("./catalog")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./spelltest-results")
}
fn default_leaderboard_limit() -> usize {
    DEFAULT_LEADERBOARD_LIMIT
}

impl Default for SpelltestConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            catalog_dir: default_catalog_dir(),
            output_dir: default_output_dir(),
            leaderboard_limit: default_leaderboard_limit(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Unset variables resolve to the empty string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let value = std::env::var(&result[start + 2..start + len]).unwrap_or_default();
        result.replace_range(start..start + len + 1, &value);
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `spelltest.toml` in the current directory
/// 2. `~/.config/spelltest/config.toml`
///
/// Environment variable overrides: `SPELLTEST_SEED`, `SPELLTEST_MAX_QUESTIONS`.
pub fn load_config() -> Result<SpelltestConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<SpelltestConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("spelltest.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<SpelltestConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => SpelltestConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.catalog_dir = resolve_path(&config.catalog_dir);
    config.output_dir = resolve_path(&config.output_dir);
    check(&config)?;

    Ok(config)
}

/// Apply `SPELLTEST_SEED` and `SPELLTEST_MAX_QUESTIONS` on top of the file
/// values. `var` looks up one variable.
fn apply_env_overrides(
    config: &mut SpelltestConfig,
    var: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(seed) = var("SPELLTEST_SEED") {
        let seed = seed
            .parse::<u64>()
            .with_context(|| format!("SPELLTEST_SEED is not a number: {seed}"))?;
        config.engine.seed = Some(seed);
    }

    if let Some(max) = var("SPELLTEST_MAX_QUESTIONS") {
        let max = max
            .parse::<usize>()
            .with_context(|| format!("SPELLTEST_MAX_QUESTIONS is not a number: {max}"))?;
        config.engine.selection.max_questions = Some(max);
    }

    Ok(())
}

fn check(config: &SpelltestConfig) -> Result<()> {
    if let Some(max) = config.engine.selection.max_questions {
        anyhow::ensure!(max >= 1, "max_questions must be at least 1");
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("spelltest"))
}
