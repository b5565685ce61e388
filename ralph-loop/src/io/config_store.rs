//! Load/save for `.ralph/ralph_config.json`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::{DEFAULT_CONFIG_PATH, RalphConfig};
use crate::error::RalphError;

pub const TASKS_FILE_ENV: &str = "RALPH_TASKS_FILE";
pub const PROGRESS_FILE_ENV: &str = "RALPH_PROGRESS_FILE";

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// Built-in defaults; the path is where a file was looked for.
    Defaults(PathBuf),
}

/// Load config from a JSON file.
///
/// If the file is missing, returns `RalphConfig::default()`.
pub fn load_config(path: &Path) -> Result<(RalphConfig, ConfigSource)> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file missing, using defaults");
            return Ok((
                RalphConfig::default(),
                ConfigSource::Defaults(path.to_path_buf()),
            ));
        }
        Err(err) => return Err(RalphError::config(path, format!("read failed: {err}")).into()),
    };
    let cfg: RalphConfig = serde_json::from_str(&contents)
        .map_err(|err| RalphError::config(path, err.to_string()))?;
    cfg.validate(path)?;
    info!(path = %path.display(), "loaded config");
    Ok((cfg, ConfigSource::File(path.to_path_buf())))
}

/// Resolve the effective configuration for a command.
///
/// `path` defaults to `.ralph/ralph_config.json`. Environment overrides are
/// applied on top of whatever was loaded.
pub fn effective_config(path: Option<&Path>) -> Result<(RalphConfig, ConfigSource)> {
    let path = path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));
    let (mut cfg, source) = load_config(path)?;
    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    let origin = match &source {
        ConfigSource::File(path) | ConfigSource::Defaults(path) => path.clone(),
    };
    cfg.validate(&origin)?;
    Ok((cfg, source))
}

/// Replace file locations from `RALPH_TASKS_FILE` / `RALPH_PROGRESS_FILE`.
///
/// Empty values are ignored.
pub fn apply_env_overrides<F>(cfg: &mut RalphConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    if let Some(tasks_file) = non_empty(TASKS_FILE_ENV) {
        debug!(%tasks_file, "tasks_file overridden from environment");
        cfg.tasks_file = PathBuf::from(tasks_file);
    }
    if let Some(progress_file) = non_empty(PROGRESS_FILE_ENV) {
        debug!(%progress_file, "progress_file overridden from environment");
        cfg.progress_file = PathBuf::from(progress_file);
    }
}

/// Overwrite `path` with `cfg` as pretty JSON (temp file + rename).
pub fn save_config(path: &Path, cfg: &RalphConfig) -> Result<()> {
    cfg.validate(path)?;
    let mut buf = serde_json::to_string_pretty(cfg).context("serialize config json")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
