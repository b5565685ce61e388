//! Append-only progress log (`.ralph/progress_tasks.txt` by default).
//!
//! The agent also appends its own summaries to this file, so the loop only
//! ever adds lines and never reads it back.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::core::outcome::IterationRecord;

pub struct ProgressLog {
    path: PathBuf,
    file: File,
}

impl ProgressLog {
    /// Open (creating file and parent directories) for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create progress log dir {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open progress log {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, record: &IterationRecord) -> Result<()> {
        self.append_at(Utc::now(), record)
    }

    fn append_at(&mut self, at: DateTime<Utc>, record: &IterationRecord) -> Result<()> {
        let line = format!(
            "[{}] {}\n",
            at.to_rfc3339_opts(SecondsFormat::Secs, true),
            record
        );
        self.file
            .write_all(line.as_bytes())
            .with_context(|| format!("append progress log {}", self.path.display()))?;
        self.file
            .flush()
            .with_context(|| format!("flush progress log {}", self.path.display()))?;
        debug!(path = %self.path.display(), iteration = record.iteration, "progress recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::core::outcome::IterationStatus;
    use chrono::TimeZone;
    use std::time::Duration;

    fn record(iteration: u32) -> IterationRecord {
        IterationRecord {
            iteration,
            iterations: 2,
            agent: Agent::Claude,
            exit_code: Some(0),
            elapsed: Duration::from_secs(3),
            status: IterationStatus::Succeeded,
        }
    }

    #[test]
    fn appends_after_existing_content() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("progress.txt");
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, "agent summary\n").expect("seed");

        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).single().expect("time");
        let mut log = ProgressLog::open(&path).expect("open");
        log.append_at(at, &record(1)).expect("append");
        log.append_at(at, &record(2)).expect("append");

        let contents = fs::read_to_string(&path).expect("read");
        assert_eq!(
            contents,
            "agent summary\n\
             [2026-01-02T03:04:05Z] iteration 1/2 agent=claude exit=0 elapsed=3.0s status=ok\n\
             [2026-01-02T03:04:05Z] iteration 2/2 agent=claude exit=0 elapsed=3.0s status=ok\n"
        );
    }

    #[test]
    fn creates_missing_parent_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(".ralph").join("progress_tasks.txt");
        let mut log = ProgressLog::open(&path).expect("open");
        log.append(&record(1)).expect("append");
        assert!(log.path().is_file());
    }
}
