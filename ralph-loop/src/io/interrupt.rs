//! Cooperative cancellation on SIGINT/SIGTERM.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};

/// Shared "stop requested" flag.
///
/// The signal handler only sets the flag; the loop and the process helpers
/// poll it and do the actual cleanup (kill the agent, record the abort).
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    /// A flag that nothing but [`Interrupt::trigger`] will set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route SIGINT and SIGTERM to a new flag. Call at most once per process.
    pub fn install() -> Result<Self> {
        let interrupt = Self::new();
        let flag = Arc::clone(&interrupt.flag);
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .context("install interrupt handler")?;
        Ok(interrupt)
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
