//! Sequential test execution with timing output.
//!
//! A run has two phases:
//!
//! 1. **Selection**: every registry entry is checked once against the
//!    [`CategoryFilter`]; the eligible entries, in registration order, form
//!    the selection. Its length is the `total` shown in progress markers.
//! 2. **Execution**: the selection is walked in order. Each test gets a
//!    progress line, is invoked, and gets a timing line.
//!
//! Because execution walks the very selection that was counted, the
//! reported total always equals the number of tests executed.
//!
//! # Output
//!
//! ```text
//! ##### [1/2][first_test]
//! ##### Time used: 3 ms
//! ##### [2/2][second_test]
//! ##### Time used: 0 ms
//! ##### Total Time Used: 4 ms
//! ```
//!
//! With ANSI output enabled each line is wrapped in `ESC[34m` … `ESC[m`.
//! Every line is flushed as soon as it is written so progress is visible
//! even if a test aborts the process.
//!
//! # Failure model
//!
//! The runner keeps no pass/fail state. A failing assertion aborts the
//! process from inside the test body, so no later test runs and the total
//! line is never printed.

#[cfg(test)]
mod tests;

use std::io::{self, Write};

use thiserror::Error;
use tracing::{debug, info};

use crate::filter::CategoryFilter;
use crate::platform::{Clock, MonotonicClock};
use crate::registry::{Registry, TestEntry};

/// Prefix of every line the runner prints.
pub const MARKER: &str = "#####";

const ANSI_BLUE: &str = "\x1b[34m";
const ANSI_RESET: &str = "\x1b[m";

// ------------------------------------------------------------------------------------------------
// Error type
// ------------------------------------------------------------------------------------------------

/// Errors returned by [`Runner`] operations.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Writing progress output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

// ------------------------------------------------------------------------------------------------
// Configuration
// ------------------------------------------------------------------------------------------------

/// Output settings for a [`Runner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Wrap output lines in ANSI colour escapes.
    ///
    /// Default: `true`.
    pub ansi: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { ansi: true }
    }
}

// ------------------------------------------------------------------------------------------------
// Report
// ------------------------------------------------------------------------------------------------

/// What happened to one executed test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    /// 1-based position among the selected tests.
    pub index: usize,

    /// Test name.
    pub name: String,

    /// Wall time spent inside the test body.
    pub elapsed_ms: u64,

    /// Status returned by the test body, recorded as-is.
    pub status: i32,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Number of tests selected by the filter.
    pub total: usize,

    /// Executed tests, in execution order.
    pub outcomes: Vec<TestOutcome>,

    /// Wall time from before selection to after the last test.
    pub elapsed_ms: u64,
}

impl RunReport {
    /// Names of the executed tests, in execution order.
    pub fn executed(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().map(|o| o.name.as_str())
    }
}

/// Bookkeeping for a run in progress.
#[derive(Debug)]
struct RunStats {
    total: usize,
    index: usize,
    started_at: u64,
}

impl RunStats {
    fn new(total: usize, started_at: u64) -> Self {
        Self {
            total,
            index: 0,
            started_at,
        }
    }

    /// Advances to the next test and returns its 1-based index.
    fn advance(&mut self) -> usize {
        self.index += 1;
        self.index
    }

    fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.started_at)
    }
}

// ------------------------------------------------------------------------------------------------
// Runner
// ------------------------------------------------------------------------------------------------

/// Executes the tests of a [`Registry`] selected by a [`CategoryFilter`].
///
/// See the [module-level documentation](self) for the run phases and the
/// output format.
#[derive(Debug)]
pub struct Runner<C: Clock = MonotonicClock> {
    config: RunnerConfig,
    clock: C,
}

impl Runner<MonotonicClock> {
    /// Creates a runner timing tests with a [`MonotonicClock`].
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl Default for Runner<MonotonicClock> {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

impl<C: Clock> Runner<C> {
    /// Creates a runner timing tests with `clock`.
    pub fn with_clock(config: RunnerConfig, clock: C) -> Self {
        Self { config, clock }
    }

    /// The runner's output settings.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Runs the selected tests, writing progress to standard output.
    ///
    /// The stdout lock is taken per line, never across a test body, so
    /// threads spawned by a test can print while the test joins them.
    pub fn run(
        &self,
        registry: &Registry,
        filter: &CategoryFilter,
    ) -> Result<RunReport, RunnerError> {
        self.run_to(registry, filter, &mut io::stdout())
    }

    /// Runs the selected tests, writing progress to `out`.
    ///
    /// Returns once every selected test has returned. A test that fails an
    /// assertion never returns; the process ends inside it.
    pub fn run_to<W: Write>(
        &self,
        registry: &Registry,
        filter: &CategoryFilter,
        out: &mut W,
    ) -> Result<RunReport, RunnerError> {
        let started_at = self.clock.now_millis();
        let selection = select(registry, filter);
        let mut stats = RunStats::new(selection.len(), started_at);

        info!(
            registered = registry.len(),
            selected = stats.total,
            "starting test run"
        );

        let mut outcomes = Vec::with_capacity(stats.total);
        for entry in selection {
            let index = stats.advance();
            self.line(
                out,
                format_args!("[{index}/{}][{}]", stats.total, entry.name()),
            )?;

            let start = self.clock.now_millis();
            let status = entry.run();
            let elapsed_ms = self.clock.now_millis().saturating_sub(start);

            self.line(out, format_args!("Time used: {elapsed_ms} ms"))?;
            debug!(index, name = entry.name(), elapsed_ms, status, "test finished");

            outcomes.push(TestOutcome {
                index,
                name: entry.name().to_owned(),
                elapsed_ms,
                status,
            });
        }

        let elapsed_ms = stats.elapsed(self.clock.now_millis());
        self.line(out, format_args!("Total Time Used: {elapsed_ms} ms"))?;
        info!(executed = outcomes.len(), elapsed_ms, "test run finished");

        Ok(RunReport {
            total: stats.total,
            outcomes,
            elapsed_ms,
        })
    }

    /// Writes the progress marker of every selected test without running any.
    ///
    /// Returns the number of selected tests.
    pub fn list_to<W: Write>(
        &self,
        registry: &Registry,
        filter: &CategoryFilter,
        out: &mut W,
    ) -> Result<usize, RunnerError> {
        let selection = select(registry, filter);
        let total = selection.len();
        for (i, entry) in selection.into_iter().enumerate() {
            self.line(
                out,
                format_args!("[{}/{total}][{}]", i + 1, entry.name()),
            )?;
        }
        Ok(total)
    }

    /// Writes one marked line and flushes it.
    fn line<W: Write>(&self, out: &mut W, body: std::fmt::Arguments<'_>) -> io::Result<()> {
        if self.config.ansi {
            writeln!(out, "{ANSI_BLUE}{MARKER} {body}{ANSI_RESET}")?;
        } else {
            writeln!(out, "{MARKER} {body}")?;
        }
        out.flush()
    }
}

/// Eligible entries of `registry`, in registration order.
///
/// The filter is consulted exactly once per entry.
pub fn select<'r>(registry: &'r Registry, filter: &CategoryFilter) -> Vec<&'r TestEntry> {
    registry
        .iter()
        .filter(|entry| filter.is_eligible(entry.categories()))
        .collect()
}
