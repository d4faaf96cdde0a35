//! # tinyunit
//!
//! A minimal test harness: an ordered registry of test functions, a
//! category filter deciding which of them run, a sequential runner that
//! times every test, and a family of typed assertions that print a precise
//! diagnostic and abort the process on the first failure.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tinyunit::{Harness, check_eq, check_mem_hex_eq, test_list};
//!
//! fn parse_header() -> i32 {
//!     let header = [0xCA_u8, 0xFE, 0x01];
//!     check_mem_hex_eq!(header, [0xCA_u8, 0xFE, 0x01], 3);
//!     0
//! }
//!
//! fn checksum() -> i32 {
//!     check_eq!(0x0F ^ 0xF0, 0xFF);
//!     0
//! }
//!
//! let mut harness = Harness::new(test_list![
//!     parse_header => "codec,fast",
//!     checksum => "codec",
//! ]);
//!
//! // Run only `codec` tests that are not `slow`.
//! harness.set_included_categories("codec").unwrap();
//! harness.set_excluded_categories("slow").unwrap();
//!
//! let report = harness.run().unwrap();
//! assert_eq!(report.total, 2);
//! ```
//!
//! ## Features
//!
//! - **Category selection**: include and exclude lists, case-insensitive,
//!   exclusion wins.
//! - **Deterministic order**: tests run one at a time, in registration order.
//! - **Timing**: per-test and total wall time on standard output.
//! - **Fail-fast assertions**: integer, unsigned, float, string, bounded
//!   memory (text or hex) and pointer checks; a failure aborts the process
//!   after writing `file`, `line`, both source expressions and both values.
//! - **Command line**: [`Harness::main`] reads `--categories`, `--exclude`,
//!   `--no-color` and `--list`.

pub mod assert;
pub mod filter;
pub mod platform;
pub mod registry;
pub mod runner;

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing::{error, info, warn};

pub use filter::{CategoryFilter, CategorySet, FilterError};
pub use registry::{Registry, TestEntry, TestFn};
pub use runner::{RunReport, Runner, RunnerConfig, RunnerError, TestOutcome};

/// Exit code used when writing progress output fails.
pub const EXIT_FAILURE: u8 = 1;

/// Exit code used when the command line or configuration is rejected.
pub const EXIT_USAGE: u8 = 2;

// ------------------------------------------------------------------------------------------------
// Configuration
// ------------------------------------------------------------------------------------------------

/// Configuration for a [`Harness`].
///
/// All fields have sensible defaults via [`HarnessConfig::default()`].
/// The configuration is validated by [`Harness::with_config`].
///
/// # Example
///
/// ```rust
/// use tinyunit::HarnessConfig;
///
/// let config = HarnessConfig {
///     ansi: false,
///     ..HarnessConfig::default()
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Maximum number of distinct names in the included list, and
    /// separately in the excluded list.
    ///
    /// Default: 16. Must be ≥ 1.
    pub max_categories: usize,

    /// Colour progress lines with ANSI escapes.
    ///
    /// Ignored when the `NO_COLOR` environment variable is set.
    ///
    /// Default: `true`.
    pub ansi: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            max_categories: filter::DEFAULT_MAX_CATEGORIES,
            ansi: true,
        }
    }
}

impl HarnessConfig {
    /// Validates all configuration parameters.
    fn validate(&self) -> Result<(), HarnessError> {
        if self.max_categories < 1 {
            return Err(HarnessError::InvalidConfig(
                "max_categories must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Converts to the runner configuration.
    ///
    /// Colour stays on only if the console accepts ANSI escapes.
    fn to_runner_config(self) -> RunnerConfig {
        let ansi = self.ansi
            && platform::ansi_supported()
            && platform::enable_virtual_terminal()
                .inspect_err(|e| warn!(error = %e, "console rejected ANSI mode, colour disabled"))
                .is_ok();
        RunnerConfig { ansi }
    }
}

// ------------------------------------------------------------------------------------------------
// Error type
// ------------------------------------------------------------------------------------------------

/// Errors returned by [`Harness`] operations.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Invalid configuration parameter.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A category list was rejected.
    #[error("{0}")]
    Filter(#[from] FilterError),

    /// The runner failed to write its output.
    #[error("{0}")]
    Runner(#[from] RunnerError),
}

impl HarnessError {
    /// Process exit code reported by [`Harness::main`] for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidConfig(_) | Self::Filter(_) => EXIT_USAGE,
            Self::Runner(_) => EXIT_FAILURE,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Command line
// ------------------------------------------------------------------------------------------------

/// Command-line options understood by [`Harness::main`].
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(about = "Run the registered tests", long_about = None)]
pub struct HarnessArgs {
    /// Run only tests tagged with one of these comma-separated categories
    #[arg(short = 'c', long, value_name = "CSV")]
    pub categories: Option<String>,

    /// Skip tests tagged with any of these comma-separated categories
    #[arg(short = 'x', long, value_name = "CSV")]
    pub exclude: Option<String>,

    /// Print progress without ANSI colours
    #[arg(long)]
    pub no_color: bool,

    /// Print the selected tests without running them
    #[arg(long)]
    pub list: bool,
}

// ------------------------------------------------------------------------------------------------
// Harness
// ------------------------------------------------------------------------------------------------

/// A registry together with the filter and settings that govern its runs.
///
/// Configuration takes `&mut self` and running takes `&self`, so a filter
/// can never change while a run is in progress.
#[derive(Debug)]
pub struct Harness {
    registry: Registry,
    filter: CategoryFilter,
    config: HarnessConfig,
}

impl Harness {
    /// Creates a harness with the default configuration.
    pub fn new(registry: Registry) -> Self {
        let config = HarnessConfig::default();
        Self {
            registry,
            filter: CategoryFilter::with_capacity(config.max_categories),
            config,
        }
    }

    /// Creates a harness with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidConfig`] if any configuration parameter
    /// is out of range.
    pub fn with_config(registry: Registry, config: HarnessConfig) -> Result<Self, HarnessError> {
        config.validate()?;
        Ok(Self {
            registry,
            filter: CategoryFilter::with_capacity(config.max_categories),
            config,
        })
    }

    /// Selects tests by category. The previous selection is replaced.
    ///
    /// An empty or whitespace-only list selects every test.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Filter`] if the list names more distinct
    /// categories than [`HarnessConfig::max_categories`]; the previous
    /// selection then stays in effect.
    pub fn set_included_categories(&mut self, csv: &str) -> Result<(), HarnessError> {
        Ok(self.filter.set_included(csv)?)
    }

    /// Excludes tests by category. The previous exclusions are replaced.
    ///
    /// An empty or whitespace-only list excludes nothing.
    ///
    /// # Errors
    ///
    /// Same as [`Harness::set_included_categories`].
    pub fn set_excluded_categories(&mut self, csv: &str) -> Result<(), HarnessError> {
        Ok(self.filter.set_excluded(csv)?)
    }

    /// The registered tests.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The current filter.
    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    /// The harness configuration.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs the selected tests, printing progress to standard output.
    ///
    /// Returns after the last selected test. If a test fails an assertion
    /// the process aborts inside that test and this never returns.
    pub fn run(&self) -> Result<RunReport, HarnessError> {
        Ok(self.runner().run(&self.registry, &self.filter)?)
    }

    /// Runs the selected tests, printing progress to `out`.
    pub fn run_to<W: Write>(&self, out: &mut W) -> Result<RunReport, HarnessError> {
        Ok(self.runner().run_to(&self.registry, &self.filter, out)?)
    }

    /// Applies parsed command-line options, then lists or runs tests,
    /// writing progress to `out`.
    ///
    /// Returns the number of tests selected.
    pub fn run_with_args<W: Write>(
        &mut self,
        args: &HarnessArgs,
        out: &mut W,
    ) -> Result<usize, HarnessError> {
        if let Some(csv) = &args.categories {
            self.set_included_categories(csv)?;
        }
        if let Some(csv) = &args.exclude {
            self.set_excluded_categories(csv)?;
        }
        if args.no_color {
            self.config.ansi = false;
        }

        if args.list {
            return Ok(self.runner().list_to(&self.registry, &self.filter, out)?);
        }
        Ok(self.run_to(out)?.total)
    }

    /// Parses `args` (program name first) and runs.
    ///
    /// Usage errors and rejected category lists are printed to standard
    /// error and yield exit code [`EXIT_USAGE`]. Failing to write progress
    /// yields [`EXIT_FAILURE`]. `--help` and `--version` print and yield
    /// success.
    pub fn main_from<I, T>(mut self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = match HarnessArgs::try_parse_from(args) {
            Ok(args) => args,
            Err(e) => {
                let _ = e.print();
                return if e.use_stderr() {
                    ExitCode::from(EXIT_USAGE)
                } else {
                    ExitCode::SUCCESS
                };
            }
        };

        // Unlocked: test bodies and their threads print to stdout too.
        match self.run_with_args(&args, &mut io::stdout()) {
            Ok(selected) => {
                info!(selected, "harness finished");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(error = %e, "harness failed");
                eprintln!("error: {e}");
                ExitCode::from(e.exit_code())
            }
        }
    }

    /// Entry point for a test binary: parses the process arguments and runs.
    ///
    /// ```rust,no_run
    /// use std::process::ExitCode;
    /// use tinyunit::{Harness, check, test_list};
    ///
    /// fn smoke() -> i32 {
    ///     check!(true);
    ///     0
    /// }
    ///
    /// fn main() -> ExitCode {
    ///     Harness::new(test_list![smoke => "fast"]).main()
    /// }
    /// ```
    pub fn main(self) -> ExitCode {
        self.main_from(std::env::args_os())
    }

    fn runner(&self) -> Runner {
        Runner::new(self.config.to_runner_config())
    }
}
