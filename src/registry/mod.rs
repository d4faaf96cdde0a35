//! The ordered list of tests known to a harness.
//!
//! A [`Registry`] is built once, before anything runs, and is immutable
//! afterwards. Iteration always yields entries in registration order.
//! Names are not de-duplicated: two entries with the same name are two
//! independent tests.
//!
//! The [`test_list!`](crate::test_list) macro builds a registry from plain
//! functions, using each function's identifier as the test name:
//!
//! ```rust
//! use tinyunit::{check_eq, test_list};
//!
//! fn addition() -> i32 {
//!     check_eq!(1 + 1, 2);
//!     0
//! }
//!
//! fn subtraction() -> i32 {
//!     check_eq!(3 - 1, 2);
//!     0
//! }
//!
//! let registry = test_list![
//!     addition => "math,fast",
//!     subtraction => "math",
//! ];
//! assert_eq!(registry.names().collect::<Vec<_>>(), ["addition", "subtraction"]);
//! ```


use std::fmt;

/// Body of a test: takes nothing and returns an integer status.
///
/// The status is recorded but never interpreted. Failures are reported by
/// the assertion macros, which abort the process.
pub type TestFn = Box<dyn Fn() -> i32>;

// ------------------------------------------------------------------------------------------------
// TestEntry
// ------------------------------------------------------------------------------------------------

/// A single registered test.
pub struct TestEntry {
    name: String,
    categories: String,
    run: TestFn,
}

impl TestEntry {
    /// Creates an entry.
    ///
    /// `categories` is a comma-separated tag list and may be empty.
    pub fn new(
        name: impl Into<String>,
        categories: impl Into<String>,
        run: impl Fn() -> i32 + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            categories: categories.into(),
            run: Box::new(run),
        }
    }

    /// The test name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The comma-separated category tags.
    pub fn categories(&self) -> &str {
        &self.categories
    }

    /// Invokes the test body and returns its status.
    pub fn run(&self) -> i32 {
        (self.run)()
    }
}

impl fmt::Debug for TestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestEntry")
            .field("name", &self.name)
            .field("categories", &self.categories)
            .finish_non_exhaustive()
    }
}

// ------------------------------------------------------------------------------------------------
// Registry
// ------------------------------------------------------------------------------------------------

/// Immutable, ordered collection of [`TestEntry`] values.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<TestEntry>,
}

impl Registry {
    /// Creates a registry holding `entries` in the given order.
    pub fn new(entries: Vec<TestEntry>) -> Self {
        Self { entries }
    }

    /// Iterates entries in registration order.
    ///
    /// Every call starts again from the first entry.
    pub fn iter(&self) -> std::slice::Iter<'_, TestEntry> {
        self.entries.iter()
    }

    /// Iterates test names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(TestEntry::name)
    }

    /// Number of registered tests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no test is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<TestEntry> for Registry {
    fn from_iter<I: IntoIterator<Item = TestEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a TestEntry;
    type IntoIter = std::slice::Iter<'a, TestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Builds a [`Registry`] from test functions and their category lists.
///
/// Each item is `function => "categories"`; the function must have the
/// signature `fn() -> i32` and its identifier becomes the test name.
#[macro_export]
macro_rules! test_list {
    ($($test:ident => $categories:expr),* $(,)?) => {
        $crate::Registry::new(::std::vec![
            $($crate::TestEntry::new(::core::stringify!($test), $categories, $test)),*
        ])
    };
}
