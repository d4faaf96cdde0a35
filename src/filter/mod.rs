//! Category-based test selection.
//!
//! Every test carries a comma-separated list of category tags. A
//! [`CategoryFilter`] holds two [`CategorySet`]s:
//!
//! - **included**: when non-empty, a test must carry at least one of these
//!   tags to be selected. When empty, every test is selected.
//! - **excluded**: a test carrying any of these tags is never selected,
//!   even if it also matches an included tag.
//!
//! Tags are trimmed and compared with ASCII case-insensitive equality, so
//! `"Network"`, `" network "` and `"NETWORK"` are the same category.
//!
//! Both sets are bounded. Configuring more distinct names than the bound is
//! rejected with [`FilterError::TooManyCategories`] and leaves the previous
//! configuration in place.


use thiserror::Error;
use tracing::{trace, warn};

/// Default bound on the number of distinct names in one [`CategorySet`].
pub const DEFAULT_MAX_CATEGORIES: usize = 16;

// ------------------------------------------------------------------------------------------------
// Error type
// ------------------------------------------------------------------------------------------------

/// Errors returned while configuring a [`CategoryFilter`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The list names more distinct categories than the set can hold.
    #[error("too many categories: {found} given, at most {limit} supported")]
    TooManyCategories {
        /// Configured bound.
        limit: usize,
        /// Distinct names found in the input.
        found: usize,
    },
}

// ------------------------------------------------------------------------------------------------
// Tokenizing
// ------------------------------------------------------------------------------------------------

/// Splits a comma-separated list into trimmed, non-empty tokens.
pub fn tokens(csv: &str) -> impl Iterator<Item = &str> {
    csv.split(',').map(str::trim).filter(|t| !t.is_empty())
}

// ------------------------------------------------------------------------------------------------
// CategorySet
// ------------------------------------------------------------------------------------------------

/// A bounded, ordered set of category names.
///
/// Names keep the spelling of their first occurrence; membership is
/// ASCII case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet {
    names: Vec<String>,
    limit: usize,
}

impl CategorySet {
    /// Creates an empty set holding at most `limit` names.
    pub fn with_capacity(limit: usize) -> Self {
        Self {
            names: Vec::new(),
            limit,
        }
    }

    /// Parses `csv` into a new set bounded by `limit`.
    ///
    /// Duplicate names (ignoring ASCII case) are kept once and count once
    /// against the bound.
    pub fn parse(csv: &str, limit: usize) -> Result<Self, FilterError> {
        let mut names: Vec<String> = Vec::new();
        for token in tokens(csv) {
            if names.iter().any(|n| n.eq_ignore_ascii_case(token)) {
                continue;
            }
            names.push(token.to_owned());
        }

        if names.len() > limit {
            return Err(FilterError::TooManyCategories {
                limit,
                found: names.len(),
            });
        }
        Ok(Self { names, limit })
    }

    /// Replaces the whole content with the names in `csv`.
    ///
    /// On error the set is left unchanged.
    pub fn assign(&mut self, csv: &str) -> Result<(), FilterError> {
        *self = Self::parse(csv, self.limit)?;
        Ok(())
    }

    /// Returns `true` if `name` (trimmed) is in the set.
    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim();
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    /// Returns `true` if any token of `csv` is in the set.
    pub fn matches_any(&self, csv: &str) -> bool {
        tokens(csv).any(|t| self.contains(t))
    }

    /// Returns `true` if the set holds no names.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of distinct names held.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// The configured bound.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Iterates the names in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Removes every name.
    pub fn clear(&mut self) {
        self.names.clear();
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_CATEGORIES)
    }
}

// ------------------------------------------------------------------------------------------------
// CategoryFilter
// ------------------------------------------------------------------------------------------------

/// Decides which tests are eligible to run.
///
/// See the [module-level documentation](self) for matching rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    included: CategorySet,
    excluded: CategorySet,
}

impl CategoryFilter {
    /// Creates an unfiltered filter whose sets hold at most `limit` names each.
    pub fn with_capacity(limit: usize) -> Self {
        Self {
            included: CategorySet::with_capacity(limit),
            excluded: CategorySet::with_capacity(limit),
        }
    }

    /// Replaces the included categories.
    ///
    /// An empty or whitespace-only list selects every test.
    pub fn set_included(&mut self, csv: &str) -> Result<(), FilterError> {
        self.included.assign(csv).inspect_err(|e| {
            warn!(categories = csv, error = %e, "rejected included categories");
        })
    }

    /// Replaces the excluded categories.
    ///
    /// An empty or whitespace-only list excludes nothing.
    pub fn set_excluded(&mut self, csv: &str) -> Result<(), FilterError> {
        self.excluded.assign(csv).inspect_err(|e| {
            warn!(categories = csv, error = %e, "rejected excluded categories");
        })
    }

    /// Returns `true` if a test tagged with `entry_categories` should run.
    ///
    /// Pure: the result depends only on the arguments and the current
    /// configuration.
    pub fn is_eligible(&self, entry_categories: &str) -> bool {
        let selected = self.included.is_empty() || self.included.matches_any(entry_categories);
        let eligible = selected
            && (self.excluded.is_empty() || !self.excluded.matches_any(entry_categories));

        trace!(categories = entry_categories, eligible, "category filter");
        eligible
    }

    /// The included set.
    pub fn included(&self) -> &CategorySet {
        &self.included
    }

    /// The excluded set.
    pub fn excluded(&self) -> &CategorySet {
        &self.excluded
    }

    /// Returns `true` when neither set holds a name, i.e. every test is eligible.
    pub fn is_unfiltered(&self) -> bool {
        self.included.is_empty() && self.excluded.is_empty()
    }

    /// Resets both sets.
    pub fn clear(&mut self) {
        self.included.clear();
        self.excluded.clear();
    }
}
