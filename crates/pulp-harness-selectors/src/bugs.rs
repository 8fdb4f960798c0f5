// crates/pulp-harness-selectors/src/bugs.rs
// ============================================================================
// Module: Defect Table
// Description: Version-scoped defect policies with fail-open lookups.
// Purpose: Answer "is this behavior exercisable on this version?" per
//          registered defect.
// Dependencies: semver
// ============================================================================

//! ## Overview
//! A defect id maps to a [`BugStatus`]: always testable, never testable,
//! or present within `[introduced_in, fixed_in)`. Lookups are fail-open:
//! an id nobody registered is assumed testable, so unregistered ids can
//! never silently skip tests. The table contents are caller data; this
//! crate ships no defect ids of its own.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use semver::Version;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Defect table errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SelectorError {
    /// A range's bounds are inverted.
    #[error("defect range invalid: introduced_in {introduced_in} exceeds fixed_in {fixed_in}")]
    InvalidRange {
        /// Version the defect appeared in.
        introduced_in: Version,
        /// Version the defect was fixed in.
        fixed_in: Version,
    },
    /// The process-wide registry lock was poisoned by a panicking holder.
    #[error("defect registry lock poisoned")]
    RegistryPoisoned,
}

// ============================================================================
// SECTION: Bug Status
// ============================================================================

/// Policy attached to a known defect id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BugStatus {
    /// The dependent behavior is testable on every version.
    Testable,
    /// The dependent behavior is untestable on every version.
    Untestable,
    /// The defect is present within `[introduced_in, fixed_in)`.
    Range {
        /// Version the defect appeared in.
        introduced_in: Version,
        /// Version the defect was fixed in; absent means not yet fixed.
        fixed_in: Option<Version>,
    },
}

impl BugStatus {
    /// Builds a validated version-range policy.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::InvalidRange`] when `introduced_in`
    /// exceeds `fixed_in`.
    pub fn range(
        introduced_in: Version,
        fixed_in: Option<Version>,
    ) -> Result<Self, SelectorError> {
        if let Some(fixed) = &fixed_in
            && introduced_in > *fixed
        {
            return Err(SelectorError::InvalidRange {
                introduced_in,
                fixed_in: fixed.clone(),
            });
        }
        Ok(Self::Range {
            introduced_in,
            fixed_in,
        })
    }

    /// Returns true when the defect makes behavior untestable on `version`.
    #[must_use]
    pub fn affects(&self, version: &Version) -> bool {
        match self {
            Self::Testable => false,
            Self::Untestable => true,
            Self::Range {
                introduced_in,
                fixed_in,
            } => {
                *version >= *introduced_in
                    && fixed_in.as_ref().is_none_or(|fixed| *version < *fixed)
            }
        }
    }
}

// ============================================================================
// SECTION: Bug Table
// ============================================================================

/// Mapping from defect ids to policies.
#[derive(Debug, Default)]
pub struct BugTable {
    /// Registered policies keyed by defect id.
    entries: BTreeMap<u32, BugStatus>,
}

impl BugTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Registers (or replaces) a policy for a defect id.
    pub fn insert(&mut self, id: u32, status: BugStatus) {
        self.entries.insert(id, status);
    }

    /// Returns the registered policy for a defect id, when one exists.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&BugStatus> {
        self.entries.get(&id)
    }

    /// Returns true iff `id` is registered and affects `version`.
    ///
    /// Unregistered ids return false (fail-open).
    #[must_use]
    pub fn is_untestable(&self, id: u32, version: &Version) -> bool {
        self.entries.get(&id).is_some_and(|status| status.affects(version))
    }

    /// Returns true unless `id` is registered and affects `version`.
    ///
    /// Unregistered ids return true (fail-open).
    #[must_use]
    pub fn is_testable(&self, id: u32, version: &Version) -> bool {
        !self.is_untestable(id, version)
    }
}

// ============================================================================
// SECTION: Process-wide Registry
// ============================================================================

/// Process-wide defect registry seeded by consuming suites.
static REGISTRY: Mutex<BugTable> = Mutex::new(BugTable::new());

/// Registers (or replaces) a policy in the process-wide registry.
///
/// # Errors
///
/// Returns [`SelectorError::RegistryPoisoned`] when the lock is poisoned.
pub fn register_bug(id: u32, status: BugStatus) -> Result<(), SelectorError> {
    let mut registry = REGISTRY.lock().map_err(|_| SelectorError::RegistryPoisoned)?;
    registry.insert(id, status);
    Ok(())
}

/// Returns true iff `id` is registered and affects `version`.
///
/// Unregistered ids, and a poisoned registry, answer false, keeping the
/// fail-open default.
#[must_use]
pub fn bug_is_untestable(id: u32, version: &Version) -> bool {
    match REGISTRY.lock() {
        Ok(registry) => registry.is_untestable(id, version),
        Err(_) => {
            tracing::warn!(id, "defect registry poisoned; treating defect as testable");
            false
        }
    }
}

/// Returns true unless `id` is registered and affects `version`.
///
/// Unregistered ids, and a poisoned registry, answer true, keeping the
/// fail-open default.
#[must_use]
pub fn bug_is_testable(id: u32, version: &Version) -> bool {
    !bug_is_untestable(id, version)
}
