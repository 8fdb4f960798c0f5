// crates/pulp-harness-selectors/src/skip.rs
// ============================================================================
// Module: Skip Engine
// Description: Conditional-skip wrapper for test invocations.
// Purpose: Substitute a skip outcome for a test body when a predicate holds.
// Dependencies: pulp-harness-config, semver
// ============================================================================

//! ## Overview
//! [`skip_if`] wraps one test invocation; [`SkipGuard`] evaluates a
//! predicate once and applies it to every test of a suite, so a guard
//! built at suite setup propagates the skip to each test method. Skips are
//! control outcomes reported to the runner, never failures, and a skipped
//! body is never executed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use pulp_harness_config::SystemsConfig;
use semver::Version;

use crate::bugs::bug_is_untestable;

// ============================================================================
// SECTION: Test Outcome
// ============================================================================

/// Control outcome of a guarded test invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    /// The test body ran to completion.
    Completed,
    /// The test body was skipped before execution.
    Skipped {
        /// Human-readable reason reported to the runner.
        reason: String,
    },
}

impl TestOutcome {
    /// Returns true when the body was skipped.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// Returns the skip reason, when the body was skipped.
    #[must_use]
    pub fn skip_reason(&self) -> Option<&str> {
        match self {
            Self::Skipped {
                reason,
            } => Some(reason),
            Self::Completed => None,
        }
    }
}

// ============================================================================
// SECTION: Skip Guard
// ============================================================================

/// A predicate evaluated once and applied to one or many test invocations.
///
/// Build a guard at suite setup to propagate one skip decision to every
/// test method of the suite, or build it inline for a single test.
#[derive(Debug, Clone)]
pub struct SkipGuard {
    /// Reason the guard skips, when it does.
    reason: Option<String>,
}

impl SkipGuard {
    /// Builds a guard from a predicate and a reason.
    ///
    /// The predicate is evaluated immediately; `reason` is reported for
    /// every invocation the guard skips.
    pub fn new<P>(predicate: P, reason: impl Into<String>) -> Self
    where
        P: FnOnce() -> bool,
    {
        let reason = predicate().then(|| reason.into());
        Self {
            reason,
        }
    }

    /// Builds a guard that skips when a registered defect makes behavior
    /// untestable on the configured version.
    ///
    /// The reason names the defect id and the version it was evaluated
    /// against. Unregistered ids never skip (fail-open).
    #[must_use]
    pub fn for_untestable_bug(bug_id: u32, config: &SystemsConfig) -> Self {
        let version = &config.version;
        Self::new(
            || bug_is_untestable(bug_id, version),
            format!("defect {bug_id} is untestable on version {version}"),
        )
    }

    /// Builds a guard that skips when the configured version is below
    /// `minimum`.
    #[must_use]
    pub fn for_minimum_version(minimum: &Version, config: &SystemsConfig) -> Self {
        let version = &config.version;
        Self::new(
            || *version < *minimum,
            format!("version {version} is below required minimum {minimum}"),
        )
    }

    /// Returns true when the guard will skip invocations.
    #[must_use]
    pub const fn active(&self) -> bool {
        self.reason.is_some()
    }

    /// Returns the skip reason, when the guard is active.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Runs `test` unless the guard is active.
    ///
    /// When active, the body is never executed and the outcome carries the
    /// guard's reason.
    pub fn run<F>(&self, test: F) -> TestOutcome
    where
        F: FnOnce(),
    {
        match &self.reason {
            Some(reason) => {
                tracing::info!(reason, "test skipped");
                TestOutcome::Skipped {
                    reason: reason.clone(),
                }
            }
            None => {
                test();
                TestOutcome::Completed
            }
        }
    }
}

// ============================================================================
// SECTION: Skip Wrapper
// ============================================================================

/// Evaluates `predicate` immediately before `test`; when it holds, the
/// body is skipped with `reason` instead of executed.
pub fn skip_if<P, F>(predicate: P, reason: impl Into<String>, test: F) -> TestOutcome
where
    P: FnOnce() -> bool,
    F: FnOnce(),
{
    SkipGuard::new(predicate, reason).run(test)
}
