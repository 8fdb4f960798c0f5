// crates/pulp-harness-selectors/src/lib.rs
// ============================================================================
// Module: Pulp Harness Selectors
// Description: Version-scoped defect policy and conditional-skip engine.
// Purpose: Decide whether behavior under test is exercisable on the target
//          version and expose that decision as a skip wrapper.
// Dependencies: pulp-harness-config, semver
// ============================================================================

//! ## Overview
//! Known defects map to a policy: always testable, never testable, or
//! present within a version range. Predicates are fail-open: an
//! unregistered defect id never skips a test. The skip engine evaluates a
//! predicate immediately before a test body runs and substitutes a
//! [`TestOutcome::Skipped`] outcome (with a human-readable reason) for the
//! body when the predicate holds.
//! Invariants:
//! - Unknown defect ids are treated as testable (fail-open).
//! - A skipped body is never executed; skips are control outcomes, not
//!   errors.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod bugs;
mod skip;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use bugs::BugStatus;
pub use bugs::BugTable;
pub use bugs::SelectorError;
pub use bugs::bug_is_testable;
pub use bugs::bug_is_untestable;
pub use bugs::register_bug;
pub use skip::SkipGuard;
pub use skip::TestOutcome;
pub use skip::skip_if;
