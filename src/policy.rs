//! Policy gates: semantic checks layered over schema validity.
//!
//! A structurally valid record can still be non-compliant. Gates never fail
//! with an error. They report a [`Verdict`] and leave the decision of what to
//! do about it to the caller.

use std::fmt;

use crate::model::{
    ArchitecturalSpec, CodeUpdate, DeploymentManifest, JournalEntry, SecurityAuditReport,
    SecurityLevel, Shard,
};

/// One reason a record is not compliant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyViolation {
    MissingTaskId,
    MissingSummary,
    /// Top-secret entries must reference a commit.
    UncommittedTopSecret,
    TestsFailed,
    SecurityScanFailed,
    LintingFailed,
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingTaskId => "task id is empty",
            Self::MissingSummary => "logic summary is empty",
            Self::UncommittedTopSecret => "top secret entries require a git commit hash",
            Self::TestsFailed => "tests did not pass",
            Self::SecurityScanFailed => "security scan did not pass",
            Self::LintingFailed => "linting did not pass",
        })
    }
}

/// The outcome of a policy gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    violations: Vec<PolicyViolation>,
}

impl Verdict {
    pub fn compliant() -> Self {
        Self::default()
    }

    fn from_checks(checks: impl IntoIterator<Item = (bool, PolicyViolation)>) -> Self {
        Self {
            violations: checks
                .into_iter()
                .filter_map(|(failed, violation)| failed.then_some(violation))
                .collect(),
        }
    }

    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[PolicyViolation] {
        &self.violations
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            return f.write_str("compliant");
        }
        let reasons: Vec<String> = self.violations.iter().map(ToString::to_string).collect();
        write!(f, "non-compliant: {}", reasons.join("; "))
    }
}

/// Records that have a policy gate.
///
/// Records without semantic rules are always compliant.
pub trait Gated {
    fn assess(&self) -> Verdict {
        Verdict::compliant()
    }
}

impl Gated for JournalEntry {
    fn assess(&self) -> Verdict {
        assess_journal_entry(self)
    }
}

impl Gated for CodeUpdate {
    fn assess(&self) -> Verdict {
        assess_code_update(self)
    }
}

impl Gated for Shard {}
impl Gated for SecurityAuditReport {}
impl Gated for ArchitecturalSpec {}
impl Gated for DeploymentManifest {}

/// A schema-valid record together with its policy verdict.
///
/// Structural validity is implied by holding the record at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment<T> {
    pub record: T,
    pub verdict: Verdict,
}

impl<T: Gated> Assessment<T> {
    pub fn of(record: T) -> Self {
        let verdict = record.assess();
        Self { record, verdict }
    }
}

/// Checks a journal entry for completeness and clearance requirements.
pub fn assess_journal_entry(entry: &JournalEntry) -> Verdict {
    Verdict::from_checks([
        (entry.task_id.is_empty(), PolicyViolation::MissingTaskId),
        (entry.logic_summary.is_empty(), PolicyViolation::MissingSummary),
        (
            entry.security_clearance == SecurityLevel::TopSecret
                && entry.git_commit_hash.as_deref().is_none_or(str::is_empty),
            PolicyViolation::UncommittedTopSecret,
        ),
    ])
}

/// Checks that a code update passed every quality gate.
pub fn assess_code_update(update: &CodeUpdate) -> Verdict {
    Verdict::from_checks([
        (!update.tests_passed, PolicyViolation::TestsFailed),
        (!update.security_scan_passed, PolicyViolation::SecurityScanFailed),
        (!update.linting_passed, PolicyViolation::LintingFailed),
    ])
}

pub fn validate_journal_entry(entry: &JournalEntry) -> bool {
    assess_journal_entry(entry).is_compliant()
}

pub fn validate_code_update(update: &CodeUpdate) -> bool {
    assess_code_update(update).is_compliant()
}
