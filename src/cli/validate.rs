//! `forge validate`: check a record from a JSON file.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde_json::Value;

use forge::clock::{Clock, SystemClock};
use forge::model::{
    ArchitecturalSpec, CodeUpdate, DeploymentManifest, JournalEntry, SecurityAuditReport, Shard,
};
use forge::policy::{Assessment, Gated};
use forge::schema::Record;

use super::format::format_violations;

/// Which kind of record the file holds.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub(super) enum RecordKind {
    Shard,
    JournalEntry,
    CodeUpdate,
    SecurityAudit,
    ArchitecturalSpec,
    DeploymentManifest,
}

pub(super) fn run(kind: RecordKind, file: &Path) -> Result<(), String> {
    let contents = fs::read_to_string(file)
        .map_err(|e| format!("failed to read {}: {e}", file.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|e| format!("{} is not valid JSON: {e}", file.display()))?;

    let summary = validate(kind, &value, &SystemClock)?;
    println!("{summary}");
    Ok(())
}

fn validate(kind: RecordKind, value: &Value, clock: &dyn Clock) -> Result<String, String> {
    match kind {
        RecordKind::Shard => check::<Shard>(value, clock),
        RecordKind::JournalEntry => check::<JournalEntry>(value, clock),
        RecordKind::CodeUpdate => check::<CodeUpdate>(value, clock),
        RecordKind::SecurityAudit => check::<SecurityAuditReport>(value, clock),
        RecordKind::ArchitecturalSpec => check::<ArchitecturalSpec>(value, clock),
        RecordKind::DeploymentManifest => check::<DeploymentManifest>(value, clock),
    }
}

/// Schema first, then policy. Either failure is an error.
fn check<R: Record + Gated>(value: &Value, clock: &dyn Clock) -> Result<String, String> {
    let record = R::from_value(value, clock)
        .map_err(|err| format!("invalid {}:\n{}", err.record, format_violations(&err)))?;

    let assessment = Assessment::of(record);
    if !assessment.verdict.is_compliant() {
        return Err(format!("valid {}, but {}", R::NAME, assessment.verdict));
    }
    Ok(format!("valid {}; policy: {}", R::NAME, assessment.verdict))
}
