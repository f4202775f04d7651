//! Core data model for Forge.
//!
//! These types are the vocabulary agents share: closed enumerations,
//! the validated records they exchange, and the persisted shard document.

mod agent;
mod architecture;
mod audit;
mod code_update;
mod deployment;
mod journal;
mod shard;
mod status;

pub use agent::{AgentDescriptor, AgentDirectory, AgentRole, AgentStatus, Manifest, Platform};
pub use architecture::ArchitecturalSpec;
pub use audit::SecurityAuditReport;
pub use code_update::{CodeUpdate, Secret};
pub use deployment::DeploymentManifest;
pub use journal::JournalEntry;
pub use shard::{Collection, NewShard, Shard, ShardBook, ShardMetrics};
pub use status::{Priority, SecurityLevel, TaskStatus};

/// A string did not name a member of a closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}', expected one of: {expected}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
    expected: String,
}

impl ParseEnumError {
    pub(crate) fn new(
        kind: &'static str,
        value: &str,
        choices: impl IntoIterator<Item = &'static str>,
    ) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected: choices.into_iter().collect::<Vec<_>>().join(", "),
        }
    }
}
