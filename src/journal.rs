//! The journal recorder: validated entries in, immutable records out.
//!
//! Recording is permissive about policy. An entry that fails
//! its policy gate is still written, with a warning, and the verdict is
//! handed back alongside it. Schema violations do stop recording.

mod render;

use serde::Serialize;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::model::{AgentRole, JournalEntry, SecurityLevel, TaskStatus};
use crate::policy::{Verdict, assess_journal_entry};
use crate::schema::{Record, SchemaValidationError};
use crate::storage::{JournalStore, StorageError};

pub use render::{record_name, render};

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What a caller supplies to record an entry. The timestamp comes from the
/// recorder's clock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalDraft {
    pub task_id: String,
    pub guru_agent: AgentRole,
    pub logic_summary: String,
    pub sub_agents_engaged: Vec<String>,
    pub artifacts_created: Vec<String>,
    pub next_steps: Vec<String>,
    pub status: TaskStatus,
    pub security_clearance: SecurityLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_commit_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_context_id: Option<String>,
}

impl JournalDraft {
    pub fn new(
        task_id: impl Into<String>,
        guru_agent: AgentRole,
        logic_summary: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            guru_agent,
            logic_summary: logic_summary.into(),
            sub_agents_engaged: Vec::new(),
            artifacts_created: Vec::new(),
            next_steps: Vec::new(),
            status: TaskStatus::InProgress,
            security_clearance: SecurityLevel::Internal,
            git_commit_hash: None,
            parent_context_id: None,
        }
    }

    #[must_use]
    pub fn sub_agents(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.sub_agents_engaged = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn artifacts(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.artifacts_created = paths.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn next_steps(mut self, steps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.next_steps = steps.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn clearance(mut self, level: SecurityLevel) -> Self {
        self.security_clearance = level;
        self
    }

    #[must_use]
    pub fn commit(mut self, hash: impl Into<String>) -> Self {
        self.git_commit_hash = Some(hash.into());
        self
    }

    #[must_use]
    pub fn parent(mut self, context_id: impl Into<String>) -> Self {
        self.parent_context_id = Some(context_id.into());
        self
    }
}

/// A written journal record.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub entry: JournalEntry,
    /// The policy verdict. Non-compliant entries are recorded all the same.
    pub verdict: Verdict,
    /// The name the store filed the record under.
    pub name: String,
}

/// Appends journal entries to a store.
pub struct JournalRecorder<J, C> {
    store: J,
    clock: C,
}

impl<J: JournalStore, C: Clock> JournalRecorder<J, C> {
    pub fn new(store: J, clock: C) -> Self {
        Self { store, clock }
    }

    /// Builds, validates, and writes an entry from a draft.
    pub fn record(&self, draft: &JournalDraft) -> Result<Recorded, JournalError> {
        let entry = JournalEntry::from_serializable(draft, &self.clock)?;
        self.write(entry)
    }

    /// Writes an entry built elsewhere, re-checking its fields first.
    pub fn record_entry(&self, entry: JournalEntry) -> Result<Recorded, JournalError> {
        entry.check()?;
        self.write(entry)
    }

    fn write(&self, entry: JournalEntry) -> Result<Recorded, JournalError> {
        let verdict = assess_journal_entry(&entry);
        if !verdict.is_compliant() {
            warn!(task_id = %entry.task_id, %verdict, "recording non-compliant journal entry");
        }

        let name = self.store.append(&record_name(&entry), &render(&entry))?;
        info!(
            task_id = %entry.task_id,
            agent = %entry.guru_agent,
            name = %name,
            "recorded journal entry"
        );

        Ok(Recorded {
            entry,
            verdict,
            name,
        })
    }
}
