//! Platform status report: agent and shard counts at a glance.

use jiff::Timestamp;
use serde::Serialize;

use crate::clock::Clock;
use crate::config::Mode;
use crate::model::{AgentDirectory, AgentStatus, Manifest, ShardBook};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentCounts {
    pub total: usize,
    pub active: usize,
    pub planned: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShardCounts {
    pub active: usize,
    pub completed: usize,
    pub archived: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub platform: String,
    pub mode: Mode,
    pub guru_agents: AgentCounts,
    pub story_shards: ShardCounts,
    pub last_updated: Timestamp,
}

impl StatusReport {
    /// Counts as of the clock's current time.
    pub fn build(manifest: &Manifest, book: &ShardBook, mode: Mode, clock: &dyn Clock) -> Self {
        Self {
            platform: manifest.platform.name.clone(),
            mode,
            guru_agents: AgentCounts {
                total: manifest.agents().len(),
                active: manifest.agents_with_status(AgentStatus::Active).len(),
                planned: manifest.agents_with_status(AgentStatus::Planned).len(),
            },
            story_shards: ShardCounts {
                active: book.active_shards.len(),
                completed: book.completed_shards.len(),
                archived: book.archived_shards.len(),
                total: book.total(),
            },
            last_updated: clock.now(),
        }
    }
}
