//! Journal entries: the narrative record of what an agent did and why.

use std::sync::LazyLock;

use jiff::Timestamp;
use regex::Regex;
use serde::Serialize;

use crate::schema::{Fields, Record, Text};

use super::{AgentRole, SecurityLevel, TaskStatus};

static COMMIT_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{7,40}$").expect("commit hash pattern is valid"));

const TASK_ID: Text = Text::between(5, 50);
const LOGIC_SUMMARY: Text = Text::between(10, 5000);
static GIT_COMMIT_HASH: Text = Text::matching(&COMMIT_HASH);

/// One immutable entry in the journal.
///
/// `task_id` usually names a shard, but nothing checks that the shard
/// exists: agents may journal work that is not tracked yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalEntry {
    pub task_id: String,

    /// The agent in charge of the task.
    pub guru_agent: AgentRole,

    pub timestamp: Timestamp,

    /// What happened and why.
    pub logic_summary: String,

    pub sub_agents_engaged: Vec<String>,

    /// Lowercase hex, 7 to 40 characters.
    pub git_commit_hash: Option<String>,

    /// Paths to artifacts created.
    pub artifacts_created: Vec<String>,

    pub security_clearance: SecurityLevel,

    /// Back-reference to a parent workflow or context.
    pub parent_context_id: Option<String>,

    pub next_steps: Vec<String>,

    /// Task status at the time of writing.
    pub status: TaskStatus,
}

impl Record for JournalEntry {
    const NAME: &'static str = "journal entry";

    fn read(f: &mut Fields<'_>) -> Option<Self> {
        let task_id = f.text("task_id", &TASK_ID);
        let guru_agent = f.choice("guru_agent");
        let timestamp = f.timestamp_or_now("timestamp");
        let logic_summary = f.text("logic_summary", &LOGIC_SUMMARY);
        let sub_agents_engaged = f.text_list("sub_agents_engaged");
        let git_commit_hash = f.optional_text("git_commit_hash", &GIT_COMMIT_HASH);
        let artifacts_created = f.text_list("artifacts_created");
        let security_clearance = f.choice_or("security_clearance", SecurityLevel::Internal);
        let parent_context_id = f.optional_text("parent_context_id", &Text::ANY);
        let next_steps = f.text_list("next_steps");
        let status = f.choice_or("status", TaskStatus::InProgress);

        Some(Self {
            task_id: task_id?,
            guru_agent: guru_agent?,
            timestamp: timestamp?,
            logic_summary: logic_summary?,
            sub_agents_engaged: sub_agents_engaged?,
            git_commit_hash: git_commit_hash?,
            artifacts_created: artifacts_created?,
            security_clearance: security_clearance?,
            parent_context_id: parent_context_id?,
            next_steps: next_steps?,
            status: status?,
        })
    }
}
