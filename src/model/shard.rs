//! Shards: the unit of work, and the document that tracks them.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use jiff::Timestamp;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::clock::Clock;
use crate::schema::{Bounds, Fields, Record, SchemaValidationError, Text, timestamp};

use super::{AgentRole, Priority, TaskStatus};

static SHARD_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^SHARD-\d{3}-[A-Z]+$").expect("shard id pattern is valid"));

static SHARD_ID: Text = Text::matching(&SHARD_ID_PATTERN);
const TITLE: Text = Text::between(5, 200);
const DESCRIPTION: Text = Text::at_least(20);
const COMPLEXITY: Bounds<i64> = Bounds::between(1, 10);
const DEFAULT_COMPLEXITY: u8 = 5;

/// An atomic, independently trackable unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shard {
    /// `SHARD-<3 digits>-<UPPERCASE TAG>`, unique across all collections.
    pub shard_id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// The agent responsible for the shard.
    pub owner_agent: AgentRole,

    #[serde(default)]
    pub contributing_agents: BTreeSet<AgentRole>,

    #[serde(default)]
    pub priority: Priority,

    pub status: TaskStatus,

    /// Shards that must complete before this one may leave pending.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// 1 (simple) to 10 (complex).
    #[serde(default = "default_complexity")]
    pub estimated_complexity: u8,

    /// What "done" means.
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,

    /// Offset-less times in stored documents are read as UTC.
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: Timestamp,

    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub target_completion: Option<Timestamp>,

    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub completed_at: Option<Timestamp>,
}

fn default_complexity() -> u8 {
    DEFAULT_COMPLEXITY
}

impl Record for Shard {
    const NAME: &'static str = "shard";

    fn read(f: &mut Fields<'_>) -> Option<Self> {
        let shard_id = f.text("shard_id", &SHARD_ID);
        let title = f.text("title", &TITLE);
        let description = f.text("description", &DESCRIPTION);
        let owner_agent = f.choice("owner_agent");
        let contributing_agents = f.choice_set("contributing_agents");
        let priority = f.choice_or("priority", Priority::Medium);
        let status = f.choice_or("status", TaskStatus::Pending);
        let dependencies = f.text_list("dependencies");
        let estimated_complexity =
            f.integer_or("estimated_complexity", COMPLEXITY, DEFAULT_COMPLEXITY);
        let acceptance_criteria = f.text_list("acceptance_criteria");
        let created_at = f.timestamp_or_now("created_at");
        let target_completion = f.optional_timestamp("target_completion");
        let completed_at = f.optional_timestamp("completed_at");

        Some(Self {
            shard_id: shard_id?,
            title: title?,
            description: description?,
            owner_agent: owner_agent?,
            contributing_agents: contributing_agents?,
            priority: priority?,
            status: status?,
            dependencies: dependencies?,
            estimated_complexity: estimated_complexity?,
            acceptance_criteria: acceptance_criteria?,
            created_at: created_at?,
            target_completion: target_completion?,
            completed_at: completed_at?,
        })
    }
}

impl Shard {
    /// Builds a pending shard from a request, stamped with the clock's time.
    pub fn create(request: &NewShard, clock: &dyn Clock) -> Result<Self, SchemaValidationError> {
        Self::from_serializable(request, clock)
    }
}

/// A request to create a shard.
///
/// Carries only what a caller chooses; status and creation time are set
/// when the shard is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewShard {
    pub shard_id: String,
    pub title: String,
    pub description: String,
    pub owner_agent: AgentRole,
    pub contributing_agents: Vec<AgentRole>,
    pub priority: Priority,
    pub dependencies: Vec<String>,
    pub estimated_complexity: u8,
    pub acceptance_criteria: Vec<String>,
    pub target_completion: Option<Timestamp>,
}

impl NewShard {
    pub fn new(
        shard_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        owner_agent: AgentRole,
    ) -> Self {
        Self {
            shard_id: shard_id.into(),
            title: title.into(),
            description: description.into(),
            owner_agent,
            contributing_agents: Vec::new(),
            priority: Priority::default(),
            dependencies: Vec::new(),
            estimated_complexity: DEFAULT_COMPLEXITY,
            acceptance_criteria: Vec::new(),
            target_completion: None,
        }
    }

    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn depends_on(mut self, dependencies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn complexity(mut self, complexity: u8) -> Self {
        self.estimated_complexity = complexity;
        self
    }

    #[must_use]
    pub fn contributors(mut self, agents: impl IntoIterator<Item = AgentRole>) -> Self {
        self.contributing_agents = agents.into_iter().collect();
        self
    }

    #[must_use]
    pub fn acceptance(mut self, criteria: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.acceptance_criteria = criteria.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn target(mut self, target_completion: Timestamp) -> Self {
        self.target_completion = Some(target_completion);
        self
    }
}

/// Which of the three disjoint collections a shard lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Active,
    Completed,
    Archived,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        })
    }
}

/// Running totals kept alongside the collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardMetrics {
    pub total_created: u64,
    pub total_completed: u64,
    pub total_archived: u64,

    /// Counters this crate does not track, kept so a rewrite preserves them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The persisted shard document.
///
/// Read and written whole. A shard id appears in at most one collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardBook {
    pub active_shards: Vec<Shard>,
    pub completed_shards: Vec<Shard>,
    pub archived_shards: Vec<Shard>,
    pub metrics: ShardMetrics,

    /// Top-level keys written by other tools, carried through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ShardBook {
    /// Finds a shard in any collection.
    pub fn locate(&self, shard_id: &str) -> Option<(Collection, &Shard)> {
        [
            (Collection::Active, &self.active_shards),
            (Collection::Completed, &self.completed_shards),
            (Collection::Archived, &self.archived_shards),
        ]
        .into_iter()
        .find_map(|(collection, shards)| {
            shards
                .iter()
                .find(|s| s.shard_id == shard_id)
                .map(|shard| (collection, shard))
        })
    }

    /// Whether the id is taken in any collection.
    pub fn contains(&self, shard_id: &str) -> bool {
        self.locate(shard_id).is_some()
    }

    pub fn collection(&self, collection: Collection) -> &[Shard] {
        match collection {
            Collection::Active => &self.active_shards,
            Collection::Completed => &self.completed_shards,
            Collection::Archived => &self.archived_shards,
        }
    }

    pub fn collection_mut(&mut self, collection: Collection) -> &mut Vec<Shard> {
        match collection {
            Collection::Active => &mut self.active_shards,
            Collection::Completed => &mut self.completed_shards,
            Collection::Archived => &mut self.archived_shards,
        }
    }

    /// Position of a shard in the active collection.
    pub fn active_index(&self, shard_id: &str) -> Option<usize> {
        self.active_shards
            .iter()
            .position(|s| s.shard_id == shard_id)
    }

    /// Dependencies of `shard` that have not completed, in declared order.
    ///
    /// A dependency is satisfied once it sits in the completed collection,
    /// or in the archived one with a completion time.
    pub fn unmet_dependencies(&self, shard: &Shard) -> Vec<String> {
        shard
            .dependencies
            .iter()
            .filter(|dep| !self.is_completed(dep))
            .cloned()
            .collect()
    }

    fn is_completed(&self, shard_id: &str) -> bool {
        match self.locate(shard_id) {
            Some((Collection::Completed, _)) => true,
            Some((Collection::Archived, shard)) => shard.completed_at.is_some(),
            Some((Collection::Active, _)) | None => false,
        }
    }

    pub fn total(&self) -> usize {
        self.active_shards.len() + self.completed_shards.len() + self.archived_shards.len()
    }
}
