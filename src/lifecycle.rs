//! The shard lifecycle: creation, assignment, completion, and archival.
//!
//! ```text
//!            assign                 complete
//! pending ──────────▶ in_progress ──────────▶ completed ──▶ archived
//!                      │      ▲                              ▲
//!          block / fail│      │assign                        │archive
//!                      ▼      │                              │
//!                  blocked / failed ─────────────────────────┘
//! ```
//!
//! Every operation is one read-modify-write cycle through
//! [`ShardRepository::transaction`]. A failed precondition aborts the cycle,
//! so nothing is persisted.

use tracing::info;

use crate::clock::Clock;
use crate::model::{
    AgentDescriptor, AgentDirectory, AgentRole, Collection, NewShard, Shard, ShardBook, TaskStatus,
};
use crate::schema::SchemaValidationError;
use crate::storage::{ShardRepository, StorageError};

/// Why a lifecycle operation was refused.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),

    #[error("shard already exists: {0}")]
    DuplicateShard(String),

    #[error("shard not found: {0}")]
    NotFound(String),

    #[error("no agent in the manifest plays {0}")]
    UnknownAgent(AgentRole),

    #[error("shard {shard_id} has unmet dependencies: {}", .unmet.join(", "))]
    DependencyNotSatisfied { shard_id: String, unmet: Vec<String> },

    #[error("shard {shard_id} cannot move from {from} to {to}")]
    InvalidTransition {
        shard_id: String,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = core::result::Result<T, LifecycleError>;

/// A shard handed to its owning agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub shard: Shard,
    pub agent: AgentDescriptor,
}

/// Drives shards through their lifecycle.
pub struct ShardManager<S, A, C> {
    store: S,
    agents: A,
    clock: C,
    enforce_dependencies: bool,
}

impl<S: ShardRepository, A: AgentDirectory, C: Clock> ShardManager<S, A, C> {
    pub fn new(store: S, agents: A, clock: C) -> Self {
        Self {
            store,
            agents,
            clock,
            enforce_dependencies: true,
        }
    }

    /// Whether assignment refuses pending shards with unmet dependencies.
    /// On by default.
    #[must_use]
    pub fn enforce_dependencies(mut self, enforce: bool) -> Self {
        self.enforce_dependencies = enforce;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a pending shard in the active collection.
    ///
    /// Dependencies are recorded but not checked here; assignment is the gate.
    pub fn create(&self, request: &NewShard) -> Result<Shard> {
        let shard = Shard::create(request, &self.clock)?;

        self.store.transaction(|book| -> Result<()> {
            if book.contains(&shard.shard_id) {
                return Err(LifecycleError::DuplicateShard(shard.shard_id.clone()));
            }
            book.active_shards.push(shard.clone());
            book.metrics.total_created += 1;
            Ok(())
        })?;

        info!(shard_id = %shard.shard_id, owner = %shard.owner_agent, "created shard");
        Ok(shard)
    }

    /// Puts an active shard in progress under its owner.
    ///
    /// Pending shards must have every dependency completed (unless enforcement
    /// is off). Blocked and failed shards resume. Assigning a shard that is
    /// already in progress re-confirms the owner and changes nothing else.
    pub fn assign(&self, shard_id: &str) -> Result<Assignment> {
        let enforce = self.enforce_dependencies;

        let assignment = self.store.transaction(|book| -> Result<Assignment> {
            let index = active_index(book, shard_id)?;
            let shard = &book.active_shards[index];

            let agent = self
                .agents
                .agent_for(shard.owner_agent)
                .ok_or(LifecycleError::UnknownAgent(shard.owner_agent))?
                .clone();

            match shard.status {
                TaskStatus::Pending => {
                    let unmet = book.unmet_dependencies(shard);
                    if enforce && !unmet.is_empty() {
                        return Err(LifecycleError::DependencyNotSatisfied {
                            shard_id: shard_id.to_string(),
                            unmet,
                        });
                    }
                }
                TaskStatus::InProgress | TaskStatus::Blocked | TaskStatus::Failed => {}
                from @ (TaskStatus::Completed | TaskStatus::Archived) => {
                    return Err(LifecycleError::InvalidTransition {
                        shard_id: shard_id.to_string(),
                        from,
                        to: TaskStatus::InProgress,
                    });
                }
            }

            let shard = &mut book.active_shards[index];
            shard.status = TaskStatus::InProgress;
            Ok(Assignment {
                shard: shard.clone(),
                agent,
            })
        })?;

        info!(shard_id, agent = %assignment.agent.name, "assigned shard");
        Ok(assignment)
    }

    /// Moves an active shard to the completed collection.
    ///
    /// The removal, the completion stamp, and the counter are saved together.
    pub fn complete(&self, shard_id: &str) -> Result<Shard> {
        let now = self.clock.now();

        let shard = self.store.transaction(|book| -> Result<Shard> {
            let index = active_index(book, shard_id)?;
            let mut shard = book.active_shards.remove(index);
            shard.status = TaskStatus::Completed;
            shard.completed_at = Some(now);
            book.completed_shards.push(shard.clone());
            book.metrics.total_completed += 1;
            Ok(shard)
        })?;

        info!(shard_id, "completed shard");
        Ok(shard)
    }

    /// Marks an in-progress shard as blocked.
    pub fn block(&self, shard_id: &str) -> Result<Shard> {
        self.interrupt(shard_id, TaskStatus::Blocked)
    }

    /// Marks an in-progress shard as failed.
    pub fn fail(&self, shard_id: &str) -> Result<Shard> {
        self.interrupt(shard_id, TaskStatus::Failed)
    }

    fn interrupt(&self, shard_id: &str, to: TaskStatus) -> Result<Shard> {
        let shard = self.store.transaction(|book| -> Result<Shard> {
            let index = active_index(book, shard_id)?;
            let shard = &mut book.active_shards[index];
            if shard.status != TaskStatus::InProgress {
                return Err(LifecycleError::InvalidTransition {
                    shard_id: shard_id.to_string(),
                    from: shard.status,
                    to,
                });
            }
            shard.status = to;
            Ok(shard.clone())
        })?;

        info!(shard_id, status = %to, "interrupted shard");
        Ok(shard)
    }

    /// Moves an active or completed shard to the archived collection.
    pub fn archive(&self, shard_id: &str) -> Result<Shard> {
        let shard = self.store.transaction(|book| -> Result<Shard> {
            let collection = match book.locate(shard_id) {
                Some((Collection::Archived, _)) | None => {
                    return Err(LifecycleError::NotFound(shard_id.to_string()));
                }
                Some((collection, _)) => collection,
            };
            let shards = book.collection_mut(collection);
            let index = shards
                .iter()
                .position(|s| s.shard_id == shard_id)
                .ok_or_else(|| LifecycleError::NotFound(shard_id.to_string()))?;
            let mut shard = shards.remove(index);
            shard.status = TaskStatus::Archived;
            book.archived_shards.push(shard.clone());
            book.metrics.total_archived += 1;
            Ok(shard)
        })?;

        info!(shard_id, "archived shard");
        Ok(shard)
    }

    /// Looks a shard up in any collection.
    pub fn get(&self, shard_id: &str) -> Result<(Collection, Shard)> {
        let book = self.store.load()?;
        book.locate(shard_id)
            .map(|(collection, shard)| (collection, shard.clone()))
            .ok_or_else(|| LifecycleError::NotFound(shard_id.to_string()))
    }

    /// The whole shard document as currently stored.
    pub fn snapshot(&self) -> Result<ShardBook> {
        Ok(self.store.load()?)
    }
}

fn active_index(book: &ShardBook, shard_id: &str) -> Result<usize> {
    book.active_index(shard_id)
        .ok_or_else(|| LifecycleError::NotFound(shard_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::{SignedDuration, Timestamp};

    use crate::clock::{FixedClock, SteppingClock};
    use crate::model::{AgentStatus, Manifest, Platform, Priority};
    use crate::storage::MemoryShardStore;

    fn start() -> Timestamp {
        Timestamp::new(1_768_298_400, 0).unwrap()
    }

    fn manifest() -> Manifest {
        let agent = |name: &str, status| AgentDescriptor {
            name: name.into(),
            role: "Testing".into(),
            status,
        };
        Manifest {
            platform: Platform {
                name: "Sovereign Forge".into(),
                version: Some("1.0.0".into()),
            },
            guru_agents: vec![
                agent("Architectural Sovereign", AgentStatus::Active),
                agent("Project Coordinator", AgentStatus::Active),
                agent("Security Sentinel", AgentStatus::Idle),
            ],
        }
    }

    fn manager(store: &MemoryShardStore) -> ShardManager<&MemoryShardStore, Manifest, FixedClock> {
        ShardManager::new(store, manifest(), FixedClock(start()))
    }

    fn request(shard_id: &str, owner: AgentRole) -> NewShard {
        NewShard::new(
            shard_id,
            "Implement the thing",
            "A description that is comfortably long enough.",
            owner,
        )
    }

    #[test]
    fn create_appends_pending_shard() {
        let store = MemoryShardStore::default();
        let forge = manager(&store);

        let shard = forge
            .create(
                &request("SHARD-001-INIT", AgentRole::ProjectCoordinator).priority(Priority::High),
            )
            .unwrap();

        assert_eq!(shard.status, TaskStatus::Pending);
        let book = store.load().unwrap();
        assert_eq!(book.active_shards, [shard]);
        assert_eq!(book.metrics.total_created, 1);
    }

    #[test]
    fn create_rejects_ids_taken_in_any_collection() {
        let store = MemoryShardStore::default();
        let forge = manager(&store);
        forge.create(&request("SHARD-001-INIT", AgentRole::ProjectCoordinator)).unwrap();
        forge.complete("SHARD-001-INIT").unwrap();

        let err = forge
            .create(&request("SHARD-001-INIT", AgentRole::ProjectCoordinator))
            .unwrap_err();

        assert!(matches!(err, LifecycleError::DuplicateShard(id) if id == "SHARD-001-INIT"));
        assert_eq!(store.load().unwrap().metrics.total_created, 1);
    }

    #[test]
    fn create_rejects_invalid_fields_without_saving() {
        let store = MemoryShardStore::default();
        let forge = manager(&store);

        let err = forge
            .create(&request("INVALID-ID", AgentRole::ProjectCoordinator).complexity(11))
            .unwrap_err();

        let LifecycleError::Schema(err) = err else {
            panic!("expected a schema error, got {err:?}");
        };
        assert!(err.violates("shard_id"));
        assert!(err.violates("estimated_complexity"));
        assert_eq!(store.saves(), 0);
    }

    #[test]
    fn assign_moves_pending_to_in_progress() {
        let store = MemoryShardStore::default();
        let forge = manager(&store);
        forge.create(&request("SHARD-002-WORK", AgentRole::ArchitecturalSovereign)).unwrap();

        let assignment = forge.assign("SHARD-002-WORK").unwrap();

        assert_eq!(assignment.shard.status, TaskStatus::InProgress);
        assert_eq!(assignment.agent.name, "Architectural Sovereign");
        assert_eq!(
            store.load().unwrap().active_shards[0].status,
            TaskStatus::InProgress
        );
    }

    #[test]
    fn reassigning_in_progress_shard_is_idempotent() {
        let store = MemoryShardStore::default();
        let forge = manager(&store);
        forge.create(&request("SHARD-002-WORK", AgentRole::ArchitecturalSovereign)).unwrap();

        forge.assign("SHARD-002-WORK").unwrap();
        let again = forge.assign("SHARD-002-WORK").unwrap();

        assert_eq!(again.shard.status, TaskStatus::InProgress);
        let book = store.load().unwrap();
        assert_eq!(book.active_shards.len(), 1);
        assert_eq!(book.active_shards[0].status, TaskStatus::InProgress);
    }

    #[test]
    fn assign_unknown_shard_fails() {
        let store = MemoryShardStore::default();
        let err = manager(&store).assign("SHARD-404-GONE").unwrap_err();

        assert!(matches!(err, LifecycleError::NotFound(_)));
    }

    #[test]
    fn assign_requires_owner_in_manifest() {
        let store = MemoryShardStore::default();
        let forge = manager(&store);
        forge.create(&request("SHARD-003-OPS", AgentRole::DevopsAutomator)).unwrap();

        let err = forge.assign("SHARD-003-OPS").unwrap_err();

        assert!(matches!(err, LifecycleError::UnknownAgent(AgentRole::DevopsAutomator)));
        assert_eq!(
            store.load().unwrap().active_shards[0].status,
            TaskStatus::Pending
        );
    }

    #[test]
    fn idle_owner_may_still_be_assigned() {
        let store = MemoryShardStore::default();
        let forge = manager(&store);
        forge.create(&request("SHARD-004-SEC", AgentRole::SecuritySentinel)).unwrap();

        assert!(forge.assign("SHARD-004-SEC").is_ok());
    }

    #[test]
    fn assign_waits_for_dependencies() {
        let store = MemoryShardStore::default();
        let forge = manager(&store);
        forge.create(&request("SHARD-010-BASE", AgentRole::ProjectCoordinator)).unwrap();
        forge
            .create(
                &request("SHARD-011-NEXT", AgentRole::ProjectCoordinator)
                    .depends_on(["SHARD-010-BASE", "SHARD-099-GHOST"]),
            )
            .unwrap();

        let err = forge.assign("SHARD-011-NEXT").unwrap_err();
        let LifecycleError::DependencyNotSatisfied { shard_id, unmet } = err else {
            panic!("expected unmet dependencies, got {err:?}");
        };
        assert_eq!(shard_id, "SHARD-011-NEXT");
        assert_eq!(unmet, ["SHARD-010-BASE", "SHARD-099-GHOST"]);
    }

    #[test]
    fn completed_dependencies_unlock_assignment() {
        let store = MemoryShardStore::default();
        let forge = manager(&store);
        forge.create(&request("SHARD-010-BASE", AgentRole::ProjectCoordinator)).unwrap();
        forge
            .create(
                &request("SHARD-011-NEXT", AgentRole::ProjectCoordinator)
                    .depends_on(["SHARD-010-BASE"]),
            )
            .unwrap();

        forge.complete("SHARD-010-BASE").unwrap();
        forge.archive("SHARD-010-BASE").unwrap();

        assert!(forge.assign("SHARD-011-NEXT").is_ok());
    }

    #[test]
    fn dependency_gate_can_be_disabled() {
        let store = MemoryShardStore::default();
        let forge = manager(&store).enforce_dependencies(false);
        forge
            .create(
                &request("SHARD-011-NEXT", AgentRole::ProjectCoordinator)
                    .depends_on(["SHARD-010-BASE"]),
            )
            .unwrap();

        assert!(forge.assign("SHARD-011-NEXT").is_ok());
    }

    #[test]
    fn complete_moves_shard_and_counts_it() {
        let store = MemoryShardStore::default();
        let forge = manager(&store);
        forge.create(&request("SHARD-005-DONE", AgentRole::ProjectCoordinator)).unwrap();
        forge.assign("SHARD-005-DONE").unwrap();

        let shard = forge.complete("SHARD-005-DONE").unwrap();

        assert_eq!(shard.status, TaskStatus::Completed);
        assert_eq!(shard.completed_at, Some(start()));
        let book = store.load().unwrap();
        assert!(book.active_shards.is_empty());
        assert_eq!(book.completed_shards, [shard]);
        assert_eq!(book.metrics.total_completed, 1);
    }

    #[test]
    fn completing_twice_fails_without_side_effects() {
        let store = MemoryShardStore::default();
        let forge = manager(&store);
        forge.create(&request("SHARD-005-DONE", AgentRole::ProjectCoordinator)).unwrap();
        forge.complete("SHARD-005-DONE").unwrap();
        let before = store.load().unwrap();
        let saves = store.saves();

        let err = forge.complete("SHARD-005-DONE").unwrap_err();

        assert!(matches!(err, LifecycleError::NotFound(_)));
        assert_eq!(store.load().unwrap(), before);
        assert_eq!(store.saves(), saves);
    }

    #[test]
    fn block_and_fail_require_in_progress() {
        let store = MemoryShardStore::default();
        let forge = manager(&store);
        forge.create(&request("SHARD-006-STUCK", AgentRole::ProjectCoordinator)).unwrap();

        let err = forge.block("SHARD-006-STUCK").unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::InvalidTransition {
                from: TaskStatus::Pending,
                to: TaskStatus::Blocked,
                ..
            }
        ));

        forge.assign("SHARD-006-STUCK").unwrap();
        assert_eq!(forge.block("SHARD-006-STUCK").unwrap().status, TaskStatus::Blocked);
        assert!(forge.fail("SHARD-006-STUCK").is_err());

        // Blocked shards resume through assignment.
        forge.assign("SHARD-006-STUCK").unwrap();
        assert_eq!(forge.fail("SHARD-006-STUCK").unwrap().status, TaskStatus::Failed);
        assert_eq!(
            forge.assign("SHARD-006-STUCK").unwrap().shard.status,
            TaskStatus::InProgress
        );
    }

    #[test]
    fn archive_takes_active_or_completed_shards_once() {
        let store = MemoryShardStore::default();
        let forge = manager(&store);
        forge.create(&request("SHARD-007-OLD", AgentRole::ProjectCoordinator)).unwrap();
        forge.create(&request("SHARD-008-DROP", AgentRole::ProjectCoordinator)).unwrap();
        forge.complete("SHARD-007-OLD").unwrap();

        let archived = forge.archive("SHARD-007-OLD").unwrap();
        assert_eq!(archived.status, TaskStatus::Archived);
        assert!(archived.completed_at.is_some());
        forge.archive("SHARD-008-DROP").unwrap();

        assert!(matches!(
            forge.archive("SHARD-007-OLD").unwrap_err(),
            LifecycleError::NotFound(_)
        ));

        let book = store.load().unwrap();
        assert!(book.active_shards.is_empty());
        assert!(book.completed_shards.is_empty());
        assert_eq!(book.archived_shards.len(), 2);
        assert_eq!(book.metrics.total_archived, 2);
    }

    #[test]
    fn get_reports_collection() {
        let store = MemoryShardStore::default();
        let forge = manager(&store);
        forge.create(&request("SHARD-009-FIND", AgentRole::ProjectCoordinator)).unwrap();
        forge.complete("SHARD-009-FIND").unwrap();

        let (collection, shard) = forge.get("SHARD-009-FIND").unwrap();
        assert_eq!(collection, Collection::Completed);
        assert_eq!(shard.status, TaskStatus::Completed);
        assert!(forge.get("SHARD-404-GONE").is_err());
    }

    #[test]
    fn creation_times_follow_the_clock() {
        let store = MemoryShardStore::default();
        let clock = SteppingClock::new(start(), SignedDuration::from_mins(1));
        let forge = ShardManager::new(&store, manifest(), &clock);

        let first = forge.create(&request("SHARD-020-A", AgentRole::ProjectCoordinator)).unwrap();
        let second = forge.create(&request("SHARD-021-B", AgentRole::ProjectCoordinator)).unwrap();

        assert_eq!(
            second.created_at.duration_since(first.created_at),
            SignedDuration::from_mins(1)
        );
    }
}
