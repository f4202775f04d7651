//! `forge shard`: create shards and drive them through their lifecycle.

use clap::{Subcommand, ValueEnum};

use forge::clock::SystemClock;
use forge::config::{Config, StoreKind};
use forge::lifecycle::{LifecycleError, ShardManager};
use forge::model::{AgentDescriptor, AgentDirectory, AgentRole, Collection, NewShard, Priority};
use forge::storage::{ConfiguredStore, JsonShardStore, SqliteShardStore, Workspace};

use super::format::{format_shard_line, format_violations};
use super::manifest;

#[derive(Debug, Subcommand)]
pub(super) enum ShardCommand {
    /// Create a pending shard. Prints the shard id.
    New {
        /// `SHARD-<3 digits>-<UPPERCASE TAG>`, e.g. SHARD-007-AUTH.
        id: String,

        /// Short title, 5 to 200 characters.
        title: String,

        /// What the shard covers, at least 20 characters.
        #[arg(long)]
        description: String,

        /// Agent responsible for the shard.
        #[arg(long)]
        owner: AgentRole,

        #[arg(long, default_value = "medium")]
        priority: Priority,

        /// Shard that must complete first. Repeatable.
        #[arg(long = "depends-on")]
        depends_on: Vec<String>,

        /// Estimated complexity, 1 to 10.
        #[arg(long, default_value_t = 5)]
        complexity: u8,

        /// Contributing agent. Repeatable.
        #[arg(long = "contributor")]
        contributors: Vec<AgentRole>,

        /// Acceptance criterion. Repeatable.
        #[arg(long = "criterion")]
        criteria: Vec<String>,
    },

    /// Put a shard in progress under its owner.
    ///
    /// The owner must be defined in the manifest. A pending shard needs
    /// its dependencies completed first.
    Assign { id: String },

    /// Move an active shard to completed.
    Complete { id: String },

    /// Mark an in-progress shard as blocked.
    Block { id: String },

    /// Mark an in-progress shard as failed.
    Fail { id: String },

    /// Move an active or completed shard to archived.
    Archive { id: String },

    /// List shards in one collection.
    List {
        #[arg(long, value_enum, default_value = "active")]
        collection: CollectionArg,
    },

    /// Print one shard as JSON.
    Show { id: String },
}

/// CLI-facing collection, mapped to the domain `Collection`.
#[derive(Debug, Clone, ValueEnum)]
pub(super) enum CollectionArg {
    Active,
    Completed,
    Archived,
}

impl CollectionArg {
    fn to_domain(&self) -> Collection {
        match self {
            Self::Active => Collection::Active,
            Self::Completed => Collection::Completed,
            Self::Archived => Collection::Archived,
        }
    }
}

/// The shard store selected by `shard-store` in the config.
pub(super) fn open_store(
    config: &Config,
    workspace: &Workspace,
) -> Result<ConfiguredStore, String> {
    match config.shard_store {
        StoreKind::Json => Ok(ConfiguredStore::Json(JsonShardStore::new(
            workspace.shards_json_path(),
        ))),
        StoreKind::Sqlite => SqliteShardStore::open(workspace.shards_sqlite_path())
            .map(ConfiguredStore::Sqlite)
            .map_err(|e| format!("failed to open shard database: {e}")),
    }
}

fn manager<A: AgentDirectory>(
    config: &Config,
    workspace: &Workspace,
    agents: A,
) -> Result<ShardManager<ConfiguredStore, A, SystemClock>, String> {
    let store = open_store(config, workspace)?;
    Ok(ShardManager::new(store, agents, SystemClock)
        .enforce_dependencies(config.enforce_dependencies))
}

pub(super) fn run(
    config: &Config,
    workspace: &Workspace,
    command: ShardCommand,
) -> Result<(), String> {
    // Only assignment consults the manifest.
    let no_agents: &[AgentDescriptor] = &[];

    match command {
        ShardCommand::New {
            id,
            title,
            description,
            owner,
            priority,
            depends_on,
            complexity,
            contributors,
            criteria,
        } => {
            let request = NewShard::new(id, title, description, owner)
                .priority(priority)
                .depends_on(depends_on)
                .complexity(complexity)
                .contributors(contributors)
                .acceptance(criteria);
            cmd_new(&manager(config, workspace, no_agents)?, &request)
        }
        ShardCommand::Assign { id } => {
            let manifest = manifest(workspace)?;
            let assignment = manager(config, workspace, &manifest)?
                .assign(&id)
                .map_err(|e| format!("failed to assign shard: {e}"))?;
            eprintln!("Shard {id} assigned to {}", assignment.agent.name);
            Ok(())
        }
        ShardCommand::Complete { id } => {
            manager(config, workspace, no_agents)?
                .complete(&id)
                .map_err(|e| format!("failed to complete shard: {e}"))?;
            eprintln!("Shard {id} completed");
            Ok(())
        }
        ShardCommand::Block { id } => {
            manager(config, workspace, no_agents)?
                .block(&id)
                .map_err(|e| format!("failed to block shard: {e}"))?;
            eprintln!("Shard {id} blocked");
            Ok(())
        }
        ShardCommand::Fail { id } => {
            manager(config, workspace, no_agents)?
                .fail(&id)
                .map_err(|e| format!("failed to fail shard: {e}"))?;
            eprintln!("Shard {id} failed");
            Ok(())
        }
        ShardCommand::Archive { id } => {
            manager(config, workspace, no_agents)?
                .archive(&id)
                .map_err(|e| format!("failed to archive shard: {e}"))?;
            eprintln!("Shard {id} archived");
            Ok(())
        }
        ShardCommand::List { collection } => {
            cmd_list(&manager(config, workspace, no_agents)?, collection.to_domain())
        }
        ShardCommand::Show { id } => {
            let (collection, shard) = manager(config, workspace, no_agents)?
                .get(&id)
                .map_err(|e| e.to_string())?;
            let json = serde_json::to_string_pretty(&shard)
                .map_err(|e| format!("failed to serialize shard: {e}"))?;
            eprintln!("Collection: {collection}");
            println!("{json}");
            Ok(())
        }
    }
}

fn cmd_new<A: AgentDirectory>(
    manager: &ShardManager<ConfiguredStore, A, SystemClock>,
    request: &NewShard,
) -> Result<(), String> {
    match manager.create(request) {
        Ok(shard) => {
            println!("{}", shard.shard_id);
            Ok(())
        }
        Err(LifecycleError::Schema(err)) => {
            eprintln!("{}", format_violations(&err));
            Err(format!("invalid shard {}", request.shard_id))
        }
        Err(e) => Err(format!("failed to create shard: {e}")),
    }
}

fn cmd_list<A: AgentDirectory>(
    manager: &ShardManager<ConfiguredStore, A, SystemClock>,
    collection: Collection,
) -> Result<(), String> {
    let book = manager
        .snapshot()
        .map_err(|e| format!("failed to load shards: {e}"))?;
    let shards = book.collection(collection);

    if shards.is_empty() {
        println!("No {collection} shards");
        return Ok(());
    }
    for shard in shards {
        println!("{}", format_shard_line(shard));
    }
    Ok(())
}
