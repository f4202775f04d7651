//! CLI interface for Forge.
//!
//! Every subcommand is non-interactive: arguments in, plain text out.
//! Results go to stdout; notices and logs go to stderr.
//!
//! Commands operate on a repository root (`--repo`, default `.`), which holds
//! the agent manifest, the shard document, and the journal directory.

mod format;
mod shard;
mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use forge::clock::{Clock, SystemClock};
use forge::config::Config;
use forge::identity::resolve_agent;
use forge::journal::{JournalDraft, JournalRecorder};
use forge::model::{AgentDirectory, AgentRole, AgentStatus, Manifest, SecurityLevel, TaskStatus};
use forge::report::StatusReport;
use forge::storage::{DirJournal, ShardRepository, Workspace, load_manifest};

use format::{format_agent, format_report};
use shard::ShardCommand;
use validate::RecordKind;

/// Forge: track shards, journal the work.
#[derive(Debug, Parser)]
#[command(name = "forge", version, after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Repository root holding `.agentic/` and `journal/`.
    #[arg(long, global = true, default_value = ".")]
    repo: PathBuf,

    #[command(subcommand)]
    command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: one shard, start to finish
  1. forge shard new SHARD-006-WORKFLOW "Complete workflow test" \
       --owner architectural_sovereign --description "..."
  2. forge shard assign SHARD-006-WORKFLOW
  3. forge journal SHARD-006-WORKFLOW --as code_generation_maestro \
       --summary "Implemented the workflow components." --artifact src/workflow.rs
  4. forge shard complete SHARD-006-WORKFLOW

Validate a record produced elsewhere:
  forge validate code-update update.json"#;

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the platform status report.
    Status,

    /// List agents from the manifest.
    Agents {
        /// Only agents with this status.
        #[arg(long, value_enum)]
        status: Option<AgentStatusArg>,
    },

    /// Create shards and move them through their lifecycle.
    Shard {
        #[command(subcommand)]
        command: ShardCommand,
    },

    /// Record a journal entry. Prints the record name.
    ///
    /// Entries that fail policy (e.g. top secret without --commit) are
    /// still recorded, with a warning.
    Journal {
        /// Task the entry is about, usually a shard id.
        task_id: String,

        /// What was done and why.
        #[arg(long)]
        summary: String,

        /// Acting agent. Falls back to `FORGE_AGENT`, then `default-agent`.
        #[arg(long = "as")]
        agent: Option<AgentRole>,

        /// Sub-agent engaged. Repeatable.
        #[arg(long = "sub-agent")]
        sub_agents: Vec<String>,

        /// Path of an artifact created. Repeatable.
        #[arg(long = "artifact")]
        artifacts: Vec<String>,

        /// A next step. Repeatable.
        #[arg(long = "next-step")]
        next_steps: Vec<String>,

        /// Task status at the time of writing.
        #[arg(long, default_value = "in_progress")]
        status: TaskStatus,

        /// Git commit hash (7 to 40 lowercase hex characters).
        #[arg(long)]
        commit: Option<String>,

        /// Clearance, 1 (public) to 5 (top secret), or its name.
        #[arg(long, default_value = "2")]
        clearance: SecurityLevel,

        /// Parent workflow or context id.
        #[arg(long)]
        parent: Option<String>,
    },

    /// Validate a record from a JSON file against its schema and policy.
    ///
    /// Prints every violated field. Exits non-zero when the record is
    /// invalid or non-compliant.
    Validate {
        #[arg(value_enum)]
        kind: RecordKind,

        file: PathBuf,
    },
}

/// CLI-facing agent status, mapped to the domain `AgentStatus`.
#[derive(Debug, Clone, ValueEnum)]
enum AgentStatusArg {
    Active,
    Idle,
    Processing,
    Error,
    Offline,
    Planned,
}

impl AgentStatusArg {
    fn to_domain(&self) -> AgentStatus {
        match self {
            Self::Active => AgentStatus::Active,
            Self::Idle => AgentStatus::Idle,
            Self::Processing => AgentStatus::Processing,
            Self::Error => AgentStatus::Error,
            Self::Offline => AgentStatus::Offline,
            Self::Planned => AgentStatus::Planned,
        }
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config) -> Result<(), String> {
    let cli = Cli::parse();
    let workspace = Workspace::new(cli.repo);

    match cli.command {
        Command::Status => cmd_status(config, &workspace, &SystemClock),
        Command::Agents { status } => {
            cmd_agents(&workspace, status.as_ref().map(AgentStatusArg::to_domain))
        }
        Command::Shard { command } => shard::run(config, &workspace, command),
        Command::Journal {
            task_id,
            summary,
            agent,
            sub_agents,
            artifacts,
            next_steps,
            status,
            commit,
            clearance,
            parent,
        } => {
            let agent = resolve_agent(agent, config)?;
            let mut draft = JournalDraft::new(task_id, agent, summary)
                .sub_agents(sub_agents)
                .artifacts(artifacts)
                .next_steps(next_steps)
                .status(status)
                .clearance(clearance);
            if let Some(hash) = commit {
                draft = draft.commit(hash);
            }
            if let Some(id) = parent {
                draft = draft.parent(id);
            }
            cmd_journal(&workspace, &draft)
        }
        Command::Validate { kind, file } => validate::run(kind, &file),
    }
}

fn manifest(workspace: &Workspace) -> Result<Manifest, String> {
    load_manifest(&workspace.manifest_path()).map_err(|e| format!("failed to load manifest: {e}"))
}

fn cmd_status(config: &Config, workspace: &Workspace, clock: &dyn Clock) -> Result<(), String> {
    let report = status_report(config, workspace, clock)?;
    print!("{}", format_report(&report));
    Ok(())
}

fn status_report(
    config: &Config,
    workspace: &Workspace,
    clock: &dyn Clock,
) -> Result<StatusReport, String> {
    let manifest = manifest(workspace)?;
    let book = shard::open_store(config, workspace)?
        .load()
        .map_err(|e| format!("failed to load shards: {e}"))?;

    Ok(StatusReport::build(&manifest, &book, config.mode, clock))
}

fn cmd_agents(workspace: &Workspace, status: Option<AgentStatus>) -> Result<(), String> {
    let manifest = manifest(workspace)?;
    let agents = match status {
        Some(status) => manifest.agents_with_status(status),
        None => manifest.agents().iter().collect(),
    };

    if agents.is_empty() {
        println!("No agents");
        return Ok(());
    }
    for agent in agents {
        println!("{}", format_agent(agent));
    }
    Ok(())
}

fn cmd_journal(workspace: &Workspace, draft: &JournalDraft) -> Result<(), String> {
    let recorder = JournalRecorder::new(DirJournal::new(workspace.journal_dir()), SystemClock);
    let recorded = recorder
        .record(draft)
        .map_err(|e| format!("failed to record journal entry: {e}"))?;

    if !recorded.verdict.is_compliant() {
        eprintln!("Warning: recorded, but {}", recorded.verdict);
    }
    println!("{}", recorded.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use forge::clock::FixedClock;
    use jiff::Timestamp;
    use tempfile::TempDir;

    fn workspace_with_documents(dir: &TempDir) -> Workspace {
        let workspace = Workspace::new(dir.path());
        fs::create_dir_all(workspace.manifests_dir()).unwrap();
        fs::write(
            workspace.manifest_path(),
            r#"{
  "platform": { "name": "Sovereign Forge", "version": "1.0.0" },
  "guru_agents": [
    { "name": "Architectural Sovereign", "role": "System design", "status": "active" },
    { "name": "UX UI Designer", "role": "Interfaces", "status": "planned" }
  ]
}"#,
        )
        .unwrap();
        fs::write(
            workspace.shards_json_path(),
            r#"{
  "active_shards": [
    {
      "shard_id": "SHARD-006-WORKFLOW",
      "title": "Complete workflow test",
      "status": "pending",
      "priority": "high",
      "owner_agent": "architectural_sovereign",
      "created_at": "2026-01-13T10:00:00.123456",
      "dependencies": []
    }
  ],
  "completed_shards": [],
  "archived_shards": []
}"#,
        )
        .unwrap();
        workspace
    }

    #[test]
    fn status_report_reads_older_documents_at_clock_time() {
        let dir = TempDir::new().unwrap();
        let workspace = workspace_with_documents(&dir);
        let now = Timestamp::new(1_768_302_000, 0).unwrap();

        let report = status_report(&Config::default(), &workspace, &FixedClock(now)).unwrap();

        assert_eq!(report.platform, "Sovereign Forge");
        assert_eq!(report.guru_agents.total, 2);
        assert_eq!(report.guru_agents.planned, 1);
        assert_eq!(report.story_shards.active, 1);
        assert_eq!(report.last_updated, now);
    }

    #[test]
    fn status_report_needs_a_manifest() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path());
        let clock = FixedClock(Timestamp::UNIX_EPOCH);

        let err = status_report(&Config::default(), &workspace, &clock).unwrap_err();
        assert!(err.starts_with("failed to load manifest"));
    }
}
