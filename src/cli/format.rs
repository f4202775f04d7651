//! Output formatting for CLI display.

use forge::model::{AgentDescriptor, Shard};
use forge::report::StatusReport;
use forge::schema::SchemaValidationError;

/// One shard per line: id, status, priority, owner, title.
pub(super) fn format_shard_line(shard: &Shard) -> String {
    format!(
        "{}  [{}] [{}] [{}]  {}",
        shard.shard_id, shard.status, shard.priority, shard.owner_agent, shard.title
    )
}

pub(super) fn format_agent(agent: &AgentDescriptor) -> String {
    format!("{}  [{}]  {}", agent.name, agent.status, agent.role)
}

pub(super) fn format_report(report: &StatusReport) -> String {
    let agents = &report.guru_agents;
    let shards = &report.story_shards;
    format!(
        "{} ({})\n\
         Agents: {} total, {} active, {} planned\n\
         Shards: {} total, {} active, {} completed, {} archived\n\
         As of {}\n",
        report.platform,
        report.mode,
        agents.total,
        agents.active,
        agents.planned,
        shards.total,
        shards.active,
        shards.completed,
        shards.archived,
        report.last_updated,
    )
}

/// One violated field per line, indented.
pub(super) fn format_violations(err: &SchemaValidationError) -> String {
    err.violations
        .iter()
        .map(|v| format!("  {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}
