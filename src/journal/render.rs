//! The journal record format: YAML-style front matter, then markdown sections.

use serde_json::Value;

use crate::model::JournalEntry;

/// File name for an entry: `<YYYY-MM-DD-HHMMSS>-<task id>.md`, in UTC.
///
/// The task id is lowercased and anything outside `[a-z0-9_-]` becomes `-`,
/// so the name can never leave the journal directory.
pub fn record_name(entry: &JournalEntry) -> String {
    let task: String = entry
        .task_id
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!(
        "{}-{task}.md",
        entry.timestamp.strftime("%Y-%m-%d-%H%M%S")
    )
}

/// Renders an entry as a self-contained markdown document.
pub fn render(entry: &JournalEntry) -> String {
    let mut front = vec![
        format!("task_id: {}", quoted(&entry.task_id)),
        format!("status: {}", quoted(entry.status.as_str())),
        format!("owner_agent: {}", quoted(entry.guru_agent.as_str())),
        format!(
            "contributing_agents: {}",
            Value::from(entry.sub_agents_engaged.clone())
        ),
        format!("last_sync: {}", quoted(&entry.timestamp.to_string())),
        format!("security_clearance: {}", entry.security_clearance.level()),
    ];
    if let Some(hash) = &entry.git_commit_hash {
        front.push(format!("git_commit_hash: {}", quoted(hash)));
    }
    if let Some(parent) = &entry.parent_context_id {
        front.push(format!("parent_context_id: {}", quoted(parent)));
    }

    let sections = [
        format!("---\n{}\n---", front.join("\n")),
        format!("# Journal Entry: {}", entry.task_id),
        [
            format!("**Date:** {}  ", entry.timestamp.strftime("%Y-%m-%d %H:%M:%S")),
            format!("**Agent:** {}  ", entry.guru_agent.display_name()),
            format!("**Status:** {}", entry.status.as_str().to_uppercase()),
        ]
        .join("\n"),
        format!("## Summary\n\n{}", entry.logic_summary),
        format!(
            "## Sub-Agents Engaged\n\n{}",
            bullets(&entry.sub_agents_engaged, |a| a.to_string(), "None")
        ),
        format!(
            "## Artifacts Created\n\n{}",
            bullets(&entry.artifacts_created, |a| format!("`{a}`"), "None")
        ),
        format!(
            "## Next Steps\n\n{}",
            bullets(&entry.next_steps, |s| s.to_string(), "To be determined")
        ),
        "---".to_string(),
        "*Recorded by forge*".to_string(),
    ];

    let mut doc = sections.join("\n\n");
    doc.push('\n');
    doc
}

fn quoted(s: &str) -> String {
    Value::from(s).to_string()
}

fn bullets(items: &[String], item: impl Fn(&str) -> String, empty: &str) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    items
        .iter()
        .map(|i| format!("- {}", item(i.as_str())))
        .collect::<Vec<_>>()
        .join("\n")
}
