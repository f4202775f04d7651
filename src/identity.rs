//! Acting-agent resolution for commands that write to the journal.
//!
//! Resolved through a chain, first match wins:
//!
//! 1. `--as <role>` on the command
//! 2. `FORGE_AGENT` environment variable (set once per agent session)
//! 3. `default-agent` in `~/.forge/config.toml`

use std::env;

use crate::config::Config;
use crate::model::AgentRole;

/// Error message shown when no agent can be resolved.
pub const AGENT_REQUIRED: &str = "acting agent required: pass --as <role>, \
    set FORGE_AGENT, or add `default-agent = \"...\"` to ~/.forge/config.toml";

/// Resolve the acting agent from the flag, the environment, and config.
pub fn resolve_agent(explicit: Option<AgentRole>, config: &Config) -> Result<AgentRole, String> {
    let from_env = env::var("FORGE_AGENT").ok();
    resolve_from(explicit, from_env.as_deref(), config.default_agent)
}

/// The resolution chain over already-gathered inputs.
///
/// An empty environment value counts as unset; an unknown role in it is an
/// error rather than a silent fall-through.
pub fn resolve_from(
    explicit: Option<AgentRole>,
    from_env: Option<&str>,
    default: Option<AgentRole>,
) -> Result<AgentRole, String> {
    if let Some(role) = explicit {
        return Ok(role);
    }

    if let Some(raw) = from_env.map(str::trim)
        && !raw.is_empty()
    {
        return raw
            .parse()
            .map_err(|e| format!("invalid FORGE_AGENT: {e}"));
    }

    default.ok_or_else(|| AGENT_REQUIRED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_wins() {
        let role = resolve_from(
            Some(AgentRole::DevopsAutomator),
            Some("security_sentinel"),
            Some(AgentRole::ProjectCoordinator),
        );
        assert_eq!(role.unwrap(), AgentRole::DevopsAutomator);
    }

    #[test]
    fn environment_beats_config() {
        let role = resolve_from(
            None,
            Some("security_sentinel"),
            Some(AgentRole::ProjectCoordinator),
        );
        assert_eq!(role.unwrap(), AgentRole::SecuritySentinel);
    }

    #[test]
    fn empty_environment_falls_through() {
        let role = resolve_from(None, Some("  "), Some(AgentRole::ProjectCoordinator));
        assert_eq!(role.unwrap(), AgentRole::ProjectCoordinator);
    }

    #[test]
    fn bad_environment_value_is_an_error() {
        let err = resolve_from(None, Some("intern"), Some(AgentRole::ProjectCoordinator))
            .unwrap_err();
        assert!(err.contains("FORGE_AGENT"));
    }

    #[test]
    fn nothing_set_is_an_error() {
        assert_eq!(resolve_from(None, None, None).unwrap_err(), AGENT_REQUIRED);
    }
}
