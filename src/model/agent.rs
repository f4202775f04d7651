//! Agents: the named actors that own shards and author journal entries.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::ParseEnumError;

/// The fixed set of guru agent roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    ArchitecturalSovereign,
    CodeGenerationMaestro,
    SecuritySentinel,
    DevopsAutomator,
    ProjectCoordinator,
    ReactiveFrontendEngineer,
    BackendSystemsEngineer,
    DataScienceShaper,
    PerformanceOptimizer,
    TestAutomationDirector,
    DocumentationSynthesizer,
    UxUiDesigner,
}

impl AgentRole {
    pub const ALL: [Self; 12] = [
        Self::ArchitecturalSovereign,
        Self::CodeGenerationMaestro,
        Self::SecuritySentinel,
        Self::DevopsAutomator,
        Self::ProjectCoordinator,
        Self::ReactiveFrontendEngineer,
        Self::BackendSystemsEngineer,
        Self::DataScienceShaper,
        Self::PerformanceOptimizer,
        Self::TestAutomationDirector,
        Self::DocumentationSynthesizer,
        Self::UxUiDesigner,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ArchitecturalSovereign => "architectural_sovereign",
            Self::CodeGenerationMaestro => "code_generation_maestro",
            Self::SecuritySentinel => "security_sentinel",
            Self::DevopsAutomator => "devops_automator",
            Self::ProjectCoordinator => "project_coordinator",
            Self::ReactiveFrontendEngineer => "reactive_frontend_engineer",
            Self::BackendSystemsEngineer => "backend_systems_engineer",
            Self::DataScienceShaper => "data_science_shaper",
            Self::PerformanceOptimizer => "performance_optimizer",
            Self::TestAutomationDirector => "test_automation_director",
            Self::DocumentationSynthesizer => "documentation_synthesizer",
            Self::UxUiDesigner => "ux_ui_designer",
        }
    }

    /// Title-cased name, e.g. "Architectural Sovereign".
    pub fn display_name(self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| {
                ParseEnumError::new("agent role", s, Self::ALL.into_iter().map(Self::as_str))
            })
    }
}

/// Where an agent stands in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Active,
    Idle,
    Processing,
    Error,
    Offline,
    /// Defined but not yet brought online.
    Planned,
}

impl AgentStatus {
    pub const ALL: [Self; 6] = [
        Self::Active,
        Self::Idle,
        Self::Processing,
        Self::Error,
        Self::Offline,
        Self::Planned,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Error => "error",
            Self::Offline => "offline",
            Self::Planned => "planned",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                ParseEnumError::new("agent status", s, Self::ALL.into_iter().map(Self::as_str))
            })
    }
}

/// One agent as described by the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Display name, e.g. "Security Sentinel".
    pub name: String,

    /// What the agent is responsible for, in prose.
    pub role: String,

    pub status: AgentStatus,
}

impl AgentDescriptor {
    /// Whether this agent plays `role`.
    ///
    /// Names match roles after lowercasing and replacing spaces with `_`.
    pub fn plays(&self, role: AgentRole) -> bool {
        self.name.to_lowercase().replace(' ', "_") == role.as_str()
    }
}

/// The platform block of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub name: String,

    #[serde(default)]
    pub version: Option<String>,
}

/// The conductor manifest: the platform and its known agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub platform: Platform,
    pub guru_agents: Vec<AgentDescriptor>,
}

/// Read-only access to the set of known agents.
pub trait AgentDirectory {
    fn agents(&self) -> &[AgentDescriptor];

    /// The agent that plays `role`, if one is defined.
    fn agent_for(&self, role: AgentRole) -> Option<&AgentDescriptor> {
        self.agents().iter().find(|agent| agent.plays(role))
    }

    /// Agents with the given status, in manifest order.
    fn agents_with_status(&self, status: AgentStatus) -> Vec<&AgentDescriptor> {
        self.agents()
            .iter()
            .filter(|agent| agent.status == status)
            .collect()
    }
}

impl AgentDirectory for Manifest {
    fn agents(&self) -> &[AgentDescriptor] {
        &self.guru_agents
    }
}

impl AgentDirectory for [AgentDescriptor] {
    fn agents(&self) -> &[AgentDescriptor] {
        self
    }
}

impl<A: AgentDirectory + ?Sized> AgentDirectory for &A {
    fn agents(&self) -> &[AgentDescriptor] {
        (**self).agents()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(name: &str, status: AgentStatus) -> AgentDescriptor {
        AgentDescriptor {
            name: name.into(),
            role: "Testing".into(),
            status,
        }
    }

    #[test]
    fn roles_round_trip_through_strings() {
        for role in AgentRole::ALL {
            assert_eq!(role.as_str().parse::<AgentRole>().unwrap(), role);
        }
        assert_eq!(
            serde_json::to_value(AgentRole::ReactiveFrontendEngineer).unwrap(),
            "reactive_frontend_engineer"
        );
    }

    #[test]
    fn unknown_role_lists_choices() {
        let err = "chief_vibes_officer".parse::<AgentRole>().unwrap_err();
        let text = err.to_string();
        assert!(text.contains("chief_vibes_officer"));
        assert!(text.contains("security_sentinel"));
    }

    #[test]
    fn display_name_is_title_cased() {
        assert_eq!(
            AgentRole::ArchitecturalSovereign.display_name(),
            "Architectural Sovereign"
        );
        assert_eq!(AgentRole::UxUiDesigner.display_name(), "Ux Ui Designer");
    }

    #[test]
    fn directory_resolves_by_normalized_name() {
        let manifest = Manifest {
            platform: Platform {
                name: "Sovereign Forge".into(),
                version: None,
            },
            guru_agents: vec![
                agent("Architectural Sovereign", AgentStatus::Active),
                agent("Security Sentinel", AgentStatus::Active),
                agent("UX UI Designer", AgentStatus::Planned),
            ],
        };

        let found = manifest.agent_for(AgentRole::SecuritySentinel).unwrap();
        assert_eq!(found.name, "Security Sentinel");
        assert!(manifest.agent_for(AgentRole::UxUiDesigner).is_some());
        assert!(manifest.agent_for(AgentRole::DevopsAutomator).is_none());

        assert_eq!(manifest.agents_with_status(AgentStatus::Active).len(), 2);
        assert_eq!(manifest.agents_with_status(AgentStatus::Planned).len(), 1);
    }
}
