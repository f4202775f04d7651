//! Architectural specs: the blueprint that later work is measured against.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use jiff::Timestamp;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::schema::{Bounds, Fields, Record, Text};

use super::AgentRole;

static SPEC_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^SPEC-\d{8}-[A-Z0-9]+$").expect("spec id pattern is valid"));

static SPEC_ID: Text = Text::matching(&SPEC_ID_PATTERN);
const PROJECT_NAME: Text = Text::between(3, 100);
const PROJECT_DESCRIPTION: Text = Text::at_least(50);
const TIMELINE_WEEKS: Bounds<i64> = Bounds::at_least(1);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchitecturalSpec {
    /// `SPEC-<8 digits>-<UPPERCASE ALNUM>`.
    pub spec_id: String,

    pub project_name: String,
    pub project_description: String,

    /// Layer to technology, e.g. `backend = "axum"`.
    pub tech_stack: BTreeMap<String, String>,

    pub architectural_patterns: Vec<String>,

    /// Performance, security, and cost limits, in whatever shape they take.
    pub constraints: Map<String, Value>,

    pub system_components: Vec<BTreeMap<String, String>>,
    pub data_models: Vec<String>,
    pub api_endpoints: Vec<BTreeMap<String, String>>,
    pub security_requirements: Vec<String>,
    pub deployment_strategy: String,

    /// At least one.
    pub estimated_timeline_weeks: u32,

    pub validated_by_pattern_matcher: bool,
    pub created_by: AgentRole,
    pub timestamp: Timestamp,
}

impl Record for ArchitecturalSpec {
    const NAME: &'static str = "architectural spec";

    fn read(f: &mut Fields<'_>) -> Option<Self> {
        let spec_id = f.text("spec_id", &SPEC_ID);
        let project_name = f.text("project_name", &PROJECT_NAME);
        let project_description = f.text("project_description", &PROJECT_DESCRIPTION);
        let tech_stack = f.required_string_map("tech_stack");
        let architectural_patterns = f.text_list("architectural_patterns");
        let constraints = f.value_map("constraints");
        let system_components = f.map_list("system_components");
        let data_models = f.text_list("data_models");
        let api_endpoints = f.map_list("api_endpoints");
        let security_requirements = f.text_list("security_requirements");
        let deployment_strategy = f.text_or("deployment_strategy", &Text::ANY, "docker_compose");
        let estimated_timeline_weeks = f.integer_or("estimated_timeline_weeks", TIMELINE_WEEKS, 4);
        let validated_by_pattern_matcher = f.flag_or("validated_by_pattern_matcher", false);
        let created_by = f.choice_or("created_by", AgentRole::ArchitecturalSovereign);
        let timestamp = f.timestamp_or_now("timestamp");

        Some(Self {
            spec_id: spec_id?,
            project_name: project_name?,
            project_description: project_description?,
            tech_stack: tech_stack?,
            architectural_patterns: architectural_patterns?,
            constraints: constraints?,
            system_components: system_components?,
            data_models: data_models?,
            api_endpoints: api_endpoints?,
            security_requirements: security_requirements?,
            deployment_strategy: deployment_strategy?,
            estimated_timeline_weeks: estimated_timeline_weeks?,
            validated_by_pattern_matcher: validated_by_pattern_matcher?,
            created_by: created_by?,
            timestamp: timestamp?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::clock::FixedClock;

    fn clock() -> FixedClock {
        FixedClock(Timestamp::new(1_768_298_400, 0).unwrap())
    }

    fn spec() -> Value {
        json!({
            "spec_id": "SPEC-20260113-FORGE1",
            "project_name": "Sovereign Forge",
            "project_description": "An agent bookkeeping platform that tracks shards and journals every decision made.",
            "tech_stack": { "backend": "axum", "storage": "sqlite" },
            "constraints": { "max_latency_ms": 200, "regions": ["eu-west-1"] },
            "system_components": [{ "name": "lifecycle", "role": "state machine" }],
        })
    }

    #[test]
    fn builds_with_defaults() {
        let spec = ArchitecturalSpec::from_value(&spec(), &clock()).unwrap();

        assert_eq!(spec.tech_stack["backend"], "axum");
        assert_eq!(spec.constraints["max_latency_ms"], json!(200));
        assert_eq!(spec.deployment_strategy, "docker_compose");
        assert_eq!(spec.estimated_timeline_weeks, 4);
        assert_eq!(spec.created_by, AgentRole::ArchitecturalSovereign);
    }

    #[test]
    fn tech_stack_is_required() {
        let mut input = spec();
        input.as_object_mut().unwrap().remove("tech_stack");

        let err = ArchitecturalSpec::from_value(&input, &clock()).unwrap_err();
        assert!(err.violates("tech_stack"));
    }

    #[test]
    fn description_and_timeline_are_bounded() {
        let mut input = spec();
        input["project_description"] = json!("Too brief.");
        input["estimated_timeline_weeks"] = json!(0);
        input["spec_id"] = json!("SPEC-2026-X");

        let err = ArchitecturalSpec::from_value(&input, &clock()).unwrap_err();
        let fields: Vec<&str> = err.fields().collect();
        assert_eq!(
            fields,
            ["spec_id", "project_description", "estimated_timeline_weeks"]
        );
    }

    #[test]
    fn components_must_map_strings_to_strings() {
        let mut input = spec();
        input["system_components"] = json!([{ "name": "api", "replicas": 3 }]);

        let err = ArchitecturalSpec::from_value(&input, &clock()).unwrap_err();
        assert!(err.violates("system_components"));
    }

    #[test]
    fn round_trips_through_fields() {
        let mut input = spec();
        input["constraints"] = json!({
            "budget": { "monthly_usd": 500, "hard_cap": true },
            "regions": ["eu-west-1", "us-east-1"],
        });
        input["api_endpoints"] = json!([{ "method": "GET", "path": "/shards" }]);
        input["security_requirements"] = json!(["TLS everywhere"]);

        let spec = ArchitecturalSpec::from_value(&input, &clock()).unwrap();
        let fields = spec.to_fields().unwrap();
        assert_eq!(fields["constraints"]["budget"]["monthly_usd"], json!(500));

        let again = ArchitecturalSpec::from_fields(&fields, &clock()).unwrap();
        assert_eq!(again, spec);
        assert_eq!(again.to_fields().unwrap(), fields);
    }
}
