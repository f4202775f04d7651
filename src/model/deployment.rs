//! Deployment manifests: what it takes to run the system somewhere.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use jiff::Timestamp;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::schema::{Fields, Record, Text};

use super::AgentRole;

static MANIFEST_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^DEPLOY-\d{8}-[A-Z0-9]+$").expect("deployment id pattern is valid")
});

static MANIFEST_ID: Text = Text::matching(&MANIFEST_ID_PATTERN);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentManifest {
    /// `DEPLOY-<8 digits>-<UPPERCASE ALNUM>`.
    pub manifest_id: String,

    pub application_name: String,

    /// e.g. development, staging, production.
    pub environment: String,

    /// e.g. docker, kubernetes, serverless, vm.
    pub infrastructure_type: String,

    pub container_images: Vec<BTreeMap<String, String>>,

    /// Non-sensitive variables only.
    pub environment_variables: BTreeMap<String, String>,

    /// Names of secrets. Values live elsewhere.
    pub secrets: Vec<String>,

    pub resource_requirements: BTreeMap<String, String>,
    pub networking: Map<String, Value>,
    pub health_checks: Vec<BTreeMap<String, String>>,
    pub backup_strategy: String,
    pub monitoring_enabled: bool,
    pub ci_cd_pipeline: String,
    pub created_by: AgentRole,
    pub timestamp: Timestamp,
}

impl Record for DeploymentManifest {
    const NAME: &'static str = "deployment manifest";

    fn read(f: &mut Fields<'_>) -> Option<Self> {
        let manifest_id = f.text("manifest_id", &MANIFEST_ID);
        let application_name = f.text("application_name", &Text::ANY);
        let environment = f.text("environment", &Text::ANY);
        let infrastructure_type = f.text("infrastructure_type", &Text::ANY);
        let container_images = f.map_list("container_images");
        let environment_variables = f.string_map("environment_variables");
        let secrets = f.text_list("secrets");
        let resource_requirements = f.string_map("resource_requirements");
        let networking = f.value_map("networking");
        let health_checks = f.map_list("health_checks");
        let backup_strategy = f.text_or("backup_strategy", &Text::ANY, "automated_daily");
        let monitoring_enabled = f.flag_or("monitoring_enabled", true);
        let ci_cd_pipeline = f.text_or("ci_cd_pipeline", &Text::ANY, "github_actions");
        let created_by = f.choice_or("created_by", AgentRole::DevopsAutomator);
        let timestamp = f.timestamp_or_now("timestamp");

        Some(Self {
            manifest_id: manifest_id?,
            application_name: application_name?,
            environment: environment?,
            infrastructure_type: infrastructure_type?,
            container_images: container_images?,
            environment_variables: environment_variables?,
            secrets: secrets?,
            resource_requirements: resource_requirements?,
            networking: networking?,
            health_checks: health_checks?,
            backup_strategy: backup_strategy?,
            monitoring_enabled: monitoring_enabled?,
            ci_cd_pipeline: ci_cd_pipeline?,
            created_by: created_by?,
            timestamp: timestamp?,
        })
    }
}
