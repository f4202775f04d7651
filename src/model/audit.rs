//! Security audit reports.

use std::sync::LazyLock;

use jiff::Timestamp;
use regex::Regex;
use serde::Serialize;

use crate::schema::{Bounds, Fields, Record, Text};

use super::AgentRole;

static AUDIT_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^AUDIT-\d{8}-[A-Z0-9]+$").expect("audit id pattern is valid"));

static AUDIT_ID: Text = Text::matching(&AUDIT_ID_PATTERN);
const COUNT: Bounds<i64> = Bounds::at_least(0);
const SCORE: Bounds<f64> = Bounds::between(0.0, 100.0);

/// Findings of one security audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityAuditReport {
    /// `AUDIT-<8 digits>-<UPPERCASE ALNUM>`.
    pub audit_id: String,

    /// File or directory audited.
    pub target_path: String,

    /// e.g. `vulnerability_scan`, `compliance_check`, `secret_detection`.
    pub audit_type: String,

    pub vulnerabilities_found: u32,
    pub critical_issues: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,

    /// Whether the audited code validates its records.
    pub schema_validation_passed: bool,

    /// Whether sensitive values are wrapped so they cannot leak into logs.
    pub secrets_properly_masked: bool,

    /// e.g. "GDPR", "HIPAA".
    pub compliance_standards: Vec<String>,

    /// 0 to 100.
    pub overall_security_score: f64,

    pub audited_by: AgentRole,
    pub timestamp: Timestamp,
}

impl Record for SecurityAuditReport {
    const NAME: &'static str = "security audit report";

    fn read(f: &mut Fields<'_>) -> Option<Self> {
        let audit_id = f.text("audit_id", &AUDIT_ID);
        let target_path = f.text("target_path", &Text::ANY);
        let audit_type = f.text("audit_type", &Text::ANY);
        let vulnerabilities_found = f.integer_or("vulnerabilities_found", COUNT, 0);
        let critical_issues = f.text_list("critical_issues");
        let warnings = f.text_list("warnings");
        let recommendations = f.text_list("recommendations");
        let schema_validation_passed = f.flag_or("schema_validation_passed", false);
        let secrets_properly_masked = f.flag_or("secrets_properly_masked", false);
        let compliance_standards = f.text_list("compliance_standards");
        let overall_security_score = f.number_or("overall_security_score", SCORE, 0.0);
        let audited_by = f.choice_or("audited_by", AgentRole::SecuritySentinel);
        let timestamp = f.timestamp_or_now("timestamp");

        Some(Self {
            audit_id: audit_id?,
            target_path: target_path?,
            audit_type: audit_type?,
            vulnerabilities_found: vulnerabilities_found?,
            critical_issues: critical_issues?,
            warnings: warnings?,
            recommendations: recommendations?,
            schema_validation_passed: schema_validation_passed?,
            secrets_properly_masked: secrets_properly_masked?,
            compliance_standards: compliance_standards?,
            overall_security_score: overall_security_score?,
            audited_by: audited_by?,
            timestamp: timestamp?,
        })
    }
}
