//! Code updates: a record of one code change and the gates it passed.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::schema::{Bounds, Fields, Record, Text};

use super::AgentRole;

const NON_EMPTY: Text = Text::at_least(1);
const COVERAGE: Bounds<f64> = Bounds::between(0.0, 100.0);

/// A sensitive string that never shows up in debug output.
///
/// Serializes as the raw value so records interchange losslessly.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(**********)")
    }
}

/// A code change or generation event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeUpdate {
    /// Relative path of the file created or modified.
    pub file_path: String,

    /// e.g. "python", "rust".
    pub language: String,

    pub code_snippet: String,

    pub tests_passed: bool,

    /// 0 to 100, when measured.
    pub test_coverage_percent: Option<f64>,

    pub dependency_audit: Option<Secret>,

    pub security_scan_passed: bool,

    pub linting_passed: bool,

    pub created_by: AgentRole,

    pub timestamp: Timestamp,
}

impl Record for CodeUpdate {
    const NAME: &'static str = "code update";

    fn read(f: &mut Fields<'_>) -> Option<Self> {
        let file_path = f.text("file_path", &NON_EMPTY);
        let language = f.text("language", &Text::ANY);
        let code_snippet = f.text("code_snippet", &NON_EMPTY);
        let tests_passed = f.flag_or("tests_passed", false);
        let test_coverage_percent = f.optional_number("test_coverage_percent", COVERAGE);
        let dependency_audit = f.optional_text("dependency_audit", &Text::ANY);
        let security_scan_passed = f.flag_or("security_scan_passed", false);
        let linting_passed = f.flag_or("linting_passed", false);
        let created_by = f.choice_or("created_by", AgentRole::CodeGenerationMaestro);
        let timestamp = f.timestamp_or_now("timestamp");

        Some(Self {
            file_path: file_path?,
            language: language?,
            code_snippet: code_snippet?,
            tests_passed: tests_passed?,
            test_coverage_percent: test_coverage_percent?,
            dependency_audit: dependency_audit?.map(Secret),
            security_scan_passed: security_scan_passed?,
            linting_passed: linting_passed?,
            created_by: created_by?,
            timestamp: timestamp?,
        })
    }
}

impl CodeUpdate {
    /// Whether every quality gate reported success.
    pub fn all_gates_passed(&self) -> bool {
        self.tests_passed && self.security_scan_passed && self.linting_passed
    }
}
