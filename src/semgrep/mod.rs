//! Semgrep subprocess runner and report parsing.

use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::config::SemgrepConfig;
use crate::core::{Error, Finding, Result, Severity};

/// Runs the semgrep binary and parses its JSON report.
pub struct Runner {
    binary: String,
    rules: String,
    args: Vec<String>,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            binary: "semgrep".to_string(),
            rules: "auto".to_string(),
            args: Vec::new(),
        }
    }
}

impl Runner {
    /// Build a runner from configuration.
    pub fn from_config(config: &SemgrepConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            rules: config.rules.clone(),
            args: config.args.clone(),
        }
    }

    /// Override the ruleset passed via `--config`.
    pub fn with_rules(mut self, rules: impl Into<String>) -> Self {
        self.rules = rules.into();
        self
    }

    /// Run semgrep against `path` and return the reported findings.
    pub fn run(&self, path: &Path) -> Result<Vec<Finding>> {
        debug!(binary = %self.binary, rules = %self.rules, path = %path.display(), "running semgrep");

        let output = Command::new(&self.binary)
            .arg("scan")
            .arg("--json")
            .arg("--quiet")
            .arg("--config")
            .arg(&self.rules)
            .args(&self.args)
            .arg(path)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::analysis(format!(
                    "{} not found on PATH; install semgrep or set [semgrep].binary",
                    self.binary
                )),
                _ => Error::analysis(format!("failed to run {}: {e}", self.binary)),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_report(&stdout) {
            Ok(findings) => {
                debug!(count = findings.len(), "semgrep reported findings");
                Ok(findings)
            }
            // Semgrep still writes a JSON report for several non-zero exits.
            Err(_) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(Error::analysis(format!(
                    "semgrep exited with {}: {}",
                    output.status,
                    stderr.trim()
                )))
            }
        }
    }
}

#[derive(Deserialize)]
struct SemgrepReport {
    #[serde(default)]
    results: Vec<SemgrepResult>,
}

#[derive(Deserialize)]
struct SemgrepResult {
    check_id: String,
    path: String,
    start: SemgrepPosition,
    end: SemgrepPosition,
    extra: SemgrepExtra,
}

#[derive(Deserialize)]
struct SemgrepPosition {
    line: u32,
}

#[derive(Deserialize)]
struct SemgrepExtra {
    message: String,
    severity: String,
}

/// Parse a semgrep JSON report into findings, preserving report order.
pub fn parse_report(raw: &str) -> Result<Vec<Finding>> {
    let report: SemgrepReport = serde_json::from_str(raw)?;
    Ok(report
        .results
        .into_iter()
        .map(|result| Finding {
            rule_id: result.check_id,
            path: result.path,
            start_line: result.start.line,
            end_line: result.end.line.max(result.start.line),
            severity: Severity::parse(&result.extra.severity),
            message: result.extra.message,
        })
        .collect())
}
