//! Static-analysis finding model.

use serde::{Deserialize, Serialize};

/// Severity of a finding, as reported by the static-analysis tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Parse a severity string from the tool's report.
    ///
    /// Semgrep reports uppercase severities; unknown values map to `Info`.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "ERROR" | "HIGH" | "CRITICAL" => Self::Error,
            "WARNING" | "MEDIUM" => Self::Warning,
            _ => Self::Info,
        }
    }

    /// Uppercase label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single issue reported by the static-analysis tool.
///
/// Immutable once produced; line numbers are 1-indexed and inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Identifier of the rule that fired.
    pub rule_id: String,
    /// Repository-relative file path.
    pub path: String,
    /// First line of the flagged range.
    pub start_line: u32,
    /// Last line of the flagged range.
    pub end_line: u32,
    /// Severity reported by the tool.
    pub severity: Severity,
    /// Human-readable rule message.
    pub message: String,
}

impl Finding {
    /// Lines spanned by this finding, for display.
    pub fn line_range(&self) -> String {
        if self.start_line == self.end_line {
            self.start_line.to_string()
        } else {
            format!("{}-{}", self.start_line, self.end_line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("ERROR"), Severity::Error);
        assert_eq!(Severity::parse("warning"), Severity::Warning);
        assert_eq!(Severity::parse("INFO"), Severity::Info);
        assert_eq!(Severity::parse("EXPERIMENT"), Severity::Info);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Warning.to_string(), "WARNING");
    }

    #[test]
    fn test_line_range_single_line() {
        let finding = Finding {
            rule_id: "python.lang.security.dangerous-eval".to_string(),
            path: "app.py".to_string(),
            start_line: 10,
            end_line: 10,
            severity: Severity::Error,
            message: "Dangerous use of eval".to_string(),
        };
        assert_eq!(finding.line_range(), "10");
    }

    #[test]
    fn test_line_range_multi_line() {
        let finding = Finding {
            rule_id: "rule".to_string(),
            path: "app.py".to_string(),
            start_line: 10,
            end_line: 12,
            severity: Severity::Warning,
            message: "msg".to_string(),
        };
        assert_eq!(finding.line_range(), "10-12");
    }

    #[test]
    fn test_finding_serialization() {
        let finding = Finding {
            rule_id: "rule".to_string(),
            path: "app.py".to_string(),
            start_line: 1,
            end_line: 2,
            severity: Severity::Error,
            message: "msg".to_string(),
        };
        let json = serde_json::to_string(&finding).unwrap();
        assert!(json.contains("\"severity\":\"error\""));
        assert!(json.contains("\"start_line\":1"));
    }
}
