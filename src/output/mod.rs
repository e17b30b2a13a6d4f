//! Output formatters for analysis reports.

use std::io::Write;

use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::core::{AnalysisReport, AnnotatedFinding, Finding, Result, Severity};

/// Output format enum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Markdown,
    #[default]
    Text,
}

impl Format {
    /// Render a full analysis report.
    pub fn render<W: Write>(&self, report: &AnalysisReport, writer: &mut W) -> Result<()> {
        match self {
            Format::Json => render_json(report, writer),
            Format::Markdown => render_markdown(report, writer),
            Format::Text => render_text(report, writer),
        }
    }

    /// Render plain findings with no blame data (the `scan` path).
    pub fn render_findings<W: Write>(&self, findings: &[Finding], writer: &mut W) -> Result<()> {
        match self {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, findings)?;
                writeln!(writer)?;
                Ok(())
            }
            Format::Markdown => {
                writeln!(writer, "| File | Lines | Rule | Severity | Message |")?;
                writeln!(writer, "| --- | --- | --- | --- | --- |")?;
                for finding in findings {
                    writeln!(
                        writer,
                        "| {} | {} | {} | {} | {} |",
                        finding.path,
                        finding.line_range(),
                        finding.rule_id,
                        finding.severity,
                        finding.message.replace('\n', " "),
                    )?;
                }
                Ok(())
            }
            Format::Text => {
                for finding in findings {
                    write_finding_header(finding, writer)?;
                }
                writeln!(writer, "{} finding(s)", findings.len())?;
                Ok(())
            }
        }
    }
}

fn render_json<W: Write>(report: &AnalysisReport, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, report)?;
    writeln!(writer)?;
    Ok(())
}

fn render_markdown<W: Write>(report: &AnalysisReport, writer: &mut W) -> Result<()> {
    writeln!(writer, "# Analysis report\n")?;
    writeln!(writer, "**Repository**: {}\n", report.repository)?;
    writeln!(writer, "**Provider**: {}\n", report.provider)?;
    writeln!(
        writer,
        "**Findings**: {} ({} with blame)\n",
        report.summary.findings, report.summary.with_blame
    )?;

    if report.findings.is_empty() {
        writeln!(writer, "_No findings_")?;
        return Ok(());
    }

    writeln!(
        writer,
        "| File | Lines | Rule | Severity | Message | Authors | Commits |"
    )?;
    writeln!(writer, "| --- | --- | --- | --- | --- | --- | --- |")?;
    for annotated in &report.findings {
        let finding = &annotated.finding;
        writeln!(
            writer,
            "| {} | {} | {} | {} | {} | {} | {} |",
            finding.path,
            finding.line_range(),
            finding.rule_id,
            finding.severity,
            finding.message.replace('\n', " "),
            authors(annotated),
            commits(annotated),
        )?;
    }
    Ok(())
}

fn render_text<W: Write>(report: &AnalysisReport, writer: &mut W) -> Result<()> {
    for annotated in &report.findings {
        let finding = &annotated.finding;
        write_finding_header(finding, writer)?;
        if annotated.blame.is_empty() {
            writeln!(writer, "    {}", "no blame data".dimmed())?;
        }
        for record in &annotated.blame {
            writeln!(
                writer,
                "    {} {} {}",
                short_sha(&record.commit).yellow(),
                record.author,
                record.timestamp.format("%Y-%m-%d"),
            )?;
        }
    }
    writeln!(
        writer,
        "{} finding(s) in {}, {} with blame ({})",
        report.summary.findings, report.repository, report.summary.with_blame, report.provider,
    )?;
    Ok(())
}

fn write_finding_header<W: Write>(finding: &Finding, writer: &mut W) -> Result<()> {
    let severity = match finding.severity {
        Severity::Error => finding.severity.label().red().bold(),
        Severity::Warning => finding.severity.label().yellow().bold(),
        Severity::Info => finding.severity.label().cyan(),
    };
    writeln!(
        writer,
        "[{}] {}:{} {}",
        severity,
        finding.path,
        finding.line_range(),
        finding.rule_id,
    )?;
    writeln!(writer, "    {}", finding.message.replace('\n', " "))?;
    Ok(())
}

fn authors(annotated: &AnnotatedFinding) -> String {
    if annotated.blame.is_empty() {
        return "-".to_string();
    }
    let mut seen = Vec::new();
    for record in &annotated.blame {
        if !seen.contains(&record.author) {
            seen.push(record.author.clone());
        }
    }
    seen.join(", ")
}

fn commits(annotated: &AnnotatedFinding) -> String {
    if annotated.blame.is_empty() {
        return "-".to_string();
    }
    annotated
        .blame
        .iter()
        .map(|r| short_sha(&r.commit).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn short_sha(sha: &str) -> &str {
    if sha.len() > 7 {
        &sha[..7]
    } else {
        sha
    }
}
