//! sastblame - correlate SAST findings with VCS blame data.
//!
//! Runs Semgrep over a repository checkout, resolves the repository's
//! hosting provider (GitHub or GitLab) from its URL, fetches blame data for
//! each finding's line range from that provider's API, and returns the
//! findings annotated with the contributors responsible for the flagged
//! lines.
//!
//! # Example
//!
//! ```no_run
//! use sastblame::core::Analyzer;
//!
//! let analyzer = Analyzer::new(None, Some("ghp_token".to_string())).unwrap();
//! let report = analyzer
//!     .analyze_checkout("https://github.com/owner/repo", std::path::Path::new("."))
//!     .unwrap();
//! for annotated in &report.findings {
//!     println!(
//!         "{}:{} last touched by {:?}",
//!         annotated.finding.path,
//!         annotated.finding.start_line,
//!         annotated.blame.first().map(|b| b.author.as_str())
//!     );
//! }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod output;
pub mod provider;
pub mod repo;
pub mod semgrep;

pub use crate::core::{AnalysisReport, Analyzer, AnnotatedFinding, Error, Finding, Result, Severity};
pub use crate::provider::{BlameProvider, BlameRecord, RepoTarget};
