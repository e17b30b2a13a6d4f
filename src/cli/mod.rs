//! CLI implementation using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// sastblame - correlate SAST findings with VCS blame data.
#[derive(Parser)]
#[command(name = "sastblame")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// GitLab personal access token
    #[arg(long, env = "GITLAB_TOKEN", hide_env_values = true)]
    pub gitlab_token: Option<String>,

    /// GitHub personal access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run static analysis and annotate findings with blame data
    #[command(alias = "a")]
    Analyze(AnalyzeArgs),

    /// Run static analysis only, without provider calls
    Scan(ScanArgs),
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Repository URL (GitHub or GitLab)
    pub repo: String,

    /// Local checkout to analyze; cloned to a temp dir when omitted
    pub path: Option<PathBuf>,

    /// Git ref (branch, tag, SHA) for blame lookups and checkout
    #[arg(long = "ref")]
    pub git_ref: Option<String>,

    /// Shallow clone (depth=1) when cloning
    #[arg(long)]
    pub shallow: bool,

    /// Semgrep ruleset passed via --config
    #[arg(long)]
    pub rules: Option<String>,
}

#[derive(Args)]
pub struct ScanArgs {
    /// Path to analyze
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Semgrep ruleset passed via --config
    #[arg(long)]
    pub rules: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Text,
}
