//! sastblame CLI - correlate SAST findings with VCS blame data.

use std::io::stdout;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sastblame::cli::{Cli, Command, OutputFormat};
use sastblame::config::Config;
use sastblame::core::Analyzer;
use sastblame::output::Format;
use sastblame::semgrep;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "sastblame=debug"
    } else {
        "sastblame=info"
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_default(".")?,
    };
    if cli.gitlab_token.is_some() {
        config.gitlab.token = cli.gitlab_token.clone();
    }
    if cli.github_token.is_some() {
        config.github.token = cli.github_token.clone();
    }

    if !config.output.color {
        colored::control::set_override(false);
    }

    let format = match cli.format {
        Some(OutputFormat::Json) => Format::Json,
        Some(OutputFormat::Markdown) => Format::Markdown,
        Some(OutputFormat::Text) => Format::Text,
        None => config.output.format,
    };

    match cli.command {
        Command::Analyze(args) => {
            if let Some(rules) = &args.rules {
                config.semgrep.rules = rules.clone();
            }
            let mut analyzer =
                Analyzer::from_config(&config).context("failed to build analyzer")?;
            if let Some(git_ref) = &args.git_ref {
                analyzer = analyzer.with_ref(git_ref.clone());
            }
            analyzer = analyzer.with_shallow(args.shallow);

            let report = match &args.path {
                Some(path) => analyzer.analyze_checkout(&args.repo, path)?,
                None => analyzer.analyze_repository(&args.repo)?,
            };
            format.render(&report, &mut stdout())?;
        }
        Command::Scan(args) => {
            if let Some(rules) = &args.rules {
                config.semgrep.rules = rules.clone();
            }
            let runner = semgrep::Runner::from_config(&config.semgrep);
            let findings = runner.run(&args.path)?;
            format.render_findings(&findings, &mut stdout())?;
        }
    }

    Ok(())
}
