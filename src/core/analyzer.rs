//! Analyzer facade correlating static-analysis findings with blame data.

use std::path::Path;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::provider::{BlameProvider, BlameRecord, GitHubProvider, GitLabProvider, RepoTarget};
use crate::repo::{self, CheckoutOptions};
use crate::semgrep;

use super::{Error, Finding, Result};

/// A finding paired with the blame records covering its line range.
///
/// The blame set is empty when the lookup failed or the lines have no
/// recorded history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedFinding {
    pub finding: Finding,
    pub blame: Vec<BlameRecord>,
}

/// Result of one repository analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Repository URL as supplied by the caller.
    pub repository: String,
    /// Resolved provider name.
    pub provider: String,
    /// Quick summary statistics.
    pub summary: Summary,
    /// Findings in the order the tool reported them.
    pub findings: Vec<AnnotatedFinding>,
}

/// Quick summary statistics for display.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    /// Number of findings reported.
    pub findings: usize,
    /// Number of findings with at least one blame record.
    pub with_blame: usize,
    /// Analysis duration.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl Summary {
    /// Create a new summary.
    pub fn new(findings: usize, with_blame: usize, duration: Duration) -> Self {
        Self {
            findings,
            with_blame,
            duration,
        }
    }
}

/// Facade over the static-analysis tool and the blame providers.
///
/// Holds credentials for the duration of its calls; performs no network
/// activity until [`Analyzer::analyze_checkout`] or
/// [`Analyzer::analyze_repository`] runs. Stateless beyond the held
/// credentials, so repeated calls with fixed inputs produce identical
/// reports.
pub struct Analyzer {
    gitlab_token: Option<String>,
    github_token: Option<String>,
    gitlab_hosts: Vec<String>,
    github_graphql_url: String,
    git_ref: String,
    shallow: bool,
    runner: semgrep::Runner,
    timeout: Duration,
    user_agent: String,
}

impl Analyzer {
    /// Create an analyzer holding the given credentials.
    ///
    /// No network activity; fails only on structurally invalid input
    /// (empty-string tokens).
    pub fn new(gitlab_token: Option<String>, github_token: Option<String>) -> Result<Self> {
        let mut analyzer = Self::from_config(&Config::default())?;
        analyzer.gitlab_token = validate_token("GitLab", gitlab_token)?;
        analyzer.github_token = validate_token("GitHub", github_token)?;
        Ok(analyzer)
    }

    /// Create an analyzer from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            gitlab_token: validate_token("GitLab", config.gitlab.token.clone())?,
            github_token: validate_token("GitHub", config.github.token.clone())?,
            gitlab_hosts: config.gitlab.hosts.clone(),
            github_graphql_url: config.github.graphql_url.clone(),
            git_ref: "HEAD".to_string(),
            shallow: false,
            runner: semgrep::Runner::from_config(&config.semgrep),
            timeout: Duration::from_secs(config.http.timeout_secs),
            user_agent: config.http.user_agent.clone(),
        })
    }

    /// Set the ref used for blame lookups (and remote checkout).
    pub fn with_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = git_ref.into();
        self
    }

    /// Use a depth-1 clone for remote checkouts.
    pub fn with_shallow(mut self, shallow: bool) -> Self {
        self.shallow = shallow;
        self
    }

    /// Replace the static-analysis runner.
    pub fn with_runner(mut self, runner: semgrep::Runner) -> Self {
        self.runner = runner;
        self
    }

    /// Analyze a repository from a local checkout.
    ///
    /// Resolves the provider from `repo_url`, runs static analysis over
    /// `path`, and correlates each finding with blame data for its line
    /// range. Per-finding blame lookup failures downgrade to an empty blame
    /// set; authentication and transport failures abort the run.
    pub fn analyze_checkout(&self, repo_url: &str, path: &Path) -> Result<AnalysisReport> {
        let started = Instant::now();

        let target = RepoTarget::from_url(repo_url, &self.gitlab_hosts)?;
        let provider = self.provider_for(&target)?;
        debug!(provider = provider.name(), repo_url, "resolved provider");

        let findings = self.runner.run(path)?;
        let annotated = if findings.is_empty() {
            Vec::new()
        } else {
            annotate(findings, provider.as_ref())?
        };

        let with_blame = annotated.iter().filter(|a| !a.blame.is_empty()).count();
        Ok(AnalysisReport {
            repository: repo_url.to_string(),
            provider: provider.name().to_string(),
            summary: Summary::new(annotated.len(), with_blame, started.elapsed()),
            findings: annotated,
        })
    }

    /// Analyze a repository with no local checkout, cloning it first.
    pub fn analyze_repository(&self, repo_url: &str) -> Result<AnalysisReport> {
        let target = RepoTarget::from_url(repo_url, &self.gitlab_hosts)?;
        let options = CheckoutOptions {
            shallow: self.shallow,
            reference: (self.git_ref != "HEAD").then(|| self.git_ref.clone()),
            target: None,
        };
        let path = repo::checkout_remote(&target.https_url(), options)?;
        self.analyze_checkout(repo_url, &path)
    }

    fn provider_for(&self, target: &RepoTarget) -> Result<Box<dyn BlameProvider>> {
        match target {
            RepoTarget::GitHub { owner, repo } => Ok(Box::new(
                GitHubProvider::new(
                    owner.clone(),
                    repo.clone(),
                    self.github_token.clone(),
                    self.git_ref.clone(),
                    self.timeout,
                    &self.user_agent,
                )?
                .with_endpoint(self.github_graphql_url.clone()),
            )),
            RepoTarget::GitLab { host, project } => Ok(Box::new(GitLabProvider::new(
                host.clone(),
                project.clone(),
                self.gitlab_token.clone(),
                self.git_ref.clone(),
                self.timeout,
                &self.user_agent,
            )?)),
        }
    }
}

fn validate_token(provider: &'static str, token: Option<String>) -> Result<Option<String>> {
    match token {
        Some(t) if t.trim().is_empty() => Err(Error::InvalidArgument(format!(
            "{provider} token must not be empty"
        ))),
        other => Ok(other),
    }
}

/// Fetch blame for each finding and pair them up.
///
/// Lookups are independent remote calls and run in parallel; results are
/// reassembled in the findings' original order.
fn annotate(findings: Vec<Finding>, provider: &dyn BlameProvider) -> Result<Vec<AnnotatedFinding>> {
    findings
        .into_par_iter()
        .map(|finding| {
            match provider.blame_range(&finding.path, finding.start_line, finding.end_line) {
                Ok(blame) => Ok(AnnotatedFinding { finding, blame }),
                Err(Error::BlameLookup { path, message }) => {
                    warn!(%path, %message, "blame lookup failed; keeping finding without blame");
                    Ok(AnnotatedFinding {
                        finding,
                        blame: Vec::new(),
                    })
                }
                Err(e) => Err(e),
            }
        })
        .collect()
}

mod duration_serde {
    use std::time::Duration;

    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Severity;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn finding(path: &str, start: u32, end: u32) -> Finding {
        Finding {
            rule_id: "python.lang.security.dangerous-eval".to_string(),
            path: path.to_string(),
            start_line: start,
            end_line: end,
            severity: Severity::Error,
            message: "Dangerous use of eval".to_string(),
        }
    }

    fn record(sha: &str, author: &str) -> BlameRecord {
        BlameRecord {
            commit: sha.to_string(),
            author: author.to_string(),
            author_email: None,
            timestamp: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    /// Deterministic provider for facade tests.
    struct StubProvider {
        calls: AtomicUsize,
        respond: fn(&str) -> crate::core::Result<Vec<BlameRecord>>,
    }

    impl StubProvider {
        fn new(respond: fn(&str) -> crate::core::Result<Vec<BlameRecord>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                respond,
            }
        }
    }

    impl BlameProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn blame_range(&self, path: &str, _start: u32, _end: u32) -> Result<Vec<BlameRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.respond)(path)
        }
    }

    #[test]
    fn test_new_rejects_empty_tokens() {
        assert!(matches!(
            Analyzer::new(Some(String::new()), None),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            Analyzer::new(None, Some("  ".to_string())),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_new_accepts_absent_tokens() {
        let analyzer = Analyzer::new(None, None).unwrap();
        assert!(analyzer.gitlab_token.is_none());
        assert!(analyzer.github_token.is_none());
    }

    #[test]
    fn test_analyze_checkout_unsupported_host() {
        let analyzer = Analyzer::new(None, None).unwrap();
        let result = analyzer.analyze_checkout("https://bitbucket.org/owner/repo", Path::new("."));
        assert!(matches!(result, Err(Error::ProviderUnsupported { .. })));
    }

    #[test]
    fn test_annotate_single_finding_single_record() {
        let provider = StubProvider::new(|_| Ok(vec![record("abc123", "alice")]));
        let annotated = annotate(vec![finding("app.py", 10, 12)], &provider).unwrap();
        assert_eq!(annotated.len(), 1);
        assert_eq!(annotated[0].finding.path, "app.py");
        assert_eq!(annotated[0].blame, vec![record("abc123", "alice")]);
    }

    #[test]
    fn test_annotate_lookup_failure_downgrades_to_empty() {
        let provider = StubProvider::new(|path| {
            if path == "gone.py" {
                Err(Error::blame_lookup(path, "file not found at ref"))
            } else {
                Ok(vec![record("abc123", "alice")])
            }
        });
        let annotated = annotate(
            vec![finding("app.py", 1, 1), finding("gone.py", 5, 6)],
            &provider,
        )
        .unwrap();
        assert_eq!(annotated.len(), 2);
        assert!(!annotated[0].blame.is_empty());
        assert!(annotated[1].blame.is_empty());
    }

    #[test]
    fn test_annotate_transport_failure_propagates() {
        let provider = StubProvider::new(|_| Err(Error::http("connection refused")));
        let result = annotate(vec![finding("app.py", 1, 1)], &provider);
        assert!(matches!(result, Err(Error::Http(_))));
    }

    #[test]
    fn test_annotate_preserves_order() {
        let provider = StubProvider::new(|path| Ok(vec![record(path, "alice")]));
        let findings = vec![
            finding("c.py", 1, 1),
            finding("a.py", 2, 2),
            finding("b.py", 3, 3),
        ];
        let annotated = annotate(findings, &provider).unwrap();
        let paths: Vec<&str> = annotated.iter().map(|a| a.finding.path.as_str()).collect();
        assert_eq!(paths, vec!["c.py", "a.py", "b.py"]);
    }

    #[test]
    fn test_annotate_no_findings_no_calls() {
        let provider = StubProvider::new(|_| Ok(Vec::new()));
        let annotated = annotate(Vec::new(), &provider).unwrap();
        assert!(annotated.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_annotate_is_deterministic() {
        let respond: fn(&str) -> crate::core::Result<Vec<BlameRecord>> =
            |path| Ok(vec![record(path, "alice")]);
        let findings = vec![finding("a.py", 1, 2), finding("b.py", 3, 4)];
        let first = annotate(findings.clone(), &StubProvider::new(respond)).unwrap();
        let second = annotate(findings, &StubProvider::new(respond)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_summary_serialization() {
        let summary = Summary::new(3, 2, Duration::from_secs(1));
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"findings\":3"));
        assert!(json.contains("\"with_blame\":2"));
        assert!(json.contains("\"duration\":1.0"));
    }

    #[test]
    fn test_report_serialization() {
        let report = AnalysisReport {
            repository: "https://github.com/owner/repo".to_string(),
            provider: "github".to_string(),
            summary: Summary::new(1, 1, Duration::ZERO),
            findings: vec![AnnotatedFinding {
                finding: finding("app.py", 10, 12),
                blame: vec![record("abc123", "alice")],
            }],
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"provider\":\"github\""));
        assert!(json.contains("\"commit\":\"abc123\""));
    }
}
