//! Source-hosting providers exposing blame data.

mod github;
mod gitlab;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

pub use github::GitHubProvider;
pub use gitlab::GitLabProvider;

/// Per-line VCS metadata identifying the commit/author that last touched
/// part of a line range. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlameRecord {
    /// Full commit SHA.
    pub commit: String,
    /// Author name as recorded by the provider.
    pub author: String,
    /// Author email, when the provider reports one.
    pub author_email: Option<String>,
    /// Commit timestamp.
    pub timestamp: DateTime<Utc>,
}

/// A blame data source for one repository.
///
/// Implementations hold the repository identity and credential; each call
/// covers one file/line range. Calls are independent and may run in parallel.
pub trait BlameProvider: Send + Sync {
    /// Provider identifier for logs and reports.
    fn name(&self) -> &'static str;

    /// Fetch blame records covering `[start_line, end_line]` of `path`.
    fn blame_range(&self, path: &str, start_line: u32, end_line: u32) -> Result<Vec<BlameRecord>>;
}

/// Repository target resolved from a URL, dispatched once per analysis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoTarget {
    GitHub {
        owner: String,
        repo: String,
    },
    GitLab {
        host: String,
        /// Full namespaced project path, e.g. `group/subgroup/project`.
        project: String,
    },
}

impl RepoTarget {
    /// Resolve a repository URL to its hosting provider.
    ///
    /// Accepts `https://`/`http://` URLs and scp-like `git@host:path` forms.
    /// `extra_gitlab_hosts` lets self-hosted GitLab instances with
    /// non-obvious hostnames resolve as GitLab.
    pub fn from_url(url: &str, extra_gitlab_hosts: &[String]) -> Result<Self> {
        let unsupported = || Error::ProviderUnsupported {
            url: url.to_string(),
        };

        let trimmed = url.trim();
        let (host, path) = if let Some(rest) = trimmed.strip_prefix("git@") {
            rest.split_once(':').ok_or_else(unsupported)?
        } else {
            let rest = trimmed
                .strip_prefix("https://")
                .or_else(|| trimmed.strip_prefix("http://"))
                .ok_or_else(unsupported)?;
            rest.split_once('/').ok_or_else(unsupported)?
        };

        let host = host.to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
        let path = path.trim_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if host == "github.com" {
            if segments.len() < 2 {
                return Err(unsupported());
            }
            Ok(Self::GitHub {
                owner: segments[0].to_string(),
                repo: segments[1].to_string(),
            })
        } else if host == "gitlab.com"
            || host.contains("gitlab")
            || extra_gitlab_hosts.iter().any(|h| h.eq_ignore_ascii_case(&host))
        {
            if segments.len() < 2 {
                return Err(unsupported());
            }
            Ok(Self::GitLab {
                host,
                project: segments.join("/"),
            })
        } else {
            Err(unsupported())
        }
    }

    /// Provider identifier for logs and reports.
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::GitHub { .. } => "github",
            Self::GitLab { .. } => "gitlab",
        }
    }

    /// Canonical https clone URL for this target.
    pub fn https_url(&self) -> String {
        match self {
            Self::GitHub { owner, repo } => format!("https://github.com/{owner}/{repo}.git"),
            Self::GitLab { host, project } => format!("https://{host}/{project}.git"),
        }
    }
}

/// Percent-encode a path component the way the GitLab API expects
/// (`lib/class.rb` becomes `lib%2Fclass%2Erb`).
pub(crate) fn encode_path_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Drop duplicate commits from an ordered record list, keeping first
/// occurrences. Providers report one range per contiguous chunk, so the same
/// commit can cover several chunks of one finding.
pub(crate) fn dedupe_by_commit(records: Vec<BlameRecord>) -> Vec<BlameRecord> {
    let mut seen = std::collections::HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.commit.clone()))
        .collect()
}
