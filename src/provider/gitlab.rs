//! GitLab blame adapter.
//!
//! Uses the repository files blame endpoint:
//! `GET /api/v4/projects/:id/repository/files/:file_path/blame`.

use std::env;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::core::{Error, Result};

use super::{dedupe_by_commit, encode_path_component, BlameProvider, BlameRecord};

/// Blame client for one GitLab project.
pub struct GitLabProvider {
    base_url: String,
    project: String,
    git_ref: String,
    token: String,
    client: reqwest::blocking::Client,
}

impl GitLabProvider {
    /// Create a provider for `project` on `host`, blaming at `git_ref`.
    ///
    /// Falls back to the `GITLAB_TOKEN` environment variable when no token is
    /// passed; fails with an auth error when neither is present.
    pub fn new(
        host: String,
        project: String,
        token: Option<String>,
        git_ref: String,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self> {
        let token = token
            .or_else(|| env::var("GITLAB_TOKEN").ok())
            .ok_or_else(|| {
                Error::provider_auth(
                    "GitLab",
                    "no GitLab token supplied; pass --gitlab-token or set GITLAB_TOKEN",
                )
            })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: format!("https://{host}"),
            project,
            git_ref,
            token,
            client,
        })
    }

    /// Override the base URL, scheme included. Used for instances served
    /// somewhere other than `https://<host>`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn blame_url(&self, path: &str, start_line: u32, end_line: u32) -> String {
        format!(
            "{}/api/v4/projects/{}/repository/files/{}/blame?ref={}&range[start]={}&range[end]={}",
            self.base_url,
            encode_path_component(&self.project),
            encode_path_component(path),
            self.git_ref,
            start_line,
            end_line,
        )
    }
}

#[derive(Deserialize)]
struct GitLabBlameEntry {
    commit: GitLabCommit,
}

#[derive(Deserialize)]
struct GitLabCommit {
    id: String,
    author_name: Option<String>,
    author_email: Option<String>,
    committed_date: DateTime<Utc>,
}

impl BlameProvider for GitLabProvider {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    fn blame_range(&self, path: &str, start_line: u32, end_line: u32) -> Result<Vec<BlameRecord>> {
        debug!(
            project = %self.project,
            path,
            start_line,
            end_line,
            "requesting GitLab blame"
        );

        let url = self.blame_url(path, start_line, end_line);
        let response = self
            .client
            .get(&url)
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .map_err(|e| Error::http(format!("GitLab blame request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::provider_auth(
                "GitLab",
                format!("token rejected ({status})"),
            ));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::blame_lookup(path, "file or ref not found"));
        }
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(Error::http(format!("GitLab API error ({status}): {text}")));
        }

        let entries: Vec<GitLabBlameEntry> = response
            .json()
            .map_err(|e| Error::http(format!("failed to decode GitLab response: {e}")))?;

        Ok(records_from_entries(entries))
    }
}

/// Map blame entries to records, deduplicated by commit. The endpoint already
/// restricts entries to the requested range, one entry per contiguous chunk.
fn records_from_entries(entries: Vec<GitLabBlameEntry>) -> Vec<BlameRecord> {
    let records = entries
        .into_iter()
        .map(|entry| BlameRecord {
            commit: entry.commit.id,
            author: entry
                .commit
                .author_name
                .unwrap_or_else(|| "Unknown".to_string()),
            author_email: entry.commit.author_email,
            timestamp: entry.commit.committed_date,
        })
        .collect();
    dedupe_by_commit(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_from_entries() {
        let entries: Vec<GitLabBlameEntry> = serde_json::from_str(
            r#"[
            {
                "commit": {
                    "id": "abc123",
                    "author_name": "alice",
                    "author_email": "alice@example.com",
                    "committed_date": "2023-01-01T12:00:00.000+00:00"
                },
                "lines": ["eval(user_input)"]
            },
            {
                "commit": {
                    "id": "def456",
                    "author_name": "bob",
                    "author_email": null,
                    "committed_date": "2022-06-01T08:30:00.000+02:00"
                },
                "lines": ["pass"]
            }
        ]"#,
        )
        .unwrap();

        let records = records_from_entries(entries);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].commit, "abc123");
        assert_eq!(records[0].author, "alice");
        assert_eq!(
            records[0].author_email.as_deref(),
            Some("alice@example.com")
        );
        assert_eq!(records[1].author, "bob");
        // Offset timestamps normalize to UTC.
        assert_eq!(records[1].timestamp.to_rfc3339(), "2022-06-01T06:30:00+00:00");
    }

    #[test]
    fn test_records_from_entries_dedupes_commits() {
        let entries: Vec<GitLabBlameEntry> = serde_json::from_str(
            r#"[
            {"commit": {"id": "abc123", "author_name": "alice", "author_email": null, "committed_date": "2023-01-01T00:00:00Z"}},
            {"commit": {"id": "abc123", "author_name": "alice", "author_email": null, "committed_date": "2023-01-01T00:00:00Z"}}
        ]"#,
        )
        .unwrap();
        assert_eq!(records_from_entries(entries).len(), 1);
    }

    #[test]
    fn test_records_from_entries_missing_author() {
        let entries: Vec<GitLabBlameEntry> = serde_json::from_str(
            r#"[{"commit": {"id": "abc123", "author_name": null, "author_email": null, "committed_date": "2023-01-01T00:00:00Z"}}]"#,
        )
        .unwrap();
        assert_eq!(records_from_entries(entries)[0].author, "Unknown");
    }

    #[test]
    fn test_blame_url_encodes_project_and_path() {
        let provider = GitLabProvider {
            base_url: "https://gitlab.com".to_string(),
            project: "group/project".to_string(),
            git_ref: "HEAD".to_string(),
            token: "secret".to_string(),
            client: reqwest::blocking::Client::new(),
        };
        let url = provider.blame_url("lib/class.rb", 10, 12);
        assert_eq!(
            url,
            "https://gitlab.com/api/v4/projects/group%2Fproject/repository/files/lib%2Fclass%2Erb/blame?ref=HEAD&range[start]=10&range[end]=12"
        );
    }

    #[test]
    fn test_new_without_token_is_auth_error() {
        let prev = env::var("GITLAB_TOKEN").ok();
        env::remove_var("GITLAB_TOKEN");
        let result = GitLabProvider::new(
            "gitlab.com".to_string(),
            "group/project".to_string(),
            None,
            "HEAD".to_string(),
            Duration::from_secs(5),
            "sastblame-test",
        );
        if let Some(token) = prev {
            env::set_var("GITLAB_TOKEN", token);
        }
        assert!(matches!(result, Err(Error::ProviderAuth { .. })));
    }
}
