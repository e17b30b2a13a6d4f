//! GitHub blame adapter.
//!
//! GitHub's REST API has no blame endpoint, so this adapter goes through the
//! GraphQL API's `Commit.blame` field.

use std::env;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::core::{Error, Result};

use super::{dedupe_by_commit, BlameProvider, BlameRecord};

const GITHUB_GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";

const BLAME_QUERY: &str = "\
query($owner: String!, $name: String!, $expression: String!, $path: String!) {
  repository(owner: $owner, name: $name) {
    object(expression: $expression) {
      ... on Commit {
        blame(path: $path) {
          ranges {
            startingLine
            endingLine
            commit {
              oid
              committedDate
              author { name email }
            }
          }
        }
      }
    }
  }
}";

/// Blame client for one GitHub repository.
pub struct GitHubProvider {
    owner: String,
    repo: String,
    git_ref: String,
    token: String,
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl GitHubProvider {
    /// Create a provider for `owner/repo`, blaming at `git_ref`.
    ///
    /// Falls back to the `GITHUB_TOKEN` environment variable when no token is
    /// passed; fails with an auth error when neither is present.
    pub fn new(
        owner: String,
        repo: String,
        token: Option<String>,
        git_ref: String,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self> {
        let token = token
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .ok_or_else(|| {
                Error::provider_auth(
                    "GitHub",
                    "no GitHub token supplied; pass --github-token or set GITHUB_TOKEN",
                )
            })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            owner,
            repo,
            git_ref,
            token,
            endpoint: GITHUB_GRAPHQL_ENDPOINT.to_string(),
            client,
        })
    }

    /// Override the GraphQL endpoint (GitHub Enterprise).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct BlameData {
    repository: Option<RepositoryNode>,
}

#[derive(Deserialize)]
struct RepositoryNode {
    object: Option<CommitNode>,
}

#[derive(Deserialize)]
struct CommitNode {
    blame: BlameNode,
}

#[derive(Deserialize)]
struct BlameNode {
    ranges: Vec<BlameRange>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlameRange {
    starting_line: u32,
    ending_line: u32,
    commit: RangeCommit,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeCommit {
    oid: String,
    committed_date: DateTime<Utc>,
    author: Option<GitActor>,
}

#[derive(Deserialize)]
struct GitActor {
    name: Option<String>,
    email: Option<String>,
}

impl BlameProvider for GitHubProvider {
    fn name(&self) -> &'static str {
        "github"
    }

    fn blame_range(&self, path: &str, start_line: u32, end_line: u32) -> Result<Vec<BlameRecord>> {
        debug!(
            owner = %self.owner,
            repo = %self.repo,
            path,
            start_line,
            end_line,
            "requesting GitHub blame"
        );

        let body = serde_json::json!({
            "query": BLAME_QUERY,
            "variables": {
                "owner": self.owner,
                "name": self.repo,
                "expression": self.git_ref,
                "path": path,
            }
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .map_err(|e| Error::http(format!("GitHub blame request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::provider_auth(
                "GitHub",
                format!("token rejected ({status})"),
            ));
        }
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(Error::http(format!("GitHub API error ({status}): {text}")));
        }

        let envelope: GraphQlResponse<BlameData> = response
            .json()
            .map_err(|e| Error::http(format!("failed to decode GitHub response: {e}")))?;

        if let Some(errors) = envelope.errors {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(Error::blame_lookup(path, messages.join("; ")));
        }

        let data = envelope
            .data
            .ok_or_else(|| Error::http("GitHub response carried no data"))?;

        records_in_range(data, path, start_line, end_line)
    }
}

/// Select the blame ranges overlapping `[start_line, end_line]` and map them
/// to records, deduplicated by commit and ordered by starting line.
fn records_in_range(
    data: BlameData,
    path: &str,
    start_line: u32,
    end_line: u32,
) -> Result<Vec<BlameRecord>> {
    let repository = data
        .repository
        .ok_or_else(|| Error::blame_lookup(path, "repository not found or not accessible"))?;
    let commit = repository
        .object
        .ok_or_else(|| Error::blame_lookup(path, "ref not found"))?;

    let mut ranges: Vec<BlameRange> = commit
        .blame
        .ranges
        .into_iter()
        .filter(|r| r.starting_line <= end_line && r.ending_line >= start_line)
        .collect();
    ranges.sort_by_key(|r| r.starting_line);

    let records = ranges
        .into_iter()
        .map(|r| {
            let author = r.commit.author.as_ref();
            BlameRecord {
                commit: r.commit.oid.clone(),
                author: author
                    .and_then(|a| a.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                author_email: author.and_then(|a| a.email.clone()),
                timestamp: r.commit.committed_date,
            }
        })
        .collect();

    Ok(dedupe_by_commit(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data(json: &str) -> BlameData {
        serde_json::from_str(json).unwrap()
    }

    const TWO_RANGES: &str = r#"{
        "repository": {
            "object": {
                "blame": {
                    "ranges": [
                        {
                            "startingLine": 1,
                            "endingLine": 9,
                            "commit": {
                                "oid": "def456",
                                "committedDate": "2022-06-01T08:30:00Z",
                                "author": {"name": "bob", "email": "bob@example.com"}
                            }
                        },
                        {
                            "startingLine": 10,
                            "endingLine": 12,
                            "commit": {
                                "oid": "abc123",
                                "committedDate": "2023-01-01T00:00:00Z",
                                "author": {"name": "alice", "email": null}
                            }
                        }
                    ]
                }
            }
        }
    }"#;

    #[test]
    fn test_records_in_range_overlap_filter() {
        let records = records_in_range(sample_data(TWO_RANGES), "app.py", 10, 12).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].commit, "abc123");
        assert_eq!(records[0].author, "alice");
        assert!(records[0].author_email.is_none());
    }

    #[test]
    fn test_records_in_range_spanning_boundary() {
        let records = records_in_range(sample_data(TWO_RANGES), "app.py", 8, 11).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].commit, "def456");
        assert_eq!(records[1].commit, "abc123");
    }

    #[test]
    fn test_records_in_range_dedupes_commits() {
        let data = sample_data(
            r#"{
            "repository": {
                "object": {
                    "blame": {
                        "ranges": [
                            {
                                "startingLine": 1,
                                "endingLine": 1,
                                "commit": {
                                    "oid": "abc123",
                                    "committedDate": "2023-01-01T00:00:00Z",
                                    "author": {"name": "alice", "email": null}
                                }
                            },
                            {
                                "startingLine": 3,
                                "endingLine": 3,
                                "commit": {
                                    "oid": "abc123",
                                    "committedDate": "2023-01-01T00:00:00Z",
                                    "author": {"name": "alice", "email": null}
                                }
                            }
                        ]
                    }
                }
            }
        }"#,
        );
        let records = records_in_range(data, "app.py", 1, 5).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_records_in_range_missing_repository_is_lookup_error() {
        let data = sample_data(r#"{"repository": null}"#);
        let result = records_in_range(data, "app.py", 1, 5);
        assert!(matches!(result, Err(Error::BlameLookup { .. })));
    }

    #[test]
    fn test_records_in_range_missing_object_is_lookup_error() {
        let data = sample_data(r#"{"repository": {"object": null}}"#);
        let result = records_in_range(data, "app.py", 1, 5);
        assert!(matches!(result, Err(Error::BlameLookup { .. })));
    }

    #[test]
    fn test_records_in_range_unknown_author() {
        let data = sample_data(
            r#"{
            "repository": {
                "object": {
                    "blame": {
                        "ranges": [
                            {
                                "startingLine": 1,
                                "endingLine": 2,
                                "commit": {
                                    "oid": "abc123",
                                    "committedDate": "2023-01-01T00:00:00Z",
                                    "author": null
                                }
                            }
                        ]
                    }
                }
            }
        }"#,
        );
        let records = records_in_range(data, "app.py", 1, 2).unwrap();
        assert_eq!(records[0].author, "Unknown");
    }

    #[test]
    fn test_new_without_token_is_auth_error() {
        let prev = env::var("GITHUB_TOKEN").ok();
        env::remove_var("GITHUB_TOKEN");
        let result = GitHubProvider::new(
            "owner".to_string(),
            "repo".to_string(),
            None,
            "HEAD".to_string(),
            Duration::from_secs(5),
            "sastblame-test",
        );
        if let Some(token) = prev {
            env::set_var("GITHUB_TOKEN", token);
        }
        assert!(matches!(result, Err(Error::ProviderAuth { .. })));
    }
}
