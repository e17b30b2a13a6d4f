//! Remote repository checkout.
//!
//! Analyzing a repository with no local checkout needs its content on disk
//! for the static-analysis step; blame still comes from the provider APIs.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::{Error, Result};

/// Checkout options for remote repositories.
#[derive(Debug, Clone, Default)]
pub struct CheckoutOptions {
    /// Use shallow clone (--depth 1).
    pub shallow: bool,
    /// Specific branch or tag to check out after cloning.
    pub reference: Option<String>,
    /// Target directory (defaults to temp dir).
    pub target: Option<PathBuf>,
}

/// Clone a remote repository and check out its working tree.
///
/// Expects a full https clone URL; a previous checkout at the target
/// directory is replaced.
pub fn checkout_remote(url: &str, options: CheckoutOptions) -> Result<PathBuf> {
    let target = match options.target {
        Some(target) => target,
        None => {
            let temp_dir = std::env::temp_dir().join("sastblame-repos");
            std::fs::create_dir_all(&temp_dir).ok();
            temp_dir.join(sanitize_repo_name(url))
        }
    };
    if target.exists() {
        std::fs::remove_dir_all(&target)?;
    }

    debug!(url, target = %target.display(), "cloning repository");

    let mut prepare = gix::prepare_clone(url.to_string(), &target)
        .map_err(|e| Error::remote(format!("Failed to prepare clone: {e}")))?;

    if options.shallow {
        prepare = prepare.with_shallow(gix::remote::fetch::Shallow::DepthAtRemote(
            std::num::NonZeroU32::new(1).unwrap(),
        ));
    }

    let (mut checkout, _outcome) = prepare
        .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
        .map_err(|e| Error::remote(format!("Failed to clone: {e}")))?;

    let (_repo, _outcome) = checkout
        .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
        .map_err(|e| Error::remote(format!("Failed to check out worktree: {e}")))?;

    if let Some(reference) = options.reference {
        checkout_ref(&target, &reference)?;
    }

    Ok(target)
}

/// Check out a specific ref in a repository.
fn checkout_ref(repo_path: &Path, reference: &str) -> Result<()> {
    // Use the git CLI for checkout since gix checkout is complex.
    let output = std::process::Command::new("git")
        .args(["checkout", reference])
        .current_dir(repo_path)
        .output()
        .map_err(|e| Error::remote(format!("Failed to run git checkout: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::remote(format!(
            "Failed to checkout {reference}: {stderr}"
        )));
    }

    Ok(())
}

/// Sanitize repository name for use as directory name.
fn sanitize_repo_name(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .take(2)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("-")
        .replace(".git", "")
}
