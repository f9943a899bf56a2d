//! Git preconditions and commands, run through a [`CommandRunner`].

use std::path::Path;

use tracing::{debug, info};

use crate::runner::CommandRunner;
use crate::{PortError, Result};

const CLEAN_TREE: &str = "nothing to commit, working tree clean";

/// Fails unless `git status` reports a clean working tree.
pub fn ensure_clean(runner: &dyn CommandRunner, dir: &Path) -> Result<()> {
    let output = runner.run(dir, "git", &["status"])?;
    if !output.stdout.contains(CLEAN_TREE) {
        return Err(PortError::precondition(format!(
            "git not clean in {:?}: {}",
            dir,
            output.stdout.trim()
        )));
    }
    debug!("Working tree clean: {:?}", dir);
    Ok(())
}

pub fn current_branch(runner: &dyn CommandRunner, dir: &Path) -> Result<String> {
    let output = runner.run_checked(dir, "git", &["rev-parse", "--abbrev-ref", "HEAD"])?;
    Ok(output.stdout.trim().to_string())
}

pub fn head_commit(runner: &dyn CommandRunner, dir: &Path) -> Result<String> {
    let output = runner.run_checked(dir, "git", &["rev-parse", "HEAD"])?;
    Ok(output.stdout.trim().to_string())
}

/// Checks out `branch` in a clean tree and confirms the checkout took effect.
pub fn switch_to_branch(runner: &dyn CommandRunner, dir: &Path, branch: &str) -> Result<()> {
    ensure_clean(runner, dir)?;
    info!("Checking out {} in {:?}", branch, dir);
    runner.run(dir, "git", &["checkout", branch])?;

    let current = current_branch(runner, dir)?;
    if current != branch {
        return Err(PortError::precondition(format!(
            "could not check out {} in {:?} (still on {})",
            branch, dir, current
        )));
    }
    Ok(())
}

pub fn commit_all(runner: &dyn CommandRunner, dir: &Path, pathspec: &str, message: &str) -> Result<()> {
    runner.run_checked(dir, "git", &["add", pathspec])?;
    runner.run_checked(dir, "git", &["commit", "-m", message])?;
    info!("Committed: {}", message);
    Ok(())
}
