// src/vcs.rs

//! Version-control collaborator
//!
//! Sync operations optionally record each touched channel as one commit.
//! The default implementation drives the `git` CLI in the overlay root.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

/// Stage-and-commit interface used by the sync operations
pub trait VersionControl {
    /// Stage `paths` (relative to the repository root) and commit them
    fn commit(&self, paths: &[PathBuf], message: &str) -> Result<()>;
}

/// `git` command-line backend
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Run `git <args>` in the repository root, returning stdout
    fn run(&self, args: &[&str]) -> Result<String> {
        debug!("git {}", args.join(" "));
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()
            .map_err(|e| Error::Vcs(format!("Failed to run git: {e}. Is git installed?")))?;

        if !output.status.success() {
            return Err(Error::Vcs(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Files added between two commits, restricted to `under`
    pub fn added_paths(&self, from: &str, to: &str, under: &str) -> Result<Vec<PathBuf>> {
        let stdout = self.run(&[
            "diff-tree",
            "--diff-filter=A",
            "--no-commit-id",
            "--name-only",
            "-r",
            from,
            to,
            "--",
            under,
        ])?;

        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(PathBuf::from)
            .collect())
    }
}

impl VersionControl for GitCli {
    fn commit(&self, paths: &[PathBuf], message: &str) -> Result<()> {
        let mut add: Vec<&str> = vec!["add", "--all", "--"];
        let path_strs: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        add.extend(path_strs.iter().map(String::as_str));
        self.run(&add)?;

        self.run(&["commit", "-m", message])?;
        info!("Committed: {}", message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn git_available() -> bool {
        Command::new("git").arg("--version").output().is_ok()
    }

    fn init_repo() -> TempDir {
        let temp = TempDir::new().unwrap();
        let git = GitCli::new(temp.path());
        git.run(&["init", "-q"]).unwrap();
        git.run(&["config", "user.email", "ci@example.org"]).unwrap();
        git.run(&["config", "user.name", "CI"]).unwrap();
        git.run(&["config", "commit.gpgsign", "false"]).unwrap();
        temp
    }

    #[test]
    fn test_commit_and_added_paths() {
        if !git_available() {
            return;
        }
        let temp = init_repo();
        let git = GitCli::new(temp.path());

        let pkg = temp.path().join("www-client/foo");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("foo-1.0.0.ebuild"), "# 1.0.0\n").unwrap();
        git.commit(&[PathBuf::from("www-client/foo")], "www-client/foo: added: 1.0.0")
            .unwrap();
        let first = git.run(&["rev-parse", "HEAD"]).unwrap();

        fs::write(pkg.join("foo-1.1.0.ebuild"), "# 1.0.0\n").unwrap();
        fs::remove_file(pkg.join("foo-1.0.0.ebuild")).unwrap();
        git.commit(
            &[PathBuf::from("www-client/foo")],
            "www-client/foo: added: 1.1.0, dropped: 1.0.0",
        )
        .unwrap();

        let added = git
            .added_paths(first.trim(), "HEAD", "www-client/")
            .unwrap();
        assert_eq!(added, vec![PathBuf::from("www-client/foo/foo-1.1.0.ebuild")]);

        let log = git.run(&["log", "-1", "--format=%s"]).unwrap();
        assert_eq!(log.trim(), "www-client/foo: added: 1.1.0, dropped: 1.0.0");
    }

    #[test]
    fn test_failure_is_vcs_error() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let git = GitCli::new(temp.path().join("not-a-repo"));
        assert!(matches!(
            git.commit(&[PathBuf::from("x")], "msg"),
            Err(Error::Vcs(_))
        ));
    }
}
