use std::{
    path::PathBuf,
    process::{Command, Output},
};

use log::info;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("failed to invoke git: {0}")]
    Io(#[from] std::io::Error),
    #[error("`git {command}` failed with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

impl GitError {
    /// Hide a credential that may have leaked into the message.
    fn redact(self, secret: Option<&str>) -> Self {
        match (self, secret) {
            (
                GitError::Failed {
                    command,
                    status,
                    stderr,
                },
                Some(secret),
            ) => GitError::Failed {
                command: redact(&command, secret),
                status,
                stderr: redact(&stderr, secret),
            },
            (e, _) => e,
        }
    }
}

/// Thin wrapper around the `git` binary, run in a fixed working tree.
pub struct Git {
    pub repo_dir: PathBuf,
    pub user_name: String,
    pub user_email: String,
}

impl Git {
    fn output(&self, args: &[&str]) -> Result<Output, GitError> {
        Ok(Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()?)
    }

    /// Run a git command and return its trimmed stdout.
    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.output(args)?;
        if !output.status.success() {
            return Err(failed(args, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn version(&self) -> Result<String, GitError> {
        self.run(&["--version"])
    }

    pub fn is_work_tree(&self) -> Result<bool, GitError> {
        let output = self.output(&["rev-parse", "--is-inside-work-tree"])?;
        Ok(output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true")
    }

    /// Does the pathspec match any tracked or untracked (not ignored) file?
    pub fn matches_any(&self, pathspec: &str) -> Result<bool, GitError> {
        let files = self.run(&[
            "ls-files",
            "--cached",
            "--others",
            "--exclude-standard",
            "--",
            pathspec,
        ])?;
        Ok(!files.is_empty())
    }

    /// Stage additions, modifications and deletions under the pathspecs.
    /// Pathspecs that match nothing are skipped.  Return the ones staged.
    pub fn stage(&self, pathspecs: &[String]) -> Result<Vec<String>, GitError> {
        let mut staged = Vec::new();
        for pathspec in pathspecs {
            if self.matches_any(pathspec)? {
                self.run(&["add", "--all", "--", pathspec])?;
                staged.push(pathspec.clone());
            } else {
                info!("Nothing matches {}, skipping", pathspec);
            }
        }
        Ok(staged)
    }

    /// Is anything staged under the pathspecs?  No pathspecs means the whole
    /// index.
    pub fn has_staged_changes(&self, pathspecs: &[String]) -> Result<bool, GitError> {
        let mut args = vec!["diff", "--cached", "--quiet", "--"];
        args.extend(pathspecs.iter().map(String::as_str));
        let output = self.output(&args)?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(failed(&args, &output)),
        }
    }

    /// Commit the pathspecs (everything staged if none) with the configured
    /// identity, return the new commit id.  Other staged files stay staged.
    pub fn commit(&self, message: &str, pathspecs: &[String]) -> Result<String, GitError> {
        let name = format!("user.name={}", self.user_name);
        let email = format!("user.email={}", self.user_email);
        let mut args: Vec<&str> = vec![
            "-c",
            &name,
            "-c",
            &email,
            "-c",
            "commit.gpgsign=false",
            "commit",
            "--quiet",
            "-m",
            message,
            "--",
        ];
        args.extend(pathspecs.iter().map(String::as_str));
        self.run(&args)?;
        self.run(&["rev-parse", "HEAD"])
    }

    pub fn remote_url(&self, remote: &str) -> Result<String, GitError> {
        self.run(&["remote", "get-url", remote])
    }

    /// Push `HEAD` to the remote, to `branch` if given.  With a token and an
    /// https remote, authenticate as `x-access-token`.
    pub fn push(
        &self,
        remote: &str,
        branch: Option<&str>,
        token: Option<&str>,
    ) -> Result<(), GitError> {
        let target = match token {
            Some(token) => authenticated_url(&self.remote_url(remote)?, token)
                .unwrap_or_else(|| remote.to_string()),
            None => remote.to_string(),
        };
        let refspec = match branch {
            Some(branch) => format!("HEAD:refs/heads/{}", branch),
            None => "HEAD".to_string(),
        };
        self.run(&["push", "--quiet", &target, &refspec])
            .map_err(|e| e.redact(token))?;
        info!("Pushed {} to {}", refspec, remote);
        Ok(())
    }
}

fn failed(args: &[&str], output: &Output) -> GitError {
    GitError::Failed {
        command: args.join(" "),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

/// Put the token in the userinfo of an https remote, replacing any existing
/// credentials.  Other schemes are left alone.
pub fn authenticated_url(url: &str, token: &str) -> Option<String> {
    let rest = url.strip_prefix("https://")?;
    let host_and_path = match rest.split_once('/') {
        Some((authority, path)) => {
            let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
            format!("{}/{}", host, path)
        }
        None => rest.rsplit_once('@').map_or(rest, |(_, h)| h).to_string(),
    };
    Some(format!("https://x-access-token:{}@{}", token, host_and_path))
}

pub fn redact(s: &str, secret: &str) -> String {
    if secret.is_empty() {
        return s.to_string();
    }
    s.replace(secret, "***")
}
