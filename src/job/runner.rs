use std::{fmt::Display, io, process::Command};

use jiff::{civil::Date, tz::TimeZone, Timestamp};
use log::info;
use thiserror::Error;

use super::{config::JobConfig, lock::RunLock, updater::Updater};
use crate::utils::git::{Git, GitError};

#[derive(Error, Debug)]
pub enum JobError {
    #[error("setup failed: {0}")]
    Setup(String),
    #[error("update step failed: {0}")]
    Update(String),
    #[error("commit failed: {0}")]
    Commit(#[source] GitError),
    #[error("push failed: {0}")]
    Push(#[source] GitError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Trigger {
    Scheduled,
    Manual,
}

impl Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Scheduled => write!(f, "scheduled"),
            Trigger::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Committed {
        commit: String,
        message: String,
        pushed: bool,
    },
    NoChanges,
}

pub fn commit_message(date: Date) -> String {
    format!("Update OCHA snapshot ({})", date)
}

pub fn utc_today() -> Date {
    Timestamp::now().to_zoned(TimeZone::UTC).date()
}

/// Run the job once: setup, update, then commit and push the watched paths
/// if anything changed.  The trigger is only logged, both kinds run the same
/// steps.  A failed step stops the job.
pub fn run_job(
    config: &JobConfig,
    updater: &dyn Updater,
    trigger: Trigger,
) -> Result<JobOutcome, JobError> {
    info!(
        "OCHA snapshot job started ({} trigger) in {:?}",
        trigger, config.repo_dir
    );
    let git = Git {
        repo_dir: config.repo_dir.clone(),
        user_name: config.user_name.clone(),
        user_email: config.user_email.clone(),
    };

    let _lock = setup(config, &git)?;

    info!("Running the {}", updater.describe());
    updater
        .update()
        .map_err(|e| JobError::Update(e.to_string()))?;

    let outcome = commit_changes(config, &git, utc_today())?;
    match &outcome {
        JobOutcome::Committed { commit, .. } => info!("Job done, committed {}", commit),
        JobOutcome::NoChanges => info!("Job done, nothing to commit"),
    }
    Ok(outcome)
}

fn setup(config: &JobConfig, git: &Git) -> Result<RunLock, JobError> {
    let version = git.version().map_err(|e| JobError::Setup(e.to_string()))?;
    info!("Using {}", version);
    if !git
        .is_work_tree()
        .map_err(|e| JobError::Setup(e.to_string()))?
    {
        return Err(JobError::Setup(format!(
            "{:?} is not a git working tree",
            config.repo_dir
        )));
    }

    let lock = RunLock::acquire(&config.repo_dir).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => {
            JobError::Setup("another run is in progress in this working tree".to_string())
        }
        _ => JobError::Setup(format!("failed to create the run lock: {}", e)),
    })?;

    if let Some(cmd) = &config.setup_command {
        info!("Running setup command `{}`", cmd);
        let status = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .current_dir(&config.repo_dir)
            .status()
            .map_err(|e| JobError::Setup(format!("failed to run `{}`: {}", cmd, e)))?;
        if !status.success() {
            return Err(JobError::Setup(format!("`{}` exited with {}", cmd, status)));
        }
    }
    Ok(lock)
}

/// Stage the watched paths and commit them, dated `date`, if their staged
/// diff is not empty.  Anything else in the index is left out of the commit.
pub fn commit_changes(config: &JobConfig, git: &Git, date: Date) -> Result<JobOutcome, JobError> {
    let staged = git.stage(&config.watch_paths).map_err(JobError::Commit)?;
    if staged.is_empty() || !git.has_staged_changes(&staged).map_err(JobError::Commit)? {
        info!("No changes under {:?}", config.watch_paths);
        return Ok(JobOutcome::NoChanges);
    }

    let message = commit_message(date);
    let commit = git.commit(&message, &staged).map_err(JobError::Commit)?;
    info!("Created commit {} \"{}\"", commit, message);

    if config.push {
        git.push(
            &config.remote,
            config.branch.as_deref(),
            config.token.as_deref(),
        )
        .map_err(JobError::Push)?;
    } else {
        info!("Push disabled, commit {} stays local", commit);
    }
    Ok(JobOutcome::Committed {
        commit,
        message,
        pushed: config.push,
    })
}
