use std::{env, fmt::Debug, path::PathBuf};

use log::{info, warn};
use thiserror::Error;

use super::schedule::WeeklySchedule;

pub const DEFAULT_USER_NAME: &str = "github-actions[bot]";
pub const DEFAULT_USER_EMAIL: &str = "41898282+github-actions[bot]@users.noreply.github.com";

#[derive(Error, Debug)]
#[error("invalid value for {name}: {message}")]
pub struct ConfigError {
    pub name: String,
    pub message: String,
}

#[derive(Clone)]
pub struct JobConfig {
    /// Root of the working tree the job updates and commits.
    pub repo_dir: PathBuf,
    /// Pathspecs staged after the update, relative to `repo_dir`.
    pub watch_paths: Vec<String>,
    pub remote: String,
    /// Push `HEAD` to this branch.  If `None`, push to the upstream of `HEAD`.
    pub branch: Option<String>,
    pub user_name: String,
    pub user_email: String,
    pub token: Option<String>,
    /// Run with `sh -c` before the update step, e.g. to install dependencies
    /// of an external update script.
    pub setup_command: Option<String>,
    /// If set, run this executable instead of the built-in updater.
    pub update_script: Option<PathBuf>,
    /// Run the update script with this program, e.g. `python3`, instead of
    /// executing it directly.
    pub update_interpreter: Option<String>,
    pub schedule: WeeklySchedule,
    pub push: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        JobConfig {
            repo_dir: PathBuf::from("."),
            watch_paths: vec!["data/*.csv".to_string(), "docs".to_string()],
            remote: "origin".to_string(),
            branch: None,
            user_name: DEFAULT_USER_NAME.to_string(),
            user_email: DEFAULT_USER_EMAIL.to_string(),
            token: None,
            setup_command: None,
            update_script: None,
            update_interpreter: None,
            schedule: WeeklySchedule::default(),
            push: true,
        }
    }
}

impl Debug for JobConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobConfig")
            .field("repo_dir", &self.repo_dir)
            .field("watch_paths", &self.watch_paths)
            .field("remote", &self.remote)
            .field("branch", &self.branch)
            .field("user_name", &self.user_name)
            .field("user_email", &self.user_email)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("setup_command", &self.setup_command)
            .field("update_script", &self.update_script)
            .field("update_interpreter", &self.update_interpreter)
            .field("schedule", &self.schedule.to_string())
            .field("push", &self.push)
            .finish()
    }
}

impl JobConfig {
    pub fn from_env() -> Result<JobConfig, ConfigError> {
        JobConfig::from_vars(|name| env::var(name).ok())
    }

    /// Build the configuration from a variable lookup.  Unset and blank
    /// variables take the default.
    pub fn from_vars<F>(get: F) -> Result<JobConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| get(name).filter(|v| !v.trim().is_empty());
        let mut config = JobConfig::default();

        if let Some(dir) = var("OCHA_REPO_DIR") {
            config.repo_dir = PathBuf::from(dir);
        }
        if let Some(paths) = var("OCHA_WATCH_PATHS") {
            config.watch_paths = paths
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
        }
        if let Some(remote) = var("OCHA_GIT_REMOTE") {
            config.remote = remote;
        }
        config.branch = var("OCHA_GIT_BRANCH");
        if let Some(name) = var("OCHA_GIT_USER_NAME") {
            config.user_name = name;
        }
        if let Some(email) = var("OCHA_GIT_USER_EMAIL") {
            config.user_email = email;
        }
        config.token = var("GITHUB_TOKEN");
        config.setup_command = var("OCHA_SETUP_COMMAND");
        config.update_script = var("OCHA_UPDATE_SCRIPT").map(PathBuf::from);
        config.update_interpreter = var("OCHA_UPDATE_INTERPRETER");
        if let Some(schedule) = var("OCHA_SCHEDULE") {
            config.schedule = schedule.parse().map_err(|e| ConfigError {
                name: "OCHA_SCHEDULE".to_string(),
                message: format!("{}", e),
            })?;
        }
        Ok(config)
    }
}

/// Load `.env/<env>.env` into the process environment.  Variables already
/// set win, and a missing file is not an error (on CI everything comes from
/// the environment).
pub fn load_env(env_name: &str) {
    let path = PathBuf::from(format!(".env/{}.env", env_name));
    match dotenvy::from_path(&path) {
        Ok(()) => info!("Loaded environment from {:?}", path),
        Err(e) if e.not_found() => info!("No {:?}, using the process environment", path),
        Err(e) => warn!("Failed to load {:?}: {}", path, e),
    }
}
