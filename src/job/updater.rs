use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use log::info;

use super::config::JobConfig;
use crate::db::{ocha::snapshot_updater::OchaSnapshotUpdater, prod_db::ProdDb};

/// The step that refreshes the data and docs in the working tree.
pub trait Updater {
    fn describe(&self) -> String;

    fn update(&self) -> Result<(), Box<dyn Error>>;
}

impl Updater for OchaSnapshotUpdater {
    fn describe(&self) -> String {
        "built-in OCHA snapshot updater".to_string()
    }

    fn update(&self) -> Result<(), Box<dyn Error>> {
        self.run().map(|_| ())
    }
}

/// A script taking no arguments, run from the repository root.  A non-zero
/// exit status is a failure.  Without an interpreter the script must be
/// executable on its own (exec bit and shebang).
pub struct ExternalScript {
    pub path: PathBuf,
    pub repo_dir: PathBuf,
    /// Program and leading arguments to run the script with, e.g. `python3 -u`.
    pub interpreter: Option<String>,
}

impl ExternalScript {
    fn command(&self, path: &Path) -> Result<Command, Box<dyn Error>> {
        let mut command = match self.interpreter.as_deref() {
            Some(interpreter) => {
                let mut words = interpreter.split_whitespace();
                let program = words
                    .next()
                    .ok_or_else(|| format!("empty interpreter for {:?}", self.path))?;
                let mut command = Command::new(program);
                command.args(words).arg(path);
                command
            }
            None => Command::new(path),
        };
        command.current_dir(&self.repo_dir);
        Ok(command)
    }
}

impl Updater for ExternalScript {
    fn describe(&self) -> String {
        format!("update script {:?}", self.path)
    }

    fn update(&self) -> Result<(), Box<dyn Error>> {
        let path = fs::canonicalize(self.repo_dir.join(&self.path))
            .map_err(|e| format!("update script {:?} not found: {}", self.path, e))?;
        let mut command = self.command(&path)?;
        info!("Running {:?}", command);
        let status = command
            .status()
            .map_err(|e| format!("failed to run {:?}: {}", self.path, e))?;
        if !status.success() {
            return Err(format!("{:?} exited with {}", self.path, status).into());
        }
        Ok(())
    }
}

pub fn updater_for(config: &JobConfig) -> Box<dyn Updater> {
    match &config.update_script {
        Some(path) => Box::new(ExternalScript {
            path: path.clone(),
            repo_dir: config.repo_dir.clone(),
            interpreter: config.update_interpreter.clone(),
        }),
        None => Box::new(ProdDb::ocha_snapshot_updater(&config.repo_dir)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updater_from_config() {
        let config = JobConfig {
            repo_dir: PathBuf::from("/srv/gaza"),
            ..JobConfig::default()
        };
        assert_eq!(updater_for(&config).describe(), "built-in OCHA snapshot updater");

        let config = JobConfig {
            update_script: Some(PathBuf::from("scripts/scrape.sh")),
            ..config
        };
        assert!(updater_for(&config).describe().contains("scripts/scrape.sh"));
    }

    #[test]
    fn missing_script() {
        let script = ExternalScript {
            path: PathBuf::from("scripts/does-not-exist.sh"),
            repo_dir: Path::new(env!("CARGO_MANIFEST_DIR")).to_path_buf(),
            interpreter: None,
        };
        let err = script.update().unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[cfg(unix)]
    #[test]
    fn script_run_through_an_interpreter() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("scripts"))?;
        // no exec bit, no shebang
        fs::write(
            dir.path().join("scripts/scrape.sh"),
            "mkdir -p data\necho 'date,fatalities' > data/fatalities.csv\n",
        )?;

        let script = ExternalScript {
            path: PathBuf::from("scripts/scrape.sh"),
            repo_dir: dir.path().to_path_buf(),
            interpreter: Some("sh -e".to_string()),
        };
        script.update()?;
        assert_eq!(
            fs::read_to_string(dir.path().join("data/fatalities.csv"))?,
            "date,fatalities\n"
        );

        let failing = ExternalScript {
            interpreter: Some("sh -c false".to_string()),
            ..script
        };
        assert!(failing.update().is_err());
        Ok(())
    }

    #[test]
    fn blank_interpreter() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("scrape.sh"), "exit 0\n")?;
        let script = ExternalScript {
            path: PathBuf::from("scrape.sh"),
            repo_dir: dir.path().to_path_buf(),
            interpreter: Some("  ".to_string()),
        };
        assert!(script.update().unwrap_err().to_string().contains("empty interpreter"));
        Ok(())
    }
}
