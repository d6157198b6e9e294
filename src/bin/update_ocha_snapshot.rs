use std::error::Error;

use clap::Parser;
use log::{error, info};
use ocha_snapshot::job::{
    config::{load_env, JobConfig},
    runner::{run_job, JobOutcome, Trigger},
    updater::updater_for,
};

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Fetch the latest OCHA Gaza snapshot, then commit and push the data and docs if they changed."
)]
struct Args {
    /// Environment name, e.g., test, prod
    #[arg(short, long, default_value = "prod")]
    env: String,

    /// What started this run.  Both triggers run the same steps.
    #[arg(long, value_enum, default_value_t = Trigger::Manual)]
    trigger: Trigger,

    /// Commit locally, don't push
    #[arg(long)]
    no_push: bool,
}

/// Run this job every Thursday at 6AM UTC, or by hand.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();
    load_env(&args.env);

    let mut config = JobConfig::from_env()?;
    if args.no_push {
        config.push = false;
    }
    info!("{:?}", config);

    let updater = updater_for(&config);
    match run_job(&config, updater.as_ref(), args.trigger) {
        Ok(JobOutcome::Committed { commit, message, .. }) => {
            info!("{} {}", commit, message)
        }
        Ok(JobOutcome::NoChanges) => info!("Nothing new this week"),
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
