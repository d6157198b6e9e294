use std::error::Error;

use clap::Parser;
use jiff::Zoned;
use log::{error, info};
use ocha_snapshot::job::{
    config::{load_env, JobConfig},
    runner::{run_job, Trigger},
    updater::updater_for,
};

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Stay up and run the OCHA snapshot job at every slot of the weekly schedule (OCHA_SCHEDULE, default Thursdays 06:00 UTC)."
)]
struct Args {
    /// Environment name, e.g., test, prod
    #[arg(short, long, default_value = "prod")]
    env: String,

    /// Exit after the first scheduled run
    #[arg(long)]
    once: bool,

    /// Commit locally, don't push
    #[arg(long)]
    no_push: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
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

    loop {
        let now = Zoned::now();
        let next = config.schedule.next_after(&now)?;
        info!("Next run at {}", next.strftime("%Y-%m-%d %H:%M %Z"));

        tokio::select! {
            _ = tokio::time::sleep(next.duration_since(&now).unsigned_abs()) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, exiting");
                return Ok(());
            }
        }

        // one run at a time, the next slot is computed after this one ends
        let job_config = config.clone();
        let result = tokio::task::spawn_blocking(move || {
            let updater = updater_for(&job_config);
            run_job(&job_config, updater.as_ref(), Trigger::Scheduled)
        })
        .await?;
        match result {
            Ok(outcome) => info!("Scheduled run finished: {:?}", outcome),
            Err(e) => error!("Scheduled run failed: {}", e),
        }

        if args.once {
            return Ok(());
        }
    }
}
