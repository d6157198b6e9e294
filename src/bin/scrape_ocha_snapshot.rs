use std::{error::Error, path::PathBuf};

use clap::Parser;
use log::info;
use num_format::{Locale, ToFormattedString};
use ocha_snapshot::{
    db::{ocha::fatalities_archive::FatalityRecord, prod_db::ProdDb},
    job::config::{load_env, JobConfig},
};
use tabled::{builder::Builder, settings::Style};

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Update data/fatalities.csv and docs/index.html from the latest OCHA Gaza snapshot.  Touches no git state."
)]
struct Args {
    /// Environment name, e.g., test, prod
    #[arg(short, long, default_value = "prod")]
    env: String,

    /// Repository root, overrides OCHA_REPO_DIR
    #[arg(long)]
    repo_dir: Option<PathBuf>,
}

/// Make an ASCII table from the last `count` rows of the archive.  The change
/// is against the row before, blank for the first row of the archive.
fn ascii_table(rows: &[FatalityRecord], count: usize) -> tabled::Table {
    let mut builder = Builder::new();
    builder.push_record(vec!["Snapshot Date", "Fatalities", "Change"]);
    let start = rows.len().saturating_sub(count);
    for (i, row) in rows.iter().enumerate().skip(start) {
        let change = match i.checked_sub(1).and_then(|j| rows.get(j)) {
            Some(previous) => format!(
                "{:+}",
                i128::from(row.fatalities) - i128::from(previous.fatalities)
            ),
            None => String::new(),
        };
        builder.push_record(vec![
            row.date.to_string(),
            row.fatalities.to_formatted_string(&Locale::en),
            change,
        ]);
    }
    let mut table = builder.build();
    table.with(Style::empty());
    table
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();
    load_env(&args.env);

    let repo_dir = match args.repo_dir {
        Some(dir) => dir,
        None => JobConfig::from_env()?.repo_dir,
    };
    let updater = ProdDb::ocha_snapshot_updater(&repo_dir);
    let outcome = updater.run()?;
    info!("{:?}", outcome);

    let rows = updater.archive.read()?;
    info!("Latest snapshots:\n{}", ascii_table(&rows, 6));

    Ok(())
}
