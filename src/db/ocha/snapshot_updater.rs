use std::{error::Error, time::Duration};

use log::info;
use num_format::{Locale, ToFormattedString};

use super::{
    fatalities_archive::{FatalityRecord, OchaFatalitiesArchive, UpsertOutcome},
    fatalities_chart::FatalitiesChartPage,
    snapshot_listing::SnapshotLocator,
    snapshot_pdf::download_fatalities,
};
use crate::utils::lib_http::client;

/// Fetch the latest weekly snapshot into the CSV archive and regenerate the
/// chart page.
pub struct OchaSnapshotUpdater {
    pub locator: SnapshotLocator,
    pub archive: OchaFatalitiesArchive,
    pub chart: FatalitiesChartPage,
}

impl OchaSnapshotUpdater {
    pub fn run(&self) -> Result<UpsertOutcome, Box<dyn Error>> {
        let snapshot = self.locator.find_latest(&client(Duration::from_secs(30))?)?;

        let rows = self.archive.read()?;
        let outcome = if rows.iter().any(|r| r.date == snapshot.date) {
            info!("No new weekly snapshot, nothing to add.");
            UpsertOutcome::AlreadyPresent
        } else {
            let fatalities =
                download_fatalities(&client(Duration::from_secs(60))?, &snapshot.pdf_url)?;
            let outcome = self.archive.upsert(FatalityRecord {
                date: snapshot.date,
                fatalities,
            })?;
            info!(
                "New data appended: {}  {}",
                snapshot.date,
                fatalities.to_formatted_string(&Locale::en)
            );
            outcome
        };

        self.chart.update(&self.archive.read()?)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::mock_http::{MockServer, Reply};
    use jiff::civil::date;
    use std::collections::HashMap;

    const LISTING: &str = r#"<html><body>
  <a href="/content/a">Reported impact snapshot | Gaza Strip (30 April 2025)</a>
  <a href="/content/b">Reported impact snapshot | Gaza Strip (7 May 2025)</a>
</body></html>"#;

    #[test]
    fn archived_snapshot_is_not_downloaded() -> Result<(), Box<dyn Error>> {
        let pdf = "/files/Gaza_Reported_Impact_Snapshot_07_May_2025-final.pdf";
        let server = MockServer::start(HashMap::from([
            ("/list".to_string(), Reply::ok("text/html", LISTING.as_bytes())),
            (pdf.to_string(), Reply::ok("application/pdf", b"%PDF-1.7")),
        ]))?;
        let dir = tempfile::tempdir()?;
        let updater = OchaSnapshotUpdater {
            locator: SnapshotLocator {
                list_url: server.url("/list"),
                files_url: server.url("/files"),
                reliefweb_url: server.url("/reliefweb"),
            },
            archive: OchaFatalitiesArchive {
                base_dir: dir.path().join("data"),
            },
            chart: FatalitiesChartPage {
                docs_dir: dir.path().join("docs"),
            },
        };
        updater.archive.upsert(FatalityRecord {
            date: date(2025, 5, 7),
            fatalities: 52_615,
        })?;

        assert_eq!(updater.run()?, UpsertOutcome::AlreadyPresent);
        let requests = server.requests();
        assert_eq!(requests.last(), Some(&format!("HEAD {}", pdf)));
        assert!(!requests.iter().any(|r| r.starts_with("GET /files/")));
        // the chart page is written even without a new row
        let page = std::fs::read_to_string(updater.chart.filename())?;
        assert!(page.contains("2025-05-07"));
        assert_eq!(updater.archive.read()?.len(), 1);
        Ok(())
    }
}
