use std::path::Path;

use crate::db::ocha::{
    fatalities_archive::OchaFatalitiesArchive, fatalities_chart::FatalitiesChartPage,
    snapshot_listing::SnapshotLocator, snapshot_updater::OchaSnapshotUpdater,
};

/// Where everything lives inside the repository that gets committed.
pub struct ProdDb {}

impl ProdDb {
    pub fn ocha_fatalities(repo_dir: &Path) -> OchaFatalitiesArchive {
        OchaFatalitiesArchive {
            base_dir: repo_dir.join("data"),
        }
    }

    pub fn ocha_fatalities_chart(repo_dir: &Path) -> FatalitiesChartPage {
        FatalitiesChartPage {
            docs_dir: repo_dir.join("docs"),
        }
    }

    pub fn ocha_snapshot_updater(repo_dir: &Path) -> OchaSnapshotUpdater {
        OchaSnapshotUpdater {
            locator: SnapshotLocator::default(),
            archive: ProdDb::ocha_fatalities(repo_dir),
            chart: ProdDb::ocha_fatalities_chart(repo_dir),
        }
    }
}
