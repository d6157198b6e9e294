pub mod fatalities_archive;
pub mod fatalities_chart;
pub mod snapshot_listing;
pub mod snapshot_pdf;
pub mod snapshot_updater;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("no Gaza snapshot found on the listing page")]
    NoSnapshotListed,
    #[error("no PDF found for the latest snapshot")]
    NoPdfFound,
    #[error("no Palestinian fatalities figure in the snapshot text")]
    FatalitiesNotFound,
    #[error("failed to extract text from PDF: {0}")]
    Pdf(String),
    #[error("invalid selector: {0}")]
    Selector(String),
    #[error(transparent)]
    Regex(#[from] regex::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
