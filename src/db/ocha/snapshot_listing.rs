// Locate the latest "Reported impact snapshot | Gaza Strip" PDF.
// https://www.ochaopt.org/publications/snapshots

use std::error::Error;

use jiff::civil::Date;
use log::{info, warn};
use regex::Regex;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use serde::Deserialize;

use super::ScrapeError;
use crate::utils::lib_http::{exists, get_text};

pub const LIST_URL: &str = "https://www.ochaopt.org/publications/snapshots";
pub const FILES_URL: &str = "https://www.ochaopt.org/sites/default/files";
pub const RELIEFWEB_URL: &str = "https://api.reliefweb.int/v1/reports?appname=ochascrape&query[value]=Gaza%20Reported%20Impact%20Snapshot&query[field]=title&sort[]=date:desc&fields[include][]=date.original&fields[include][]=file.url&limit=1";

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRef {
    pub pdf_url: String,
    pub date: Date,
}

pub struct SnapshotLocator {
    pub list_url: String,
    pub files_url: String,
    pub reliefweb_url: String,
}

impl Default for SnapshotLocator {
    fn default() -> Self {
        SnapshotLocator {
            list_url: LIST_URL.to_string(),
            files_url: FILES_URL.to_string(),
            reliefweb_url: RELIEFWEB_URL.to_string(),
        }
    }
}

impl SnapshotLocator {
    /// Find the PDF for the most recent snapshot on the listing page.  Try
    /// the usual file names first, then fall back to the ReliefWeb API.
    pub fn find_latest(&self, client: &Client) -> Result<SnapshotRef, Box<dyn Error>> {
        let html = get_text(client, &self.list_url, Some("text/html"))?;
        let date = latest_listed_date(&html)?;
        info!("Latest snapshot listed is for {}", date);

        for url in candidate_pdf_urls(&self.files_url, date) {
            if exists(client, &url) {
                info!("Found snapshot PDF at {}", url);
                return Ok(SnapshotRef { pdf_url: url, date });
            }
        }

        warn!(
            "No PDF at the usual locations for {}, asking ReliefWeb instead",
            date
        );
        let json = get_text(client, &self.reliefweb_url, Some("application/json"))?;
        let snapshot = parse_reliefweb(&json)?;
        info!("ReliefWeb points to {} ({})", snapshot.pdf_url, snapshot.date);
        Ok(snapshot)
    }
}

/// All the snapshot dates linked from the listing page, in page order.
pub fn parse_listing(html: &str) -> Result<Vec<Date>, ScrapeError> {
    let re = Regex::new(r"^Reported impact snapshot \| Gaza Strip \((\d{1,2} \w+\.? \d{4})\)")?;
    let selector = Selector::parse("a").map_err(|e| ScrapeError::Selector(e.to_string()))?;
    let document = Html::parse_document(html);

    let mut dates = Vec::new();
    for link in document.select(&selector) {
        let title = link
            .text()
            .flat_map(|s| s.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(caps) = re.captures(&title) {
            match parse_snapshot_date(&caps[1]) {
                Some(date) => dates.push(date),
                None => warn!("Ignoring snapshot link with a bad date: {}", title),
            }
        }
    }
    Ok(dates)
}

pub fn latest_listed_date(html: &str) -> Result<Date, ScrapeError> {
    parse_listing(html)?
        .into_iter()
        .max()
        .ok_or(ScrapeError::NoSnapshotListed)
}

/// Parse a day-first date like `7 May 2025` or `12 Sept 2024`.
pub fn parse_snapshot_date(s: &str) -> Option<Date> {
    let mut parts = s.split_whitespace();
    let day: i8 = parts.next()?.parse().ok()?;
    let name = parts.next()?.trim_end_matches('.').to_lowercase();
    let year: i16 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || name.len() < 3 {
        return None;
    }
    let month = MONTHS.iter().position(|m| m.starts_with(name.as_str()))?;
    Date::new(year, i8::try_from(month + 1).ok()?, day).ok()
}

/// The file names OCHA has used for the snapshot PDF, most common first.
pub fn candidate_pdf_urls(files_url: &str, date: Date) -> Vec<String> {
    let stem = format!(
        "{}/Gaza_Reported_Impact_Snapshot_{}",
        files_url.trim_end_matches('/'),
        date.strftime("%d_%B_%Y")
    );
    vec![
        format!("{}%20final.pdf", stem),
        format!("{}-final.pdf", stem),
        format!("{}.pdf", stem),
    ]
}

#[derive(Debug, Deserialize)]
struct ReliefWebResponse {
    #[serde(default)]
    data: Vec<ReliefWebReport>,
}

#[derive(Debug, Deserialize)]
struct ReliefWebReport {
    fields: ReliefWebFields,
}

#[derive(Debug, Deserialize)]
struct ReliefWebFields {
    #[serde(default, alias = "attachments")]
    file: Vec<ReliefWebFile>,
    date: Option<ReliefWebDate>,
}

#[derive(Debug, Deserialize)]
struct ReliefWebFile {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ReliefWebDate {
    original: String,
}

/// Pull the first attachment and the publication date out of a ReliefWeb
/// reports response.
pub fn parse_reliefweb(json: &str) -> Result<SnapshotRef, ScrapeError> {
    let response: ReliefWebResponse = serde_json::from_str(json)?;
    let fields = response
        .data
        .into_iter()
        .next()
        .map(|report| report.fields)
        .ok_or(ScrapeError::NoPdfFound)?;
    let date = fields
        .date
        .as_ref()
        .and_then(|d| d.original.get(..10))
        .and_then(|d| d.parse::<Date>().ok())
        .ok_or(ScrapeError::NoPdfFound)?;
    let pdf_url = fields
        .file
        .into_iter()
        .next()
        .map(|f| f.url)
        .ok_or(ScrapeError::NoPdfFound)?;
    Ok(SnapshotRef { pdf_url, date })
}
