use std::error::Error;

use log::info;
use regex::Regex;
use reqwest::blocking::Client;

use super::ScrapeError;
use crate::utils::lib_http::get_bytes;

/// Download the snapshot PDF and return the cumulative number of reported
/// Palestinian fatalities.
pub fn download_fatalities(client: &Client, pdf_url: &str) -> Result<u64, Box<dyn Error>> {
    let bytes = get_bytes(client, pdf_url)?;
    info!("Downloaded {} bytes from {}", bytes.len(), pdf_url);
    let text = pdf_text(&bytes)?;
    Ok(extract_fatalities(&text)?)
}

pub fn pdf_text(bytes: &[u8]) -> Result<String, ScrapeError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ScrapeError::Pdf(e.to_string()))
}

/// Look for the figure sitting between "Palestinians" and "fatalities",
/// e.g. `Palestinians killed: 52,615 fatalities`.  If the layout breaks that
/// pattern, take the first thousands-grouped number on a line mentioning
/// Palestinians.
pub fn extract_fatalities(text: &str) -> Result<u64, ScrapeError> {
    let near = Regex::new(r"(?is)palestinians[^0-9]{0,40}([\d,]{3,})[^a-z]{0,20}fatalities")?;
    if let Some(caps) = near.captures(text) {
        return parse_count(&caps[1]);
    }

    let grouped = Regex::new(r"\d{1,3}(?:,\d{3})+")?;
    text.lines()
        .filter(|line| line.to_lowercase().contains("palestinians"))
        .find_map(|line| grouped.find(line))
        .ok_or(ScrapeError::FatalitiesNotFound)
        .and_then(|m| parse_count(m.as_str()))
}

fn parse_count(s: &str) -> Result<u64, ScrapeError> {
    s.replace(',', "")
        .parse::<u64>()
        .map_err(|_| ScrapeError::FatalitiesNotFound)
}
