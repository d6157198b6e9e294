use std::{error::Error, time::Duration};

use reqwest::{
    blocking::Client,
    header::{ACCEPT, UPGRADE_INSECURE_REQUESTS, USER_AGENT},
    StatusCode,
};

const BROWSER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// A blocking client with a browser user agent.  Some of the OCHA pages
/// refuse requests without one.
pub fn client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(BROWSER_AGENT)
        .build()
}

/// Get the body of a page as text.  Fails on any status other than 200.
pub fn get_text(
    client: &Client,
    url: &str,
    accept_header: Option<&str>,
) -> Result<String, Box<dyn Error>> {
    let mut builder = client
        .get(url)
        .header(USER_AGENT, BROWSER_AGENT)
        .header(UPGRADE_INSECURE_REQUESTS, "1");
    if let Some(accept_header) = accept_header {
        builder = builder.header(ACCEPT, accept_header);
    }
    let response = builder.send()?;
    if response.status() != StatusCode::OK {
        return Err(format!("Download failed! {} returned {}", url, response.status()).into());
    }
    Ok(response.text()?)
}

/// Get the body of a binary resource, e.g. a PDF.
pub fn get_bytes(client: &Client, url: &str) -> Result<Vec<u8>, Box<dyn Error>> {
    let response = client
        .get(url)
        .header(USER_AGENT, BROWSER_AGENT)
        .send()?;
    if !response.status().is_success() {
        return Err(format!("Download failed! {} returned {}", url, response.status()).into());
    }
    Ok(response.bytes()?.to_vec())
}

/// Check if a resource exists with a HEAD request.  Transport errors count
/// as a miss.
pub fn exists(client: &Client, url: &str) -> bool {
    match client.head(url).header(USER_AGENT, BROWSER_AGENT).send() {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            log::warn!("HEAD {} failed: {}", url, e);
            false
        }
    }
}
