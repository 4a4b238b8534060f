//! GoAnywhere MFT portal protocol (spec.md §4.2): a three-step dance —
//! fetch the portal page to pick up a session cookie, ViewState, and a row
//! key; stage the file with an ajax "select row" POST; then POST a second
//! form to receive the file stream. `reqwest::Client`'s cookie jar carries
//! the session across all three requests.

use std::time::Duration;

use regex::Regex;
use reqwest::Client;

use welldex_common::{Result, WelldexError};

use crate::viewstate::extract_viewstate;

/// Build a client with cookie storage enabled — required for the MFT
/// portal's session-based staging flow.
pub fn mft_client() -> reqwest::Result<Client> {
    Client::builder().cookie_store(true).build()
}

/// Download `file_name` from a GoAnywhere MFT portal folder.
pub async fn fetch_file(
    client: &Client,
    portal_url: &str,
    folder_path: &str,
    file_name: &str,
) -> Result<Vec<u8>> {
    // Step 1: load the portal page, extract ViewState + row key for the target file.
    let portal_resp = client
        .get(portal_url)
        .timeout(Duration::from_secs(30))
        .send()
        .await
        .map_err(|e| WelldexError::Network(e.to_string()))?;
    let portal_html = portal_resp
        .text()
        .await
        .map_err(|e| WelldexError::Network(e.to_string()))?;

    let fields = extract_viewstate(&portal_html);
    let row_key = extract_row_key(&portal_html, file_name)
        .ok_or_else(|| WelldexError::Parse(format!("row key for {file_name} not found on portal page")))?;

    // Step 2: ajax "select row" to stage the file server-side.
    let select_resp = client
        .post(portal_url)
        .form(&[
            ("__VIEWSTATE", fields.viewstate.as_str()),
            ("__VIEWSTATEGENERATOR", fields.viewstate_generator.as_str()),
            ("ajaxAction", "selectRow"),
            ("rowKey", row_key.as_str()),
            ("folder", folder_path),
        ])
        .timeout(Duration::from_secs(30))
        .send()
        .await
        .map_err(|e| WelldexError::Network(e.to_string()))?;
    if !select_resp.status().is_success() {
        return Err(WelldexError::Network(format!(
            "row selection failed with status {}",
            select_resp.status()
        )));
    }

    // Step 3: second form POST receives the actual file stream.
    let download_resp = client
        .post(portal_url)
        .form(&[
            ("__VIEWSTATE", fields.viewstate.as_str()),
            ("ajaxAction", "download"),
            ("rowKey", row_key.as_str()),
        ])
        .timeout(Duration::from_secs(30 * 60))
        .send()
        .await
        .map_err(|e| WelldexError::Network(e.to_string()))?;
    if !download_resp.status().is_success() {
        return Err(WelldexError::Network(format!(
            "file download failed with status {}",
            download_resp.status()
        )));
    }

    download_resp
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| WelldexError::Network(e.to_string()))
}

/// The portal's file listing embeds a data-row-key attribute next to each
/// file's display name; extract the one matching `file_name`.
fn extract_row_key(html: &str, file_name: &str) -> Option<String> {
    let pattern = format!(
        r#"data-row-key="([^"]+)"[^>]*>\s*{}"#,
        regex::escape(file_name)
    );
    Regex::new(&pattern).ok()?.captures(html)?.get(1).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_row_key_for_named_file() {
        let html = r#"<tr data-row-key="ROW-42"><td>P5_WELLBORE.TXT</td></tr>
                        <tr data-row-key="ROW-7"><td>OTHER.TXT</td></tr>"#;
        assert_eq!(extract_row_key(html, "P5_WELLBORE.TXT"), Some("ROW-42".to_string()));
    }

    #[test]
    fn missing_file_returns_none() {
        let html = r#"<tr data-row-key="ROW-1"><td>SOMETHING.TXT</td></tr>"#;
        assert_eq!(extract_row_key(html, "NOT_THERE.TXT"), None);
    }
}
