//! Shared HTTP plumbing: retry/backoff, ArcGIS FeatureServer pagination,
//! authenticated JSON API pagination, and the downloaded-file integrity
//! check (spec.md §4.2, §7).

use std::time::Duration;

use rand::Rng;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use welldex_common::{Result, WelldexError};

/// HTTP 429 gets a long cooldown before the next attempt, per spec.md §7.
const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(60);

/// GET `url`, retrying transient failures up to `attempts` times with
/// linear backoff (`base_delay * attempt`). A 429 sleeps
/// [`RATE_LIMIT_COOLDOWN`] before the next attempt rather than counting
/// against the linear schedule. Exhausting all attempts surfaces
/// [`WelldexError::RetriesExhausted`] — the caller (a source adapter) turns
/// that into a source-level failure without aborting the rest of the run.
pub async fn get_with_retry(
    client: &Client,
    url: &str,
    attempts: u32,
    base_delay: Duration,
    timeout: Duration,
) -> Result<reqwest::Response> {
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        let result = client.get(url).timeout(timeout).send().await;

        match result {
            Ok(resp) if resp.status() == StatusCode::TOO_MANY_REQUESTS => {
                warn!(url, attempt, "rate limited, sleeping 60s before retry");
                tokio::time::sleep(RATE_LIMIT_COOLDOWN).await;
                last_error = "429 Too Many Requests".to_string();
                continue;
            }
            Ok(resp) if resp.status().is_server_error() => {
                last_error = format!("{} {}", resp.status(), url);
                warn!(url, attempt, status = %resp.status(), "transient server error, retrying");
            }
            Ok(resp) if resp.status().is_success() => return Ok(resp),
            Ok(resp) => {
                // Non-retryable client error (4xx other than 429).
                return Err(WelldexError::Network(format!(
                    "{} returned {}",
                    url,
                    resp.status()
                )));
            }
            Err(e) => {
                last_error = e.to_string();
                warn!(url, attempt, error = %last_error, "request failed, retrying");
            }
        }

        if attempt < attempts {
            let backoff = base_delay * attempt;
            let jitter = Duration::from_millis(rand::rng().random_range(0..1000));
            tokio::time::sleep(backoff + jitter).await;
        }
    }

    Err(WelldexError::RetriesExhausted {
        url: url.to_string(),
        attempts,
        message: last_error,
    })
}

/// Page through an ArcGIS FeatureServer query endpoint using
/// `resultOffset`/`resultRecordCount`/`orderByFields`, stopping exactly when
/// a response returns fewer features than `page_size` AND
/// `exceededTransferLimit` is false/absent (spec.md §4.2, scenario 5). A
/// short page with `exceededTransferLimit: true` continues. Failures within
/// a page retry that same offset rather than advancing.
pub async fn fetch_arcgis_pages(
    client: &Client,
    query_url: &str,
    where_clause: &str,
    out_fields: &str,
    order_by: &str,
    page_size: u32,
    attempts: u32,
    base_delay: Duration,
) -> Result<Vec<Value>> {
    let mut all_features = Vec::new();
    let mut offset = 0u32;

    loop {
        let url = format!(
            "{query_url}?where={}&outFields={}&f=json&resultOffset={offset}&resultRecordCount={page_size}&orderByFields={}",
            urlencode(where_clause),
            urlencode(out_fields),
            urlencode(order_by),
        );

        let resp = get_with_retry(client, &url, attempts, base_delay, Duration::from_secs(60)).await?;
        let body: Value = resp
            .json()
            .await
            .map_err(|e| WelldexError::Parse(format!("invalid ArcGIS JSON at offset {offset}: {e}")))?;

        let features = body
            .get("features")
            .and_then(|f| f.as_array())
            .cloned()
            .unwrap_or_default();
        let exceeded = body
            .get("exceededTransferLimit")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let page_len = features.len() as u32;
        debug!(offset, page_len, exceeded, "fetched ArcGIS page");
        all_features.extend(features);

        if page_len < page_size && !exceeded {
            break;
        }
        offset += page_size;
    }

    Ok(all_features)
}

fn urlencode(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ' ' => "%20".to_string(),
            '=' => "%3D".to_string(),
            '\'' => "%27".to_string(),
            c if c.is_ascii_alphanumeric() || "-_.~,".contains(c) => c.to_string(),
            c => format!("%{:02X}", c as u32),
        })
        .collect()
}

/// Authenticate against a JWT-protected JSON API (`POST /auth/login` with
/// email+password) and return the bearer token.
pub async fn authenticate_jwt(
    client: &Client,
    login_url: &str,
    email: &str,
    password: &str,
) -> Result<String> {
    #[derive(serde::Serialize)]
    struct LoginRequest<'a> {
        email: &'a str,
        password: &'a str,
    }
    #[derive(serde::Deserialize)]
    struct LoginResponse {
        token: String,
    }

    let resp = client
        .post(login_url)
        .json(&LoginRequest { email, password })
        .timeout(Duration::from_secs(30))
        .send()
        .await
        .map_err(|e| WelldexError::Network(e.to_string()))?;

    if resp.status() == StatusCode::UNAUTHORIZED {
        return Err(WelldexError::Auth(format!("login rejected for {email}")));
    }
    if !resp.status().is_success() {
        return Err(WelldexError::Auth(format!(
            "login failed with status {}",
            resp.status()
        )));
    }

    let parsed: LoginResponse = resp
        .json()
        .await
        .map_err(|e| WelldexError::Parse(format!("invalid login response: {e}")))?;
    Ok(parsed.token)
}

/// Page through an `offset`/`limit` JSON API with bearer auth, re-authenticating
/// once on a 401 and paging until a short page is returned.
pub async fn fetch_json_pages_with_auth(
    client: &Client,
    list_url: &str,
    login_url: &str,
    email: &str,
    password: &str,
    page_size: u32,
) -> Result<Vec<Value>> {
    let mut token = authenticate_jwt(client, login_url, email, password).await?;
    let mut all_items = Vec::new();
    let mut offset = 0u32;
    let mut reauthenticated = false;

    loop {
        let url = format!("{list_url}?offset={offset}&limit={page_size}");
        let resp = client
            .get(&url)
            .bearer_auth(&token)
            .timeout(Duration::from_secs(60))
            .send()
            .await
            .map_err(|e| WelldexError::Network(e.to_string()))?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            if reauthenticated {
                return Err(WelldexError::Auth("re-authentication also rejected".to_string()));
            }
            warn!(url = list_url, "401 from JSON API, re-authenticating once");
            token = authenticate_jwt(client, login_url, email, password).await?;
            reauthenticated = true;
            continue;
        }

        if !resp.status().is_success() {
            return Err(WelldexError::Network(format!(
                "{} returned {}",
                url,
                resp.status()
            )));
        }

        let items: Vec<Value> = resp
            .json()
            .await
            .map_err(|e| WelldexError::Parse(format!("invalid page JSON at offset {offset}: {e}")))?;
        let page_len = items.len() as u32;
        all_items.extend(items);

        if page_len < page_size {
            break;
        }
        offset += page_size;
    }

    Ok(all_items)
}

/// Guard against HTML error pages masquerading as data (spec.md §4.2).
/// A "download" under 1 KB that begins with `<html` or `<!DOCTYPE` is
/// treated as a failed fetch, not a tiny valid payload.
pub fn looks_like_html_error(bytes: &[u8]) -> bool {
    if bytes.len() >= 1024 {
        return false;
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(64)]).to_lowercase();
    let trimmed = head.trim_start();
    trimmed.starts_with("<html") || trimmed.starts_with("<!doctype")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_html_is_flagged() {
        assert!(looks_like_html_error(b"<html><body>404</body></html>"));
        assert!(looks_like_html_error(b"<!DOCTYPE html><html></html>"));
    }

    #[test]
    fn small_non_html_is_not_flagged() {
        assert!(!looks_like_html_error(b"api_no|well_name\n001|Test Well\n"));
    }

    #[test]
    fn large_html_is_not_flagged() {
        let big = format!("<html>{}</html>", "x".repeat(2000));
        assert!(!looks_like_html_error(big.as_bytes()));
    }
}
