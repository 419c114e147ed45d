use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use reqwest::Client;
use serde_json::Value;

use super::{ScanInventory, Summarizer};
use crate::models::*;
use crate::tenant::TenantId;

// Upper bound on followed `links.next` pages for one inventory call
const MAX_SCAN_PAGES: usize = 20;

/// Client for the platform API: scan inventory and scan summaries.
#[derive(Clone)]
pub struct ScansApiClient {
    client: Client,
    base_url: String,
}

impl ScansApiClient {
    pub fn new(base_url: String, timeout_ms: u64, user_agent: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, url: &str, tenant: &TenantId, query: &[(&str, String)]) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .header("X-Tenant-Id", tenant.as_str())
            .header("Accept", "application/vnd.api+json")
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LighthouseError::ExternalService(format!(
                "Scan inventory error: status={} body={}",
                status, text
            )));
        }

        Ok(response.json().await?)
    }
}

fn scan_ids_from_page(page: &Value) -> Vec<String> {
    page.get("data")
        .and_then(|d| d.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(|id| id.as_str()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn next_link(page: &Value) -> Option<String> {
    page.get("links")
        .and_then(|l| l.get("next"))
        .and_then(|n| n.as_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl ScanInventory for ScansApiClient {
    async fn completed_scans_last_24h(&self, tenant: &TenantId) -> Result<Vec<String>> {
        let since = (Utc::now() - ChronoDuration::hours(24)).to_rfc3339_opts(SecondsFormat::Secs, true);
        let query = vec![
            ("filter[state]", "completed".to_string()),
            ("filter[completed_at__gte]", since),
            ("fields[scans]", "id".to_string()),
            ("page[size]", "100".to_string()),
        ];

        let mut url = format!("{}/scans", self.base_url);
        let mut page = self.get_json(&url, tenant, &query).await?;
        let mut ids = scan_ids_from_page(&page);
        let mut pages = 1;

        // `next` already carries the query string
        while let Some(next) = next_link(&page) {
            if pages >= MAX_SCAN_PAGES {
                tracing::warn!(tenant = %tenant, pages, "Scan inventory truncated at page limit");
                break;
            }
            url = next;
            page = self.get_json(&url, tenant, &[]).await?;
            ids.extend(scan_ids_from_page(&page));
            pages += 1;
        }

        tracing::debug!(tenant = %tenant, scan_count = ids.len(), "Fetched completed scans");
        Ok(ids)
    }
}

#[async_trait]
impl Summarizer for ScansApiClient {
    async fn summarize(&self, tenant: &TenantId, scan_ids: &[String]) -> Result<Option<String>> {
        if scan_ids.is_empty() {
            return Ok(None);
        }

        let url = format!("{}/lighthouse/summaries", self.base_url);
        let body = serde_json::json!({ "scan_ids": scan_ids });
        let response = self
            .client
            .post(&url)
            .header("X-Tenant-Id", tenant.as_str())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LighthouseError::ExternalService(format!(
                "Summary error: status={} body={}",
                status, text
            )));
        }

        let result: Value = response.json().await?;
        let summary = result
            .get("summary")
            .and_then(|s| s.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_ids_and_next_link() {
        let page = json!({
            "data": [{"id": "s1", "type": "scans"}, {"id": "s2", "type": "scans"}, {"type": "scans"}],
            "links": {"next": "http://api/scans?page[number]=2"}
        });
        assert_eq!(scan_ids_from_page(&page), vec!["s1".to_string(), "s2".to_string()]);
        assert_eq!(next_link(&page).as_deref(), Some("http://api/scans?page[number]=2"));

        let last = json!({"data": [], "links": {"next": null}});
        assert!(scan_ids_from_page(&last).is_empty());
        assert!(next_link(&last).is_none());
    }
}
