//! Hugging Face datasets-server client.
//!
//! Pages through the `/rows` endpoint and assembles the rows into a
//! [`Table`] that follows the dataset's feature order.

use super::DatasetSource;
use crate::error::LoadError;
use crate::models::Table;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Hard upper bound the server accepts for `length`.
pub const MAX_PAGE_SIZE: usize = 100;

/// One page of the `/rows` response.
#[derive(Debug, Deserialize)]
pub struct RowsPage {
    pub features: Vec<Feature>,
    pub rows: Vec<RowEntry>,
    pub num_rows_total: usize,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RowEntry {
    pub row: Map<String, Value>,
}

/// Client for the datasets-server rows API.
pub struct HubClient {
    http_client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    page_size: usize,
}

impl HubClient {
    /// Create a client for the given endpoint.
    pub fn new(
        endpoint: &str,
        timeout_seconds: u64,
        token: Option<String>,
        page_size: usize,
    ) -> Result<Self, LoadError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("profilegen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LoadError::Retrieval {
                url: endpoint.to_string(),
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        })
    }

    fn rows_url(&self) -> String {
        format!("{}/rows", self.endpoint)
    }

    /// Fetch a single page of rows starting at `offset`.
    pub async fn fetch_page(&self, source: &DatasetSource, offset: usize) -> Result<RowsPage, LoadError> {
        let url = self.rows_url();
        debug!("GET {} offset={} length={}", url, offset, self.page_size);

        let offset = offset.to_string();
        let length = self.page_size.to_string();
        let mut request = self.http_client.get(&url).query(&[
            ("dataset", source.id.as_str()),
            ("config", source.config.as_str()),
            ("split", source.split.as_str()),
            ("offset", offset.as_str()),
            ("length", length.as_str()),
        ]);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| LoadError::Retrieval {
            url: url.clone(),
            message: if e.is_timeout() {
                "request timed out".to_string()
            } else if e.is_connect() {
                format!("cannot connect: {}", e)
            } else {
                e.to_string()
            },
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LoadError::Status { url, status, body });
        }

        response.json().await.map_err(|e| LoadError::Decode {
            url,
            message: e.to_string(),
        })
    }

    /// Fetch every row of the dataset split.
    pub async fn fetch_table(&self, source: &DatasetSource, show_progress: bool) -> Result<Table, LoadError> {
        info!("Fetching {} from {}", source, self.endpoint);

        let first = self.fetch_page(source, 0).await?;
        let total = first.num_rows_total;
        let mut table = Table::new(first.features.iter().map(|f| f.name.clone()).collect());
        debug!("Schema: {:?}, {} rows total", table.columns, total);

        let progress_bar = if show_progress {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut page = first;
        loop {
            let fetched = append_page(&mut table, &page);
            if let Some(ref pb) = progress_bar {
                pb.set_position(table.len() as u64);
            }
            if fetched == 0 || table.len() >= total {
                break;
            }
            page = self.fetch_page(source, table.len()).await?;
        }

        if table.len() < total {
            if let Some(pb) = progress_bar {
                pb.abandon_with_message("Download incomplete");
            }
            return Err(LoadError::Incomplete {
                url: self.rows_url(),
                fetched: table.len(),
                total,
            });
        }

        if let Some(pb) = progress_bar {
            pb.finish_with_message("Download complete");
        }

        info!("Fetched {} rows", table.len());
        Ok(table)
    }
}

/// Append a page's rows to the table. Returns the number of rows added.
pub fn append_page(table: &mut Table, page: &RowsPage) -> usize {
    for entry in &page.rows {
        table.push_object(&entry.row);
    }
    page.rows.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::test_server::serve_rows;
    use serde_json::json;

    const SAMPLE_PAGE: &str = r#"{
        "features": [
            {"feature_idx": 0, "name": "persona", "type": {"dtype": "string", "_type": "Value"}},
            {"feature_idx": 1, "name": "url", "type": {"dtype": "string", "_type": "Value"}},
            {"feature_idx": 2, "name": "visit_count", "type": {"dtype": "int64", "_type": "Value"}}
        ],
        "rows": [
            {"row_idx": 0, "row": {"persona": "Student", "url": "http://x.com", "visit_count": 2}, "truncated_cells": []},
            {"row_idx": 1, "row": {"persona": "Chef", "url": null, "visit_count": 1}, "truncated_cells": []}
        ],
        "num_rows_total": 2,
        "num_rows_per_page": 100,
        "partial": false
    }"#;

    #[test]
    fn test_parse_rows_page() {
        let page: RowsPage = serde_json::from_str(SAMPLE_PAGE).unwrap();
        assert_eq!(page.num_rows_total, 2);
        assert_eq!(page.features.len(), 3);

        let mut table = Table::new(page.features.iter().map(|f| f.name.clone()).collect());
        assert_eq!(append_page(&mut table, &page), 2);

        assert_eq!(table.columns, vec!["persona", "url", "visit_count"]);
        assert_eq!(table.rows[0][2], serde_json::json!(2));
        assert_eq!(table.rows[1][1], Value::Null);
    }

    #[test]
    fn test_page_size_is_clamped() {
        let client = HubClient::new("https://example.com/", 5, None, 1000).unwrap();
        assert_eq!(client.page_size, MAX_PAGE_SIZE);
        assert_eq!(client.rows_url(), "https://example.com/rows");

        let client = HubClient::new("https://example.com", 5, None, 0).unwrap();
        assert_eq!(client.page_size, 1);
    }

    #[tokio::test]
    async fn test_fetch_table_pages_through_rows() {
        let rows = vec![
            json!({"persona": "Student", "url": "http://a.com", "title": "A"}),
            json!({"persona": "Chef", "url": "http://b.com", "title": "B"}),
            json!({"persona": "Nurse", "url": "http://c.com", "title": "C"}),
        ];
        let server = serve_rows(&["url", "persona", "title"], rows, 3).await;
        let client = HubClient::new(&server.endpoint, 5, None, 2).unwrap();

        let table = client
            .fetch_table(&DatasetSource::default(), false)
            .await
            .unwrap();

        assert_eq!(table.columns, vec!["url", "persona", "title"]);
        let personas: Vec<&Value> = table.rows.iter().map(|r| &r[1]).collect();
        assert_eq!(personas, vec!["Student", "Chef", "Nurse"]);
        assert_eq!(*server.requests.lock().unwrap(), vec![(0, 2), (2, 2)]);
    }

    #[tokio::test]
    async fn test_fetch_table_rejects_short_dataset() {
        let rows = vec![json!({"persona": "Student", "url": "http://a.com"})];
        let server = serve_rows(&["persona", "url"], rows, 3).await;
        let client = HubClient::new(&server.endpoint, 5, None, 100).unwrap();

        match client.fetch_table(&DatasetSource::default(), false).await {
            Err(LoadError::Incomplete { fetched, total, .. }) => {
                assert_eq!(fetched, 1);
                assert_eq!(total, 3);
            }
            other => panic!("expected incomplete download, got {other:?}"),
        }
        assert_eq!(*server.requests.lock().unwrap(), vec![(0, 100), (1, 100)]);
    }
}
