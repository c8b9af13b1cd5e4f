//! Minimal local stand-in for the datasets-server `/rows` endpoint.

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A running local rows server.
pub struct RowsServer {
    /// Base URL to use as the client endpoint.
    pub endpoint: String,
    /// `(offset, length)` of every request served, in order.
    pub requests: Arc<Mutex<Vec<(usize, usize)>>>,
}

/// Serve `rows` under the given schema, advertising `total` rows.
///
/// A `total` larger than `rows.len()` makes the server run dry early.
pub async fn serve_rows(columns: &[&str], rows: Vec<Value>, total: usize) -> RowsServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    let requests = Arc::new(Mutex::new(Vec::new()));

    let features: Vec<Value> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| json!({"feature_idx": i, "name": name, "type": {"_type": "Value"}}))
        .collect();
    let log = Arc::clone(&requests);

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };

            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => buf.extend_from_slice(&chunk[..n]),
                }
            }
            let request = String::from_utf8_lossy(&buf);
            let request_line = request.lines().next().unwrap_or_default();
            let offset = query_param(request_line, "offset").unwrap_or(0);
            let length = query_param(request_line, "length").unwrap_or(100);
            log.lock().unwrap().push((offset, length));

            let page: Vec<Value> = rows
                .iter()
                .enumerate()
                .skip(offset)
                .take(length)
                .map(|(i, row)| json!({"row_idx": i, "row": row, "truncated_cells": []}))
                .collect();
            let body = json!({
                "features": features,
                "rows": page,
                "num_rows_total": total,
                "num_rows_per_page": length,
                "partial": false,
            })
            .to_string();

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    RowsServer { endpoint, requests }
}

fn query_param(request_line: &str, name: &str) -> Option<usize> {
    let query = request_line.split_whitespace().nth(1)?.split('?').nth(1)?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| value.parse().ok())
}
