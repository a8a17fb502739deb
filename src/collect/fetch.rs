//! Fetch functions - retrieve the raw export from the registry API

use crate::collect::types::RawExport;
use anyhow::Result;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

const TIMEOUT_SECS: u64 = 30;

/// Download the statistics export via HTTP GET
///
/// Fails on transport errors and on any non-success status. No retries:
/// the next scheduled run is the retry.
pub async fn fetch_export(url: &str) -> Result<RawExport> {
    info!("Downloading statistics from {}", url);
    let client = Client::builder()
        .timeout(Duration::from_secs(TIMEOUT_SECS))
        .build()?;

    let response = client.get(url).send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(anyhow::anyhow!("HTTP request failed: {}", status));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = response.bytes().await?;
    debug!("Content-Type: {:?}", content_type);
    info!("Downloaded {} bytes", body.len());

    Ok(RawExport { body, content_type })
}

/// Serve a single canned HTTP response on a loopback port, for tests
#[cfg(test)]
pub(crate) async fn serve_once(
    status_line: &'static str,
    extra_headers: &'static str,
    body: Vec<u8>,
) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;

        let head = format!(
            "{}\r\ncontent-length: {}\r\n{}\r\n",
            status_line,
            body.len(),
            extra_headers
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&body).await.unwrap();
        socket.shutdown().await.ok();
    });

    format!("http://{}", addr)
}
