//! Outbound HTTP client shared by every relayed request

use std::time::Duration;

use anyhow::{Context, Result};
use flyt_shared::Error;
use reqwest::{Client, Request, Response};
use tokio::time::timeout;

/// Build the process-wide client. `reqwest::Client` is an `Arc` internally,
/// so clones share one connection pool across tasks.
///
/// Targets are dialled directly; `HTTP_PROXY`-style variables are ignored.
pub fn build_client(connect_timeout: Duration) -> Result<Client> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .no_proxy()
        .build()
        .context("Failed to build upstream HTTP client")
}

/// Execute `request`, waiting at most `limit` for the response headers.
/// The body is not covered by the limit; it streams at the caller's pace.
pub async fn send(client: &Client, request: Request, limit: Duration) -> flyt_shared::Result<Response> {
    match timeout(limit, client.execute(request)).await {
        Ok(Ok(resp)) => Ok(resp),
        Ok(Err(e)) => Err(Error::Upstream(format!("{:#}", anyhow::Error::from(e)))),
        Err(_) => Err(Error::Upstream(format!(
            "no response from forward_url within {}s",
            limit.as_secs()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_refused_connection_is_upstream_error() {
        let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
        let client = build_client(Duration::from_secs(2)).unwrap();
        let request = client.get(format!("http://{}/", addr)).build().unwrap();

        let err = send(&client, request, Duration::from_secs(5)).await.unwrap_err();

        assert_eq!(err.status(), 502);
        assert!(err.to_string().contains("error sending request"));
    }
}
