use anyhow::Context;
use log::{debug, info};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

/// Build the shared client every fetcher in a run goes through.
pub fn build_client(user_agent: &str, timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .context("building http client")
}

/// Send one GET and return the body, treating any non-2xx status as an error.
pub async fn send_for_text(request: RequestBuilder) -> anyhow::Result<String> {
    let response = request.send().await.context("sending request")?;
    let url = response.url().clone();
    let status = response.status();
    info!("GET {url} -> {status}");
    let response = response
        .error_for_status()
        .with_context(|| format!("unexpected status from {url}"))?;
    let body = response
        .text()
        .await
        .with_context(|| format!("reading body from {url}"))?;
    debug!("{} bytes from {url}", body.len());
    Ok(body)
}
