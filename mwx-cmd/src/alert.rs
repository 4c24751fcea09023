use log::{error, info, warn};
use reqwest::Client;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Notification<'a> {
    subject: &'a str,
    message: &'a str,
}

/// Failure notifications posted to an optional webhook.
///
/// Notifying never fails the caller: a missing webhook or a failed post is
/// only logged.
#[derive(Debug, Clone)]
pub struct Alerter {
    client: Client,
    webhook: Option<String>,
}

impl Alerter {
    pub fn new(client: Client, webhook: Option<String>) -> Self {
        Alerter { client, webhook }
    }

    pub async fn notify(&self, subject: &str, message: &str) {
        let Some(url) = &self.webhook else {
            warn!("no alert webhook set, skipping notification: {subject}");
            return;
        };
        let sent = self
            .client
            .post(url)
            .json(&Notification { subject, message })
            .send()
            .await
            .and_then(|r| r.error_for_status());
        match sent {
            Ok(_) => info!("sent alert: {subject}"),
            Err(e) => error!("failed to send alert: {e}"),
        }
    }
}
