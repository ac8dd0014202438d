//! Webhook notifier (chat-robot style text messages)

use crate::core::config::NotifyConfig;
use crate::core::error::{RailError, RailResult};
use crate::tools::Notifier;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, info};

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WebhookNotifier {
  url: Option<String>,
  token: String,
  client: Client,
}

impl WebhookNotifier {
  pub fn new(config: &NotifyConfig, token: &str) -> RailResult<Self> {
    let client = Client::builder()
      .timeout(NOTIFY_TIMEOUT)
      .build()
      .map_err(|e| {
        RailError::with_help(
          format!("Failed to build HTTP client: {}", e),
          "Notifications need a working TLS backend; check the system certificate store.",
        )
      })?;
    Ok(Self {
      url: config.url.clone(),
      token: token.to_string(),
      client,
    })
  }
}

fn payload(message: &str) -> serde_json::Value {
  serde_json::json!({
    "msgtype": "text",
    "text": { "content": message },
  })
}

impl Notifier for WebhookNotifier {
  fn notify(&self, message: &str) -> RailResult<()> {
    let Some(url) = &self.url else {
      debug!("no notify url configured, dropping: {}", message);
      return Ok(());
    };

    self
      .client
      .post(url)
      .query(&[("access_token", self.token.as_str())])
      .json(&payload(message))
      .send()
      .and_then(|resp| resp.error_for_status())
      .map_err(|e| RailError::message(format!("Notification to {} failed: {}", url, e)))?;

    info!("notification sent");
    Ok(())
  }
}
