//! Webhook notification delivery
//!
//! Supported channels: DingTalk (markdown message), Feishu (interactive card)
//! and WeChat Work (markdown message). Every configured channel is tried;
//! the outcome of each is reported but never fails the run. With no channel
//! configured the content is printed to stdout instead.

use crate::config::NotifyConfig;
use crate::output::markdown::data_url;
use reqwest::Client;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

/// A notification destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    DingTalk,
    Feishu,
    WeChatWork,
}

impl Channel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DingTalk => "DingTalk",
            Self::Feishu => "Feishu",
            Self::WeChatWork => "WeChat Work",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Webhook addresses; `None` disables a channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Webhooks {
    pub dingtalk: Option<String>,
    pub feishu: Option<String>,
    pub wechat_work: Option<String>,
}

impl Webhooks {
    /// Reads the webhook addresses from the environment variables named in `[notify]`
    pub fn from_env(config: &NotifyConfig) -> Self {
        Self {
            dingtalk: env_value(&config.dingtalk_webhook_env),
            feishu: env_value(&config.feishu_webhook_env),
            wechat_work: env_value(&config.wechat_work_webhook_env),
        }
    }

    /// Configured channels with their addresses, in delivery order
    pub fn configured(&self) -> Vec<(Channel, &str)> {
        [
            (Channel::DingTalk, &self.dingtalk),
            (Channel::Feishu, &self.feishu),
            (Channel::WeChatWork, &self.wechat_work),
        ]
        .into_iter()
        .filter_map(|(channel, url)| url.as_deref().map(|u| (channel, u)))
        .collect()
    }
}

/// Per-channel delivery outcome
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub results: Vec<(Channel, bool)>,
}

impl NotifyReport {
    /// True if at least one channel accepted the message
    pub fn any_success(&self) -> bool {
        self.results.iter().any(|(_, ok)| *ok)
    }
}

/// Sends the summary to every configured webhook
pub struct NotificationSender {
    client: Client,
    webhooks: Webhooks,
    repository: Option<String>,
    data_file: String,
}

impl NotificationSender {
    /// Creates a sender
    ///
    /// # Arguments
    ///
    /// * `webhooks` - Channel addresses
    /// * `repository` - `owner/name` used for the Feishu "full data" button
    /// * `data_file` - File the button links to
    pub fn new(webhooks: Webhooks, repository: Option<String>, data_file: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            webhooks,
            repository: repository.filter(|r| !r.trim().is_empty()),
            data_file: data_file.into(),
        }
    }

    /// Creates a sender from the `[notify]` section and the environment
    pub fn from_env(config: &NotifyConfig, data_file: impl Into<String>) -> Self {
        Self::new(
            Webhooks::from_env(config),
            env_value(&config.repository_env),
            data_file,
        )
    }

    pub fn has_channels(&self) -> bool {
        !self.webhooks.configured().is_empty()
    }

    /// Delivers the content to every configured channel
    ///
    /// # Arguments
    ///
    /// * `title` - Message title, used by channels that show one
    /// * `content` - Markdown body
    pub async fn send(&self, title: &str, content: &str) -> NotifyReport {
        let mut report = NotifyReport::default();

        let channels = self.webhooks.configured();
        if channels.is_empty() {
            tracing::warn!("No notification channel configured; printing content");
            println!("\n=== Notification ===\n");
            println!("{}", content);
            println!("\n====================\n");
            return report;
        }

        for (channel, url) in channels {
            let payload = match channel {
                Channel::DingTalk => dingtalk_payload(title, content),
                Channel::Feishu => {
                    let button = self
                        .repository
                        .as_deref()
                        .map(|repo| data_url(repo, &self.data_file));
                    feishu_payload(title, content, button.as_deref())
                }
                Channel::WeChatWork => wechat_work_payload(content),
            };

            let ok = self.post(channel, url, &payload).await;
            report.results.push((channel, ok));
        }

        report
    }

    async fn post(&self, channel: Channel, url: &str, payload: &Value) -> bool {
        match self.client.post(url).json(payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Notification sent to {}", channel);
                true
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                tracing::warn!("{} rejected notification: HTTP {} {}", channel, status, body);
                false
            }
            Err(e) => {
                tracing::warn!("Failed to send notification to {}: {}", channel, e);
                false
            }
        }
    }
}

/// DingTalk robot markdown message
pub fn dingtalk_payload(title: &str, content: &str) -> Value {
    json!({
        "msgtype": "markdown",
        "markdown": {
            "title": title,
            "text": content,
        }
    })
}

/// Feishu interactive card, with an optional link button
pub fn feishu_payload(title: &str, content: &str, button_url: Option<&str>) -> Value {
    let mut elements = vec![json!({
        "tag": "div",
        "text": {
            "tag": "lark_md",
            "content": content,
        }
    })];

    if let Some(url) = button_url {
        elements.push(json!({
            "tag": "action",
            "actions": [{
                "tag": "button",
                "text": {
                    "tag": "plain_text",
                    "content": "View full data",
                },
                "url": url,
                "type": "default",
            }]
        }));
    }

    json!({
        "msg_type": "interactive",
        "card": {
            "header": {
                "title": {
                    "tag": "plain_text",
                    "content": title,
                },
                "template": "blue",
            },
            "elements": elements,
        }
    })
}

/// WeChat Work robot markdown message
pub fn wechat_work_payload(content: &str) -> Value {
    json!({
        "msgtype": "markdown",
        "markdown": {
            "content": content,
        }
    })
}

fn env_value(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
