use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, error};

use crate::{application::services::webhook::WebhookClient, domain::models::DeliveryFailure};

/// Posts messages to Discord execute-webhook URLs.
pub struct DiscordWebhookClient {
    http: Client,
}

impl DiscordWebhookClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("notifi-worker/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("failed to build discord webhook client")?;
        Ok(Self { http })
    }
}

#[async_trait]
impl WebhookClient for DiscordWebhookClient {
    async fn deliver(&self, address: &str, title: &str, body: &str) -> Result<(), DeliveryFailure> {
        let payload = ExecuteWebhook {
            content: None,
            embeds: vec![Embed {
                title,
                description: body,
                color: None,
            }],
        };

        let response = self
            .http
            .post(address)
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                error!(error = %err, "error sending request to discord");
                DeliveryFailure::Transport(err.to_string())
            })?;

        let status = response.status();
        match status {
            StatusCode::OK | StatusCode::NO_CONTENT => {
                debug!(status_code = status.as_u16(), "discord accepted webhook");
                Ok(())
            }
            StatusCode::BAD_REQUEST => Err(DeliveryFailure::MessageDataRejected),
            _ => {
                let body = response.text().await.unwrap_or_default();
                error!(
                    status_code = status.as_u16(),
                    response = %body,
                    "message could not be delivered"
                );
                Err(DeliveryFailure::Undelivered {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

#[derive(Serialize)]
struct ExecuteWebhook<'a> {
    content: Option<&'a str>,
    embeds: Vec<Embed<'a>>,
}

#[derive(Serialize)]
struct Embed<'a> {
    title: &'a str,
    description: &'a str,
    color: Option<u32>,
}
