// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Twilio WhatsApp messaging over the REST Messages API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use super::{Messenger, MessagingError};
use crate::custody::{normalize_identifier, redact};

const DEFAULT_API_BASE_URL: &str = "https://api.twilio.com";
const WHATSAPP_PREFIX: &str = "whatsapp:";

/// Twilio credentials and sender number.
#[derive(Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number, without the `whatsapp:` prefix.
    pub whatsapp_number: String,
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("whatsapp_number", &self.whatsapp_number)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

#[derive(Debug, Clone)]
pub struct TwilioMessenger {
    config: TwilioConfig,
    api_base_url: String,
    http: Client,
}

impl TwilioMessenger {
    pub fn new(config: TwilioConfig) -> Result<Self, MessagingError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| MessagingError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            http,
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base_url.trim_end_matches('/'),
            self.config.account_sid
        )
    }
}

/// `whatsapp:`-prefixed channel address for a phone number.
pub fn whatsapp_address(number: &str) -> Option<String> {
    normalize_identifier(number).map(|n| format!("{WHATSAPP_PREFIX}{n}"))
}

#[async_trait]
impl Messenger for TwilioMessenger {
    async fn send_message(&self, destination: &str, body: &str) -> Result<String, MessagingError> {
        let to = whatsapp_address(destination)
            .ok_or_else(|| MessagingError::InvalidDestination(redact(destination)))?;
        let from = whatsapp_address(&self.config.whatsapp_number).ok_or_else(|| {
            MessagingError::InvalidDestination("sender number is not configured".to_string())
        })?;

        let form = [("From", from.as_str()), ("To", to.as_str()), ("Body", body)];
        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| MessagingError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MessagingError::Rejected { status, body });
        }

        let message: MessageResponse = response
            .json()
            .await
            .map_err(|e| MessagingError::Request(format!("invalid response: {e}")))?;

        info!(
            message_sid = %message.sid,
            destination = %redact(destination),
            "WhatsApp message queued"
        );
        Ok(message.sid)
    }
}
