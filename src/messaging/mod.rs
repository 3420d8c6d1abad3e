// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outbound messaging.
//!
//! Only used to deliver chat invitations. When no gateway is configured the
//! service runs without one and invites are refused.

pub mod twilio;

use async_trait::async_trait;

pub use twilio::{TwilioConfig, TwilioMessenger};

#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    #[error("messaging request failed: {0}")]
    Request(String),

    #[error("messaging gateway rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Sends a text message to a phone-number destination.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Returns the gateway's message id.
    async fn send_message(&self, destination: &str, body: &str) -> Result<String, MessagingError>;
}

#[cfg(test)]
pub mod recording {
    use std::sync::Mutex;

    use super::*;

    /// Messenger double that records what it was asked to send.
    #[derive(Default)]
    pub struct RecordingMessenger {
        pub sent: Mutex<Vec<(String, String)>>,
        pub fail: bool,
    }

    impl RecordingMessenger {
        pub fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn send_message(
            &self,
            destination: &str,
            body: &str,
        ) -> Result<String, MessagingError> {
            if self.fail {
                return Err(MessagingError::Request("gateway down".to_string()));
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push((destination.to_string(), body.to_string()));
            Ok(format!("SM{}", sent.len()))
        }
    }
}
