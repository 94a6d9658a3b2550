use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use roombot_core::config::SlackConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::blocks::{MessageTemplate, ModalView, PostMessageRequest, ViewRequest};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SlackApiError {
    #[error("slack request failed: {0}")]
    Transport(String),
    #[error("slack api returned http {0}")]
    Status(u16),
    #[error("slack api `{method}` rejected the call: {error}")]
    Api { method: &'static str, error: String },
    #[error("slack response could not be decoded: {0}")]
    Decode(String),
}

/// The Web API methods roombot calls.
#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), SlackApiError>;

    async fn push_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), SlackApiError>;

    async fn post_message(
        &self,
        channel: &str,
        message: &MessageTemplate,
    ) -> Result<(), SlackApiError>;
}

pub struct HttpSlackApi {
    client: Client,
    base_url: String,
    bot_token: SecretString,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl HttpSlackApi {
    pub fn new(config: &SlackConfig) -> Result<Self, SlackApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| SlackApiError::Transport(error.to_string()))?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            bot_token: config.bot_token.clone(),
        })
    }

    async fn call<B: Serialize + Sync>(
        &self,
        method: &'static str,
        body: &B,
    ) -> Result<(), SlackApiError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .bearer_auth(self.bot_token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|error| SlackApiError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SlackApiError::Status(status.as_u16()));
        }

        let envelope: ApiEnvelope =
            response.json().await.map_err(|error| SlackApiError::Decode(error.to_string()))?;
        if !envelope.ok {
            return Err(SlackApiError::Api {
                method,
                error: envelope.error.unwrap_or_else(|| "unknown_error".to_owned()),
            });
        }

        debug!(event_name = "slack.api.call", method, "slack api call succeeded");
        Ok(())
    }
}

#[async_trait]
impl SlackApi for HttpSlackApi {
    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), SlackApiError> {
        self.call("views.open", &ViewRequest { trigger_id, view }).await
    }

    async fn push_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), SlackApiError> {
        self.call("views.push", &ViewRequest { trigger_id, view }).await
    }

    async fn post_message(
        &self,
        channel: &str,
        message: &MessageTemplate,
    ) -> Result<(), SlackApiError> {
        self.call("chat.postMessage", &PostMessageRequest { channel, message }).await
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackCall {
    OpenView { trigger_id: String, view: ModalView },
    PushView { trigger_id: String, view: ModalView },
    PostMessage { channel: String, message: MessageTemplate },
}

/// Records every call instead of talking to Slack. Used by tests and by
/// local runs without a workspace.
#[derive(Default)]
pub struct RecordingSlackApi {
    calls: Mutex<Vec<SlackCall>>,
    failure: Option<SlackApiError>,
}

impl RecordingSlackApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call is still recorded but answers with `error`.
    pub fn failing(error: SlackApiError) -> Self {
        Self { calls: Mutex::default(), failure: Some(error) }
    }

    pub async fn calls(&self) -> Vec<SlackCall> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: SlackCall) -> Result<(), SlackApiError> {
        self.calls.lock().await.push(call);
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SlackApi for RecordingSlackApi {
    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), SlackApiError> {
        self.record(SlackCall::OpenView { trigger_id: trigger_id.to_owned(), view: view.clone() })
            .await
    }

    async fn push_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), SlackApiError> {
        self.record(SlackCall::PushView { trigger_id: trigger_id.to_owned(), view: view.clone() })
            .await
    }

    async fn post_message(
        &self,
        channel: &str,
        message: &MessageTemplate,
    ) -> Result<(), SlackApiError> {
        self.record(SlackCall::PostMessage {
            channel: channel.to_owned(),
            message: message.clone(),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordingSlackApi, SlackApi, SlackApiError, SlackCall};
    use crate::blocks::ModalView;
    use crate::modals::main_menu_message;

    #[tokio::test]
    async fn recording_api_keeps_calls_in_order() {
        let api = RecordingSlackApi::new();

        api.post_message("C1", &main_menu_message()).await.expect("post");
        api.open_view("trigger-1", &ModalView::new("Reserve a room", vec![])).await.expect("open");

        let calls = api.calls().await;
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], SlackCall::PostMessage { channel, .. } if channel == "C1"));
        assert!(matches!(
            &calls[1],
            SlackCall::OpenView { trigger_id, .. } if trigger_id == "trigger-1"
        ));
    }

    #[tokio::test]
    async fn failing_api_records_and_returns_the_error() {
        let error =
            SlackApiError::Api { method: "views.open", error: "expired_trigger_id".to_owned() };
        let api = RecordingSlackApi::failing(error.clone());

        let result = api.open_view("trigger-1", &ModalView::new("Reserve a room", vec![])).await;

        assert_eq!(result, Err(error));
        assert_eq!(api.calls().await.len(), 1);
    }
}
