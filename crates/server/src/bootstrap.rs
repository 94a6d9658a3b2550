use std::sync::Arc;

use roombot_calendar::{CalendarError, ReservationService};
use roombot_core::config::AppConfig;
use roombot_slack::{
    client::{HttpSlackApi, SlackApi, SlackApiError},
    events::{reservation_dispatcher, EventDispatcher},
    flow::ReservationFlow,
};
use thiserror::Error;
use tracing::info;

use crate::signature::SlackSigner;

pub struct Application {
    pub config: AppConfig,
    pub service: ReservationService,
    pub dispatcher: Arc<EventDispatcher>,
    pub signer: Option<SlackSigner>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("calendar backend setup failed: {0}")]
    Calendar(#[from] CalendarError),
    #[error("slack client setup failed: {0}")]
    Slack(#[from] SlackApiError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let service = ReservationService::from_config(&config.calendar)?;
    let api: Arc<dyn SlackApi> = Arc::new(HttpSlackApi::new(&config.slack)?);
    let dispatcher = reservation_dispatcher(api, ReservationFlow::new(service.clone()));
    let signer = config.slack.signing_secret.clone().map(SlackSigner::new);
    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        handler_count = dispatcher.handler_count(),
        signature_verification = signer.is_some(),
        "slack dispatcher wired"
    );

    Ok(Application { config, service, dispatcher: Arc::new(dispatcher), signer })
}

#[cfg(test)]
mod tests {
    use roombot_calendar::CalendarError;
    use roombot_core::config::{AppConfig, CalendarBackendKind};

    use super::{bootstrap_with_config, BootstrapError};

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.slack.bot_token = "xoxb-test".to_owned().into();
        config.calendar.backend = CalendarBackendKind::Memory;
        config
    }

    #[tokio::test]
    async fn bootstrap_wires_every_handler_for_the_memory_backend() {
        let app = bootstrap_with_config(memory_config()).expect("bootstrap should succeed");

        assert_eq!(app.dispatcher.handler_count(), 4);
        assert!(app.signer.is_none());
        assert_eq!(app.service.probe().await, Ok(0));
    }

    #[test]
    fn bootstrap_enables_signature_checks_when_a_secret_is_set() {
        let mut config = memory_config();
        config.slack.signing_secret = Some("shh".to_owned().into());

        let app = bootstrap_with_config(config).expect("bootstrap should succeed");

        assert!(app.signer.is_some());
    }

    #[test]
    fn bootstrap_fails_fast_without_google_credentials() {
        let mut config = memory_config();
        config.calendar.backend = CalendarBackendKind::Google;

        let result = bootstrap_with_config(config);

        assert!(matches!(result, Err(BootstrapError::Calendar(CalendarError::Config(_)))));
    }
}
