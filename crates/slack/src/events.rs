use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    blocks::{ModalView, ViewResponse},
    client::{SlackApi, SlackApiError},
    modals::main_menu_message,
    payloads::{
        BlockActionsPayload, EventCallbackPayload, EventsApiPayload, InteractionPayload,
        ViewSubmissionPayload,
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub request_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    UrlVerification { challenge: String },
    EventCallback(EventCallbackPayload),
    BlockActions(BlockActionsPayload),
    ViewSubmission(ViewSubmissionPayload),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::UrlVerification { .. } => SlackEventType::UrlVerification,
            Self::EventCallback(_) => SlackEventType::EventCallback,
            Self::BlockActions(_) => SlackEventType::BlockActions,
            Self::ViewSubmission(_) => SlackEventType::ViewSubmission,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

impl From<EventsApiPayload> for SlackEvent {
    fn from(value: EventsApiPayload) -> Self {
        match value {
            EventsApiPayload::UrlVerification { challenge } => Self::UrlVerification { challenge },
            EventsApiPayload::EventCallback(callback) => Self::EventCallback(callback),
            EventsApiPayload::Unsupported => {
                Self::Unsupported { event_type: "events_api".to_owned() }
            }
        }
    }
}

impl From<InteractionPayload> for SlackEvent {
    fn from(value: InteractionPayload) -> Self {
        match value {
            InteractionPayload::BlockActions(payload) => Self::BlockActions(payload),
            InteractionPayload::ViewSubmission(payload) => Self::ViewSubmission(payload),
            InteractionPayload::ViewClosed(_) => {
                Self::Unsupported { event_type: "view_closed".to_owned() }
            }
            InteractionPayload::Unsupported => {
                Self::Unsupported { event_type: "interaction".to_owned() }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    UrlVerification,
    EventCallback,
    BlockActions,
    ViewSubmission,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    /// Echo for `url_verification`.
    Challenge(String),
    /// Synchronous body for a `view_submission`.
    ViewResponse(ViewResponse),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error(transparent)]
    SlackApi(#[from] SlackApiError),
    #[error("malformed slack payload: {0}")]
    Malformed(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            debug!(
                event_name = "slack.dispatch.ignored",
                correlation_id = %ctx.correlation_id,
                event_type = ?envelope.event.event_type(),
                "no handler registered for slack event"
            );
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Wires every handler roombot needs around one Web API client and one
/// reservation flow.
pub fn reservation_dispatcher<S>(api: Arc<dyn SlackApi>, service: S) -> EventDispatcher
where
    S: BlockActionService + ViewSubmissionService + Clone + 'static,
{
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(UrlVerificationHandler);
    dispatcher.register(MenuHandler::new(api.clone()));
    dispatcher.register(BlockActionHandler::new(service.clone(), api));
    dispatcher.register(ViewSubmissionHandler::new(service));
    dispatcher
}

pub struct UrlVerificationHandler;

#[async_trait]
impl EventHandler for UrlVerificationHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::UrlVerification
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::UrlVerification { challenge } = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        Ok(HandlerResult::Challenge(challenge.clone()))
    }
}

/// Posts the main menu whenever someone mentions or messages the bot.
pub struct MenuHandler {
    api: Arc<dyn SlackApi>,
}

impl MenuHandler {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl EventHandler for MenuHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::EventCallback
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::EventCallback(callback) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        let Some(channel) = callback.event.menu_channel() else {
            return Ok(HandlerResult::Ignored);
        };

        self.api.post_message(channel, &main_menu_message()).await?;
        info!(
            event_name = "slack.menu.posted",
            correlation_id = %ctx.correlation_id,
            channel,
            "main menu posted"
        );
        Ok(HandlerResult::Processed)
    }
}

/// Where the next modal goes: a fresh modal from a message button, or onto
/// the stack when the click came from inside a modal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewAction {
    Open(ModalView),
    Push(ModalView),
}

#[async_trait]
pub trait BlockActionService: Send + Sync {
    /// `None` when the action is not one roombot reacts to.
    async fn handle_block_action(
        &self,
        payload: &BlockActionsPayload,
        ctx: &EventContext,
    ) -> Result<Option<ViewAction>, EventHandlerError>;
}

pub struct BlockActionHandler<S> {
    service: S,
    api: Arc<dyn SlackApi>,
}

impl<S> BlockActionHandler<S>
where
    S: BlockActionService,
{
    pub fn new(service: S, api: Arc<dyn SlackApi>) -> Self {
        Self { service, api }
    }
}

#[async_trait]
impl<S> EventHandler for BlockActionHandler<S>
where
    S: BlockActionService + 'static,
{
    fn event_type(&self) -> SlackEventType {
        SlackEventType::BlockActions
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::BlockActions(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let Some(next) = self.service.handle_block_action(payload, ctx).await? else {
            return Ok(HandlerResult::Ignored);
        };
        if payload.trigger_id.trim().is_empty() {
            return Err(EventHandlerError::Malformed("block_actions without trigger_id".to_owned()));
        }
        match next {
            ViewAction::Open(view) => self.api.open_view(&payload.trigger_id, &view).await?,
            ViewAction::Push(view) => self.api.push_view(&payload.trigger_id, &view).await?,
        }
        Ok(HandlerResult::Processed)
    }
}

#[async_trait]
pub trait ViewSubmissionService: Send + Sync {
    /// `None` for submissions of modals roombot did not open.
    async fn handle_view_submission(
        &self,
        payload: &ViewSubmissionPayload,
        ctx: &EventContext,
    ) -> Result<Option<ViewResponse>, EventHandlerError>;
}

pub struct ViewSubmissionHandler<S> {
    service: S,
}

impl<S> ViewSubmissionHandler<S>
where
    S: ViewSubmissionService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for ViewSubmissionHandler<S>
where
    S: ViewSubmissionService + 'static,
{
    fn event_type(&self) -> SlackEventType {
        SlackEventType::ViewSubmission
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::ViewSubmission(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        Ok(match self.service.handle_view_submission(payload, ctx).await? {
            Some(response) => HandlerResult::ViewResponse(response),
            None => HandlerResult::Ignored,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::{
        reservation_dispatcher, BlockActionService, EventContext, EventDispatcher,
        EventHandlerError, HandlerResult, SlackEnvelope, SlackEvent, ViewAction,
        ViewSubmissionService,
    };
    use crate::blocks::{ModalView, ViewResponse};
    use crate::client::{RecordingSlackApi, SlackApi, SlackCall};
    use crate::payloads::{
        ActionPayload, BlockActionsPayload, CallbackEvent, EventCallbackPayload,
        InteractionPayload, SlackUser, ViewPayload, ViewSubmissionPayload,
    };

    #[derive(Clone)]
    struct StubFlow;

    #[async_trait]
    impl BlockActionService for StubFlow {
        async fn handle_block_action(
            &self,
            payload: &BlockActionsPayload,
            _ctx: &EventContext,
        ) -> Result<Option<ViewAction>, EventHandlerError> {
            let view = ModalView::new("stub", vec![]);
            Ok(match payload.actions.first().map(|action| action.action_id.as_str()) {
                Some("reserve") => Some(ViewAction::Open(view)),
                Some("select_room") => Some(ViewAction::Push(view)),
                _ => None,
            })
        }
    }

    #[async_trait]
    impl ViewSubmissionService for StubFlow {
        async fn handle_view_submission(
            &self,
            payload: &ViewSubmissionPayload,
            _ctx: &EventContext,
        ) -> Result<Option<ViewResponse>, EventHandlerError> {
            Ok((payload.view.callback_id == "retrieve_date_input").then_some(ViewResponse::Clear))
        }
    }

    fn user() -> SlackUser {
        SlackUser { id: "U1".to_owned(), username: Some("dana".to_owned()), name: None }
    }

    fn envelope(event: SlackEvent) -> SlackEnvelope {
        SlackEnvelope { request_id: "req-1".to_owned(), event }
    }

    fn click(action_id: &str) -> SlackEnvelope {
        envelope(SlackEvent::BlockActions(BlockActionsPayload {
            trigger_id: "trigger-1".to_owned(),
            user: user(),
            channel: None,
            view: None,
            actions: vec![ActionPayload {
                action_id: action_id.to_owned(),
                block_id: None,
                value: None,
            }],
        }))
    }

    fn dispatcher() -> (Arc<RecordingSlackApi>, EventDispatcher) {
        let api = Arc::new(RecordingSlackApi::new());
        let shared: Arc<dyn SlackApi> = api.clone();
        (api, reservation_dispatcher(shared, StubFlow))
    }

    #[test]
    fn reservation_dispatcher_registers_handlers() {
        let (_, dispatcher) = dispatcher();
        assert_eq!(dispatcher.handler_count(), 4);
    }

    #[tokio::test]
    async fn dispatcher_echoes_url_verification_challenge() {
        let (_, dispatcher) = dispatcher();
        let envelope = envelope(SlackEvent::UrlVerification { challenge: "abc123".to_owned() });

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Challenge("abc123".to_owned()));
    }

    #[tokio::test]
    async fn dispatcher_returns_ignored_when_no_handler_registered() {
        let dispatcher = EventDispatcher::new();

        let result = dispatcher
            .dispatch(&click("reserve"), &EventContext::default())
            .await
            .expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
    }

    #[tokio::test]
    async fn mentions_get_the_main_menu_and_bot_messages_do_not() {
        let (api, dispatcher) = dispatcher();
        let mention = envelope(SlackEvent::EventCallback(EventCallbackPayload {
            team_id: None,
            event_id: Some("Ev1".to_owned()),
            event: CallbackEvent::AppMention {
                user: Some("U1".to_owned()),
                channel: "C1".to_owned(),
                text: "<@B1>".to_owned(),
            },
        }));
        let bot = envelope(SlackEvent::EventCallback(EventCallbackPayload {
            team_id: None,
            event_id: Some("Ev2".to_owned()),
            event: CallbackEvent::Message {
                user: None,
                channel: "C1".to_owned(),
                bot_id: Some("B1".to_owned()),
                subtype: Some("bot_message".to_owned()),
            },
        }));

        let ctx = EventContext::default();
        assert_eq!(dispatcher.dispatch(&mention, &ctx).await, Ok(HandlerResult::Processed));
        assert_eq!(dispatcher.dispatch(&bot, &ctx).await, Ok(HandlerResult::Ignored));

        let calls = api.calls().await;
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], SlackCall::PostMessage { channel, .. } if channel == "C1"));
    }

    #[tokio::test]
    async fn block_actions_open_or_push_the_returned_view() {
        let (api, dispatcher) = dispatcher();
        let ctx = EventContext::default();

        assert_eq!(
            dispatcher.dispatch(&click("reserve"), &ctx).await,
            Ok(HandlerResult::Processed)
        );
        assert_eq!(
            dispatcher.dispatch(&click("select_room"), &ctx).await,
            Ok(HandlerResult::Processed)
        );
        assert_eq!(
            dispatcher.dispatch(&click("start_hour"), &ctx).await,
            Ok(HandlerResult::Ignored)
        );

        let calls = api.calls().await;
        assert_eq!(calls.len(), 2);
        assert!(matches!(
            &calls[0],
            SlackCall::OpenView { trigger_id, .. } if trigger_id == "trigger-1"
        ));
        assert!(matches!(&calls[1], SlackCall::PushView { .. }));
    }

    #[tokio::test]
    async fn slack_api_failures_surface_as_dispatch_errors() {
        let api: Arc<dyn SlackApi> = Arc::new(RecordingSlackApi::failing(
            crate::client::SlackApiError::Status(500),
        ));
        let dispatcher = reservation_dispatcher(api, StubFlow);

        let result = dispatcher.dispatch(&click("reserve"), &EventContext::default()).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn view_submissions_return_the_service_response() {
        let (_, dispatcher) = dispatcher();
        let submission = |callback_id: &str| {
            envelope(SlackEvent::ViewSubmission(ViewSubmissionPayload {
                trigger_id: None,
                user: user(),
                view: ViewPayload { callback_id: callback_id.to_owned(), ..ViewPayload::default() },
            }))
        };
        let ctx = EventContext::default();

        assert_eq!(
            dispatcher.dispatch(&submission("retrieve_date_input"), &ctx).await,
            Ok(HandlerResult::ViewResponse(ViewResponse::Clear))
        );
        assert_eq!(
            dispatcher.dispatch(&submission("someone_elses_modal"), &ctx).await,
            Ok(HandlerResult::Ignored)
        );
    }

    #[test]
    fn view_closed_interactions_are_unsupported() {
        let payload: InteractionPayload = serde_json::from_value(serde_json::json!({
            "type": "view_closed",
            "user": {"id": "U1"},
            "view": {"id": "V1", "callback_id": "reserve_datetime_input"}
        }))
        .expect("decodes");

        assert_eq!(
            SlackEvent::from(payload),
            SlackEvent::Unsupported { event_type: "view_closed".to_owned() }
        );
    }
}
