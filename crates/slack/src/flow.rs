//! The modal flows behind the three menu buttons.
//!
//! Button clicks become `ViewAction`s (open or push a modal) and modal
//! submissions become `response_action` bodies. Calendar work goes through
//! [`ReservationService`]; failures are shown to the user as an error modal
//! carrying the correlation id.

use async_trait::async_trait;
use chrono::NaiveTime;
use roombot_calendar::{ReservationError, ReservationService};
use roombot_core::{
    parse_date, parse_time, ApplicationError, DomainError, MeetingRoom, Reservation,
    ReservationDetails, TimeWindow,
};
use tracing::{info, warn};

use crate::{
    blocks::{ModalView, ViewResponse},
    events::{
        BlockActionService, EventContext, EventHandlerError, ViewAction, ViewSubmissionService,
    },
    modals::{self, ids},
    payloads::{
        BlockActionsPayload, MenuAction, ModalCallback, ViewState, ViewSubmissionPayload,
    },
};

/// A submitted value that cannot be used, reported next to its input.
#[derive(Clone, Debug, PartialEq, Eq)]
struct FieldError {
    block_id: &'static str,
    message: &'static str,
}

impl FieldError {
    fn new(block_id: &'static str, message: &'static str) -> Self {
        Self { block_id, message }
    }
}

enum SubmissionError {
    Field(FieldError),
    Reservation(ReservationError),
}

impl From<FieldError> for SubmissionError {
    fn from(value: FieldError) -> Self {
        Self::Field(value)
    }
}

impl From<ReservationError> for SubmissionError {
    fn from(value: ReservationError) -> Self {
        Self::Reservation(value)
    }
}

impl From<DomainError> for SubmissionError {
    fn from(value: DomainError) -> Self {
        Self::Reservation(ReservationError::Domain(value))
    }
}

#[derive(Clone)]
pub struct ReservationFlow {
    service: ReservationService,
}

impl ReservationFlow {
    pub fn new(service: ReservationService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &ReservationService {
        &self.service
    }

    async fn next_view(
        &self,
        action: MenuAction,
        payload: &BlockActionsPayload,
        value: Option<&str>,
    ) -> Result<ModalView, ReservationError> {
        let today = self.service.converter().today();
        let booker = payload.user.display_name();
        Ok(match action {
            MenuAction::Reserve => modals::reserve_datetime_modal(today),
            MenuAction::Retrieve => modals::retrieve_date_modal(today),
            MenuAction::ChangeAndCancel => modals::change_and_cancel_input_modal(today, booker),
            MenuAction::SelectRoom => {
                let (window, room) = modals::parse_detail_metadata(required(value)?)?;
                modals::reserve_detail_modal(&window, room, booker)
            }
            MenuAction::Change => {
                let reservation = self.service.retrieve_by_id(required(value)?).await?;
                modals::change_request_modal(&reservation)
            }
            MenuAction::Cancel => {
                let reservation = self.service.retrieve_by_id(required(value)?).await?;
                modals::cancel_confirm_modal(&reservation)
            }
        })
    }

    async fn find_rooms(&self, state: &ViewState) -> Result<ViewResponse, SubmissionError> {
        let window = read_window(state)?;
        let rooms = self.service.available_rooms(&window).await?;
        Ok(ViewResponse::update(modals::available_rooms_modal(&window, &rooms)))
    }

    async fn reserve(
        &self,
        metadata: &str,
        state: &ViewState,
        ctx: &EventContext,
    ) -> Result<ViewResponse, SubmissionError> {
        let (window, room) = modals::parse_detail_metadata(metadata)?;
        let description = read_text(state, ids::DESCRIPTION_BLOCK, ids::DESCRIPTION_ACTION)?;
        let booker = read_text(state, ids::NAME_BLOCK, ids::NAME_ACTION)?;

        let details = ReservationDetails::new(room, description, booker);
        match self.service.reserve(details, window).await {
            Ok(reservation) => Ok(ViewResponse::update(modals::reserve_result_modal(&reservation))),
            Err(ReservationError::Domain(DomainError::ReservationConflict { room, window })) => {
                let summary = format!(
                    "{room} was booked by someone else for {window}. \
                     Start over to pick another room."
                );
                Ok(ViewResponse::update(modals::error_modal(&summary, &ctx.correlation_id)))
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn show_day(&self, state: &ViewState) -> Result<ViewResponse, SubmissionError> {
        let date = read_date(state)?;
        let reservations = self.service.retrieve_day(date).await?;
        Ok(ViewResponse::update(modals::retrieve_result_modal(date, &reservations)))
    }

    async fn list_own(&self, state: &ViewState) -> Result<ViewResponse, SubmissionError> {
        let date = read_date(state)?;
        let booker = read_text(state, ids::NAME_BLOCK, ids::NAME_ACTION)?;
        let reservations = self.service.retrieve_by_booker(date, booker).await?;
        Ok(ViewResponse::update(modals::reservation_list_modal(date, booker, &reservations)))
    }

    async fn change(&self, id: &str, state: &ViewState) -> Result<ViewResponse, SubmissionError> {
        let window = read_window(state)?;
        let room = read_room(state)?;
        let description = read_text(state, ids::DESCRIPTION_BLOCK, ids::DESCRIPTION_ACTION)?;
        let booker = read_text(state, ids::NAME_BLOCK, ids::NAME_ACTION)?;

        let existing = self.service.retrieve_by_id(id).await?;
        let requested =
            existing.rescheduled(ReservationDetails::new(room, description, booker), window);
        match self.service.change(&requested).await {
            Ok(changed) => Ok(ViewResponse::update(modals::change_result_modal(&changed))),
            Err(ReservationError::Domain(DomainError::ReservationConflict { .. })) => {
                Err(FieldError::new(
                    ids::START_HOUR_BLOCK,
                    "The room is already booked for this time.",
                )
                .into())
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn cancel(&self, id: &str) -> Result<ViewResponse, SubmissionError> {
        let reservation: Reservation = self.service.retrieve_by_id(id).await?;
        self.service.cancel(&reservation).await?;
        Ok(ViewResponse::update(modals::cancel_result_modal(&reservation)))
    }
}

#[async_trait]
impl BlockActionService for ReservationFlow {
    async fn handle_block_action(
        &self,
        payload: &BlockActionsPayload,
        ctx: &EventContext,
    ) -> Result<Option<ViewAction>, EventHandlerError> {
        let Some(clicked) = payload.actions.first() else {
            return Ok(None);
        };
        // Picker changes inside input blocks also arrive as block actions.
        let Ok(action) = clicked.action_id.parse::<MenuAction>() else {
            return Ok(None);
        };
        info!(
            event_name = "slack.flow.block_action",
            correlation_id = %ctx.correlation_id,
            action_id = action.as_str(),
            user_id = %payload.user.id,
            "block action received"
        );

        let view = match self.next_view(action, payload, clicked.value.as_deref()).await {
            Ok(view) => view,
            Err(error) => failure_modal(error, ctx, action.as_str()),
        };
        Ok(Some(match payload.view {
            Some(_) => ViewAction::Push(view),
            None => ViewAction::Open(view),
        }))
    }
}

#[async_trait]
impl ViewSubmissionService for ReservationFlow {
    async fn handle_view_submission(
        &self,
        payload: &ViewSubmissionPayload,
        ctx: &EventContext,
    ) -> Result<Option<ViewResponse>, EventHandlerError> {
        let Ok(callback) = payload.view.callback_id.parse::<ModalCallback>() else {
            return Ok(None);
        };
        info!(
            event_name = "slack.flow.view_submission",
            correlation_id = %ctx.correlation_id,
            callback_id = callback.as_str(),
            user_id = %payload.user.id,
            "view submission received"
        );

        let state = &payload.view.state;
        let metadata = payload.view.private_metadata.as_str();
        let outcome = match callback {
            ModalCallback::ReserveDatetimeInput => self.find_rooms(state).await,
            ModalCallback::ReserveDetailInput => self.reserve(metadata, state, ctx).await,
            ModalCallback::RetrieveDateInput => self.show_day(state).await,
            ModalCallback::ChangeAndCancelInput => self.list_own(state).await,
            ModalCallback::ChangeRequest => self.change(metadata, state).await,
            ModalCallback::CancelConfirm => self.cancel(metadata).await,
        };

        Ok(Some(match outcome {
            Ok(response) => response,
            Err(SubmissionError::Field(error)) => {
                info!(
                    event_name = "slack.flow.validation_failed",
                    correlation_id = %ctx.correlation_id,
                    callback_id = callback.as_str(),
                    block_id = error.block_id,
                    "submission rejected"
                );
                ViewResponse::error(error.block_id, error.message)
            }
            Err(SubmissionError::Reservation(error)) => {
                ViewResponse::update(failure_modal(error, ctx, callback.as_str()))
            }
        }))
    }
}

fn failure_modal(error: ReservationError, ctx: &EventContext, step: &str) -> ModalView {
    warn!(
        event_name = "slack.flow.failed",
        correlation_id = %ctx.correlation_id,
        step,
        error = %error,
        "reservation flow step failed"
    );
    let error = ApplicationError::from(error).into_interface(ctx.correlation_id.clone());
    modals::error_modal(error.user_message(), error.correlation_id())
}

fn required(value: Option<&str>) -> Result<&str, ReservationError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ReservationError::InvalidEvent("missing action value".to_owned()))
}

fn read_date(state: &ViewState) -> Result<chrono::NaiveDate, FieldError> {
    state
        .value(ids::DATE_BLOCK, ids::DATE_ACTION)
        .and_then(|value| parse_date(value).ok())
        .ok_or_else(|| FieldError::new(ids::DATE_BLOCK, "Pick a valid date."))
}

fn read_time(
    state: &ViewState,
    (hour_block, hour_action): (&'static str, &str),
    (minute_block, minute_action): (&str, &str),
    message: &'static str,
) -> Result<NaiveTime, FieldError> {
    let hour = state.value(hour_block, hour_action).ok_or(FieldError::new(hour_block, message))?;
    let minute = state.value(minute_block, minute_action).unwrap_or("00");
    parse_time(&format!("{hour}:{minute}")).map_err(|_| FieldError::new(hour_block, message))
}

fn read_window(state: &ViewState) -> Result<TimeWindow, FieldError> {
    let date = read_date(state)?;
    let start = read_time(
        state,
        (ids::START_HOUR_BLOCK, ids::START_HOUR_ACTION),
        (ids::START_MINUTE_BLOCK, ids::START_MINUTE_ACTION),
        "Pick a start time.",
    )?;
    let end = read_time(
        state,
        (ids::END_HOUR_BLOCK, ids::END_HOUR_ACTION),
        (ids::END_MINUTE_BLOCK, ids::END_MINUTE_ACTION),
        "Pick an end time.",
    )?;
    TimeWindow::new(date, start, end).map_err(|_| {
        FieldError::new(ids::END_HOUR_BLOCK, "The end time must be after the start time.")
    })
}

fn read_room(state: &ViewState) -> Result<MeetingRoom, FieldError> {
    state
        .value(ids::ROOM_BLOCK, ids::ROOM_ACTION)
        .and_then(|value| MeetingRoom::from_name(value).ok())
        .ok_or_else(|| FieldError::new(ids::ROOM_BLOCK, "Pick a room."))
}

fn read_text<'a>(
    state: &'a ViewState,
    block_id: &'static str,
    action_id: &str,
) -> Result<&'a str, FieldError> {
    let message = if block_id == ids::NAME_BLOCK { "Enter your name." } else { "Enter a title." };
    state.value(block_id, action_id).ok_or_else(|| FieldError::new(block_id, message))
}
