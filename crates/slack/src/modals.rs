//! Modal and message factories for every step of the reservation flows.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime, Timelike};
use roombot_core::{DomainError, MeetingRoom, Reservation, ReservationSet, TimeWindow, DATE_FORMAT};

use crate::blocks::{
    Block, ButtonElement, ButtonStyle, Element, MessageBuilder, MessageTemplate, ModalView,
    SelectOption, TextObject,
};
use crate::payloads::{MenuAction, ModalCallback};

/// Block and action ids of modal inputs. Validation errors are keyed by the
/// block id.
pub mod ids {
    pub const DATE_BLOCK: &str = "datepicker_block";
    pub const DATE_ACTION: &str = "datepicker";
    pub const START_HOUR_BLOCK: &str = "start_hour_block";
    pub const START_HOUR_ACTION: &str = "start_hour";
    pub const START_MINUTE_BLOCK: &str = "start_minute_block";
    pub const START_MINUTE_ACTION: &str = "start_minute";
    pub const END_HOUR_BLOCK: &str = "end_hour_block";
    pub const END_HOUR_ACTION: &str = "end_hour";
    pub const END_MINUTE_BLOCK: &str = "end_minute_block";
    pub const END_MINUTE_ACTION: &str = "end_minute";
    pub const ROOM_BLOCK: &str = "room_block";
    pub const ROOM_ACTION: &str = "room";
    pub const DESCRIPTION_BLOCK: &str = "description_block";
    pub const DESCRIPTION_ACTION: &str = "description";
    pub const NAME_BLOCK: &str = "name_block";
    pub const NAME_ACTION: &str = "name";
}

const METADATA_SEPARATOR: char = '_';
const MINUTE_STEP: u32 = 10;

/// `private_metadata` of the reserve detail modal:
/// `"{date}_{start}_{end}_{room}"`.
pub fn detail_metadata(window: &TimeWindow, room: MeetingRoom) -> String {
    format!(
        "{date}{sep}{start}{sep}{end}{sep}{room}",
        date = window.formatted_date(),
        start = window.formatted_start_time(),
        end = window.formatted_end_time(),
        room = room.name(),
        sep = METADATA_SEPARATOR,
    )
}

pub fn parse_detail_metadata(metadata: &str) -> Result<(TimeWindow, MeetingRoom), DomainError> {
    let parts: Vec<&str> = metadata.split(METADATA_SEPARATOR).collect();
    let [date, start, end, room] = parts.as_slice() else {
        return Err(DomainError::InvalidDate(metadata.to_owned()));
    };
    Ok((TimeWindow::parse(date, start, end)?, MeetingRoom::from_name(room)?))
}

pub fn main_menu_message() -> MessageTemplate {
    MessageBuilder::new("Meeting room reservations")
        .section("menu.header.v1", |section| {
            section.mrkdwn("*Meeting room reservations*\nWhat would you like to do?");
        })
        .actions("menu.actions.v1", |actions| {
            actions
                .button(
                    ButtonElement::new(MenuAction::Reserve, "Reserve")
                        .style(ButtonStyle::Primary)
                        .value(MenuAction::Reserve.as_str()),
                )
                .button(
                    ButtonElement::new(MenuAction::Retrieve, "View reservations")
                        .value(MenuAction::Retrieve.as_str()),
                )
                .button(
                    ButtonElement::new(MenuAction::ChangeAndCancel, "Change or cancel")
                        .value(MenuAction::ChangeAndCancel.as_str()),
                );
        })
        .build()
}

pub fn reserve_datetime_modal(today: NaiveDate) -> ModalView {
    let mut blocks = vec![date_input("Pick the date to reserve", today)];
    blocks.extend(time_inputs(None));
    ModalView::form(ModalCallback::ReserveDatetimeInput, "Reserve a room", "Find rooms", blocks)
}

pub fn available_rooms_modal(window: &TimeWindow, rooms: &BTreeSet<MeetingRoom>) -> ModalView {
    let mut builder = MessageBuilder::new("available rooms")
        .section("rooms.header.v1", |section| {
            section.mrkdwn(format!("*Free rooms for {window}*"));
        })
        .divider();

    if rooms.is_empty() {
        builder = builder.section("rooms.empty.v1", |section| {
            section.plain("Every room is booked for this time. Try another slot.");
        });
    }
    for room in rooms {
        let metadata = detail_metadata(window, *room);
        let block_id = format!("rooms.{}.v1", room.name().to_ascii_lowercase());
        builder = builder.section(block_id, |section| {
            section.mrkdwn(format!("*{room}*")).accessory(
                ButtonElement::new(MenuAction::SelectRoom, "Select")
                    .style(ButtonStyle::Primary)
                    .value(metadata),
            );
        });
    }

    ModalView::new("Reserve a room", builder.into_blocks())
}

/// `booker` prefills the name input.
pub fn reserve_detail_modal(
    window: &TimeWindow,
    room: MeetingRoom,
    booker: Option<&str>,
) -> ModalView {
    let blocks = MessageBuilder::new("reservation details")
        .section("reserve.detail.summary.v1", |section| {
            section.mrkdwn(format!("*{room}* on *{window}*"));
        })
        .divider()
        .input(
            ids::DESCRIPTION_BLOCK,
            "Meeting title",
            Element::plain_text_input(ids::DESCRIPTION_ACTION, "What is the meeting about?", None),
        )
        .input(
            ids::NAME_BLOCK,
            "Booked by",
            Element::plain_text_input(ids::NAME_ACTION, "Your name", booker.map(str::to_owned)),
        )
        .into_blocks();

    ModalView::form(ModalCallback::ReserveDetailInput, "Reserve a room", "Reserve", blocks)
        .private_metadata(detail_metadata(window, room))
}

pub fn reserve_result_modal(reservation: &Reservation) -> ModalView {
    let blocks = MessageBuilder::new("reservation created")
        .section("reserve.result.header.v1", |section| {
            section.mrkdwn(":white_check_mark: *Your room is booked.*");
        })
        .divider()
        .into_blocks();
    ModalView::new("Reserve a room", with_reservation(blocks, reservation))
}

pub fn retrieve_date_modal(today: NaiveDate) -> ModalView {
    ModalView::form(
        ModalCallback::RetrieveDateInput,
        "View reservations",
        "Show",
        vec![date_input("Which day do you want to see?", today)],
    )
}

pub fn retrieve_result_modal(date: NaiveDate, reservations: &ReservationSet) -> ModalView {
    let mut blocks = MessageBuilder::new("reservations")
        .section("retrieve.result.header.v1", |section| {
            section.mrkdwn(format!("*Reservations on {}*", date.format(DATE_FORMAT)));
        })
        .divider()
        .into_blocks();

    if reservations.is_empty() {
        blocks.push(Block::section(
            "retrieve.result.empty.v1",
            TextObject::plain("No reservations yet."),
        ));
    }
    for reservation in reservations {
        blocks.push(reservation_section(reservation));
    }

    ModalView::new("View reservations", blocks)
}

pub fn change_and_cancel_input_modal(today: NaiveDate, booker: Option<&str>) -> ModalView {
    let blocks = vec![
        date_input("Date of the reservation", today),
        Block::input(
            ids::NAME_BLOCK,
            "Booked by",
            Element::plain_text_input(
                ids::NAME_ACTION,
                "Name used when booking",
                booker.map(str::to_owned),
            ),
        ),
    ];
    ModalView::form(ModalCallback::ChangeAndCancelInput, "Change or cancel", "Find", blocks)
}

/// One section per reservation followed by its change and cancel buttons.
pub fn reservation_list_modal(
    date: NaiveDate,
    booker: &str,
    reservations: &ReservationSet,
) -> ModalView {
    let mut blocks = MessageBuilder::new("your reservations")
        .section("change.list.header.v1", |section| {
            section.mrkdwn(format!("*{booker}'s reservations on {}*", date.format(DATE_FORMAT)));
        })
        .divider()
        .into_blocks();

    if reservations.is_empty() {
        blocks.push(Block::section(
            "change.list.empty.v1",
            TextObject::plain("No reservations found for this name and date."),
        ));
    }
    for reservation in reservations {
        let id = reservation.id().as_str();
        blocks.push(reservation_section(reservation));
        blocks.push(Block::Actions {
            block_id: format!("change.list.{id}.actions"),
            elements: vec![
                ButtonElement::new(MenuAction::Change, "Change").value(id).into(),
                ButtonElement::new(MenuAction::Cancel, "Cancel")
                    .style(ButtonStyle::Danger)
                    .value(id)
                    .into(),
            ],
        });
    }

    ModalView::new("Change or cancel", blocks)
}

/// Every input is prefilled from `reservation`; its id rides in `private_metadata`.
pub fn change_request_modal(reservation: &Reservation) -> ModalView {
    let window = reservation.window();
    let mut blocks = vec![date_input("Date", window.date())];
    blocks.extend(time_inputs(Some(window)));
    blocks.push(room_input(Some(reservation.room())));
    blocks.push(Block::input(
        ids::DESCRIPTION_BLOCK,
        "Meeting title",
        Element::plain_text_input(
            ids::DESCRIPTION_ACTION,
            "What is the meeting about?",
            Some(reservation.description().to_owned()),
        ),
    ));
    blocks.push(Block::input(
        ids::NAME_BLOCK,
        "Booked by",
        Element::plain_text_input(
            ids::NAME_ACTION,
            "Your name",
            Some(reservation.booker().to_owned()),
        ),
    ));
    let end = window.end_time();
    if (end.hour(), end.minute(), end.second()) == (23, 59, 59) {
        blocks.push(Block::Context {
            block_id: "change.overnight.v1".to_owned(),
            elements: vec![TextObject::plain(
                "This reservation runs past midnight. Saving ends it at 23:59 on this date.",
            )],
        });
    }

    ModalView::form(ModalCallback::ChangeRequest, "Change reservation", "Save", blocks)
        .private_metadata(reservation.id().as_str())
}

pub fn change_result_modal(reservation: &Reservation) -> ModalView {
    let blocks = MessageBuilder::new("reservation changed")
        .section("change.result.header.v1", |section| {
            section.mrkdwn(":white_check_mark: *Your reservation was updated.*");
        })
        .divider()
        .into_blocks();
    ModalView::new("Change reservation", with_reservation(blocks, reservation))
}

pub fn cancel_confirm_modal(reservation: &Reservation) -> ModalView {
    let blocks = MessageBuilder::new("cancel reservation")
        .section("cancel.confirm.header.v1", |section| {
            section.plain("Cancel the reservation below?");
        })
        .divider()
        .into_blocks();

    ModalView::form(
        ModalCallback::CancelConfirm,
        "Cancel reservation",
        "Yes",
        with_reservation(blocks, reservation),
    )
    .private_metadata(reservation.id().as_str())
    .close_label("No")
}

pub fn cancel_result_modal(reservation: &Reservation) -> ModalView {
    let blocks = MessageBuilder::new("reservation cancelled")
        .section("cancel.result.header.v1", |section| {
            section.mrkdwn(":wastebasket: *The reservation was cancelled.*");
        })
        .divider()
        .into_blocks();
    ModalView::new("Cancel reservation", with_reservation(blocks, reservation))
}

pub fn error_modal(summary: &str, correlation_id: &str) -> ModalView {
    let blocks = MessageBuilder::new(summary.to_owned())
        .section("error.summary.v1", |section| {
            section.mrkdwn(format!(":warning: {summary}"));
        })
        .context("error.context.v1", |context| {
            context.plain(format!("Correlation ID: {correlation_id}"));
        })
        .into_blocks();
    ModalView::new("Something went wrong", blocks)
}

pub fn hour_options() -> Vec<SelectOption> {
    (0..24).map(|hour| SelectOption::same(format!("{hour:02}"))).collect()
}

pub fn minute_options() -> Vec<SelectOption> {
    (0..60)
        .step_by(MINUTE_STEP as usize)
        .map(|minute| SelectOption::same(format!("{minute:02}")))
        .collect()
}

pub fn room_options() -> Vec<SelectOption> {
    MeetingRoom::ALL.into_iter().map(|room| SelectOption::same(room.name())).collect()
}

fn date_input(label: &str, initial: NaiveDate) -> Block {
    Block::input(
        ids::DATE_BLOCK,
        label,
        Element::datepicker(ids::DATE_ACTION, Some(initial.format(DATE_FORMAT).to_string())),
    )
}

/// Hour and minute pickers for start and end. An initial minute off the
/// picker's step is added as its own option so saving keeps it.
fn time_inputs(initial: Option<&TimeWindow>) -> Vec<Block> {
    let start = initial.map(TimeWindow::start_time);
    let end = initial.map(TimeWindow::end_time);
    vec![
        hour_input(ids::START_HOUR_BLOCK, ids::START_HOUR_ACTION, "Start hour", start),
        minute_input(ids::START_MINUTE_BLOCK, ids::START_MINUTE_ACTION, "Start minute", start),
        hour_input(ids::END_HOUR_BLOCK, ids::END_HOUR_ACTION, "End hour", end),
        minute_input(ids::END_MINUTE_BLOCK, ids::END_MINUTE_ACTION, "End minute", end),
    ]
}

fn hour_input(block_id: &str, action_id: &str, label: &str, initial: Option<NaiveTime>) -> Block {
    let initial = initial.map(|time| format!("{:02}", time.hour()));
    Block::input(
        block_id,
        label,
        Element::static_select(action_id, "Hour", hour_options(), initial.as_deref()),
    )
}

fn minute_input(block_id: &str, action_id: &str, label: &str, initial: Option<NaiveTime>) -> Block {
    let initial = format!("{:02}", initial.map_or(0, |time| time.minute()));
    let mut options = minute_options();
    if !options.iter().any(|option| option.value == initial) {
        let at = options.iter().position(|option| option.value > initial).unwrap_or(options.len());
        options.insert(at, SelectOption::same(initial.clone()));
    }
    Block::input(
        block_id,
        label,
        Element::static_select(action_id, "Minute", options, Some(&initial)),
    )
}

fn room_input(initial: Option<MeetingRoom>) -> Block {
    Block::input(
        ids::ROOM_BLOCK,
        "Room",
        Element::static_select(
            ids::ROOM_ACTION,
            "Room",
            room_options(),
            initial.map(|room| room.name()),
        ),
    )
}

fn reservation_section(reservation: &Reservation) -> Block {
    let window = reservation.window();
    Block::Section {
        block_id: format!("reservation.{}.v1", reservation.id().as_str()),
        text: TextObject::mrkdwn(format!(
            "*{} / {}*",
            reservation.room(),
            reservation.description()
        )),
        fields: vec![
            TextObject::plain(reservation.booker()),
            TextObject::plain(format!(
                "{} {}-{}",
                window.formatted_date(),
                window.formatted_start_time(),
                window.formatted_end_time()
            )),
        ],
        accessory: None,
    }
}

fn with_reservation(mut blocks: Vec<Block>, reservation: &Reservation) -> Vec<Block> {
    blocks.push(reservation_section(reservation));
    blocks
}
