use roombot_calendar::ReservationService;
use roombot_core::config::{AppConfig, LoadOptions};
use roombot_core::TimeWindow;
use serde::Serialize;

use super::{block_on, CommandResult};

const COMMAND: &str = "availability";

#[derive(Debug, Serialize)]
struct AvailabilityReport {
    command: &'static str,
    status: &'static str,
    date: String,
    start: String,
    end: String,
    rooms: Vec<&'static str>,
}

pub fn run(date: &str, start: &str, end: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2)
        }
    };

    let window = match TimeWindow::parse(date, start, end) {
        Ok(window) => window,
        Err(error) => return CommandResult::failure(COMMAND, "invalid_input", error.to_string(), 3),
    };

    let service = match ReservationService::from_config(&config.calendar) {
        Ok(service) => service,
        Err(error) => {
            return CommandResult::failure(COMMAND, "calendar_setup", error.to_string(), 4)
        }
    };

    let rooms = match block_on(service.available_rooms(&window)) {
        Ok(Ok(rooms)) => rooms,
        Ok(Err(error)) => {
            return CommandResult::failure(COMMAND, "calendar_query", error.to_string(), 4)
        }
        Err(error) => return CommandResult::failure(COMMAND, "runtime", error, 5),
    };

    let report = AvailabilityReport {
        command: COMMAND,
        status: "ok",
        date: window.formatted_date(),
        start: window.formatted_start_time(),
        end: window.formatted_end_time(),
        rooms: rooms.into_iter().map(|room| room.name()).collect(),
    };
    match serde_json::to_string(&report) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure(COMMAND, "serialization", error.to_string(), 5),
    }
}
