//! Calendar access for roombot.
//!
//! Google Calendar is the system of record: one event is one reservation.
//! - **Backend** (`backend`) - `CalendarBackend` trait and the event model
//! - **Google** (`google`) - Calendar v3 REST client over `reqwest`
//! - **Memory** (`memory`) - in-process backend for tests and local runs
//! - **Converter** (`converter`) - event summary <-> reservation mapping
//! - **Service** (`service`) - reservation use cases on top of a backend

pub mod backend;
pub mod converter;
pub mod google;
pub mod memory;
pub mod service;

pub use backend::{CalendarBackend, CalendarError, CalendarEvent, EventDraft, EventRange};
pub use converter::ReservationConverter;
pub use google::GoogleCalendarClient;
pub use memory::InMemoryCalendar;
pub use service::{ReservationError, ReservationService};
