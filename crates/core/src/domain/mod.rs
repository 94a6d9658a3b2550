pub mod meeting_room;
pub mod reservation;
pub mod time_window;
