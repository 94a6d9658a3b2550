use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Bookable rooms. The order here is the order rooms are listed in Slack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingRoom {
    Denali,
    Elbrus,
    Everest,
    Fuji,
    Kilimanjaro,
}

impl MeetingRoom {
    pub const ALL: [MeetingRoom; 5] =
        [Self::Denali, Self::Elbrus, Self::Everest, Self::Fuji, Self::Kilimanjaro];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Denali => "Denali",
            Self::Elbrus => "Elbrus",
            Self::Everest => "Everest",
            Self::Fuji => "Fuji",
            Self::Kilimanjaro => "Kilimanjaro",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, DomainError> {
        let normalized = name.trim();
        Self::ALL
            .into_iter()
            .find(|room| room.name().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| DomainError::RoomNotFound(normalized.to_owned()))
    }
}

impl fmt::Display for MeetingRoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MeetingRoom {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_name(value)
    }
}

#[cfg(test)]
mod tests {
    use super::MeetingRoom;
    use crate::errors::DomainError;

    #[test]
    fn resolves_room_names_case_insensitively() {
        assert_eq!(MeetingRoom::from_name(" everest "), Ok(MeetingRoom::Everest));
        assert_eq!("FUJI".parse::<MeetingRoom>(), Ok(MeetingRoom::Fuji));
    }

    #[test]
    fn unknown_room_name_is_rejected() {
        assert_eq!(
            MeetingRoom::from_name("Atlantis"),
            Err(DomainError::RoomNotFound("Atlantis".to_owned()))
        );
    }

    #[test]
    fn every_room_round_trips_through_its_display_name() {
        for room in MeetingRoom::ALL {
            assert_eq!(MeetingRoom::from_name(&room.to_string()), Ok(room));
        }
    }
}
