//! Inbound Slack payloads and the identifiers roombot routes on.
//!
//! Events API requests arrive as JSON; interactions arrive form-encoded with
//! the JSON document in the `payload` field. Both are tagged on `type`, and
//! anything roombot does not handle decodes to `Unsupported`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventsApiPayload {
    UrlVerification {
        challenge: String,
    },
    EventCallback(EventCallbackPayload),
    #[serde(other)]
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EventCallbackPayload {
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
    pub event: CallbackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallbackEvent {
    AppMention {
        #[serde(default)]
        user: Option<String>,
        channel: String,
        #[serde(default)]
        text: String,
    },
    Message {
        #[serde(default)]
        user: Option<String>,
        channel: String,
        #[serde(default)]
        bot_id: Option<String>,
        #[serde(default)]
        subtype: Option<String>,
    },
    AppHomeOpened {
        user: String,
        #[serde(default)]
        channel: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

impl CallbackEvent {
    /// Channel to post the menu into. `None` for bot chatter, message edits
    /// and events roombot does not answer.
    pub fn menu_channel(&self) -> Option<&str> {
        match self {
            Self::AppMention { channel, .. } => Some(channel),
            Self::Message { channel, bot_id: None, subtype: None, user: Some(_) } => Some(channel),
            Self::Message { .. } => None,
            Self::AppHomeOpened { user, channel } => Some(channel.as_deref().unwrap_or(user)),
            Self::Unsupported => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionPayload {
    BlockActions(BlockActionsPayload),
    ViewSubmission(ViewSubmissionPayload),
    ViewClosed(ViewClosedPayload),
    #[serde(other)]
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SlackUser {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl SlackUser {
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.username.as_deref()).filter(|name| !name.trim().is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChannelRef {
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BlockActionsPayload {
    pub trigger_id: String,
    pub user: SlackUser,
    #[serde(default)]
    pub channel: Option<ChannelRef>,
    /// Present when the action came from inside a modal.
    #[serde(default)]
    pub view: Option<ViewPayload>,
    #[serde(default)]
    pub actions: Vec<ActionPayload>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ActionPayload {
    pub action_id: String,
    #[serde(default)]
    pub block_id: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ViewSubmissionPayload {
    #[serde(default)]
    pub trigger_id: Option<String>,
    pub user: SlackUser,
    pub view: ViewPayload,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ViewClosedPayload {
    pub user: SlackUser,
    pub view: ViewPayload,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ViewPayload {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub callback_id: String,
    #[serde(default)]
    pub private_metadata: String,
    #[serde(default)]
    pub state: ViewState,
}

/// `view.state.values`, keyed by block id then action id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub values: HashMap<String, HashMap<String, StateValue>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct StateValue {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub selected_date: Option<String>,
    #[serde(default)]
    pub selected_option: Option<SelectedOption>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SelectedOption {
    pub value: String,
}

impl ViewState {
    /// Whatever the input holds: typed text, a picked date or a selected
    /// option value. Blank input reads as `None`.
    pub fn value(&self, block_id: &str, action_id: &str) -> Option<&str> {
        let state = self.values.get(block_id)?.get(action_id)?;
        state
            .value
            .as_deref()
            .or(state.selected_date.as_deref())
            .or(state.selected_option.as_ref().map(|option| option.value.as_str()))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownIdentifier {
    pub kind: &'static str,
    pub value: String,
}

/// Which modal a `view_submission` belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalCallback {
    ReserveDatetimeInput,
    ReserveDetailInput,
    RetrieveDateInput,
    ChangeAndCancelInput,
    ChangeRequest,
    CancelConfirm,
}

impl ModalCallback {
    pub const ALL: [ModalCallback; 6] = [
        Self::ReserveDatetimeInput,
        Self::ReserveDetailInput,
        Self::RetrieveDateInput,
        Self::ChangeAndCancelInput,
        Self::ChangeRequest,
        Self::CancelConfirm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReserveDatetimeInput => "reserve_datetime_input",
            Self::ReserveDetailInput => "reserve_detail_input",
            Self::RetrieveDateInput => "retrieve_date_input",
            Self::ChangeAndCancelInput => "change_and_cancel_input",
            Self::ChangeRequest => "change_request",
            Self::CancelConfirm => "cancel_confirm",
        }
    }
}

impl FromStr for ModalCallback {
    type Err = UnknownIdentifier;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|callback| callback.as_str() == value.trim())
            .ok_or_else(|| UnknownIdentifier { kind: "callback_id", value: value.to_owned() })
    }
}

impl fmt::Display for ModalCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Button actions roombot renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MenuAction {
    Reserve,
    Retrieve,
    ChangeAndCancel,
    SelectRoom,
    Change,
    Cancel,
}

impl MenuAction {
    pub const ALL: [MenuAction; 6] = [
        Self::Reserve,
        Self::Retrieve,
        Self::ChangeAndCancel,
        Self::SelectRoom,
        Self::Change,
        Self::Cancel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reserve => "reserve",
            Self::Retrieve => "retrieve",
            Self::ChangeAndCancel => "change_and_cancel",
            Self::SelectRoom => "select_room",
            Self::Change => "change",
            Self::Cancel => "cancel",
        }
    }
}

impl FromStr for MenuAction {
    type Err = UnknownIdentifier;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == value.trim())
            .ok_or_else(|| UnknownIdentifier { kind: "action_id", value: value.to_owned() })
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
