//! Slack integration - Events API and interactive modal interface
//!
//! This crate provides the Slack surface for roombot:
//! - **Payloads** (`payloads`) - Events API and interaction documents Slack posts to us
//! - **Events** (`events`) - dispatcher routing those payloads to handlers
//! - **Flow** (`flow`) - the reserve, view, change and cancel modal flows
//! - **Block Kit** (`blocks`, `modals`) - typed views and the factories that build them
//! - **Web API** (`client`) - `views.open`, `views.push` and `chat.postMessage`
//!
//! # Architecture
//!
//! ```text
//! HTTP webhook → EventDispatcher → Handlers → ReservationFlow → ReservationService
//!                                                   ↓
//!                                   SlackApi (views.open/push) / response_action
//! ```
//!
//! # Key Types
//!
//! - `EventDispatcher` - routes events to the handler registered for their type
//! - `ReservationFlow` - turns button clicks and modal submissions into calendar calls
//! - `MessageBuilder` / `ModalView` - construct Block Kit payloads
//! - `SlackApi` - trait over the Web API methods roombot calls

pub mod blocks;
pub mod client;
pub mod events;
pub mod flow;
pub mod modals;
pub mod payloads;
