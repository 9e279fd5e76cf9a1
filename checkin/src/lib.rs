//! # Check-in desk
//!
//! Front desk for event check-in staff: scan a QR code (or type an
//! identifier), see who it is and how they are booked for the selected event,
//! then register them or check them in with optional score and coin rewards.
//!
//! The desk is a thin client over the reception REST API. All decisions live
//! in one reducer ([`workflow::CheckinReducer`]); everything that talks to the
//! outside world sits behind the traits in `reception_core` and is injected
//! through [`workflow::ReceptionEnvironment`].
//!
//! ## Modules
//!
//! - [`config`]: environment settings and the persisted configuration record
//! - [`client`]: HTTP implementation of the API contract
//! - [`events`]: which events are selectable and in what order
//! - [`scanner`]: the single decode session and the line-based scanner
//! - [`workflow`]: state, actions and the reducer
//! - [`presentation`]: text rendering of the state
//! - [`shell`]: line commands

pub mod client;
pub mod config;
pub mod events;
pub mod presentation;
pub mod scanner;
pub mod shell;
pub mod workflow;

pub use client::HttpReceptionApi;
pub use config::{AppSettings, FileSettingsStore};
pub use scanner::{LineCodeReader, ScanSession};
pub use workflow::{CheckinAction, CheckinReducer, ReceptionEnvironment, ReceptionState};
