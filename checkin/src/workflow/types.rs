//! State types for the check-in workflow.

use crate::events::EventList;
use chrono::{DateTime, Utc};
use reception_core::model::{BookingStatus, Configuration, Person};
use reception_core::scanner::CameraDevice;
use std::fmt;
use thiserror::Error;

/// Reward description used when the selected event is not in the list.
pub const FALLBACK_REWARD_DESCRIPTION: &str = "Event Check-in";

/// Errors the workflow surfaces to staff.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// No base URL or credential; blocks every call and opens settings
    #[error("Please configure API Key first.")]
    ConfigMissing,

    /// No event selected; blocks lookups
    #[error("Please select an event first.")]
    PrerequisiteMissing,

    /// Any other failed call; aborts the current step sequence
    #[error("{0}")]
    TransportOrServer(String),
}

/// Whole desk state, owned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceptionState {
    /// Active configuration
    pub config: Configuration,
    /// Event picker contents
    pub events: EventList,
    /// Selected event id
    pub selected_event: Option<String>,
    /// Decode session state
    pub scanner: ScannerState,
    /// A lookup owns the desk until its modal closes
    pub processing: bool,
    /// Incremented whenever a lookup starts or a modal closes; results
    /// carrying an older number are stale
    pub lookup_seq: u64,
    /// Person modal
    pub modal: Option<Modal>,
    /// Settings panel visible
    pub settings_open: bool,
    /// Transient notification
    pub toast: Option<Toast>,
    /// Id of the last toast shown
    pub toast_seq: u64,
    /// Blocking notice shown until the next lookup, selection or save
    pub alert: Option<String>,
}

impl ReceptionState {
    /// Fresh state for a loaded configuration.
    #[must_use]
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Whether a decode session is running.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.scanner.status == ScannerStatus::Active
    }

    /// The modal if `seq` still identifies it.
    pub fn current_modal(&mut self, seq: u64) -> Option<&mut Modal> {
        if seq == self.lookup_seq {
            self.modal.as_mut()
        } else {
            None
        }
    }

    /// Description attached to score and coin writes for `event_id`.
    #[must_use]
    pub fn reward_description(&self, event_id: &str) -> String {
        self.events
            .find(event_id)
            .map(|event| event.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| FALLBACK_REWARD_DESCRIPTION.to_string())
    }
}

/// Decode session lifecycle as seen by the desk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScannerStatus {
    /// No session
    #[default]
    Idle,
    /// Start requested
    Starting,
    /// Session running
    Active,
    /// Stop requested
    Stopping,
}

/// Capture devices and the session status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannerState {
    /// Enumerated devices
    pub devices: Vec<CameraDevice>,
    /// Device used by the next start
    pub selected_device: Option<String>,
    /// Session status
    pub status: ScannerStatus,
    /// Device problem shown next to the camera picker
    pub error: Option<String>,
}

/// Where a lookup currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fetching the person record
    LoadingPerson,
    /// Fetching the booking status
    LoadingBooking,
    /// Person and status shown, actions available
    Rendered,
    /// Booking creation in flight
    Registering,
    /// Check-in step in flight
    CheckingIn(CheckInStep),
    /// Lookup failed; nothing stale is shown
    Failed,
}

/// One call of the check-in sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckInStep {
    /// Booking status set to `attended`
    Status,
    /// Score adjustment
    Score,
    /// Coin adjustment
    Coin,
}

impl fmt::Display for CheckInStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Status => "status update",
            Self::Score => "score",
            Self::Coin => "coins",
        })
    }
}

/// Actions the modal offers for a booking status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPanel {
    /// Nothing decided yet
    None,
    /// Offer registration
    Register,
    /// Offer check-in with adjustable rewards
    CheckIn {
        /// Score delta
        score: i64,
        /// Coin delta
        coin: i64,
    },
    /// Read-only: already checked in
    Attended {
        /// Placeholder check-in time
        checked_in_at: DateTime<Utc>,
    },
    /// Unrecognised status; no action is legal
    Unavailable,
}

/// Map a booking status to the actions that are legal for it.
///
/// Check-in inputs are pre-filled from the configured reward defaults.
#[must_use]
pub fn decide_ui_state(
    status: &BookingStatus,
    config: &Configuration,
    now: DateTime<Utc>,
) -> ActionPanel {
    match status {
        BookingStatus::None | BookingStatus::Cancelled | BookingStatus::Rejected => {
            ActionPanel::Register
        },
        BookingStatus::Confirmed | BookingStatus::Lottery => ActionPanel::CheckIn {
            score: config.default_score,
            coin: config.default_coin,
        },
        BookingStatus::Attended => ActionPanel::Attended { checked_in_at: now },
        BookingStatus::Unknown(_) => ActionPanel::Unavailable,
    }
}

/// Progress of one check-in sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInProgress {
    /// Score delta being applied
    pub score: i64,
    /// Coin delta being applied
    pub coin: i64,
    /// Reward description
    pub description: String,
    /// Steps that succeeded, in order
    pub completed: Vec<CheckInStep>,
    /// Step that failed and why
    pub failed: Option<(CheckInStep, String)>,
}

impl CheckInProgress {
    /// New sequence for the given deltas.
    #[must_use]
    pub fn new(score: i64, coin: i64, description: String) -> Self {
        Self {
            score,
            coin,
            description,
            completed: Vec::new(),
            failed: None,
        }
    }

    /// Steps this sequence issues: status, then each non-zero delta.
    #[must_use]
    pub fn plan(&self) -> Vec<CheckInStep> {
        let mut steps = vec![CheckInStep::Status];
        if self.score != 0 {
            steps.push(CheckInStep::Score);
        }
        if self.coin != 0 {
            steps.push(CheckInStep::Coin);
        }
        steps
    }

    /// Step following `step` in the plan.
    #[must_use]
    pub fn next_after(&self, step: CheckInStep) -> Option<CheckInStep> {
        self.plan().into_iter().find(|candidate| *candidate > step)
    }

    /// Some steps succeeded before one failed.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.failed.is_some() && !self.completed.is_empty()
    }
}

/// The person modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    /// Scanned or typed identifier
    pub identifier: String,
    /// Event the lookup runs against
    pub event_id: String,
    /// Lookup phase
    pub phase: Phase,
    /// Loaded person
    pub person: Option<Person>,
    /// Loaded booking status
    pub booking: Option<BookingStatus>,
    /// Offered actions
    pub panel: ActionPanel,
    /// Registration awaiting confirmation
    pub confirm_register: bool,
    /// Last check-in sequence
    pub check_in: Option<CheckInProgress>,
    /// Error shown in place of person data
    pub error: Option<String>,
}

impl Modal {
    /// Modal for a lookup that just started.
    #[must_use]
    pub fn loading(identifier: &str, event_id: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            event_id: event_id.to_string(),
            phase: Phase::LoadingPerson,
            person: None,
            booking: None,
            panel: ActionPanel::None,
            confirm_register: false,
            check_in: None,
            error: None,
        }
    }

    /// Id of the loaded person, else the identifier that was looked up.
    #[must_use]
    pub fn person_id(&self) -> &str {
        self.person
            .as_ref()
            .map_or(self.identifier.as_str(), |person| person.id.as_str())
    }

    /// A mutating call is in flight.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Registering | Phase::CheckingIn(_))
    }
}

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    /// Neutral
    Info,
    /// Operation succeeded
    Success,
    /// Operation failed
    Error,
}

/// Transient notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Matches the `ToastExpired` that clears it
    pub id: u64,
    /// Text
    pub message: String,
    /// Severity
    pub kind: ToastKind,
}
