//! Actions for the check-in workflow.

use super::types::CheckInStep;
use reception_core::model::{BookingLookup, Configuration, Event, Person};
use reception_core::scanner::CameraDevice;

/// Every input the desk reacts to: staff commands, decoded codes and the
/// results of the calls the reducer issued.
///
/// Lookup results carry the sequence number of the lookup that issued them so
/// late answers for a closed or replaced modal are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckinAction {
    // ===== Startup =====
    /// Configure the API client, load events and enumerate devices
    Initialize,

    // ===== Settings =====
    /// Show the settings panel; stops a running scan
    OpenSettings,
    /// Hide the settings panel
    CloseSettings,
    /// Persist new connection settings
    SaveSettings {
        /// Base URL as typed
        api_url: String,
        /// Bearer credential
        api_key: String,
    },
    /// Persist new reward defaults
    SetRewardDefaults {
        /// Default score
        score: i64,
        /// Default coins
        coin: i64,
    },
    /// Configuration persisted and applied
    SettingsSaved {
        /// The stored configuration
        configuration: Configuration,
    },
    /// Configuration could not be persisted
    SettingsSaveFailed {
        /// Reason
        error: String,
    },

    // ===== Events =====
    /// Fetch the event list
    LoadEvents,
    /// Event list fetched (unfiltered)
    EventsLoaded {
        /// Events as returned by the API
        events: Vec<Event>,
    },
    /// Event list request failed
    EventsFailed {
        /// Reason
        error: String,
    },
    /// Choose the event lookups run against; empty clears the selection
    SelectEvent {
        /// Event id
        event_id: String,
    },

    // ===== Scanner =====
    /// Enumerate capture devices
    ListDevices,
    /// Devices enumerated
    DevicesListed {
        /// Available devices
        devices: Vec<CameraDevice>,
    },
    /// Enumeration failed
    DevicesFailed {
        /// Reason
        error: String,
    },
    /// Choose the capture device
    SelectDevice {
        /// Device id
        device_id: String,
    },
    /// Start the decode session
    StartScanning,
    /// Decode session running
    ScannerStarted {
        /// Device in use
        device_id: String,
    },
    /// Decode session could not start
    ScannerFailed {
        /// Reason
        error: String,
    },
    /// Stop the decode session
    StopScanning,
    /// Decode session stopped
    ScannerStopped,
    /// The decode session produced a code
    CodeDecoded {
        /// Decoded text
        text: String,
    },

    // ===== Lookup =====
    /// Identifier typed by staff
    SubmitIdentifier {
        /// Identifier
        identifier: String,
    },
    /// Person record fetched
    PersonLoaded {
        /// Lookup sequence number
        seq: u64,
        /// The person
        person: Person,
    },
    /// Person record could not be fetched
    PersonFailed {
        /// Lookup sequence number
        seq: u64,
        /// Reason
        error: String,
    },
    /// Booking status fetched; a missing booking is `NotFound`, not a failure
    BookingLoaded {
        /// Lookup sequence number
        seq: u64,
        /// Lookup outcome
        lookup: BookingLookup,
    },
    /// Booking status could not be fetched
    BookingFailed {
        /// Lookup sequence number
        seq: u64,
        /// Reason
        error: String,
    },

    // ===== Register =====
    /// Ask for confirmation before registering
    RequestRegister,
    /// Registration confirmed
    ConfirmRegister,
    /// Registration declined
    CancelRegister,
    /// Booking created
    RegisterSucceeded {
        /// Lookup sequence number
        seq: u64,
    },
    /// Booking could not be created
    RegisterFailed {
        /// Lookup sequence number
        seq: u64,
        /// Reason
        error: String,
    },

    // ===== Check-in =====
    /// Nudge the score input
    AdjustScore {
        /// Amount added
        delta: i64,
    },
    /// Nudge the coin input
    AdjustCoin {
        /// Amount added
        delta: i64,
    },
    /// Set the score input
    SetScore {
        /// New value
        value: i64,
    },
    /// Set the coin input
    SetCoin {
        /// New value
        value: i64,
    },
    /// Run the check-in sequence
    ConfirmCheckIn,
    /// A check-in step succeeded
    CheckInStepSucceeded {
        /// Lookup sequence number
        seq: u64,
        /// Completed step
        step: CheckInStep,
    },
    /// A check-in step failed; remaining steps are abandoned
    CheckInStepFailed {
        /// Lookup sequence number
        seq: u64,
        /// Failed step
        step: CheckInStep,
        /// Reason
        error: String,
    },

    // ===== Modal & toasts =====
    /// Close the person modal and release the desk
    CloseModal,
    /// Toast timer elapsed
    ToastExpired {
        /// Toast the timer belongs to
        id: u64,
    },
}
