//! Check-in workflow.
//!
//! The desk as a single reducer:
//!
//! ```text
//! scan / typed id ─► begin_lookup (guard: processing)
//!                       │
//!                       ▼
//!              LoadingPerson ─► LoadingBooking ─► Rendered(status)
//!                       │              │             │
//!                       └──── Failed ◄─┘             ├─ Register ─► Registering ─► lookup again
//!                                                    └─ CheckIn  ─► status ─► score? ─► coin? ─► closed
//! ```
//!
//! The booking status alone decides which actions are legal
//! ([`decide_ui_state`]). Every network result carries the sequence number of
//! the lookup that issued it; results for a closed or replaced modal are
//! dropped. The check-in sequence is not transactional: a failed score or
//! coin write leaves the booking attended and the modal shows the sequence as
//! partially completed.

pub mod actions;
pub mod environment;
pub mod reducer;
pub mod types;

pub use actions::CheckinAction;
pub use environment::{CheckinEnvironment, ReceptionEnvironment};
pub use reducer::CheckinReducer;
pub use types::{
    ActionPanel, CheckInProgress, CheckInStep, Modal, Phase, ReceptionState, ScannerState,
    ScannerStatus, Toast, ToastKind, WorkflowError, decide_ui_state,
};
