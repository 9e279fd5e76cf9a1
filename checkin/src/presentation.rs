//! Text rendering of the desk state.
//!
//! Purely reactive: [`render`] reads a [`ReceptionState`] and produces the
//! screen. Nothing here talks to the network or the scanner.

use crate::events::{EventList, event_label};
use crate::workflow::{
    ActionPanel, CheckInStep, Modal, Phase, ReceptionState, ScannerStatus, ToastKind,
};
use reception_core::model::BookingStatus;
use std::fmt::Write;

/// Name shown when a person record has none.
pub const UNKNOWN_USER: &str = "Unknown User";

/// Upper-cased status for the badge.
#[must_use]
pub fn status_badge(status: &BookingStatus) -> String {
    status.as_str().to_uppercase()
}

/// Render the whole screen.
#[must_use]
pub fn render(state: &ReceptionState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "==================== Reception Desk ====================");

    if let Some(alert) = &state.alert {
        let _ = writeln!(out, "!! {alert}");
    }

    render_events(&mut out, state);
    render_scanner(&mut out, state);

    if state.settings_open {
        render_settings(&mut out, state);
    }
    if let Some(modal) = &state.modal {
        render_modal(&mut out, modal);
    }
    if let Some(toast) = &state.toast {
        let marker = match toast.kind {
            ToastKind::Info => "i",
            ToastKind::Success => "+",
            ToastKind::Error => "x",
        };
        let _ = writeln!(out, "[{marker}] {}", toast.message);
    }

    out
}

fn render_events(out: &mut String, state: &ReceptionState) {
    let _ = write!(out, "Event:  ");
    match &state.events {
        EventList::NotLoaded => {
            let _ = writeln!(out, "(configure the API to load events)");
        },
        EventList::Loading => {
            let _ = writeln!(out, "Loading events...");
        },
        EventList::Empty => {
            let _ = writeln!(out, "No active events found");
        },
        EventList::Failed(_) => {
            let _ = writeln!(out, "Error loading events");
        },
        EventList::Loaded(events) => {
            let selected = state.selected_event.as_deref();
            match selected.and_then(|id| state.events.find(id)) {
                Some(event) => {
                    let _ = writeln!(out, "{}", event_label(event));
                },
                None => {
                    let _ = writeln!(out, "-- Select Event --");
                },
            }
            for (index, event) in events.iter().enumerate() {
                let marker = if selected == Some(event.id.as_str()) { '*' } else { ' ' };
                let _ = writeln!(out, "  {marker}{:>2}. {}", index + 1, event_label(event));
            }
        },
    }
}

fn render_scanner(out: &mut String, state: &ReceptionState) {
    let scanner = &state.scanner;
    let camera = if let Some(error) = &scanner.error {
        error.clone()
    } else if scanner.devices.is_empty() {
        "No cameras found".to_string()
    } else {
        scanner
            .selected_device
            .as_deref()
            .and_then(|id| scanner.devices.iter().find(|device| device.id == id))
            .map_or_else(|| "none".to_string(), reception_core::scanner::CameraDevice::display_label)
    };
    let status = match scanner.status {
        ScannerStatus::Idle => "stopped",
        ScannerStatus::Starting => "starting",
        ScannerStatus::Active => "scanning",
        ScannerStatus::Stopping => "stopping",
    };
    let _ = writeln!(out, "Camera: {camera} [{status}]");
}

fn render_settings(out: &mut String, state: &ReceptionState) {
    let config = &state.config;
    let key = if config.api_key.is_empty() { "(not set)" } else { "********" };
    let url = if config.api_url.is_empty() { "(not set)" } else { config.api_url.as_str() };
    let _ = writeln!(out, "---------------------- Settings ------------------------");
    let _ = writeln!(out, "API URL: {url}");
    let _ = writeln!(out, "API Key: {key}");
    let _ = writeln!(
        out,
        "Defaults: score {} / coin {}",
        config.default_score, config.default_coin
    );
    let _ = writeln!(out, "  settings save <url> <key> | defaults <score> <coin> | settings close");
}

fn render_modal(out: &mut String, modal: &Modal) {
    let _ = writeln!(out, "------------------------ Person ------------------------");

    match modal.phase {
        Phase::LoadingPerson | Phase::LoadingBooking => {
            let _ = writeln!(out, "Loading {}...", modal.identifier);
        },
        Phase::Failed => {
            let _ = writeln!(
                out,
                "{}",
                modal.error.as_deref().unwrap_or("Could not find user or error occurred.")
            );
        },
        Phase::Rendered | Phase::Registering | Phase::CheckingIn(_) => {
            render_person(out, modal);
            render_panel(out, modal);
        },
    }
    let _ = writeln!(out, "  close");
}

fn render_person(out: &mut String, modal: &Modal) {
    let name = modal
        .person
        .as_ref()
        .and_then(|person| person.name.as_deref())
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_USER);
    let _ = writeln!(out, "{name}  (ID: {})", modal.person_id());

    if let Some(person) = &modal.person {
        let tags = person.tags();
        if !tags.is_empty() {
            let line: Vec<String> = tags.iter().map(|tag| format!("[{tag}]")).collect();
            let _ = writeln!(out, "{}", line.join(" "));
        }
    }
    if let Some(status) = &modal.booking {
        let _ = writeln!(out, "Status: {}", status_badge(status));
    }
}

fn render_panel(out: &mut String, modal: &Modal) {
    match modal.phase {
        Phase::Registering => {
            let _ = writeln!(out, "Registering...");
            return;
        },
        Phase::CheckingIn(step) => {
            let _ = writeln!(out, "Checking in ({})...", step_label(step));
            return;
        },
        _ => {},
    }

    if let Some(error) = &modal.error {
        let _ = writeln!(out, "!! {error}");
    }

    match &modal.panel {
        ActionPanel::None => {},
        ActionPanel::Register => {
            if modal.confirm_register {
                let _ = writeln!(out, "Register this user for the event? (yes / no)");
            } else {
                let _ = writeln!(out, "Not registered.  register");
            }
        },
        ActionPanel::CheckIn { score, coin } => {
            let _ = writeln!(out, "Score: {score}   Coin: {coin}");
            let _ = writeln!(out, "  score <+|-|N> | coin <+|-|N> | checkin");
        },
        ActionPanel::Attended { checked_in_at } => {
            let _ = writeln!(
                out,
                "Already checked in. Checked in at: {}",
                checked_in_at.format("%Y-%m-%d %H:%M:%S")
            );
        },
        ActionPanel::Unavailable => {
            let _ = writeln!(out, "No action available for this status.");
        },
    }
}

const fn step_label(step: CheckInStep) -> &'static str {
    match step {
        CheckInStep::Status => "marking attended",
        CheckInStep::Score => "writing score",
        CheckInStep::Coin => "writing coins",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;
    use crate::workflow::Toast;
    use chrono::{TimeZone, Utc};
    use reception_core::model::{Event, Person};
    use reception_core::scanner::CameraDevice;

    fn modal(phase: Phase) -> Modal {
        let mut modal = Modal::loading("U123", "EV1");
        modal.phase = phase;
        modal
    }

    #[test]
    fn test_badge_is_upper_case() {
        assert_eq!(status_badge(&BookingStatus::Lottery), "LOTTERY");
        assert_eq!(status_badge(&BookingStatus::Unknown("waitlist".into())), "WAITLIST");
    }

    #[test]
    fn test_picker_states() {
        let mut state = ReceptionState::default();
        state.events = EventList::Empty;
        assert!(render(&state).contains("No active events found"));

        state.events = EventList::Failed("API Error".into());
        assert!(render(&state).contains("Error loading events"));

        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        state.events = EventList::Loaded(vec![Event {
            id: "EV1".into(),
            name: "Open Day".into(),
            start_time: start,
            end_time: start,
        }]);
        let screen = render(&state);
        assert!(screen.contains("-- Select Event --"));
        assert!(screen.contains("1. Open Day (2025-03-01)"));
    }

    #[test]
    fn test_camera_line() {
        let mut state = ReceptionState::default();
        assert!(render(&state).contains("Camera: No cameras found [stopped]"));

        state.scanner.devices = vec![CameraDevice {
            id: "cam0".into(),
            label: "Front Desk".into(),
        }];
        state.scanner.selected_device = Some("cam0".into());
        assert!(render(&state).contains("Camera: Front Desk [stopped]"));

        state.scanner.error = Some("Camera access denied".into());
        assert!(render(&state).contains("Camera: Camera access denied"));
    }

    #[test]
    fn test_person_without_name_and_tags() {
        let mut modal = modal(Phase::Rendered);
        modal.person = Some(Person {
            id: "U123".into(),
            name: None,
            grade: Some("3".into()),
            affiliation: None,
            student_id: Some("S-9".into()),
        });
        modal.booking = Some(BookingStatus::None);
        modal.panel = ActionPanel::Register;

        let mut state = ReceptionState::default();
        state.modal = Some(modal);
        let screen = render(&state);

        assert!(screen.contains("Unknown User  (ID: U123)"));
        assert!(screen.contains("[3] [S-9]"));
        assert!(screen.contains("Status: NONE"));
        assert!(screen.contains("register"));
    }

    #[test]
    fn test_failed_lookup_shows_no_person() {
        let mut failed = modal(Phase::Failed);
        failed.error = Some("Could not find user or error occurred.".into());
        let mut state = ReceptionState::default();
        state.modal = Some(failed);
        state.toast = Some(Toast {
            id: 1,
            message: "Failed to load user data".into(),
            kind: ToastKind::Error,
        });

        let screen = render(&state);
        assert!(screen.contains("Could not find user or error occurred."));
        assert!(screen.contains("[x] Failed to load user data"));
        assert!(!screen.contains("Status:"));
    }
}
