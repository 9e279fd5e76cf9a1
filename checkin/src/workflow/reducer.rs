//! Reducer for the check-in workflow.

use super::actions::CheckinAction;
use super::environment::{CheckinEnvironment, ReceptionEnvironment};
use super::types::{
    ActionPanel, CheckInProgress, CheckInStep, Modal, Phase, ReceptionState, ScannerStatus, Toast,
    ToastKind, WorkflowError, decide_ui_state,
};
use crate::events::{EventList, select_active};
use reception_core::model::{BookingStatus, Configuration};
use reception_core::{effect::Effect, reducer::Reducer};
use smallvec::{SmallVec, smallvec};
use std::time::Duration;

type Effects = SmallVec<[Effect<CheckinAction>; 4]>;

/// How long a toast stays visible.
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

/// Shown in the modal when a lookup fails.
pub const LOOKUP_FAILED_MESSAGE: &str = "Could not find user or error occurred.";

/// Toast for a failed lookup.
pub const LOAD_FAILED_TOAST: &str = "Failed to load user data";

/// Starting a scan without any device.
pub const NO_CAMERA_MESSAGE: &str = "No camera selected.";

/// Device enumeration failed.
pub const CAMERA_ERROR_MESSAGE: &str = "Camera Error (Check Permissions)";

/// Reducer driving the desk: settings, event picker, scanner and the
/// lookup → register / check-in workflow.
///
/// Scan and manual entry share one guarded entry point: a lookup starts only
/// when no other lookup owns the desk, and the desk stays owned until the
/// modal closes.
#[derive(Debug, Clone, Copy)]
pub struct CheckinReducer;

impl CheckinReducer {
    /// Create a new check-in reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for CheckinReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for CheckinReducer {
    type State = ReceptionState;
    type Action = CheckinAction;
    type Environment = ReceptionEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects {
        match action {
            // ========== Startup ==========
            CheckinAction::Initialize => {
                let api = env.api();
                let config = state.config.clone();
                let mut effects: Effects = smallvec![Effect::fire_and_forget(async move {
                    api.configure(&config);
                })];
                effects.push(load_events(state, env));
                effects.push(list_devices(env));
                effects
            },

            // ========== Settings ==========
            CheckinAction::OpenSettings => {
                state.settings_open = true;
                stop_scanning(state, env)
            },

            CheckinAction::CloseSettings => {
                state.settings_open = false;
                smallvec![Effect::None]
            },

            CheckinAction::SaveSettings { api_url, api_key } => {
                let configuration = state.config.clone().with_connection(&api_url, &api_key);
                smallvec![persist(env, configuration)]
            },

            CheckinAction::SetRewardDefaults { score, coin } => {
                let configuration = state.config.clone().with_reward_defaults(score, coin);
                smallvec![persist(env, configuration)]
            },

            CheckinAction::SettingsSaved { configuration } => {
                tracing::info!(api_url = %configuration.api_url, "Settings saved");
                state.config = configuration;
                state.settings_open = false;
                state.alert = None;
                smallvec![
                    toast(state, "Settings saved", ToastKind::Success),
                    load_events(state, env),
                ]
            },

            CheckinAction::SettingsSaveFailed { error } => {
                tracing::error!(%error, "Failed to persist settings");
                smallvec![toast(
                    state,
                    format!("Failed to save settings: {error}"),
                    ToastKind::Error
                )]
            },

            // ========== Events ==========
            CheckinAction::LoadEvents => smallvec![load_events(state, env)],

            CheckinAction::EventsLoaded { events } => {
                let total = events.len();
                let active = select_active(events, env.clock().now());
                tracing::info!(total, active = active.len(), "Events loaded");

                if state
                    .selected_event
                    .as_ref()
                    .is_some_and(|id| !active.iter().any(|event| &event.id == id))
                {
                    state.selected_event = None;
                }
                state.events = EventList::from_active(active);
                smallvec![Effect::None]
            },

            CheckinAction::EventsFailed { error } => {
                tracing::warn!(%error, "Failed to load events");
                state.events = EventList::Failed(error);
                smallvec![Effect::None]
            },

            CheckinAction::SelectEvent { event_id } => {
                if event_id.is_empty() {
                    state.selected_event = None;
                } else if state.events.find(&event_id).is_some() {
                    tracing::info!(%event_id, "Event selected");
                    state.selected_event = Some(event_id);
                    state.alert = None;
                } else {
                    tracing::debug!(%event_id, "Ignoring unknown event");
                }
                smallvec![Effect::None]
            },

            // ========== Scanner ==========
            CheckinAction::ListDevices => smallvec![list_devices(env)],

            CheckinAction::DevicesListed { devices } => {
                tracing::info!(count = devices.len(), "Capture devices listed");
                state.scanner.selected_device = devices.last().map(|device| device.id.clone());
                state.scanner.devices = devices;
                state.scanner.error = None;
                smallvec![Effect::None]
            },

            CheckinAction::DevicesFailed { error } => {
                tracing::warn!(%error, "Failed to list capture devices");
                state.scanner.error = Some(CAMERA_ERROR_MESSAGE.to_string());
                smallvec![Effect::None]
            },

            CheckinAction::SelectDevice { device_id } => {
                if state.scanner.devices.iter().any(|device| device.id == device_id) {
                    state.scanner.selected_device = Some(device_id);
                } else {
                    tracing::debug!(%device_id, "Ignoring unknown device");
                }
                smallvec![Effect::None]
            },

            CheckinAction::StartScanning => {
                if state.scanner.status != ScannerStatus::Idle {
                    tracing::debug!(status = ?state.scanner.status, "Start ignored");
                    return smallvec![Effect::None];
                }
                if check_prerequisites(state).is_err() {
                    return smallvec![Effect::None];
                }

                let device = state.scanner.selected_device.clone().or_else(|| {
                    state.scanner.devices.first().map(|device| device.id.clone())
                });
                let Some(device_id) = device else {
                    state.alert = Some(NO_CAMERA_MESSAGE.to_string());
                    return smallvec![Effect::None];
                };

                state.scanner.status = ScannerStatus::Starting;
                state.scanner.selected_device = Some(device_id.clone());
                state.scanner.error = None;

                let scanner = env.scanner();
                smallvec![Effect::task(async move {
                    match scanner.start(&device_id).await {
                        Ok(()) => CheckinAction::ScannerStarted { device_id },
                        Err(error) => CheckinAction::ScannerFailed {
                            error: error.to_string(),
                        },
                    }
                })]
            },

            CheckinAction::ScannerStarted { device_id } => {
                if state.scanner.status == ScannerStatus::Starting {
                    tracing::info!(%device_id, "Scanning");
                    state.scanner.status = ScannerStatus::Active;
                    smallvec![Effect::None]
                } else {
                    // Stop was requested while starting
                    state.scanner.status = ScannerStatus::Active;
                    stop_scanning(state, env)
                }
            },

            CheckinAction::ScannerFailed { error } => {
                tracing::warn!(%error, "Failed to start scanning");
                state.scanner.status = ScannerStatus::Idle;
                smallvec![toast(
                    state,
                    format!("Failed to start camera: {error}"),
                    ToastKind::Error
                )]
            },

            CheckinAction::StopScanning => stop_scanning(state, env),

            CheckinAction::ScannerStopped => {
                if state.scanner.status == ScannerStatus::Stopping {
                    state.scanner.status = ScannerStatus::Idle;
                }
                smallvec![Effect::None]
            },

            CheckinAction::CodeDecoded { text } => {
                if !state.is_scanning() {
                    tracing::trace!("Decode ignored, scanner not active");
                    return smallvec![Effect::None];
                }
                begin_lookup(state, env, &text)
            },

            // ========== Lookup ==========
            CheckinAction::SubmitIdentifier { identifier } => begin_lookup(state, env, &identifier),

            CheckinAction::PersonLoaded { seq, person } => {
                let Some(modal) = state.current_modal(seq) else {
                    tracing::debug!(seq, "Stale person result ignored");
                    return smallvec![Effect::None];
                };
                if modal.phase != Phase::LoadingPerson {
                    return smallvec![Effect::None];
                }

                let event_id = modal.event_id.clone();
                let person_id = person.id.clone();
                modal.person = Some(person);
                modal.phase = Phase::LoadingBooking;

                let api = env.api();
                smallvec![Effect::task(async move {
                    match api.booking_status(&event_id, &person_id).await {
                        Ok(lookup) => CheckinAction::BookingLoaded { seq, lookup },
                        Err(error) => CheckinAction::BookingFailed {
                            seq,
                            error: error.to_string(),
                        },
                    }
                })]
            },

            CheckinAction::PersonFailed { seq, error }
            | CheckinAction::BookingFailed { seq, error } => fail_lookup(state, seq, &error),

            CheckinAction::BookingLoaded { seq, lookup } => {
                let status = lookup.status();
                let panel = decide_ui_state(&status, &state.config, env.clock().now());

                let Some(modal) = state.current_modal(seq) else {
                    tracing::debug!(seq, "Stale booking result ignored");
                    return smallvec![Effect::None];
                };
                if modal.phase != Phase::LoadingBooking {
                    return smallvec![Effect::None];
                }

                tracing::info!(person_id = modal.person_id(), %status, "Booking status loaded");
                modal.booking = Some(status);
                modal.panel = panel;
                modal.phase = Phase::Rendered;
                modal.error = None;
                smallvec![Effect::None]
            },

            // ========== Register ==========
            CheckinAction::RequestRegister => {
                if let Some(modal) = rendered_modal(state) {
                    if modal.panel == ActionPanel::Register {
                        modal.confirm_register = true;
                    }
                }
                smallvec![Effect::None]
            },

            CheckinAction::CancelRegister => {
                if let Some(modal) = state.modal.as_mut() {
                    modal.confirm_register = false;
                }
                smallvec![Effect::None]
            },

            CheckinAction::ConfirmRegister => {
                let seq = state.lookup_seq;
                let Some(modal) = rendered_modal(state) else {
                    return smallvec![Effect::None];
                };
                if !modal.confirm_register || modal.panel != ActionPanel::Register {
                    return smallvec![Effect::None];
                }

                modal.confirm_register = false;
                modal.phase = Phase::Registering;
                let event_id = modal.event_id.clone();
                let person_id = modal.person_id().to_string();
                tracing::info!(%person_id, %event_id, "Registering");

                let api = env.api();
                smallvec![Effect::task(async move {
                    match api.create_booking(&event_id, &person_id).await {
                        Ok(()) => CheckinAction::RegisterSucceeded { seq },
                        Err(error) => CheckinAction::RegisterFailed {
                            seq,
                            error: error.to_string(),
                        },
                    }
                })]
            },

            CheckinAction::RegisterSucceeded { seq } => {
                let Some(modal) = state.current_modal(seq) else {
                    return smallvec![Effect::None];
                };
                let person_id = modal.person_id().to_string();
                let event_id = modal.event_id.clone();
                tracing::info!(%person_id, %event_id, "Registered");

                smallvec![
                    toast(state, "User registered successfully", ToastKind::Success),
                    start_lookup(state, env, &person_id, &event_id),
                ]
            },

            CheckinAction::RegisterFailed { seq, error } => {
                let Some(modal) = state.current_modal(seq) else {
                    return smallvec![Effect::None];
                };
                modal.phase = Phase::Rendered;
                tracing::warn!(%error, "Registration failed");
                smallvec![toast(state, format!("Registration failed: {error}"), ToastKind::Error)]
            },

            // ========== Check-in ==========
            CheckinAction::AdjustScore { delta } => {
                edit_rewards(state, |score, _| *score = score.saturating_add(delta));
                smallvec![Effect::None]
            },

            CheckinAction::AdjustCoin { delta } => {
                edit_rewards(state, |_, coin| *coin = coin.saturating_add(delta));
                smallvec![Effect::None]
            },

            CheckinAction::SetScore { value } => {
                edit_rewards(state, |score, _| *score = value);
                smallvec![Effect::None]
            },

            CheckinAction::SetCoin { value } => {
                edit_rewards(state, |_, coin| *coin = value);
                smallvec![Effect::None]
            },

            CheckinAction::ConfirmCheckIn => {
                let seq = state.lookup_seq;
                let Some(modal) = state.modal.as_ref().filter(|m| m.phase == Phase::Rendered)
                else {
                    return smallvec![Effect::None];
                };
                let ActionPanel::CheckIn { score, coin } = modal.panel else {
                    return smallvec![Effect::None];
                };
                let event_id = modal.event_id.clone();
                let person_id = modal.person_id().to_string();
                let progress =
                    CheckInProgress::new(score, coin, state.reward_description(&event_id));

                if let Some(modal) = state.modal.as_mut() {
                    modal.phase = Phase::CheckingIn(CheckInStep::Status);
                    modal.check_in = Some(progress.clone());
                    modal.error = None;
                }
                tracing::info!(%person_id, %event_id, score, coin, "Checking in");

                smallvec![check_in_step(
                    env,
                    seq,
                    CheckInStep::Status,
                    event_id,
                    person_id,
                    &progress
                )]
            },

            CheckinAction::CheckInStepSucceeded { seq, step } => {
                let Some(modal) = state.current_modal(seq) else {
                    return smallvec![Effect::None];
                };
                if modal.phase != Phase::CheckingIn(step) {
                    return smallvec![Effect::None];
                }
                if step == CheckInStep::Status {
                    modal.booking = Some(BookingStatus::Attended);
                }
                let Some(progress) = modal.check_in.as_mut() else {
                    return smallvec![Effect::None];
                };
                progress.completed.push(step);
                let next = progress.next_after(step);
                let progress = progress.clone();

                if let Some(next) = next {
                    modal.phase = Phase::CheckingIn(next);
                    let event_id = modal.event_id.clone();
                    let person_id = modal.person_id().to_string();
                    return smallvec![check_in_step(env, seq, next, event_id, person_id, &progress)];
                }

                tracing::info!(person_id = modal.person_id(), "Check-in complete");
                let mut effects = close_modal(state, env);
                effects.push(toast(state, "Check-in Complete!", ToastKind::Success));
                effects
            },

            CheckinAction::CheckInStepFailed { seq, step, error } => {
                let Some(modal) = state.current_modal(seq) else {
                    return smallvec![Effect::None];
                };
                if modal.phase != Phase::CheckingIn(step) {
                    return smallvec![Effect::None];
                }
                modal.phase = Phase::Rendered;

                let partial = modal.check_in.as_mut().is_some_and(|progress| {
                    progress.failed = Some((step, error.clone()));
                    progress.is_partial()
                });
                let message = if partial {
                    format!("Check-in partially completed: {step} failed ({error})")
                } else {
                    format!("Check-in failed: {error}")
                };
                modal.error = Some(message.clone());
                tracing::warn!(%step, %error, partial, "Check-in step failed");

                smallvec![toast(state, message, ToastKind::Error)]
            },

            // ========== Modal & toasts ==========
            CheckinAction::CloseModal => {
                if state.modal.as_ref().is_some_and(Modal::is_busy) {
                    tracing::debug!("Close ignored while a call is in flight");
                    return smallvec![Effect::None];
                }
                close_modal(state, env)
            },

            CheckinAction::ToastExpired { id } => {
                if state.toast.as_ref().is_some_and(|toast| toast.id == id) {
                    state.toast = None;
                }
                smallvec![Effect::None]
            },
        }
    }
}

/// Show a toast and schedule its expiry.
fn toast(
    state: &mut ReceptionState,
    message: impl Into<String>,
    kind: ToastKind,
) -> Effect<CheckinAction> {
    state.toast_seq += 1;
    let id = state.toast_seq;
    state.toast = Some(Toast {
        id,
        message: message.into(),
        kind,
    });
    Effect::Delay {
        duration: TOAST_DURATION,
        action: Box::new(CheckinAction::ToastExpired { id }),
    }
}

fn load_events(state: &mut ReceptionState, env: &ReceptionEnvironment) -> Effect<CheckinAction> {
    if state.config.api_url.is_empty() {
        state.events = EventList::NotLoaded;
        return Effect::None;
    }

    state.events = EventList::Loading;
    let api = env.api();
    Effect::task(async move {
        match api.list_events().await {
            Ok(events) => CheckinAction::EventsLoaded { events },
            Err(error) => CheckinAction::EventsFailed {
                error: error.to_string(),
            },
        }
    })
}

fn list_devices(env: &ReceptionEnvironment) -> Effect<CheckinAction> {
    let scanner = env.scanner();
    Effect::task(async move {
        match scanner.devices().await {
            Ok(devices) => CheckinAction::DevicesListed { devices },
            Err(error) => CheckinAction::DevicesFailed {
                error: error.to_string(),
            },
        }
    })
}

/// Persist, then apply to the API client.
fn persist(env: &ReceptionEnvironment, configuration: Configuration) -> Effect<CheckinAction> {
    let settings = env.settings();
    let api = env.api();
    Effect::task(async move {
        match settings.save(&configuration).await {
            Ok(()) => {
                api.configure(&configuration);
                CheckinAction::SettingsSaved { configuration }
            },
            Err(error) => CheckinAction::SettingsSaveFailed {
                error: error.to_string(),
            },
        }
    })
}

fn stop_scanning(state: &mut ReceptionState, env: &ReceptionEnvironment) -> Effects {
    match state.scanner.status {
        ScannerStatus::Idle | ScannerStatus::Stopping => smallvec![Effect::None],
        ScannerStatus::Starting | ScannerStatus::Active => {
            state.scanner.status = ScannerStatus::Stopping;
            let scanner = env.scanner();
            smallvec![Effect::task(async move {
                if let Err(error) = scanner.stop().await {
                    tracing::warn!(%error, "Decode session did not stop cleanly");
                }
                CheckinAction::ScannerStopped
            })]
        },
    }
}

/// The one entry point for scanned and typed identifiers.
fn begin_lookup(state: &mut ReceptionState, env: &ReceptionEnvironment, raw: &str) -> Effects {
    let identifier = raw.trim();
    if identifier.is_empty() {
        return smallvec![Effect::None];
    }
    if state.processing {
        tracing::debug!(identifier, "Lookup in flight, input dropped");
        return smallvec![Effect::None];
    }
    let event_id = match check_prerequisites(state) {
        Ok(event_id) => event_id,
        Err(WorkflowError::ConfigMissing) => return stop_scanning(state, env),
        Err(_) => return smallvec![Effect::None],
    };

    state.processing = true;
    let scanner = env.scanner();
    smallvec![
        Effect::fire_and_forget(async move { scanner.pause() }),
        start_lookup(state, env, identifier, &event_id),
    ]
}

/// Selected event id when the desk can use a scan, otherwise raise the alert.
///
/// A missing configuration also opens settings.
fn check_prerequisites(state: &mut ReceptionState) -> Result<String, WorkflowError> {
    let result = if state.config.is_complete() {
        state
            .selected_event
            .clone()
            .ok_or(WorkflowError::PrerequisiteMissing)
    } else {
        state.settings_open = true;
        Err(WorkflowError::ConfigMissing)
    };
    if let Err(error) = &result {
        state.alert = Some(error.to_string());
    }
    result
}

/// Open a fresh modal and fetch the person. Does not check the guard.
fn start_lookup(
    state: &mut ReceptionState,
    env: &ReceptionEnvironment,
    identifier: &str,
    event_id: &str,
) -> Effect<CheckinAction> {
    state.lookup_seq += 1;
    let seq = state.lookup_seq;
    state.alert = None;
    state.modal = Some(Modal::loading(identifier, event_id));
    tracing::info!(identifier, event_id, seq, "Lookup started");

    let api = env.api();
    let person_id = identifier.to_string();
    Effect::task(async move {
        match api.read_person(&person_id).await {
            Ok(person) => CheckinAction::PersonLoaded { seq, person },
            Err(error) => CheckinAction::PersonFailed {
                seq,
                error: error.to_string(),
            },
        }
    })
}

/// Replace whatever the modal showed with the failure state.
fn fail_lookup(state: &mut ReceptionState, seq: u64, error: &str) -> Effects {
    let Some(modal) = state.current_modal(seq) else {
        tracing::debug!(seq, "Stale lookup failure ignored");
        return smallvec![Effect::None];
    };
    if !matches!(modal.phase, Phase::LoadingPerson | Phase::LoadingBooking) {
        return smallvec![Effect::None];
    }

    modal.phase = Phase::Failed;
    modal.person = None;
    modal.booking = None;
    modal.panel = ActionPanel::None;
    modal.confirm_register = false;
    modal.check_in = None;
    modal.error = Some(LOOKUP_FAILED_MESSAGE.to_string());
    tracing::warn!(identifier = %modal.identifier, error, "Lookup failed");

    smallvec![toast(state, LOAD_FAILED_TOAST, ToastKind::Error)]
}

fn rendered_modal(state: &mut ReceptionState) -> Option<&mut Modal> {
    state
        .modal
        .as_mut()
        .filter(|modal| modal.phase == Phase::Rendered)
}

fn edit_rewards(state: &mut ReceptionState, edit: impl FnOnce(&mut i64, &mut i64)) {
    if let Some(ActionPanel::CheckIn { score, coin }) =
        rendered_modal(state).map(|modal| &mut modal.panel)
    {
        edit(score, coin);
    }
}

fn check_in_step(
    env: &ReceptionEnvironment,
    seq: u64,
    step: CheckInStep,
    event_id: String,
    person_id: String,
    progress: &CheckInProgress,
) -> Effect<CheckinAction> {
    let api = env.api();
    let (score, coin) = (progress.score, progress.coin);
    let description = progress.description.clone();

    Effect::task(async move {
        let result = match step {
            CheckInStep::Status => {
                api.update_booking_status(&event_id, &person_id, &BookingStatus::Attended)
                    .await
            },
            CheckInStep::Score => api.write_score(&person_id, score, &description).await,
            CheckInStep::Coin => api.write_coin(&person_id, coin, &description).await,
        };
        match result {
            Ok(()) => CheckinAction::CheckInStepSucceeded { seq, step },
            Err(error) => CheckinAction::CheckInStepFailed {
                seq,
                step,
                error: error.to_string(),
            },
        }
    })
}

/// Drop the modal, release the desk and resume decoding.
fn close_modal(state: &mut ReceptionState, env: &ReceptionEnvironment) -> Effects {
    state.modal = None;
    state.processing = false;
    state.lookup_seq += 1;

    if state.is_scanning() {
        let scanner = env.scanner();
        smallvec![Effect::fire_and_forget(async move { scanner.resume() })]
    } else {
        smallvec![Effect::None]
    }
}
