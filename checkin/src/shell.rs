//! Line commands for the terminal desk.
//!
//! [`parse`] turns one input line into a [`Command`]; [`Command::into_action`]
//! resolves it against the current state into a workflow action. Shell-level
//! commands (`help`, `show`, `quit`) never reach the store.

use crate::workflow::{CheckinAction, CheckinReducer, ReceptionEnvironment, ReceptionState};
use reception_runtime::Store;
use thiserror::Error;
use tokio::sync::mpsc;

/// Step applied by `score +` and `coin -`.
pub const REWARD_STEP: i64 = 10;

/// Help text listing every command.
pub const HELP: &str = "\
Commands:
  settings                     open settings (stops scanning)
  settings save <url> <key>    save API base URL and key
  settings close               close settings
  defaults <score> <coin>      save default check-in rewards
  events                       reload the event list
  select <n|event-id>          choose the event
  cameras                      list capture devices
  camera <device-id>           choose the capture device
  start | stop                 start or stop scanning
  id <identifier>              look up a person by typed identifier
  register, yes, no            register the person (with confirmation)
  score <+|-|N>, coin <+|-|N>  adjust check-in rewards by 10 or set them
  checkin                      confirm check-in
  close                        close the person view
  show | help | quit";

/// Errors from parsing or resolving a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Nothing typed
    #[error("empty command")]
    Empty,

    /// First word is not a command
    #[error("unknown command '{0}', type 'help'")]
    UnknownCommand(String),

    /// Arguments missing
    #[error("usage: {0}")]
    Usage(&'static str),

    /// A number did not parse
    #[error("'{0}' is not a number")]
    InvalidNumber(String),

    /// `select` did not match any listed event
    #[error("no event '{0}' in the list")]
    UnknownEvent(String),
}

/// How a reward input is changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardEdit {
    /// Add to the current value
    Adjust(i64),
    /// Replace the current value
    Set(i64),
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print help
    Help,
    /// Re-render the screen
    Show,
    /// Leave the desk
    Quit,
    /// Open settings
    OpenSettings,
    /// Save connection settings
    SaveSettings {
        /// Base URL
        api_url: String,
        /// Credential
        api_key: String,
    },
    /// Close settings
    CloseSettings,
    /// Save reward defaults
    Defaults {
        /// Default score
        score: i64,
        /// Default coins
        coin: i64,
    },
    /// Reload events
    Events,
    /// Select an event by list position or id
    Select(String),
    /// Enumerate devices
    Cameras,
    /// Select a device
    Camera(String),
    /// Start scanning
    Start,
    /// Stop scanning
    Stop,
    /// Manual identifier entry
    Identifier(String),
    /// Ask to register
    Register,
    /// Confirm registration
    Yes,
    /// Decline registration
    No,
    /// Change the score input
    Score(RewardEdit),
    /// Change the coin input
    Coin(RewardEdit),
    /// Confirm check-in
    CheckIn,
    /// Close the person view
    Close,
}

/// Parse one input line.
///
/// # Errors
///
/// Returns a [`ParseError`] describing what is wrong with the line.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(ParseError::Empty);
    };
    let args: Vec<&str> = words.collect();

    let command = match (head.to_lowercase().as_str(), args.as_slice()) {
        ("help" | "?", _) => Command::Help,
        ("show", _) => Command::Show,
        ("quit" | "exit", _) => Command::Quit,
        ("settings", []) => Command::OpenSettings,
        ("settings", ["save", url, key]) => Command::SaveSettings {
            api_url: (*url).to_string(),
            api_key: (*key).to_string(),
        },
        ("settings", ["close"]) => Command::CloseSettings,
        ("settings", _) => return Err(ParseError::Usage("settings [save <url> <key> | close]")),
        ("defaults", [score, coin]) => Command::Defaults {
            score: number(score)?,
            coin: number(coin)?,
        },
        ("defaults", _) => return Err(ParseError::Usage("defaults <score> <coin>")),
        ("events", _) => Command::Events,
        ("select", [key]) => Command::Select((*key).to_string()),
        ("select", _) => return Err(ParseError::Usage("select <n|event-id>")),
        ("cameras", _) => Command::Cameras,
        ("camera", [id]) => Command::Camera((*id).to_string()),
        ("camera", _) => return Err(ParseError::Usage("camera <device-id>")),
        ("start", _) => Command::Start,
        ("stop", _) => Command::Stop,
        ("id", []) => return Err(ParseError::Usage("id <identifier>")),
        ("id", rest) => Command::Identifier(rest.join(" ")),
        ("register", _) => Command::Register,
        ("yes" | "y", _) => Command::Yes,
        ("no" | "n", _) => Command::No,
        ("score", [edit]) => Command::Score(reward_edit(edit)?),
        ("score", _) => return Err(ParseError::Usage("score <+|-|N>")),
        ("coin", [edit]) => Command::Coin(reward_edit(edit)?),
        ("coin", _) => return Err(ParseError::Usage("coin <+|-|N>")),
        ("checkin", _) => Command::CheckIn,
        ("close", _) => Command::Close,
        (other, _) => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(command)
}

fn number(raw: &str) -> Result<i64, ParseError> {
    raw.parse().map_err(|_| ParseError::InvalidNumber(raw.to_string()))
}

/// `+`/`-` step by ten, `+N`/`-N` adjust by N, bare `N` sets.
fn reward_edit(raw: &str) -> Result<RewardEdit, ParseError> {
    match raw {
        "+" => Ok(RewardEdit::Adjust(REWARD_STEP)),
        "-" => Ok(RewardEdit::Adjust(-REWARD_STEP)),
        _ if raw.starts_with('+') || raw.starts_with('-') => number(raw).map(RewardEdit::Adjust),
        _ => number(raw).map(RewardEdit::Set),
    }
}

impl Command {
    /// Workflow action for this command; `None` for shell-level commands.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownEvent`] when `select` matches nothing.
    pub fn into_action(self, state: &ReceptionState) -> Result<Option<CheckinAction>, ParseError> {
        let action = match self {
            Self::Help | Self::Show | Self::Quit => return Ok(None),
            Self::OpenSettings => CheckinAction::OpenSettings,
            Self::SaveSettings { api_url, api_key } => {
                CheckinAction::SaveSettings { api_url, api_key }
            },
            Self::CloseSettings => CheckinAction::CloseSettings,
            Self::Defaults { score, coin } => CheckinAction::SetRewardDefaults { score, coin },
            Self::Events => CheckinAction::LoadEvents,
            Self::Select(key) => {
                let event = state
                    .events
                    .resolve(&key)
                    .ok_or(ParseError::UnknownEvent(key))?;
                CheckinAction::SelectEvent {
                    event_id: event.id.clone(),
                }
            },
            Self::Cameras => CheckinAction::ListDevices,
            Self::Camera(device_id) => CheckinAction::SelectDevice { device_id },
            Self::Start => CheckinAction::StartScanning,
            Self::Stop => CheckinAction::StopScanning,
            Self::Identifier(identifier) => CheckinAction::SubmitIdentifier { identifier },
            Self::Register => CheckinAction::RequestRegister,
            Self::Yes => CheckinAction::ConfirmRegister,
            Self::No => CheckinAction::CancelRegister,
            Self::Score(RewardEdit::Adjust(delta)) => CheckinAction::AdjustScore { delta },
            Self::Score(RewardEdit::Set(value)) => CheckinAction::SetScore { value },
            Self::Coin(RewardEdit::Adjust(delta)) => CheckinAction::AdjustCoin { delta },
            Self::Coin(RewardEdit::Set(value)) => CheckinAction::SetCoin { value },
            Self::CheckIn => CheckinAction::ConfirmCheckIn,
            Self::Close => CheckinAction::CloseModal,
        };
        Ok(Some(action))
    }
}

/// Store driven by the shell.
pub type DeskStore = Store<ReceptionState, CheckinAction, ReceptionEnvironment, CheckinReducer>;

/// Send queued actions to `store` one at a time until the queue closes.
///
/// Each action, effects included, completes before the next is reduced.
pub async fn dispatch(store: DeskStore, mut queue: mpsc::Receiver<CheckinAction>) {
    while let Some(action) = queue.recv().await {
        if let Err(error) = store.send(action).await {
            tracing::debug!(%error, "Command dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;
    use crate::events::EventList;
    use chrono::{TimeZone, Utc};
    use reception_core::model::Event;

    #[test]
    fn test_parse_settings_forms() {
        assert_eq!(parse("settings"), Ok(Command::OpenSettings));
        assert_eq!(
            parse("settings save https://api.test/ secret"),
            Ok(Command::SaveSettings {
                api_url: "https://api.test/".into(),
                api_key: "secret".into(),
            })
        );
        assert_eq!(parse("Settings close"), Ok(Command::CloseSettings));
        assert!(matches!(parse("settings save onlyurl"), Err(ParseError::Usage(_))));
    }

    #[test]
    fn test_parse_reward_edits() {
        assert_eq!(parse("score +"), Ok(Command::Score(RewardEdit::Adjust(10))));
        assert_eq!(parse("coin -"), Ok(Command::Coin(RewardEdit::Adjust(-10))));
        assert_eq!(parse("score +5"), Ok(Command::Score(RewardEdit::Adjust(5))));
        assert_eq!(parse("coin 30"), Ok(Command::Coin(RewardEdit::Set(30))));
        assert_eq!(
            parse("score lots"),
            Err(ParseError::InvalidNumber("lots".into()))
        );
    }

    #[test]
    fn test_parse_identifier_and_errors() {
        assert_eq!(parse("id  U123 "), Ok(Command::Identifier("U123".into())));
        assert_eq!(parse("   "), Err(ParseError::Empty));
        assert_eq!(parse("dance"), Err(ParseError::UnknownCommand("dance".into())));
        assert!(matches!(parse("id"), Err(ParseError::Usage(_))));
    }

    #[test]
    fn test_select_resolves_against_list() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let mut state = ReceptionState::default();
        state.events = EventList::Loaded(vec![Event {
            id: "EV7".into(),
            name: "Open Day".into(),
            start_time: start,
            end_time: start,
        }]);

        let action = parse("select 1").unwrap().into_action(&state).unwrap();
        assert_eq!(
            action,
            Some(CheckinAction::SelectEvent {
                event_id: "EV7".into()
            })
        );

        let missing = parse("select 4").unwrap().into_action(&state);
        assert_eq!(missing, Err(ParseError::UnknownEvent("4".into())));
    }

    #[test]
    fn test_shell_commands_have_no_action() {
        let state = ReceptionState::default();
        for line in ["help", "show", "quit"] {
            assert_eq!(parse(line).unwrap().into_action(&state), Ok(None));
        }
    }
}
