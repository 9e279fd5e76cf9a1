//! Domain model shared by the client, the workflow and the test mocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Connection settings and reward defaults persisted between sessions.
///
/// Field names on the wire (`apiUrl`, `apiKey`) match the record written by
/// earlier versions of the desk so existing storage keeps loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Base URL of the REST API, without trailing slash
    #[serde(default)]
    pub api_url: String,

    /// Bearer credential
    #[serde(default)]
    pub api_key: String,

    /// Score pre-filled in the check-in panel
    #[serde(default)]
    pub default_score: i64,

    /// Coins pre-filled in the check-in panel
    #[serde(default)]
    pub default_coin: i64,
}

impl Configuration {
    /// Build a configuration from user input, normalizing the base URL.
    #[must_use]
    pub fn new(api_url: &str, api_key: &str) -> Self {
        Self {
            api_url: normalize_base_url(api_url),
            api_key: api_key.to_string(),
            default_score: 0,
            default_coin: 0,
        }
    }

    /// Both the base URL and the credential are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.api_url.is_empty() && !self.api_key.is_empty()
    }

    /// Replace the connection settings, keeping reward defaults.
    #[must_use]
    pub fn with_connection(mut self, api_url: &str, api_key: &str) -> Self {
        self.api_url = normalize_base_url(api_url);
        self.api_key = api_key.to_string();
        self
    }

    /// Replace the reward defaults.
    #[must_use]
    pub const fn with_reward_defaults(mut self, score: i64, coin: i64) -> Self {
        self.default_score = score;
        self.default_coin = coin;
        self
    }
}

/// Strip a single trailing `/` so endpoint paths can be appended verbatim.
#[must_use]
pub fn normalize_base_url(url: &str) -> String {
    url.strip_suffix('/').unwrap_or(url).to_string()
}

/// An event people can book and attend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub id: String,
    /// Display name, also used as the reward description
    pub name: String,
    /// When the event starts
    pub start_time: DateTime<Utc>,
    /// When the event ends
    pub end_time: DateTime<Utc>,
}

/// A person looked up by scanned or typed identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Person identifier
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    /// Display name
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub name: Option<String>,

    /// School grade
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub grade: Option<String>,

    /// Club, team or organisation
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub affiliation: Option<String>,

    /// Student number
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub student_id: Option<String>,
}

impl Person {
    /// A person with only an id and a name.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            grade: None,
            affiliation: None,
            student_id: None,
        }
    }

    /// Non-empty identity tags in display order: grade, affiliation, student id.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        [&self.grade, &self.affiliation, &self.student_id]
            .into_iter()
            .filter_map(|tag| tag.as_deref())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

/// Booking state of a person for one event.
///
/// This is the single source of truth for which desk actions are legal.
/// Status strings the desk does not know are kept verbatim in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    /// No booking exists
    None,
    /// Booking was cancelled
    Cancelled,
    /// Booking was rejected
    Rejected,
    /// Booking is confirmed
    Confirmed,
    /// Booking came through the lottery
    Lottery,
    /// Person has been checked in
    Attended,
    /// A status string this desk does not recognise
    Unknown(String),
}

impl BookingStatus {
    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
            Self::Confirmed => "confirmed",
            Self::Lottery => "lottery",
            Self::Attended => "attended",
            Self::Unknown(raw) => raw,
        }
    }
}

impl FromStr for BookingStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "none" => Self::None,
            "cancelled" => Self::Cancelled,
            "rejected" => Self::Rejected,
            "confirmed" => Self::Confirmed,
            "lottery" => Self::Lottery,
            "attended" => Self::Attended,
            other => Self::Unknown(other.to_string()),
        })
    }
}

impl From<String> for BookingStatus {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl From<BookingStatus> for String {
    fn from(value: BookingStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a booking-status lookup.
///
/// A missing booking is a normal answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingLookup {
    /// The API returned a booking with this status
    Found(BookingStatus),
    /// The API reported no booking for this person and event
    NotFound,
}

impl BookingLookup {
    /// Collapse into a status, `none` when absent.
    #[must_use]
    pub fn status(self) -> BookingStatus {
        match self {
            Self::Found(status) => status,
            Self::NotFound => BookingStatus::None,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;

    #[test]
    fn test_normalize_strips_one_trailing_slash() {
        assert_eq!(normalize_base_url("https://api.example.com/"), "https://api.example.com");
        assert_eq!(normalize_base_url("https://api.example.com"), "https://api.example.com");
        assert_eq!(normalize_base_url(""), "");
    }

    #[test]
    fn test_configuration_completeness() {
        assert!(!Configuration::default().is_complete());
        assert!(!Configuration::new("https://api.example.com", "").is_complete());
        assert!(!Configuration::new("", "key").is_complete());
        assert!(Configuration::new("https://api.example.com/", "key").is_complete());
    }

    #[test]
    fn test_configuration_reads_legacy_record() {
        let config: Configuration =
            serde_json::from_str(r#"{"apiUrl":"https://x.test","apiKey":"k"}"#).unwrap();
        assert_eq!(config.api_url, "https://x.test");
        assert_eq!(config.default_score, 0);
        assert_eq!(config.default_coin, 0);
    }

    #[test]
    fn test_person_accepts_numeric_fields() {
        let person: Person = serde_json::from_str(
            r#"{"id":42,"name":"Aiko","grade":3,"affiliation":"","student_id":null}"#,
        )
        .unwrap();
        assert_eq!(person.id, "42");
        assert_eq!(person.grade.as_deref(), Some("3"));
        assert_eq!(person.tags(), vec!["3"]);
    }

    #[test]
    fn test_booking_status_parsing() {
        assert_eq!("lottery".parse::<BookingStatus>(), Ok(BookingStatus::Lottery));
        assert_eq!(
            BookingStatus::from("waitlist".to_string()),
            BookingStatus::Unknown("waitlist".to_string())
        );
        let json = serde_json::to_string(&BookingStatus::Attended).unwrap();
        assert_eq!(json, r#""attended""#);
    }

    #[test]
    fn test_missing_booking_is_none() {
        assert_eq!(BookingLookup::NotFound.status(), BookingStatus::None);
        assert_eq!(
            BookingLookup::Found(BookingStatus::Confirmed).status(),
            BookingStatus::Confirmed
        );
    }
}
