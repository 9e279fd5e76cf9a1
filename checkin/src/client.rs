//! HTTP implementation of [`ReceptionApi`].
//!
//! Every call goes through [`HttpReceptionApi::call`]: it refuses to run
//! without a complete configuration, attaches the bearer credential and a JSON
//! content type, and turns any non-success status into an [`ApiError`]
//! carrying the server's `error` message (or a generic fallback). No retries,
//! no caching, no deduplication; callers serialize what must not race.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reception_core::api::{ApiError, ReceptionApi};
use reception_core::model::{BookingLookup, BookingStatus, Configuration, Event, Person};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::{Value, json};
use std::sync::RwLock;

/// Message used when an error response carries no usable `error` field
pub const GENERIC_ERROR: &str = "API Error";

#[derive(Debug, Deserialize)]
struct PersonEnvelope {
    data: Person,
}

#[derive(Debug, Deserialize)]
struct EventsEnvelope {
    /// Kept loose so one malformed record cannot sink the list
    #[serde(default)]
    events: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct EventRecord {
    #[serde(default)]
    event_id: Value,
    #[serde(default)]
    event_name: Value,
    #[serde(default)]
    event_start_datetime: Value,
    #[serde(default)]
    event_end_datetime: Value,
}

impl EventRecord {
    /// Decode one raw list entry, `None` when it is unusable.
    fn parse(raw: Value) -> Option<Event> {
        serde_json::from_value::<Self>(raw).ok()?.into_event()
    }

    /// Convert to an [`Event`], `None` when the id or a timestamp is unusable.
    fn into_event(self) -> Option<Event> {
        let id = match self.event_id {
            Value::String(s) if !s.is_empty() => s,
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let start_time = timestamp_value(&self.event_start_datetime)?;
        let end_time = timestamp_value(&self.event_end_datetime)?;
        let name = match self.event_name {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        };

        Some(Event {
            id,
            name,
            start_time,
            end_time,
        })
    }
}

/// A timestamp given as text or as epoch milliseconds.
fn timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => parse_timestamp(raw),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct BookingStatusEnvelope {
    status: BookingStatus,
}

/// Parse the timestamp formats the API has been seen to emit.
///
/// RFC 3339 first; zone-less date-times and bare dates are read as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// REST client for the reception API.
#[derive(Debug)]
pub struct HttpReceptionApi {
    client: Client,
    configuration: RwLock<Configuration>,
}

impl HttpReceptionApi {
    /// Create a client with the given configuration.
    #[must_use]
    pub fn new(configuration: Configuration) -> Self {
        Self::with_client(Client::new(), configuration)
    }

    /// Create a client reusing an existing `reqwest::Client`.
    #[must_use]
    pub const fn with_client(client: Client, configuration: Configuration) -> Self {
        Self {
            client,
            configuration: RwLock::new(configuration),
        }
    }

    fn configuration(&self) -> Configuration {
        match self.configuration.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Issue one authenticated request and decode the JSON body.
    ///
    /// An empty success body decodes as JSON `null`.
    ///
    /// # Errors
    ///
    /// - [`ApiError::ConfigMissing`] before any network attempt when the base
    ///   URL or credential is empty
    /// - [`ApiError::NotFound`] for 404, [`ApiError::Server`] for any other
    ///   non-success status
    /// - [`ApiError::Transport`] when no response arrives
    /// - [`ApiError::Decode`] when the body does not match `T`
    pub async fn call<T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let configuration = self.configuration();
        if !configuration.is_complete() {
            tracing::warn!(path, "API Config missing");
            return Err(ApiError::ConfigMissing);
        }

        let url = format!("{}{}", configuration.api_url, path);
        tracing::debug!(%method, %url, "API call");

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(&configuration.api_key)
            .header(CONTENT_TYPE, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| GENERIC_ERROR.to_string());

            tracing::warn!(status = status.as_u16(), %message, path, "API call failed");

            return Err(if status == StatusCode::NOT_FOUND {
                ApiError::NotFound { message }
            } else {
                ApiError::Server {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        let value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))?
        };
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ReceptionApi for HttpReceptionApi {
    fn configure(&self, configuration: &Configuration) {
        match self.configuration.write() {
            Ok(mut guard) => *guard = configuration.clone(),
            Err(poisoned) => *poisoned.into_inner() = configuration.clone(),
        }
    }

    async fn read_person(&self, person_id: &str) -> Result<Person, ApiError> {
        let envelope: PersonEnvelope = self
            .call(Method::GET, "/api/user/read", &[("user_id", person_id)], None)
            .await?;
        Ok(envelope.data)
    }

    async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        let envelope: EventsEnvelope = self.call(Method::GET, "/api/events/all", &[], None).await?;
        let total = envelope.events.len();
        let events: Vec<Event> = envelope
            .events
            .into_iter()
            .filter_map(EventRecord::parse)
            .collect();
        if events.len() < total {
            tracing::debug!(skipped = total - events.len(), "Skipped events with unusable id or timestamps");
        }
        Ok(events)
    }

    async fn booking_status(
        &self,
        event_id: &str,
        person_id: &str,
    ) -> Result<BookingLookup, ApiError> {
        let result: Result<BookingStatusEnvelope, ApiError> = self
            .call(
                Method::GET,
                "/api/events/bookings/status",
                &[("event_id", event_id), ("user_id", person_id)],
                None,
            )
            .await;

        match result {
            Ok(envelope) => Ok(BookingLookup::Found(envelope.status)),
            Err(error) if error.is_not_found() => Ok(BookingLookup::NotFound),
            Err(error) => Err(error),
        }
    }

    async fn create_booking(&self, event_id: &str, person_id: &str) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .call(
                Method::POST,
                &format!("/api/events/{event_id}/bookings"),
                &[],
                Some(json!({ "user_id": person_id })),
            )
            .await?;
        Ok(())
    }

    async fn update_booking_status(
        &self,
        event_id: &str,
        person_id: &str,
        status: &BookingStatus,
    ) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .call(
                Method::POST,
                &format!("/api/events/{event_id}/bookings/status"),
                &[],
                Some(json!({ "user_id": person_id, "status": status.as_str() })),
            )
            .await?;
        Ok(())
    }

    async fn write_score(
        &self,
        person_id: &str,
        score_change: i64,
        description: &str,
    ) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .call(
                Method::POST,
                "/api/score/write",
                &[],
                Some(json!({
                    "user_id": person_id,
                    "score_change": score_change,
                    "description": description,
                })),
            )
            .await?;
        Ok(())
    }

    async fn write_coin(
        &self,
        person_id: &str,
        coin_change: i64,
        description: &str,
    ) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .call(
                Method::POST,
                "/api/coin/write",
                &[],
                Some(json!({
                    "user_id": person_id,
                    "coin_change": coin_change,
                    "description": description,
                })),
            )
            .await?;
        Ok(())
    }
}
