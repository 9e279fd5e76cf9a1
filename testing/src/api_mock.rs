//! In-memory [`ReceptionApi`] that records every call.
//!
//! The mock mirrors the server's observable behavior closely enough for
//! workflow tests: people and bookings are looked up in maps, creating a
//! booking confirms it, status updates overwrite it, and any endpoint can be
//! scripted to fail. A person read can be held on a gate to simulate a lookup
//! that is still in flight.

#![allow(clippy::module_name_repetitions)]

use async_trait::async_trait;
use reception_core::api::{ApiError, ReceptionApi};
use reception_core::model::{BookingLookup, BookingStatus, Configuration, Event, Person};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

/// Endpoint selector used to script failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /api/user/read`
    ReadPerson,
    /// `GET /api/events/all`
    ListEvents,
    /// `GET /api/events/bookings/status`
    BookingStatus,
    /// `POST /api/events/{id}/bookings`
    CreateBooking,
    /// `POST /api/events/{id}/bookings/status`
    UpdateBookingStatus,
    /// `POST /api/score/write`
    WriteScore,
    /// `POST /api/coin/write`
    WriteCoin,
}

/// A recorded call with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// Person read
    ReadPerson {
        /// Requested id
        person_id: String,
    },
    /// Event list
    ListEvents,
    /// Booking-status lookup
    BookingStatus {
        /// Event id
        event_id: String,
        /// Person id
        person_id: String,
    },
    /// Booking creation
    CreateBooking {
        /// Event id
        event_id: String,
        /// Person id
        person_id: String,
    },
    /// Booking status update
    UpdateBookingStatus {
        /// Event id
        event_id: String,
        /// Person id
        person_id: String,
        /// New status
        status: BookingStatus,
    },
    /// Score adjustment
    WriteScore {
        /// Person id
        person_id: String,
        /// Delta
        score_change: i64,
        /// Description
        description: String,
    },
    /// Coin adjustment
    WriteCoin {
        /// Person id
        person_id: String,
        /// Delta
        coin_change: i64,
        /// Description
        description: String,
    },
}

impl ApiCall {
    /// Endpoint this call hit.
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        match self {
            Self::ReadPerson { .. } => Endpoint::ReadPerson,
            Self::ListEvents => Endpoint::ListEvents,
            Self::BookingStatus { .. } => Endpoint::BookingStatus,
            Self::CreateBooking { .. } => Endpoint::CreateBooking,
            Self::UpdateBookingStatus { .. } => Endpoint::UpdateBookingStatus,
            Self::WriteScore { .. } => Endpoint::WriteScore,
            Self::WriteCoin { .. } => Endpoint::WriteCoin,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    configuration: Option<Configuration>,
    people: HashMap<String, Person>,
    events: Vec<Event>,
    bookings: HashMap<(String, String), BookingStatus>,
    failures: HashMap<Endpoint, ApiError>,
    calls: Vec<ApiCall>,
    person_gate: Option<Arc<Notify>>,
}

/// Scriptable, recording [`ReceptionApi`].
#[derive(Debug, Default)]
pub struct MockReceptionApi {
    inner: Mutex<MockState>,
}

impl MockReceptionApi {
    /// Empty mock: every person read is a 404, every booking absent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::expect_used)] // Poisoning only follows a panicking test
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().expect("mock state lock poisoned")
    }

    /// Register a person.
    #[must_use]
    pub fn with_person(self, person: Person) -> Self {
        self.lock().people.insert(person.id.clone(), person);
        self
    }

    /// Set the event list.
    #[must_use]
    pub fn with_events(self, events: Vec<Event>) -> Self {
        self.lock().events = events;
        self
    }

    /// Register a booking.
    #[must_use]
    pub fn with_booking(self, event_id: &str, person_id: &str, status: BookingStatus) -> Self {
        self.lock()
            .bookings
            .insert((event_id.to_string(), person_id.to_string()), status);
        self
    }

    /// Make every call to `endpoint` fail with `error`.
    pub fn fail(&self, endpoint: Endpoint, error: ApiError) {
        self.lock().failures.insert(endpoint, error);
    }

    /// Remove a scripted failure.
    pub fn recover(&self, endpoint: Endpoint) {
        self.lock().failures.remove(&endpoint);
    }

    /// Hold the next person read until the returned gate is notified.
    #[must_use]
    pub fn gate_person_reads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().person_gate = Some(Arc::clone(&gate));
        gate
    }

    /// All calls so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Number of calls to `endpoint`.
    #[must_use]
    pub fn count(&self, endpoint: Endpoint) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.endpoint() == endpoint)
            .count()
    }

    /// Calls that mutate server state, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<ApiCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| {
                matches!(
                    call.endpoint(),
                    Endpoint::CreateBooking
                        | Endpoint::UpdateBookingStatus
                        | Endpoint::WriteScore
                        | Endpoint::WriteCoin
                )
            })
            .cloned()
            .collect()
    }

    /// Current server-side booking status.
    #[must_use]
    pub fn booking(&self, event_id: &str, person_id: &str) -> Option<BookingStatus> {
        self.lock()
            .bookings
            .get(&(event_id.to_string(), person_id.to_string()))
            .cloned()
    }

    /// Last configuration passed to [`ReceptionApi::configure`].
    #[must_use]
    pub fn configuration(&self) -> Option<Configuration> {
        self.lock().configuration.clone()
    }

    /// Record a call and return the scripted failure for its endpoint, if any.
    fn record(&self, call: ApiCall) -> Result<(), ApiError> {
        let mut state = self.lock();
        let endpoint = call.endpoint();
        state.calls.push(call);
        state.failures.get(&endpoint).cloned().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl ReceptionApi for MockReceptionApi {
    fn configure(&self, configuration: &Configuration) {
        self.lock().configuration = Some(configuration.clone());
    }

    async fn read_person(&self, person_id: &str) -> Result<Person, ApiError> {
        self.record(ApiCall::ReadPerson {
            person_id: person_id.to_string(),
        })?;

        let gate = self.lock().person_gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.lock()
            .people
            .get(person_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                message: "User not found".to_string(),
            })
    }

    async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        self.record(ApiCall::ListEvents)?;
        Ok(self.lock().events.clone())
    }

    async fn booking_status(
        &self,
        event_id: &str,
        person_id: &str,
    ) -> Result<BookingLookup, ApiError> {
        self.record(ApiCall::BookingStatus {
            event_id: event_id.to_string(),
            person_id: person_id.to_string(),
        })?;

        Ok(self
            .booking(event_id, person_id)
            .map_or(BookingLookup::NotFound, BookingLookup::Found))
    }

    async fn create_booking(&self, event_id: &str, person_id: &str) -> Result<(), ApiError> {
        self.record(ApiCall::CreateBooking {
            event_id: event_id.to_string(),
            person_id: person_id.to_string(),
        })?;

        self.lock().bookings.insert(
            (event_id.to_string(), person_id.to_string()),
            BookingStatus::Confirmed,
        );
        Ok(())
    }

    async fn update_booking_status(
        &self,
        event_id: &str,
        person_id: &str,
        status: &BookingStatus,
    ) -> Result<(), ApiError> {
        self.record(ApiCall::UpdateBookingStatus {
            event_id: event_id.to_string(),
            person_id: person_id.to_string(),
            status: status.clone(),
        })?;

        self.lock()
            .bookings
            .insert((event_id.to_string(), person_id.to_string()), status.clone());
        Ok(())
    }

    async fn write_score(
        &self,
        person_id: &str,
        score_change: i64,
        description: &str,
    ) -> Result<(), ApiError> {
        self.record(ApiCall::WriteScore {
            person_id: person_id.to_string(),
            score_change,
            description: description.to_string(),
        })
    }

    async fn write_coin(
        &self,
        person_id: &str,
        coin_change: i64,
        description: &str,
    ) -> Result<(), ApiError> {
        self.record(ApiCall::WriteCoin {
            person_id: person_id.to_string(),
            coin_change,
            description: description.to_string(),
        })
    }
}
