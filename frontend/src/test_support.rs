//! Scripted [`SchedulingApi`] fake and fixtures shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use shared::{BookingCreated, CreateBookingRequest, Professional, SessionUser, UserType};

use crate::error::{ApiError, ApiResult};
use crate::services::api::SchedulingApi;
use crate::services::session::Session;

/// One recorded call against the fake
#[derive(Debug, Clone, PartialEq)]
pub enum FakeCall {
    ListProfessionals,
    GetProfessional(i64),
    OccupiedTimes(i64, NaiveDate),
    CreateBooking(CreateBookingRequest),
}

/// In-memory scheduling API that records every call
#[derive(Debug, Default)]
pub struct FakeSchedulingApi {
    professionals: Vec<Professional>,
    professionals_fail: bool,
    occupied: HashMap<(i64, NaiveDate), Vec<String>>,
    occupied_fail: bool,
    booking_id: i64,
    booking_failure: Mutex<Option<ApiError>>,
    rejecting_token: AtomicBool,
    token: Option<String>,
    calls: Mutex<Vec<FakeCall>>,
}

impl FakeSchedulingApi {
    pub fn new() -> Self {
        Self {
            booking_id: 1,
            ..Self::default()
        }
    }

    pub fn with_professionals(mut self, professionals: Vec<Professional>) -> Self {
        self.professionals = professionals;
        self
    }

    pub fn failing_professionals(mut self) -> Self {
        self.professionals_fail = true;
        self
    }

    pub fn with_occupied(mut self, professional_id: i64, date: NaiveDate, times: &[&str]) -> Self {
        self.occupied.insert(
            (professional_id, date),
            times.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn failing_occupied_times(mut self) -> Self {
        self.occupied_fail = true;
        self
    }

    pub fn with_booking_id(mut self, id: i64) -> Self {
        self.booking_id = id;
        self
    }

    /// The next `create_booking` fails with `error`; later calls succeed
    pub fn failing_booking(self, error: ApiError) -> Self {
        *self.booking_failure.lock().unwrap() = Some(error);
        self
    }

    /// While set, every call fails with [`ApiError::Unauthorized`]
    pub fn set_rejecting_token(&self, rejecting: bool) {
        self.rejecting_token.store(rejecting, Ordering::SeqCst);
    }

    /// Token most recently handed over by `set_token`
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_booking_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, FakeCall::CreateBooking(_)))
            .count()
    }

    pub fn occupied_times_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, FakeCall::OccupiedTimes(..)))
            .count()
    }

    pub fn last_booking_request(&self) -> Option<CreateBookingRequest> {
        self.calls().into_iter().rev().find_map(|c| match c {
            FakeCall::CreateBooking(request) => Some(request),
            _ => None,
        })
    }

    fn record(&self, call: FakeCall) -> ApiResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.rejecting_token.load(Ordering::SeqCst) {
            return Err(ApiError::Unauthorized);
        }
        Ok(())
    }
}

fn unavailable() -> ApiError {
    ApiError::Server {
        status: StatusCode::SERVICE_UNAVAILABLE,
        message: None,
    }
}

#[async_trait]
impl SchedulingApi for FakeSchedulingApi {
    async fn list_professionals(&self) -> ApiResult<Vec<Professional>> {
        self.record(FakeCall::ListProfessionals)?;
        if self.professionals_fail {
            return Err(unavailable());
        }
        Ok(self.professionals.clone())
    }

    async fn get_professional(&self, id: i64) -> ApiResult<Professional> {
        self.record(FakeCall::GetProfessional(id))?;
        self.professionals
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(ApiError::Server {
                status: StatusCode::NOT_FOUND,
                message: Some("Profissional não encontrado".to_string()),
            })
    }

    async fn get_occupied_times(
        &self,
        professional_id: i64,
        date: NaiveDate,
    ) -> ApiResult<Vec<String>> {
        self.record(FakeCall::OccupiedTimes(professional_id, date))?;
        if self.occupied_fail {
            return Err(unavailable());
        }
        Ok(self
            .occupied
            .get(&(professional_id, date))
            .cloned()
            .unwrap_or_default())
    }

    async fn create_booking(&self, request: &CreateBookingRequest) -> ApiResult<BookingCreated> {
        self.record(FakeCall::CreateBooking(request.clone()))?;
        if let Some(error) = self.booking_failure.lock().unwrap().take() {
            return Err(error);
        }
        Ok(BookingCreated {
            id: self.booking_id,
            extra: HashMap::new(),
        })
    }

    fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }
}

/// Patient 41 whose plan covers nutrition consultations
pub fn sample_session() -> Session {
    let mut extra = HashMap::new();
    extra.insert("nutricionista".to_string(), serde_json::Value::Bool(true));
    Session {
        auth_token: "token-123".to_string(),
        user_type: UserType::Patient,
        user: SessionUser {
            id: 41,
            name: Some("Ana".to_string()),
            email: Some("ana@example.com".to_string()),
            extra,
        },
    }
}

pub fn professional(id: i64, name: &str, category: &str) -> Professional {
    Professional {
        id,
        name: Some(name.to_string()),
        category: Some(category.to_string()),
        registration: Some(format!("CRN-{}", id)),
        phone: Some("(11) 99999-0000".to_string()),
        email: None,
        consultation_price: None,
        profile_image: None,
    }
}
