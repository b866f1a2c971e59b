//! # API Client
//!
//! The [`SchedulingApi`] seam the booking flow talks through, and its HTTP
//! implementation against the CliniVida REST API.
//!
//! ## Endpoints:
//! - `GET /professional` and `GET /professional/{id}`
//! - `GET /schedule/occupied-times?profissional_id=..&date=YYYY-MM-DD`
//! - `POST /schedule`
//!
//! A 401 maps to [`ApiError::Unauthorized`]; any other non-2xx status keeps
//! the `message` (or `error`) field of the response body when present.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    ApiErrorBody, BookingCreated, CreateBookingRequest, OccupiedTimesResponse, Professional,
};
use tracing::{debug, error};

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::services::date_utils::format_iso_date;

/// The remote scheduling API as seen by the booking flow
#[async_trait]
pub trait SchedulingApi: Send + Sync {
    /// All professionals patients can book with
    async fn list_professionals(&self) -> ApiResult<Vec<Professional>>;

    /// A single professional by id
    async fn get_professional(&self, id: i64) -> ApiResult<Professional>;

    /// Start times (`HH:MM`) already booked for a professional on a date
    async fn get_occupied_times(
        &self,
        professional_id: i64,
        date: NaiveDate,
    ) -> ApiResult<Vec<String>>;

    /// Create a booking
    async fn create_booking(&self, request: &CreateBookingRequest) -> ApiResult<BookingCreated>;

    /// Set or clear the bearer token sent with every request
    fn set_token(&mut self, token: Option<String>);
}

/// HTTP client for the CliniVida REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client from configuration
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a client with a custom base URL and default settings
    pub fn with_base_url(base_url: impl Into<String>) -> ApiResult<Self> {
        let config = ClientConfig {
            api_base_url: base_url.into(),
            ..ClientConfig::default()
        };
        Self::new(&config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = self.authorize(request).send().await?;
        Self::handle_response(response).await
    }

    /// Map non-2xx statuses to [`ApiError`], keeping the server's message when it sent one
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("API error {}: {}", status, text);

            if status == StatusCode::UNAUTHORIZED {
                return Err(ApiError::Unauthorized);
            }

            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|body| body.text().map(str::to_string));
            return Err(ApiError::Server { status, message });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl SchedulingApi for ApiClient {
    async fn list_professionals(&self) -> ApiResult<Vec<Professional>> {
        debug!("Loading professionals from {}", self.base_url);
        self.send(self.client.get(self.url("professional"))).await
    }

    async fn get_professional(&self, id: i64) -> ApiResult<Professional> {
        self.send(self.client.get(self.url(&format!("professional/{}", id))))
            .await
    }

    async fn get_occupied_times(
        &self,
        professional_id: i64,
        date: NaiveDate,
    ) -> ApiResult<Vec<String>> {
        let request = self
            .client
            .get(self.url("schedule/occupied-times"))
            .query(&[
                ("profissional_id", professional_id.to_string()),
                ("date", format_iso_date(date)),
            ]);

        let response: OccupiedTimesResponse = self.send(request).await?;
        Ok(response.booked_times)
    }

    async fn create_booking(&self, request: &CreateBookingRequest) -> ApiResult<BookingCreated> {
        debug!(
            "Creating booking for professional {} on {} at {}",
            request.professional_id, request.date, request.time
        );
        self.send(self.client.post(self.url("schedule")).json(request))
            .await
    }

    fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }
}
