use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A professional (nutritionist, personal trainer, ...) as returned by `GET /professional`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Professional {
    /// Server-assigned identifier, never changed by the client
    pub id: i64,
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
    /// Category slug such as `nutricionista` or `personal-trainer`
    #[serde(rename = "tipo", default)]
    pub category: Option<String>,
    /// Professional council registration (CRN, CREF, ...)
    #[serde(rename = "cr", default)]
    pub registration: Option<String>,
    #[serde(rename = "fone", default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Consultation price; the API sends either a JSON number or a decimal string
    #[serde(rename = "valor_consulta", default)]
    pub consultation_price: Option<Decimal>,
    #[serde(rename = "imagem_perfil", default)]
    pub profile_image: Option<ProfileImage>,
}

/// Profile image reference as stored by the API.
///
/// Decoding a buffer into something displayable is left to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileImage {
    /// Node-style serialized buffer: `{ "type": "Buffer", "data": [..] }`
    Buffer {
        #[serde(rename = "type")]
        kind: String,
        data: Vec<u8>,
    },
    /// A URL or a (possibly prefixed) base64 payload
    Text(String),
    Other(serde_json::Value),
}

impl ProfileImage {
    /// Returns the image source when it can be used as-is (URL or data URI)
    pub fn direct_source(&self) -> Option<&str> {
        match self {
            ProfileImage::Text(text) if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        }
    }
}

/// Payment methods accepted by the booking endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "PIX")]
    Pix,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Pix => "PIX",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /schedule`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    /// Consultation date, serialized as `YYYY-MM-DD`
    #[serde(rename = "data")]
    pub date: NaiveDate,
    /// Start time in `HH:MM`
    #[serde(rename = "hora")]
    pub time: String,
    #[serde(rename = "forma_pagamento")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "valor", with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "observacoes", default)]
    pub notes: String,
    #[serde(rename = "profissional_id")]
    pub professional_id: i64,
    #[serde(rename = "paciente_id")]
    pub patient_id: i64,
}

/// Response of `POST /schedule`; only the id is interpreted by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingCreated {
    pub id: i64,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Response of `GET /schedule/occupied-times`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OccupiedTimesResponse {
    #[serde(rename = "bookedTimes", default)]
    pub booked_times: Vec<String>,
}

/// Error body the API returns alongside non-2xx statuses
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    /// The human-readable message, preferring `message` over `error`
    pub fn text(&self) -> Option<&str> {
        fn non_blank(field: &Option<String>) -> Option<&str> {
            field.as_deref().map(str::trim).filter(|m| !m.is_empty())
        }
        non_blank(&self.message).or_else(|| non_blank(&self.error))
    }
}

/// Kind of account that owns the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserType {
    #[serde(rename = "paciente")]
    Patient,
    #[serde(rename = "profissional")]
    Professional,
}

/// The logged-in user as persisted after login (`userData`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Remaining fields, including the per-category plan flags
    /// (e.g. `"nutricionista": true`)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl SessionUser {
    /// Whether the user's plan covers consultations of the given category
    pub fn covers_category(&self, category: &str) -> bool {
        match self.extra.get(category) {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            Some(serde_json::Value::String(s)) => !s.is_empty() && s != "false" && s != "0",
            _ => false,
        }
    }
}
