//! # Wizard State Module
//!
//! The four-step booking wizard: professional → date → time → confirm.
//!
//! ## Responsibilities:
//! - Current step pointer, moved one step at a time (no skipping)
//! - The accumulating selection (professional, date, time, payment, price)
//! - Per-step validation before moving forward, driven by one gate table
//! - Submitting the finished selection to the scheduling API
//! - Inline feedback (error, loading, success) for the step being shown
//!
//! ## Submission:
//! `submit` re-checks every required field, whatever step is visible. A
//! [`SubmitLatch`] is held for the duration of the request so the confirm
//! control can be disabled and a second submission is refused. On success
//! the selection is cleared; on failure it is kept so the user can retry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use shared::{BookingCreated, CreateBookingRequest, PaymentMethod};
use tracing::{error, info, warn};

use crate::error::{SubmitError, ValidationError};
use crate::services::api::SchedulingApi;
use crate::services::date_utils::format_slot_time;
use crate::services::session::Session;

/// Steps of the booking wizard, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Professional = 1,
    Date = 2,
    Time = 3,
    Confirm = 4,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::Professional,
        WizardStep::Date,
        WizardStep::Time,
        WizardStep::Confirm,
    ];

    pub const FIRST: WizardStep = WizardStep::Professional;
    pub const LAST: WizardStep = WizardStep::Confirm;

    /// 1-based position of the step
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::Professional => Some(WizardStep::Date),
            WizardStep::Date => Some(WizardStep::Time),
            WizardStep::Time => Some(WizardStep::Confirm),
            WizardStep::Confirm => None,
        }
    }

    pub fn previous(self) -> Option<WizardStep> {
        match self {
            WizardStep::Professional => None,
            WizardStep::Date => Some(WizardStep::Professional),
            WizardStep::Time => Some(WizardStep::Date),
            WizardStep::Confirm => Some(WizardStep::Time),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::Professional => "Profissional",
            WizardStep::Date => "Data",
            WizardStep::Time => "Horário",
            WizardStep::Confirm => "Confirmação",
        }
    }
}

type StepGate = fn(&BookingSelection) -> Result<(), ValidationError>;

/// What must be filled in before leaving a step. Steps without an entry
/// (the confirm step) have no forward gate.
const STEP_GATES: [(WizardStep, StepGate); 3] = [
    (WizardStep::Professional, require_professional),
    (WizardStep::Date, require_date),
    (WizardStep::Time, require_time),
];

fn require_professional(selection: &BookingSelection) -> Result<(), ValidationError> {
    selection
        .professional_id
        .map(|_| ())
        .ok_or(ValidationError::MissingProfessional)
}

fn require_date(selection: &BookingSelection) -> Result<(), ValidationError> {
    selection.date.map(|_| ()).ok_or(ValidationError::MissingDate)
}

fn require_time(selection: &BookingSelection) -> Result<(), ValidationError> {
    selection.time.map(|_| ()).ok_or(ValidationError::MissingTime)
}

fn require_payment_method(selection: &BookingSelection) -> Result<(), ValidationError> {
    selection
        .payment_method
        .map(|_| ())
        .ok_or(ValidationError::MissingPaymentMethod)
}

/// The booking being assembled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingSelection {
    pub professional_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub payment_method: Option<PaymentMethod>,
    pub price: Decimal,
}

impl BookingSelection {
    /// Empty selection with the fixed payment method and a starting price
    pub fn new(payment_method: PaymentMethod, price: Decimal) -> Self {
        Self {
            professional_id: None,
            date: None,
            time: None,
            payment_method: Some(payment_method),
            price,
        }
    }

    /// Every required field is present
    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check the required fields in wizard order, reporting the first missing one
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_professional(self)?;
        require_date(self)?;
        require_time(self)?;
        require_payment_method(self)
    }
}

/// Kind of inline message shown near the wizard controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Error,
    Loading,
    Success,
}

/// Inline message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub message: String,
}

impl Feedback {
    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: FeedbackKind::Error, message: message.into() }
    }

    pub fn loading(message: impl Into<String>) -> Self {
        Self { kind: FeedbackKind::Loading, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: FeedbackKind::Success, message: message.into() }
    }
}

/// Shared "request in flight" flag for the confirm control.
///
/// Clones observe the same flag, so a UI can hold one to render the
/// confirm button disabled while a submission is running.
#[derive(Debug, Clone, Default)]
pub struct SubmitLatch {
    in_flight: Arc<AtomicBool>,
}

impl SubmitLatch {
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Take the latch, or `None` if a submission is already running
    pub fn try_acquire(&self) -> Option<SubmitGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| SubmitGuard {
                in_flight: Arc::clone(&self.in_flight),
            })
    }
}

/// Releases the latch when dropped, including when the submission future is dropped
#[derive(Debug)]
pub struct SubmitGuard {
    in_flight: Arc<AtomicBool>,
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

pub const SUBMITTING_MESSAGE: &str = "Creating your booking...";
pub const BOOKED_MESSAGE: &str = "Booking created successfully! Redirecting to your history...";

/// The booking wizard: step pointer, selection, feedback and submit latch
#[derive(Debug, Clone)]
pub struct BookingWizard {
    step: WizardStep,
    selection: BookingSelection,
    default_price: Decimal,
    payment_method: PaymentMethod,
    feedback: Option<Feedback>,
    latch: SubmitLatch,
    completed: Option<BookingCreated>,
}

impl BookingWizard {
    pub fn new(payment_method: PaymentMethod, default_price: Decimal) -> Self {
        Self {
            step: WizardStep::FIRST,
            selection: BookingSelection::new(payment_method, default_price),
            default_price,
            payment_method,
            feedback: None,
            latch: SubmitLatch::default(),
            completed: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn selection(&self) -> &BookingSelection {
        &self.selection
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn set_feedback(&mut self, feedback: Feedback) {
        self.feedback = Some(feedback);
    }

    pub fn clear_feedback(&mut self) {
        self.feedback = None;
    }

    /// A handle on the in-flight flag
    pub fn submit_latch(&self) -> SubmitLatch {
        self.latch.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.latch.is_in_flight()
    }

    /// The booking created by the last successful submission
    pub fn completed(&self) -> Option<&BookingCreated> {
        self.completed.as_ref()
    }

    /// Check the gate of the current step without moving
    pub fn validate_step(&self) -> Result<(), ValidationError> {
        STEP_GATES
            .iter()
            .find(|(step, _)| *step == self.step)
            .map_or(Ok(()), |(_, gate)| gate(&self.selection))
    }

    /// Move one step forward if the current step's selection is filled in.
    ///
    /// On a validation failure the step is unchanged and the error is shown
    /// as feedback. Advancing from the last step is a no-op.
    pub fn advance(&mut self) -> Result<WizardStep, ValidationError> {
        if let Err(e) = self.validate_step() {
            warn!("Cannot leave step {:?}: {}", self.step, e);
            self.feedback = Some(Feedback::error(e.to_string()));
            return Err(e);
        }

        self.feedback = None;
        if let Some(next) = self.step.next() {
            info!("➡️ Wizard step {:?} -> {:?}", self.step, next);
            self.step = next;
        }
        Ok(self.step)
    }

    /// Move one step back; no validation. Retreating from the first step is a no-op.
    pub fn retreat(&mut self) -> WizardStep {
        if let Some(previous) = self.step.previous() {
            info!("⬅️ Wizard step {:?} -> {:?}", self.step, previous);
            self.step = previous;
        }
        self.step
    }

    pub fn select_professional(&mut self, professional_id: i64) {
        self.selection.professional_id = Some(professional_id);
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.selection.date = Some(date);
    }

    pub fn select_time(&mut self, time: NaiveTime) {
        self.selection.time = Some(time);
    }

    pub fn clear_time(&mut self) {
        self.selection.time = None;
    }

    /// Price of the consultation for the selected professional
    pub fn set_price(&mut self, price: Decimal) {
        self.selection.price = price;
    }

    /// Reset the selection to empty, keeping the step pointer
    pub fn clear_selection(&mut self) {
        self.selection = BookingSelection::new(self.payment_method, self.default_price);
    }

    /// Back to the first step with an empty selection. Feedback and the
    /// last completed booking are kept so the confirmation stays visible.
    pub fn restart(&mut self) {
        info!("🔄 Wizard restarted from {:?}", self.step);
        self.step = WizardStep::FIRST;
        self.clear_selection();
    }

    /// Build the create-booking request, or the first validation error
    pub fn build_request(
        &self,
        session: Option<&Session>,
        notes: &str,
    ) -> Result<CreateBookingRequest, ValidationError> {
        self.selection.validate()?;
        let session = session.ok_or(ValidationError::MissingSession)?;

        // validate() guarantees these are present
        let (Some(professional_id), Some(date), Some(time), Some(payment_method)) = (
            self.selection.professional_id,
            self.selection.date,
            self.selection.time,
            self.selection.payment_method,
        ) else {
            return Err(ValidationError::MissingProfessional);
        };

        Ok(CreateBookingRequest {
            date,
            time: format_slot_time(time),
            payment_method,
            price: self.selection.price,
            notes: notes.trim().to_string(),
            professional_id,
            patient_id: session.patient_id(),
        })
    }

    /// Validate and send the booking.
    ///
    /// Validation failures never reach the API. On success the selection is
    /// cleared and the created booking returned; on failure the selection is
    /// kept and the user-facing message is set as feedback.
    pub async fn submit<A>(
        &mut self,
        api: &A,
        session: Option<&Session>,
        notes: &str,
    ) -> Result<BookingCreated, SubmitError>
    where
        A: SchedulingApi + ?Sized,
    {
        let Some(_guard) = self.latch.try_acquire() else {
            return Err(SubmitError::InFlight);
        };

        let request = match self.build_request(session, notes) {
            Ok(request) => request,
            Err(e) => {
                warn!("Booking not submitted: {}", e);
                self.feedback = Some(Feedback::error(e.to_string()));
                return Err(e.into());
            }
        };

        self.feedback = Some(Feedback::loading(SUBMITTING_MESSAGE));
        self.completed = None;

        match api.create_booking(&request).await {
            Ok(created) => {
                info!(
                    "✅ Booking {} created for professional {} on {} at {}",
                    created.id, request.professional_id, request.date, request.time
                );
                self.clear_selection();
                self.feedback = Some(Feedback::success(BOOKED_MESSAGE));
                self.completed = Some(created.clone());
                Ok(created)
            }
            Err(e) => {
                error!("Failed to create booking: {}", e);
                let err = SubmitError::Api(e);
                self.feedback = Some(Feedback::error(err.user_message()));
                Err(err)
            }
        }
    }
}
