//! # Booking Coordinator
//!
//! Owns every piece of booking state and wires user actions between them.
//!
//! ## Responsibilities:
//! - Loading professionals into the carousel and mirroring the focused card
//!   into the wizard selection
//! - Forwarding calendar navigation and day selection
//! - Refreshing availability when the time step becomes visible, or when
//!   the date or professional changes while it is visible
//! - Accepting only bookable slots from the latest availability result
//! - Keeping the API token in step with the session
//! - Submitting the booking and signing out on any 401
//!
//! ## Latest request wins:
//! An availability refresh is split into [`BookingCoordinator::begin_refresh`]
//! (issue a ticket) and [`BookingCoordinator::apply_resolution`] (apply the
//! result only if its ticket is still current), so a slow response for an
//! old date can never overwrite the slots for the date now selected.

use chrono::{NaiveDate, NaiveTime};
use shared::BookingCreated;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, ConfigError, SubmitError, ValidationError};
use crate::services::api::SchedulingApi;
use crate::services::date_utils::parse_slot_time;
use crate::services::session::{Session, SessionStore};
use crate::state::availability_state::{
    AvailabilityResolver, AvailabilityTicket, ResolvedSlots, SlotAvailability,
};
use crate::state::calendar_state::{CalendarGrid, CalendarModel};
use crate::state::carousel_state::ProfessionalCarousel;
use crate::state::wizard_state::{BookingWizard, Feedback, WizardStep};
use crate::view_model::{BookingView, ViewSources};

pub const PROFESSIONALS_LOAD_FAILURE: &str = "Could not load the professionals. Please try again.";

/// An availability lookup that has been issued but not yet applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityRequest {
    pub ticket: AvailabilityTicket,
    pub professional_id: i64,
    pub date: NaiveDate,
}

/// The booking screen's state and the actions that change it
pub struct BookingCoordinator<A: SchedulingApi> {
    api: A,
    wizard: BookingWizard,
    calendar: CalendarModel,
    carousel: ProfessionalCarousel,
    resolver: AvailabilityResolver,
    slots: Vec<SlotAvailability>,
    availability_degraded: bool,
    session: Option<Session>,
    session_store: Option<SessionStore>,
}

impl<A: SchedulingApi> BookingCoordinator<A> {
    pub fn new(api: A, config: &ClientConfig) -> Result<Self, ConfigError> {
        let resolver = AvailabilityResolver::new(config.slot_catalog()?);
        Ok(Self {
            api,
            wizard: BookingWizard::new(config.payment_method, config.default_consultation_price),
            calendar: CalendarModel::new(),
            carousel: ProfessionalCarousel::new(config.default_consultation_price),
            resolver,
            slots: Vec::new(),
            availability_degraded: false,
            session: None,
            session_store: None,
        })
    }

    /// Replace the calendar (e.g. to pin "today")
    pub fn with_calendar(mut self, calendar: CalendarModel) -> Self {
        self.calendar = calendar;
        self
    }

    /// Read the session from `store`; it is also cleared there on a 401
    pub fn with_session_store(mut self, store: SessionStore) -> anyhow::Result<Self> {
        let session = store.load()?;
        if session.is_none() {
            warn!("🔒 No stored session; bookings cannot be submitted until sign-in");
        }
        self.set_session(session);
        self.session_store = Some(store);
        Ok(self)
    }

    /// Replace the session and hand its token to the API client
    pub fn set_session(&mut self, session: Option<Session>) {
        self.api.set_token(session.as_ref().map(|s| s.auth_token.clone()));
        self.session = session;
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn wizard(&self) -> &BookingWizard {
        &self.wizard
    }

    pub fn calendar(&self) -> &CalendarModel {
        &self.calendar
    }

    pub fn carousel(&self) -> &ProfessionalCarousel {
        &self.carousel
    }

    pub fn resolver(&self) -> &AvailabilityResolver {
        &self.resolver
    }

    /// Slots from the latest applied availability result
    pub fn slots(&self) -> &[SlotAvailability] {
        &self.slots
    }

    pub fn availability_degraded(&self) -> bool {
        self.availability_degraded
    }

    /// Snapshot for rendering
    pub fn view(&self) -> BookingView {
        BookingView::build(ViewSources {
            wizard: &self.wizard,
            calendar: &self.calendar,
            carousel: &self.carousel,
            slots: &self.slots,
            availability_degraded: self.availability_degraded,
            session: self.session.as_ref(),
        })
    }

    /// Fill the carousel from the API and select the first professional.
    ///
    /// On failure the carousel is left empty and the error shown as feedback.
    pub async fn load_professionals(&mut self) -> Result<usize, ApiError> {
        match self.api.list_professionals().await {
            Ok(professionals) => {
                let count = professionals.len();
                self.carousel.set_professionals(professionals);
                self.sync_focused_professional();
                Ok(count)
            }
            Err(e) => {
                warn!("Failed to load professionals: {}", e);
                self.carousel.set_professionals(Vec::new());
                if e.is_unauthorized() {
                    self.handle_unauthorized();
                } else {
                    self.wizard.set_feedback(Feedback::error(
                        e.server_message().unwrap_or(PROFESSIONALS_LOAD_FAILURE),
                    ));
                }
                Err(e)
            }
        }
    }

    pub async fn next_professional(&mut self) {
        self.carousel.next();
        self.focus_changed().await;
    }

    pub async fn previous_professional(&mut self) {
        self.carousel.previous();
        self.focus_changed().await;
    }

    pub async fn go_to_professional(&mut self, index: usize) {
        self.carousel.go_to(index);
        self.focus_changed().await;
    }

    /// Select a professional by id, focusing their card
    pub async fn select_professional(&mut self, id: i64) -> Result<(), ValidationError> {
        self.carousel
            .focus_id(id)
            .ok_or(ValidationError::ProfessionalNotFound(id))?;
        self.focus_changed().await;
        Ok(())
    }

    /// Sync the focused card and, on the time step, reload its slots
    async fn focus_changed(&mut self) {
        if self.sync_focused_professional() && self.wizard.step() == WizardStep::Time {
            self.refresh_availability().await;
        }
    }

    /// Mirror the focused card into the wizard, with its resolved price.
    /// Returns whether the selected professional changed.
    fn sync_focused_professional(&mut self) -> bool {
        let Some(professional) = self.carousel.current() else {
            return false;
        };
        let id = professional.id;
        let price = self.carousel.price_for(professional);

        let changed = self.wizard.selection().professional_id != Some(id);
        if changed {
            // Booked times belong to the previous professional
            self.wizard.clear_time();
            self.slots.clear();
        }
        self.wizard.select_professional(id);
        self.wizard.set_price(price);
        changed
    }

    pub fn prev_month(&mut self) -> CalendarGrid {
        self.calendar.prev_month()
    }

    pub fn next_month(&mut self) -> CalendarGrid {
        self.calendar.next_month()
    }

    /// Select a day of the displayed month and record it in the wizard.
    ///
    /// Rejected days are shown as feedback. If the time step is visible the
    /// slots are refreshed for the new date.
    pub async fn select_day(&mut self, day: u32) -> Result<NaiveDate, ValidationError> {
        let date = match self.calendar.select_day(day) {
            Ok(date) => date,
            Err(e) => {
                self.wizard.set_feedback(Feedback::error(e.to_string()));
                return Err(e);
            }
        };

        if self.wizard.selection().date != Some(date) {
            self.wizard.clear_time();
            self.slots.clear();
        }
        self.wizard.select_date(date);
        self.wizard.clear_feedback();

        if self.wizard.step() == WizardStep::Time {
            self.refresh_availability().await;
        }
        Ok(date)
    }

    /// Advance the wizard; entering the time step loads the slots
    pub async fn advance(&mut self) -> Result<WizardStep, ValidationError> {
        let before = self.wizard.step();
        let step = self.wizard.advance()?;
        if step == WizardStep::Time && before != WizardStep::Time {
            self.refresh_availability().await;
        }
        Ok(step)
    }

    pub fn retreat(&mut self) -> WizardStep {
        self.wizard.retreat()
    }

    /// Issue a ticket for the current (professional, date), if both are chosen
    pub fn begin_refresh(&mut self) -> Option<AvailabilityRequest> {
        let selection = self.wizard.selection();
        let professional_id = selection.professional_id?;
        let date = selection.date?;
        let ticket = self.resolver.issue_ticket();
        Some(AvailabilityRequest {
            ticket,
            professional_id,
            date,
        })
    }

    /// Apply a resolution if it is still the latest one. Returns whether it was applied.
    pub fn apply_resolution(&mut self, resolved: ResolvedSlots) -> bool {
        if resolved.unauthorized {
            self.handle_unauthorized();
        }
        if !self.resolver.is_current(resolved.ticket) {
            info!(
                "Discarding stale availability for professional {} on {}",
                resolved.professional_id, resolved.date
            );
            return false;
        }

        if let Some(time) = self.wizard.selection().time {
            let still_bookable = resolved.slots.iter().any(|s| s.time == time && s.bookable);
            if !still_bookable {
                warn!("Selected time {} is no longer bookable, clearing it", time);
                self.wizard.clear_time();
            }
        }

        self.availability_degraded = resolved.degraded;
        self.slots = resolved.slots;
        true
    }

    /// Fetch and apply availability for the current selection
    pub async fn refresh_availability(&mut self) -> bool {
        let Some(request) = self.begin_refresh() else {
            return false;
        };
        let resolved = self
            .resolver
            .resolve(&self.api, request.ticket, request.professional_id, request.date)
            .await;
        self.apply_resolution(resolved)
    }

    /// Pick a start time (`HH:MM`) from the latest slots
    pub fn select_time(&mut self, label: &str) -> Result<(), ValidationError> {
        let result = self.check_time(label);
        match result {
            Ok(time) => {
                self.wizard.select_time(time);
                self.wizard.clear_feedback();
                Ok(())
            }
            Err(e) => {
                self.wizard.set_feedback(Feedback::error(e.to_string()));
                Err(e)
            }
        }
    }

    fn check_time(&self, label: &str) -> Result<NaiveTime, ValidationError> {
        let time = parse_slot_time(label)
            .ok_or_else(|| ValidationError::SlotNotInCatalog(label.to_string()))?;
        let professional_id = self
            .wizard
            .selection()
            .professional_id
            .ok_or(ValidationError::MissingProfessional)?;
        if !self.resolver.catalog().contains(professional_id, time) {
            return Err(ValidationError::SlotNotInCatalog(label.to_string()));
        }
        if !self.slots.iter().any(|s| s.time == time && s.bookable) {
            return Err(ValidationError::SlotNotBookable(label.to_string()));
        }
        Ok(time)
    }

    /// Submit the booking with the stored session.
    ///
    /// On success the wizard starts over at the first step with the focused
    /// card selected again; the calendar selection and slots are reset.
    pub async fn confirm(&mut self, notes: &str) -> Result<BookingCreated, SubmitError> {
        let result = self
            .wizard
            .submit(&self.api, self.session.as_ref(), notes)
            .await;

        match &result {
            Ok(_) => {
                self.wizard.restart();
                self.calendar.clear_selection();
                self.slots.clear();
                self.availability_degraded = false;
                self.sync_focused_professional();
            }
            Err(SubmitError::Api(e)) if e.is_unauthorized() => self.handle_unauthorized(),
            Err(_) => {}
        }
        result
    }

    /// Sign out after the API rejected the token: the session, the client's
    /// token and the stored session file are all dropped.
    fn handle_unauthorized(&mut self) {
        warn!("🔒 Session rejected by the API, signing out");
        self.session = None;
        self.api.set_token(None);
        if let Some(store) = &self.session_store {
            if let Err(e) = store.clear() {
                warn!("Failed to clear session file: {:#}", e);
            }
        }
        self.wizard
            .set_feedback(Feedback::error(ValidationError::MissingSession.to_string()));
    }
}
