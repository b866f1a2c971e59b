//! # View Model
//!
//! A plain snapshot of everything the booking screen shows, computed from
//! the wizard, calendar, carousel and resolved slots. Rendering code reads
//! a [`BookingView`] and never touches the state types directly.

use rust_decimal::Decimal;
use shared::Professional;

use crate::services::date_utils::{format_long_date, format_short_date, format_slot_time};
use crate::services::session::Session;
use crate::state::availability_state::SlotAvailability;
use crate::state::calendar_state::{CalendarGrid, CalendarModel};
use crate::state::carousel_state::{
    display_category, display_name, display_phone, display_registration, ProfessionalCarousel,
};
use crate::state::wizard_state::{BookingWizard, Feedback, WizardStep};

/// Format an amount as Brazilian reais, e.g. `R$ 1.234,56`
pub fn format_brl(amount: Decimal) -> String {
    let fixed = format!("{:.2}", amount.round_dp(2).abs());
    let (units, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    if amount.is_sign_negative() && !amount.round_dp(2).is_zero() {
        format!("-R$ {},{}", grouped, cents)
    } else {
        format!("R$ {},{}", grouped, cents)
    }
}

/// One entry of the step indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepIndicator {
    pub number: u8,
    pub label: &'static str,
    pub active: bool,
    pub completed: bool,
}

/// A professional as shown on a carousel card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfessionalCard {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub registration: String,
    pub phone: String,
    /// Only shown when the patient's plan covers the professional's category
    pub price: Option<String>,
    pub focused: bool,
}

/// One time-slot button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotButton {
    pub label: String,
    pub bookable: bool,
    pub selected: bool,
}

/// What the confirm step lists before submitting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingSummary {
    pub professional: String,
    pub date: String,
    pub time: String,
    pub price: String,
    pub payment_method: String,
}

/// Everything the booking screen renders
#[derive(Debug, Clone, PartialEq)]
pub struct BookingView {
    pub step: WizardStep,
    pub steps: Vec<StepIndicator>,
    pub can_go_back: bool,
    pub professionals: Vec<ProfessionalCard>,
    pub calendar: CalendarGrid,
    pub month_title: String,
    pub selected_date_caption: Option<String>,
    pub slots: Vec<SlotButton>,
    pub availability_degraded: bool,
    pub summary: Option<BookingSummary>,
    pub feedback: Option<Feedback>,
    pub confirm_enabled: bool,
}

/// Inputs of [`BookingView::build`]
pub struct ViewSources<'a> {
    pub wizard: &'a BookingWizard,
    pub calendar: &'a CalendarModel,
    pub carousel: &'a ProfessionalCarousel,
    pub slots: &'a [SlotAvailability],
    pub availability_degraded: bool,
    pub session: Option<&'a Session>,
}

impl BookingView {
    pub fn build(sources: ViewSources<'_>) -> Self {
        let ViewSources {
            wizard,
            calendar,
            carousel,
            slots,
            availability_degraded,
            session,
        } = sources;
        let step = wizard.step();
        let selection = wizard.selection();

        let steps = WizardStep::ALL
            .iter()
            .map(|&s| StepIndicator {
                number: s.number(),
                label: s.label(),
                active: s == step,
                completed: s < step,
            })
            .collect();

        let professionals = carousel
            .professionals()
            .iter()
            .enumerate()
            .map(|(index, professional)| ProfessionalCard {
                id: professional.id,
                name: display_name(professional).to_string(),
                category: display_category(professional).to_string(),
                registration: display_registration(professional).to_string(),
                phone: display_phone(professional).to_string(),
                price: visible_price(carousel, professional, session),
                focused: index == carousel.current_index(),
            })
            .collect();

        let grid = calendar.render_current();
        let month_title = grid.title();

        let slots = slots
            .iter()
            .map(|slot| SlotButton {
                label: slot.label(),
                bookable: slot.bookable,
                selected: selection.time == Some(slot.time),
            })
            .collect();

        let summary = match (
            selection.professional_id.and_then(|id| carousel.find(id)),
            selection.date,
            selection.time,
        ) {
            (Some(professional), Some(date), Some(time)) => Some(BookingSummary {
                professional: display_name(professional).to_string(),
                date: format_short_date(date),
                time: format_slot_time(time),
                price: format_brl(selection.price),
                payment_method: selection
                    .payment_method
                    .map(|m| m.to_string())
                    .unwrap_or_default(),
            }),
            _ => None,
        };

        Self {
            step,
            steps,
            can_go_back: step.previous().is_some(),
            professionals,
            calendar: grid,
            month_title,
            selected_date_caption: selection.date.map(format_long_date),
            slots,
            availability_degraded,
            summary,
            feedback: wizard.feedback().cloned(),
            confirm_enabled: step == WizardStep::Confirm && !wizard.is_submitting(),
        }
    }
}

fn visible_price(
    carousel: &ProfessionalCarousel,
    professional: &Professional,
    session: Option<&Session>,
) -> Option<String> {
    let category = professional.category.as_deref()?;
    let covered = session.is_some_and(|s| s.user.covers_category(category));
    covered.then(|| format_brl(carousel.price_for(professional)))
}
