//! # Carousel State Module
//!
//! The professional picker shown on the first wizard step: the list loaded
//! from the API and the index of the card in focus.
//!
//! ## Responsibilities:
//! - Wrap-around navigation (`next`/`previous`) and direct jumps (`go_to`)
//! - Resolving a professional's consultation price against the configured default
//! - Display fallbacks for professionals with missing fields

use rust_decimal::Decimal;
use shared::Professional;
use tracing::{debug, info};

pub const MISSING_NAME: &str = "Name not provided";
pub const MISSING_CATEGORY: &str = "Category not provided";
pub const MISSING_REGISTRATION: &str = "Registration not provided";
pub const MISSING_PHONE: &str = "Phone not provided";

/// Human label for a category slug; unknown slugs are shown as sent
pub fn category_label(category: &str) -> &str {
    match category {
        "nutricionista" => "Nutricionista",
        "personal-trainer" => "Personal Trainer",
        other => other,
    }
}

/// Professionals with one of them in focus
#[derive(Debug, Clone, PartialEq)]
pub struct ProfessionalCarousel {
    professionals: Vec<Professional>,
    index: usize,
    default_price: Decimal,
}

impl ProfessionalCarousel {
    pub fn new(default_price: Decimal) -> Self {
        Self {
            professionals: Vec::new(),
            index: 0,
            default_price,
        }
    }

    /// Replace the list and focus the first card
    pub fn set_professionals(&mut self, professionals: Vec<Professional>) {
        info!("👥 Loaded {} professionals", professionals.len());
        self.professionals = professionals;
        self.index = 0;
    }

    pub fn professionals(&self) -> &[Professional] {
        &self.professionals
    }

    pub fn len(&self) -> usize {
        self.professionals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.professionals.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    /// The professional in focus, if any were loaded
    pub fn current(&self) -> Option<&Professional> {
        self.professionals.get(self.index)
    }

    /// Focus the next card, wrapping from the last to the first
    pub fn next(&mut self) -> Option<&Professional> {
        if self.professionals.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.professionals.len();
        debug!("Carousel moved to {}", self.index);
        self.current()
    }

    /// Focus the previous card, wrapping from the first to the last
    pub fn previous(&mut self) -> Option<&Professional> {
        if self.professionals.is_empty() {
            return None;
        }
        self.index = self
            .index
            .checked_sub(1)
            .unwrap_or(self.professionals.len() - 1);
        debug!("Carousel moved to {}", self.index);
        self.current()
    }

    /// Jump to a card; out-of-range indices leave the focus where it is
    pub fn go_to(&mut self, index: usize) -> Option<&Professional> {
        if index < self.professionals.len() {
            self.index = index;
        }
        self.current()
    }

    /// Focus the professional with this id
    pub fn focus_id(&mut self, id: i64) -> Option<&Professional> {
        let position = self.professionals.iter().position(|p| p.id == id)?;
        self.index = position;
        self.current()
    }

    pub fn find(&self, id: i64) -> Option<&Professional> {
        self.professionals.iter().find(|p| p.id == id)
    }

    /// The professional's own price when set and positive, else the default
    pub fn price_for(&self, professional: &Professional) -> Decimal {
        professional
            .consultation_price
            .filter(|price| price.is_sign_positive() && !price.is_zero())
            .unwrap_or(self.default_price)
    }
}

/// Display name, falling back to [`MISSING_NAME`]
pub fn display_name(professional: &Professional) -> &str {
    non_blank(professional.name.as_deref()).unwrap_or(MISSING_NAME)
}

/// Category label, falling back to [`MISSING_CATEGORY`]
pub fn display_category(professional: &Professional) -> &str {
    non_blank(professional.category.as_deref())
        .map(category_label)
        .unwrap_or(MISSING_CATEGORY)
}

pub fn display_registration(professional: &Professional) -> &str {
    non_blank(professional.registration.as_deref()).unwrap_or(MISSING_REGISTRATION)
}

pub fn display_phone(professional: &Professional) -> &str {
    non_blank(professional.phone.as_deref()).unwrap_or(MISSING_PHONE)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
