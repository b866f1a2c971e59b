//! # Availability State Module
//!
//! Works out which start times can still be booked for a professional on a day.
//!
//! ## How it works:
//! - Every professional has a catalog of candidate start times (the clinic
//!   default is 08:00–17:00 hourly with a lunch gap at 12:00).
//! - The API reports the times already booked for (professional, date).
//! - Each catalog slot is returned in chronological order, tagged bookable
//!   when it is not in the booked set. Booked slots are kept (not removed)
//!   so the grid can show them disabled.
//!
//! ## Failure policy:
//! If the booked set cannot be fetched the resolver fails open: every slot
//! is reported bookable and the condition is logged. The server re-checks
//! conflicts when the booking is created.
//!
//! ## Stale responses:
//! Each resolution is tagged with an [`AvailabilityTicket`]. Only the most
//! recently issued ticket is current; results carrying an older ticket are
//! discarded by the caller.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::services::api::SchedulingApi;
use crate::services::date_utils::{format_iso_date, format_slot_time, parse_slot_time};

/// The clinic's default working-day slots
pub const DEFAULT_SLOT_TIMES: [&str; 9] = [
    "08:00", "09:00", "10:00", "11:00", "13:00", "14:00", "15:00", "16:00", "17:00",
];

/// Candidate start times, with optional per-professional schedules
#[derive(Debug, Clone, PartialEq)]
pub struct SlotCatalog {
    default: Vec<NaiveTime>,
    per_professional: HashMap<i64, Vec<NaiveTime>>,
}

impl SlotCatalog {
    /// Build a catalog from `HH:MM` strings. Entries are sorted and de-duplicated.
    pub fn new<S: AsRef<str>>(default: &[S]) -> Result<Self, ConfigError> {
        Ok(Self {
            default: parse_times(default)?,
            per_professional: HashMap::new(),
        })
    }

    /// Give one professional their own list of start times
    pub fn with_professional<S: AsRef<str>>(
        mut self,
        professional_id: i64,
        times: &[S],
    ) -> Result<Self, ConfigError> {
        self.per_professional.insert(professional_id, parse_times(times)?);
        Ok(self)
    }

    /// Slots offered by a professional, falling back to the clinic default
    pub fn slots_for(&self, professional_id: i64) -> &[NaiveTime] {
        self.per_professional
            .get(&professional_id)
            .unwrap_or(&self.default)
    }

    pub fn contains(&self, professional_id: i64, time: NaiveTime) -> bool {
        self.slots_for(professional_id).contains(&time)
    }
}

impl Default for SlotCatalog {
    fn default() -> Self {
        let default = DEFAULT_SLOT_TIMES
            .iter()
            .filter_map(|t| parse_slot_time(t))
            .collect();
        Self {
            default,
            per_professional: HashMap::new(),
        }
    }
}

fn parse_times<S: AsRef<str>>(times: &[S]) -> Result<Vec<NaiveTime>, ConfigError> {
    let mut parsed = BTreeSet::new();
    for raw in times {
        let raw = raw.as_ref();
        let time = parse_slot_time(raw).ok_or_else(|| {
            ConfigError::Invalid(format!("'{}' is not a valid HH:MM slot time", raw))
        })?;
        parsed.insert(time);
    }
    if parsed.is_empty() {
        return Err(ConfigError::Invalid("slot catalog cannot be empty".to_string()));
    }
    Ok(parsed.into_iter().collect())
}

/// One catalog slot with its bookability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAvailability {
    pub time: NaiveTime,
    pub bookable: bool,
}

impl SlotAvailability {
    /// `HH:MM` label for the slot button
    pub fn label(&self) -> String {
        format_slot_time(self.time)
    }
}

/// Identifies one availability resolution; higher is newer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AvailabilityTicket(u64);

/// Result of one resolution, tagged with the ticket it was issued under
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSlots {
    pub ticket: AvailabilityTicket,
    pub professional_id: i64,
    pub date: NaiveDate,
    pub slots: Vec<SlotAvailability>,
    /// True when the booked set could not be fetched and every slot was assumed free
    pub degraded: bool,
    /// True when the lookup was rejected with a 401; the session needs dropping
    pub unauthorized: bool,
}

/// Reconciles the slot catalog against the API's booked times
#[derive(Debug, Clone)]
pub struct AvailabilityResolver {
    catalog: SlotCatalog,
    last_ticket: u64,
}

impl AvailabilityResolver {
    pub fn new(catalog: SlotCatalog) -> Self {
        Self {
            catalog,
            last_ticket: 0,
        }
    }

    pub fn catalog(&self) -> &SlotCatalog {
        &self.catalog
    }

    /// Issue a new ticket. Every ticket issued earlier becomes stale.
    pub fn issue_ticket(&mut self) -> AvailabilityTicket {
        self.last_ticket += 1;
        AvailabilityTicket(self.last_ticket)
    }

    /// Whether results carrying this ticket should still be applied
    pub fn is_current(&self, ticket: AvailabilityTicket) -> bool {
        ticket.0 == self.last_ticket
    }

    /// Pure reconciliation of the catalog against a booked set
    pub fn reconcile(
        &self,
        professional_id: i64,
        booked: &HashSet<NaiveTime>,
    ) -> Vec<SlotAvailability> {
        self.catalog
            .slots_for(professional_id)
            .iter()
            .map(|&time| SlotAvailability {
                time,
                bookable: !booked.contains(&time),
            })
            .collect()
    }

    /// Fetch the booked set and tag every catalog slot. Never fails.
    ///
    /// Takes `&self` so a resolution can run while the ticket it was issued
    /// under is checked later by the owner.
    pub async fn resolve<A>(
        &self,
        api: &A,
        ticket: AvailabilityTicket,
        professional_id: i64,
        date: NaiveDate,
    ) -> ResolvedSlots
    where
        A: SchedulingApi + ?Sized,
    {
        let mut unauthorized = false;
        let (booked, degraded) = match api.get_occupied_times(professional_id, date).await {
            Ok(times) => (parse_booked(&times), false),
            Err(e) => {
                unauthorized = e.is_unauthorized();
                warn!(
                    "⚠️ No occupied times for professional {} on {}, all slots shown free: {}",
                    professional_id,
                    format_iso_date(date),
                    e
                );
                (HashSet::new(), true)
            }
        };

        let slots = self.reconcile(professional_id, &booked);
        debug!(
            "Resolved {} slots ({} bookable) for professional {} on {}",
            slots.len(),
            slots.iter().filter(|s| s.bookable).count(),
            professional_id,
            date
        );

        ResolvedSlots {
            ticket,
            professional_id,
            date,
            slots,
            degraded,
            unauthorized,
        }
    }
}

impl Default for AvailabilityResolver {
    fn default() -> Self {
        Self::new(SlotCatalog::default())
    }
}

fn parse_booked(times: &[String]) -> HashSet<NaiveTime> {
    times
        .iter()
        .filter_map(|raw| {
            let parsed = parse_slot_time(raw);
            if parsed.is_none() {
                debug!("Ignoring unparseable booked time '{}'", raw);
            }
            parsed
        })
        .collect()
}
