//! # Calendar State Module
//!
//! Month grid for the date step of the booking flow.
//!
//! ## Responsibilities:
//! - Month/year cursor with rollover at the December/January boundary
//! - Day-cell generation (Sunday-first weeks, padded to full rows)
//! - Day classification: past, weekend or available
//! - Single-day selection, restricted to available days
//!
//! ## Classification rules:
//! A day strictly before today is `Past`, even when it is a Saturday or
//! Sunday. Otherwise weekends are `Weekend`, and every other day is
//! `Available`. "Today" is read from the model's [`Clock`] on every render
//! and every selection, so a screen left open past midnight reclassifies
//! yesterday as `Past`.

use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use tracing::info;

use crate::error::{UnselectableReason, ValidationError};
use crate::services::date_utils::{
    days_in_month, first_weekday_of_month, format_month_title, is_weekend, next_month,
    previous_month,
};

/// Source of "today" for the calendar
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The local system date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always the same date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// How a calendar day may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayClassification {
    Past,
    Weekend,
    Available,
}

impl DayClassification {
    /// Classify `date` relative to `today`
    pub fn of(date: NaiveDate, today: NaiveDate) -> Self {
        if date < today {
            DayClassification::Past
        } else if is_weekend(date) {
            DayClassification::Weekend
        } else {
            DayClassification::Available
        }
    }

    pub fn is_selectable(&self) -> bool {
        matches!(self, DayClassification::Available)
    }
}

/// One cell of the month grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayCell {
    /// Padding before the 1st or after the last day of the month
    Empty,
    Day {
        day: u32,
        date: NaiveDate,
        classification: DayClassification,
        selected: bool,
    },
}

impl DayCell {
    pub fn day(&self) -> Option<u32> {
        match self {
            DayCell::Day { day, .. } => Some(*day),
            DayCell::Empty => None,
        }
    }

    pub fn classification(&self) -> Option<DayClassification> {
        match self {
            DayCell::Day { classification, .. } => Some(*classification),
            DayCell::Empty => None,
        }
    }
}

/// A rendered month: cells in row-major order, always a multiple of 7
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarGrid {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<DayCell>,
}

impl CalendarGrid {
    /// Cells grouped by week (Sunday first)
    pub fn weeks(&self) -> impl Iterator<Item = &[DayCell]> {
        self.cells.chunks(7)
    }

    /// The cell for a day of the month
    pub fn day(&self, day: u32) -> Option<&DayCell> {
        self.cells.iter().find(|cell| cell.day() == Some(day))
    }

    /// Header title, e.g. "junho de 2024"
    pub fn title(&self) -> String {
        format_month_title(self.year, self.month)
    }
}

/// Month cursor, clock and the selected day
#[derive(Clone)]
pub struct CalendarModel {
    year: i32,
    month: u32,
    clock: Arc<dyn Clock>,
    selected: Option<NaiveDate>,
}

impl fmt::Debug for CalendarModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarModel")
            .field("year", &self.year)
            .field("month", &self.month)
            .field("today", &self.today())
            .field("selected", &self.selected)
            .finish()
    }
}

impl CalendarModel {
    /// Calendar on the current month, following the system date
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Calendar on the month containing the clock's current date
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let today = clock.today();
        Self {
            year: today.year(),
            month: today.month(),
            clock,
            selected: None,
        }
    }

    /// Calendar pinned to a fixed "today"
    pub fn with_today(today: NaiveDate) -> Self {
        Self::with_clock(Arc::new(FixedClock(today)))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Current month, 1-based
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Today according to the clock
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn selected(&self) -> Option<NaiveDate> {
        self.selected
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Render an arbitrary month (1-based) without moving the cursor
    pub fn render(&self, year: i32, month: u32) -> CalendarGrid {
        let Some(leading) = first_weekday_of_month(year, month) else {
            return CalendarGrid {
                year,
                month,
                cells: Vec::new(),
            };
        };
        let num_days = days_in_month(year, month);
        let today = self.today();

        let mut cells = Vec::with_capacity(42);
        cells.extend((0..leading).map(|_| DayCell::Empty));

        for day in 1..=num_days {
            let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                continue;
            };
            cells.push(DayCell::Day {
                day,
                date,
                classification: DayClassification::of(date, today),
                selected: self.selected == Some(date),
            });
        }

        while cells.len() % 7 != 0 {
            cells.push(DayCell::Empty);
        }

        CalendarGrid { year, month, cells }
    }

    /// Render the month under the cursor
    pub fn render_current(&self) -> CalendarGrid {
        self.render(self.year, self.month)
    }

    /// Move the cursor one month back and re-render
    pub fn prev_month(&mut self) -> CalendarGrid {
        (self.year, self.month) = previous_month(self.year, self.month);
        info!("📅 Navigated to previous month: {}/{}", self.month, self.year);
        self.render_current()
    }

    /// Move the cursor one month forward and re-render
    pub fn next_month(&mut self) -> CalendarGrid {
        (self.year, self.month) = next_month(self.year, self.month);
        info!("📅 Navigated to next month: {}/{}", self.month, self.year);
        self.render_current()
    }

    /// Select a day of the month under the cursor.
    ///
    /// Only available days can be selected; selecting one replaces any
    /// previous selection.
    pub fn select_day(&mut self, day: u32) -> Result<NaiveDate, ValidationError> {
        let today = self.today();
        let date = NaiveDate::from_ymd_opt(self.year, self.month, day).ok_or(
            ValidationError::DayNotSelectable {
                date: NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(today),
                reason: UnselectableReason::OutsideMonth,
            },
        )?;

        match DayClassification::of(date, today) {
            DayClassification::Available => {
                self.selected = Some(date);
                info!("📅 Selected date {}", date);
                Ok(date)
            }
            DayClassification::Past => Err(ValidationError::DayNotSelectable {
                date,
                reason: UnselectableReason::Past,
            }),
            DayClassification::Weekend => Err(ValidationError::DayNotSelectable {
                date,
                reason: UnselectableReason::Weekend,
            }),
        }
    }
}

impl Default for CalendarModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn june_2024() -> CalendarModel {
        // Monday
        CalendarModel::with_today(date(2024, 6, 10))
    }

    #[test]
    fn test_classification_precedence() {
        let today = date(2024, 6, 10);

        // A past Saturday is past, not weekend
        assert_eq!(DayClassification::of(date(2024, 6, 8), today), DayClassification::Past);
        assert_eq!(DayClassification::of(date(2024, 6, 9), today), DayClassification::Past);
        assert_eq!(DayClassification::of(date(2024, 6, 7), today), DayClassification::Past);

        // Today is not past
        assert_eq!(DayClassification::of(today, today), DayClassification::Available);
        assert_eq!(DayClassification::of(date(2024, 6, 15), today), DayClassification::Weekend);
        assert_eq!(DayClassification::of(date(2024, 6, 16), today), DayClassification::Weekend);
    }

    #[test]
    fn test_render_june_2024() {
        let grid = june_2024().render(2024, 6);

        // June 1st 2024 is a Saturday: six leading blanks
        assert!(grid.cells[..6].iter().all(|c| *c == DayCell::Empty));
        assert_eq!(grid.cells[6].day(), Some(1));
        assert_eq!(grid.cells.len() % 7, 0);
        assert_eq!(grid.cells.iter().filter(|c| c.day().is_some()).count(), 30);

        for day in 1..=9 {
            assert_eq!(grid.day(day).unwrap().classification(), Some(DayClassification::Past));
        }
        assert_eq!(grid.day(15).unwrap().classification(), Some(DayClassification::Weekend));
        assert_eq!(grid.day(16).unwrap().classification(), Some(DayClassification::Weekend));
        for day in [10, 11, 12, 13, 14, 17, 28] {
            assert_eq!(grid.day(day).unwrap().classification(), Some(DayClassification::Available));
        }
        assert_eq!(grid.title(), "junho de 2024");
    }

    #[test]
    fn test_grid_rows_are_complete() {
        let model = june_2024();
        // September 2024 starts on a Sunday, February 2026 fits exactly in four rows
        let september = model.render(2024, 9);
        assert_eq!(september.cells[0].day(), Some(1));
        assert!(september.weeks().all(|week| week.len() == 7));

        let february = model.render(2026, 2);
        assert_eq!(february.cells.len(), 28);
    }

    #[test]
    fn test_render_invalid_month_is_empty() {
        assert!(june_2024().render(2024, 13).cells.is_empty());
    }

    #[test]
    fn test_every_future_day_has_exactly_one_classification() {
        let model = june_2024();
        let grid = model.render(2024, 7);
        for cell in grid.cells.iter().filter(|c| c.day().is_some()) {
            let DayCell::Day { date, classification, .. } = *cell else { unreachable!() };
            let expected = if is_weekend(date) {
                DayClassification::Weekend
            } else {
                DayClassification::Available
            };
            assert_eq!(classification, expected);
        }
    }

    #[test]
    fn test_navigation_rolls_over_years() {
        let mut model = CalendarModel::with_today(date(2024, 12, 2));

        let grid = model.next_month();
        assert_eq!((grid.year, grid.month), (2025, 1));
        assert_eq!((model.year(), model.month()), (2025, 1));

        model.prev_month();
        let grid = model.prev_month();
        assert_eq!((grid.year, grid.month), (2024, 11));
        assert!(grid
            .cells
            .iter()
            .filter_map(DayCell::classification)
            .all(|c| c == DayClassification::Past));
    }

    #[test]
    fn test_select_available_day() {
        let mut model = june_2024();

        assert_eq!(model.select_day(12).unwrap(), date(2024, 6, 12));
        assert_eq!(model.selected(), Some(date(2024, 6, 12)));

        let grid = model.render_current();
        assert!(matches!(grid.day(12), Some(DayCell::Day { selected: true, .. })));
    }

    #[test]
    fn test_selection_is_single() {
        let mut model = june_2024();
        model.select_day(12).unwrap();
        model.select_day(13).unwrap();

        let grid = model.render_current();
        let selected: Vec<u32> = grid
            .cells
            .iter()
            .filter(|c| matches!(c, DayCell::Day { selected: true, .. }))
            .filter_map(DayCell::day)
            .collect();
        assert_eq!(selected, vec![13]);
    }

    #[test]
    fn test_unavailable_days_cannot_be_selected() {
        let mut model = june_2024();

        assert_eq!(
            model.select_day(8),
            Err(ValidationError::DayNotSelectable {
                date: date(2024, 6, 8),
                reason: UnselectableReason::Past,
            })
        );
        assert_eq!(
            model.select_day(15),
            Err(ValidationError::DayNotSelectable {
                date: date(2024, 6, 15),
                reason: UnselectableReason::Weekend,
            })
        );
        assert!(matches!(
            model.select_day(31),
            Err(ValidationError::DayNotSelectable { reason: UnselectableReason::OutsideMonth, .. })
        ));
        assert_eq!(model.selected(), None);
    }

    /// Clock the test can move forward
    struct SteppingClock(Mutex<NaiveDate>);

    impl Clock for SteppingClock {
        fn today(&self) -> NaiveDate {
            *self.0.lock().unwrap()
        }
    }

    #[test]
    fn test_midnight_rollover_reclassifies_without_reset() {
        let clock = Arc::new(SteppingClock(Mutex::new(date(2024, 6, 10))));
        let mut model = CalendarModel::with_clock(clock.clone());
        let classify = |model: &CalendarModel| {
            model.render_current().day(10).and_then(DayCell::classification)
        };
        assert_eq!(classify(&model), Some(DayClassification::Available));

        *clock.0.lock().unwrap() = date(2024, 6, 11);

        assert_eq!(classify(&model), Some(DayClassification::Past));
        assert_eq!(model.today(), date(2024, 6, 11));
        assert_eq!(
            model.select_day(10),
            Err(ValidationError::DayNotSelectable {
                date: date(2024, 6, 10),
                reason: UnselectableReason::Past,
            })
        );
        assert_eq!(model.select_day(11), Ok(date(2024, 6, 11)));
    }

    #[test]
    fn test_fixed_clock() {
        let model = june_2024();
        assert_eq!(model.today(), date(2024, 6, 10));
        assert_eq!((model.year(), model.month()), (2024, 6));
    }
}
