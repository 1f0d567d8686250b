use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// A displayed month. Navigation only moves this view; it never touches
/// the selected date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
}

impl MonthView {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        // Also bounds the year: chrono only represents a finite range.
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| MonthView { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        MonthView {
            year: date.year(),
            month: date.month(),
        }
    }

    /// December rolls over into January of the following year.
    pub fn next(self) -> Self {
        if self.month == 12 {
            MonthView {
                year: self.year + 1,
                month: 1,
            }
        } else {
            MonthView {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// January rolls back into December of the prior year.
    pub fn prev(self) -> Self {
        if self.month == 1 {
            MonthView {
                year: self.year - 1,
                month: 12,
            }
        } else {
            MonthView {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    fn first_day(&self) -> NaiveDate {
        // year and month are validated on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("valid month view")
    }

    pub fn days(&self) -> u32 {
        (29..=31)
            .take_while(|d| NaiveDate::from_ymd_opt(self.year, self.month, *d).is_some())
            .last()
            .unwrap_or(28)
    }

    /// Render the month as an ordered cell sequence: leading blanks to
    /// align the 1st under its weekday (Sunday first), then one cell per
    /// day. Pure; `today` decides which days are in the past.
    pub fn grid(&self, selected: Option<NaiveDate>, today: NaiveDate) -> Vec<DayCell> {
        let first = self.first_day();
        let lead = first.weekday().num_days_from_sunday();

        let mut cells = Vec::with_capacity((lead + self.days()) as usize);
        for _ in 0..lead {
            cells.push(DayCell::Blank);
        }
        for day in 1..=self.days() {
            let date = NaiveDate::from_ymd_opt(self.year, self.month, day).expect("valid day");
            cells.push(DayCell::Day {
                day,
                date,
                past: date < today,
                today: date == today,
                selected: selected == Some(date),
            });
        }
        cells
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayCell {
    /// Padding before the 1st in the first display week.
    Blank,
    Day {
        day: u32,
        date: NaiveDate,
        past: bool,
        today: bool,
        selected: bool,
    },
}

impl DayCell {
    /// Past cells render non-interactive; everything else takes clicks,
    /// including an already-selected day (re-selection is a no-op).
    pub fn selectable(&self) -> bool {
        match self {
            DayCell::Blank => false,
            DayCell::Day { past, .. } => !past,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn cell_for<'a>(cells: &'a [DayCell], want: NaiveDate) -> &'a DayCell {
        cells
            .iter()
            .find(|c| matches!(c, DayCell::Day { date, .. } if *date == want))
            .unwrap()
    }

    #[test]
    fn test_next_rolls_december_into_next_year() {
        let view = MonthView::new(2024, 12).unwrap();
        assert_eq!(view.next(), MonthView { year: 2025, month: 1 });
    }

    #[test]
    fn test_prev_rolls_january_into_prior_year() {
        let view = MonthView::new(2024, 1).unwrap();
        assert_eq!(view.prev(), MonthView { year: 2023, month: 12 });
    }

    #[test]
    fn test_prev_then_next_is_identity() {
        let view = MonthView::new(2024, 6).unwrap();
        assert_eq!(view.prev().next(), view);
        assert_eq!(view.next().prev(), view);
    }

    #[test]
    fn test_new_rejects_invalid_month() {
        assert!(MonthView::new(2024, 0).is_none());
        assert!(MonthView::new(2024, 13).is_none());
    }

    #[test]
    fn test_new_rejects_out_of_range_year() {
        assert!(MonthView::new(300_000, 6).is_none());
        assert!(MonthView::new(-300_000, 6).is_none());
    }

    #[test]
    fn test_grid_at_calendar_range_edge() {
        // December of the last representable year has no next month to
        // peek at, so day counting must not reach past it.
        let view = MonthView::containing(NaiveDate::MAX);
        let cells = view.grid(None, date("2024-06-15"));
        let days = cells
            .iter()
            .filter(|c| matches!(c, DayCell::Day { .. }))
            .count() as u32;
        assert_eq!(days, view.days());
        assert_eq!(days, 31);
    }

    #[test]
    fn test_days_handles_leap_february() {
        assert_eq!(MonthView::new(2024, 2).unwrap().days(), 29);
        assert_eq!(MonthView::new(2025, 2).unwrap().days(), 28);
        assert_eq!(MonthView::new(2024, 6).unwrap().days(), 30);
    }

    #[test]
    fn test_grid_leading_blanks_match_first_weekday() {
        // June 1, 2024 is a Saturday: weekday index 6
        let cells = MonthView::new(2024, 6).unwrap().grid(None, date("2024-06-15"));
        assert_eq!(cells.len(), 6 + 30);
        assert!(cells[..6].iter().all(|c| *c == DayCell::Blank));
        assert!(matches!(cells[6], DayCell::Day { day: 1, .. }));

        // September 1, 2024 is a Sunday: no padding at all
        let cells = MonthView::new(2024, 9).unwrap().grid(None, date("2024-06-15"));
        assert!(matches!(cells[0], DayCell::Day { day: 1, .. }));
    }

    #[test]
    fn test_past_days_are_not_selectable_and_today_is() {
        let today = date("2024-06-15");
        let cells = MonthView::new(2024, 6).unwrap().grid(None, today);

        let yesterday = cell_for(&cells, date("2024-06-14"));
        assert!(!yesterday.selectable());
        assert!(matches!(yesterday, DayCell::Day { past: true, today: false, .. }));

        let today_cell = cell_for(&cells, today);
        assert!(today_cell.selectable());
        assert!(matches!(today_cell, DayCell::Day { past: false, today: true, .. }));
    }

    #[test]
    fn test_selected_day_is_highlighted_and_still_selectable() {
        let today = date("2024-06-15");
        let cells = MonthView::new(2024, 6)
            .unwrap()
            .grid(Some(date("2024-06-20")), today);

        let selected = cell_for(&cells, date("2024-06-20"));
        assert!(matches!(selected, DayCell::Day { selected: true, .. }));
        assert!(selected.selectable());
    }

    #[test]
    fn test_selection_outside_displayed_month_marks_nothing() {
        let cells = MonthView::new(2024, 6)
            .unwrap()
            .grid(Some(date("2024-07-20")), date("2024-06-15"));
        assert!(!cells
            .iter()
            .any(|c| matches!(c, DayCell::Day { selected: true, .. })));
    }
}
