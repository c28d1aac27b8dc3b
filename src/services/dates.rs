//! Date-range refinement.
//!
//! A page that advertises a sale may also say when it runs. When an
//! explicit "M.D - M.D" or "M월 D일 ~ M월 D일" interval is found, the `sale`
//! status is checked against today's date. Dates only ever confirm or
//! disqualify a sale; they never turn a non-sale page into one.

use chrono::{Datelike, NaiveDate};
use regex::{Captures, Regex};

use crate::error::Result;
use crate::models::SaleStatus;
use crate::services::NormalizedText;

/// Optional weekday annotation such as "(일)" or "(SUN)".
const WEEKDAY: &str = r"(?:\s*\([^)]{1,5}\))?";
/// Range separators: hyphen, tilde, full-width tilde, en dash.
const SEPARATOR: &str = r"\s*[-~～–]\s*";

/// Calendar interval announced on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateInterval {
    /// Build an interval in `year`. An end before the start means the sale
    /// crosses new year, so the end moves to the following year.
    pub fn from_month_days(year: i32, start: (u32, u32), end: (u32, u32)) -> Option<Self> {
        let start_date = NaiveDate::from_ymd_opt(year, start.0, start.1)?;
        let mut end_date = NaiveDate::from_ymd_opt(year, end.0, end.1)?;
        if end_date < start_date {
            end_date = NaiveDate::from_ymd_opt(year + 1, end.0, end.1)?;
        }
        Some(Self {
            start: start_date,
            end: end_date,
        })
    }

    /// Status of a running sale on `today`.
    pub fn status_on(&self, today: NaiveDate) -> SaleStatus {
        if today < self.start {
            SaleStatus::Upcoming
        } else if today > self.end {
            SaleStatus::NoSale
        } else {
            SaleStatus::Sale
        }
    }
}

/// Finds sale intervals in page text.
#[derive(Debug, Clone)]
pub struct DateRangeRefiner {
    numeric: Regex,
    localized: Regex,
}

impl DateRangeRefiner {
    pub fn new() -> Result<Self> {
        let numeric = format!(
            r"(?:^|[^\d.])(\d{{1,2}})\.(\d{{1,2}}){WEEKDAY}{SEPARATOR}(\d{{1,2}})\.(\d{{1,2}}){WEEKDAY}(?:$|[^\d.])"
        );
        let localized = format!(
            r"(\d{{1,2}})\s*월\s*(\d{{1,2}})\s*일{WEEKDAY}{SEPARATOR}(\d{{1,2}})\s*월\s*(\d{{1,2}})\s*일"
        );
        Ok(Self {
            numeric: Regex::new(&numeric)?,
            localized: Regex::new(&localized)?,
        })
    }

    /// Re-evaluate a status against the first interval in `text`.
    ///
    /// Anything but `sale` passes through untouched, as does a page without
    /// a valid interval.
    pub fn refine(&self, status: SaleStatus, text: &NormalizedText, today: NaiveDate) -> SaleStatus {
        if status != SaleStatus::Sale {
            return status;
        }
        match self.find_interval(text, today.year()) {
            Some(interval) => interval.status_on(today),
            None => status,
        }
    }

    /// The earliest interval form in the text, parsed against `year`.
    /// An invalid first match is not retried with later ones.
    pub fn find_interval(&self, text: &NormalizedText, year: i32) -> Option<DateInterval> {
        let haystack = text.as_str();
        let numeric = self.numeric.captures(haystack);
        let localized = self.localized.captures(haystack);

        let first = match (numeric, localized) {
            (Some(a), Some(b)) => {
                if match_start(&a) <= match_start(&b) {
                    a
                } else {
                    b
                }
            }
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => return None,
        };

        let group = |i: usize| first.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        let start = (group(1)?, group(2)?);
        let end = (group(3)?, group(4)?);
        if !(1..=12).contains(&start.0) || !(1..=12).contains(&end.0) {
            return None;
        }
        DateInterval::from_month_days(year, start, end)
    }
}

/// Position of the first captured number (not the boundary character).
fn match_start(caps: &Captures<'_>) -> usize {
    caps.get(1).map_or(usize::MAX, |m| m.start())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refiner() -> DateRangeRefiner {
        DateRangeRefiner::new().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn refine(text: &str, today: NaiveDate) -> SaleStatus {
        refiner().refine(SaleStatus::Sale, &NormalizedText::from_text(text), today)
    }

    #[test]
    fn test_interval_relative_to_today() {
        let text = "WINTER SALE 1.28 - 2.11";
        assert_eq!(refine(text, date(2024, 1, 15)), SaleStatus::Upcoming);
        assert_eq!(refine(text, date(2024, 2, 1)), SaleStatus::Sale);
        assert_eq!(refine(text, date(2024, 3, 1)), SaleStatus::NoSale);
    }

    #[test]
    fn test_interval_bounds_are_inclusive() {
        let text = "1.28 ~ 2.11";
        assert_eq!(refine(text, date(2024, 1, 28)), SaleStatus::Sale);
        assert_eq!(refine(text, date(2024, 2, 11)), SaleStatus::Sale);
        assert_eq!(refine(text, date(2024, 2, 12)), SaleStatus::NoSale);
    }

    #[test]
    fn test_localized_form() {
        let text = "시즌오프 12월 20일(금) ~ 1월 5일(일)";
        let interval = refiner()
            .find_interval(&NormalizedText::from_text(text), 2024)
            .unwrap();
        assert_eq!(interval.start, date(2024, 12, 20));
        assert_eq!(interval.end, date(2025, 1, 5));
        assert_eq!(refine(text, date(2024, 12, 25)), SaleStatus::Sale);
    }

    #[test]
    fn test_year_wrap_numeric() {
        let interval = refiner()
            .find_interval(&NormalizedText::from_text("12.26 – 1.03"), 2025)
            .unwrap();
        assert_eq!(interval.end, date(2026, 1, 3));
    }

    #[test]
    fn test_invalid_dates_leave_status() {
        assert_eq!(refine("13.01 - 14.02", date(2024, 6, 1)), SaleStatus::Sale);
        assert_eq!(refine("2.30 - 3.05", date(2024, 6, 1)), SaleStatus::Sale);
        assert_eq!(refine("no dates at all", date(2024, 6, 1)), SaleStatus::Sale);
    }

    #[test]
    fn test_full_dates_are_not_partial_matches() {
        assert_eq!(
            refine("2024.01.28 - 2024.02.11", date(2024, 6, 1)),
            SaleStatus::Sale
        );
    }

    #[test]
    fn test_never_promotes() {
        let r = refiner();
        let text = NormalizedText::from_text("SALE 1.28 - 2.11");
        for status in [
            SaleStatus::NoSale,
            SaleStatus::Upcoming,
            SaleStatus::Error,
            SaleStatus::InvalidUrl,
        ] {
            assert_eq!(r.refine(status, &text, date(2024, 2, 1)), status);
        }
    }

    #[test]
    fn test_first_match_wins() {
        let text = NormalizedText::from_text("1월 1일 - 1월 10일 then 3.01 - 3.31");
        let interval = refiner().find_interval(&text, 2024).unwrap();
        assert_eq!(interval.start, date(2024, 1, 1));
    }
}
