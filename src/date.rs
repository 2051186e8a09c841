//! Gregorian calendar arithmetic for the scheduler.
//!
//! No `chrono` dependency: the engine only ever needs the narrow slice of
//! Gregorian arithmetic the scheduler exercises (day/week/month addition,
//! last-day predicates, comparison), so it is hand-rolled the same way the
//! teacher hand-rolls small self-contained value types (`TerrainCell`,
//! `Crater`) rather than reaching for a crate to model a handful of fields.

use std::fmt;

const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    if month == 2 && is_leap_year(year) {
        29
    } else {
        DAYS_IN_MONTH[(month - 1) as usize]
    }
}

/// A Gregorian calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Date {
    year: i32,
    month: u32,
    day: u32,
}

impl Date {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        assert!((1..=12).contains(&month), "month out of range: {month}");
        assert!(day >= 1 && day <= days_in_month(year, month), "day out of range: {day}");
        Date { year, month, day }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn is_last_day_of_month(&self) -> bool {
        self.day == days_in_month(self.year, self.month)
    }

    pub fn is_last_day_of_year(&self) -> bool {
        self.month == 12 && self.day == 31
    }

    /// Parse `"Y-M-D"`.
    pub fn parse(s: &str) -> Option<Date> {
        let mut parts = s.splitn(3, '-');
        let year: i32 = parts.next()?.parse().ok()?;
        let month: u32 = parts.next()?.parse().ok()?;
        let day: u32 = parts.next()?.parse().ok()?;
        if month == 0 || month > 12 || day == 0 || day > days_in_month(year, month) {
            return None;
        }
        Some(Date { year, month, day })
    }

    pub fn add_days(&self, n: u32) -> Date {
        let mut date = *self;
        for _ in 0..n {
            date = date.next_day();
        }
        date
    }

    fn next_day(self) -> Date {
        if self.day < days_in_month(self.year, self.month) {
            Date { day: self.day + 1, ..self }
        } else if self.month < 12 {
            Date { year: self.year, month: self.month + 1, day: 1 }
        } else {
            Date { year: self.year + 1, month: 1, day: 1 }
        }
    }

    pub fn subtract_day(&self) -> Date {
        if self.day > 1 {
            Date { day: self.day - 1, ..*self }
        } else if self.month > 1 {
            let month = self.month - 1;
            Date { year: self.year, month, day: days_in_month(self.year, month) }
        } else {
            Date { year: self.year - 1, month: 12, day: 31 }
        }
    }

    pub fn add_weeks(&self, n: u32) -> Date {
        self.add_days(n * 7)
    }

    /// Add one calendar month, clamping the day into the target month if it
    /// would otherwise overflow (e.g. Jan 31 + 1 month -> Feb 28/29).
    pub fn add_months(&self, n: u32) -> Date {
        let mut date = *self;
        for _ in 0..n {
            let (year, month) = if date.month == 12 {
                (date.year + 1, 1)
            } else {
                (date.year, date.month + 1)
            };
            let day = date.day.min(days_in_month(year, month));
            date = Date { year, month, day };
        }
        date
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_days_rolls_month_and_year() {
        let d = Date::new(2020, 1, 31);
        assert_eq!(d.add_days(1), Date::new(2020, 2, 1));
        let d = Date::new(2020, 12, 31);
        assert_eq!(d.add_days(1), Date::new(2021, 1, 1));
    }

    #[test]
    fn leap_year_february() {
        let d = Date::new(2020, 2, 28);
        assert_eq!(d.add_days(1), Date::new(2020, 2, 29));
        let d = Date::new(2021, 2, 28);
        assert_eq!(d.add_days(1), Date::new(2021, 3, 1));
    }

    #[test]
    fn add_months_clamps_day() {
        let d = Date::new(2021, 1, 31);
        assert_eq!(d.add_months(1), Date::new(2021, 2, 28));
    }

    #[test]
    fn last_day_predicates() {
        assert!(Date::new(2020, 2, 29).is_last_day_of_month());
        assert!(Date::new(2020, 12, 31).is_last_day_of_year());
        assert!(!Date::new(2020, 12, 30).is_last_day_of_year());
    }

    #[test]
    fn parse_and_display() {
        let d = Date::parse("2020-03-15").unwrap();
        assert_eq!(d, Date::new(2020, 3, 15));
        assert_eq!(d.to_string(), "2020-03-15");
    }

    #[test]
    fn ordering() {
        assert!(Date::new(2020, 1, 1) < Date::new(2020, 1, 2));
        assert!(Date::new(2020, 1, 1) < Date::new(2021, 1, 1));
    }
}
