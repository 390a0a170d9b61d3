//! Resolves a period selection into a rule that decides which dates belong to it.
//!
//! Resolution is pure: "today" is passed in by the caller, already converted
//! to the configured local timezone. Selections that are incomplete or
//! malformed never fail, they resolve to [PeriodRule::Unrestricted].

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::{
    Date, Duration, Month, Weekday,
    format_description::BorrowedFormatItem,
    macros::format_description,
};

/// The periods a user can choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodSelector {
    /// Every record, regardless of its date.
    All,
    /// A single calendar date.
    SpecificDate(Date),
    /// An ISO 8601 week, Monday to Sunday.
    IsoWeek { year: i32, week: u8 },
    /// A month of a specific year.
    CalendarMonth { year: i32, month: Month },
    /// The n-th block of seven days in a month, starting from the first of the month.
    MonthWeek { year: i32, month: Month, week: u8 },
    /// The week starting on the most recent Sunday, shifted by `offset` weeks.
    RollingWeek { offset: i64 },
    /// The current month, in any year.
    RollingMonth,
    /// A month, in any year.
    MonthOfAnyYear(Month),
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The rule produced by resolving a [PeriodSelector].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodRule {
    /// Matches every record, including those without a valid date.
    Unrestricted,
    /// Matches records created on the given date.
    Day(Date),
    /// Matches records created within the range, inclusive at both ends.
    Range(DateRange),
    /// Matches records created in the given month of the given year.
    YearMonth { year: i32, month: Month },
    /// Matches records created in the given month of any year.
    MonthIndex(Month),
}

impl PeriodRule {
    /// Whether a record created on `date` falls within this rule.
    ///
    /// A record without a valid date only matches [PeriodRule::Unrestricted].
    pub fn matches(&self, date: Option<Date>) -> bool {
        match (self, date) {
            (PeriodRule::Unrestricted, _) => true,
            (_, None) => false,
            (PeriodRule::Day(day), Some(date)) => *day == date,
            (PeriodRule::Range(range), Some(date)) => range.contains(date),
            (PeriodRule::YearMonth { year, month }, Some(date)) => {
                date.year() == *year && date.month() == *month
            }
            (PeriodRule::MonthIndex(month), Some(date)) => date.month() == *month,
        }
    }
}

/// Resolve `selector` into a [PeriodRule] relative to `today`.
///
/// Selectors that name a date that does not exist (e.g., week 53 of a year
/// with 52 ISO weeks) resolve to [PeriodRule::Unrestricted].
pub fn resolve(selector: &PeriodSelector, today: Date) -> PeriodRule {
    let rule = match *selector {
        PeriodSelector::All => Some(PeriodRule::Unrestricted),
        PeriodSelector::SpecificDate(date) => Some(PeriodRule::Day(date)),
        PeriodSelector::IsoWeek { year, week } => iso_week_range(year, week).map(PeriodRule::Range),
        PeriodSelector::CalendarMonth { year, month } => {
            Some(PeriodRule::YearMonth { year, month })
        }
        PeriodSelector::MonthWeek { year, month, week } => {
            month_week_range(year, month, week).map(PeriodRule::Range)
        }
        PeriodSelector::RollingWeek { offset } => {
            rolling_week_range(today, offset).map(PeriodRule::Range)
        }
        PeriodSelector::RollingMonth => Some(PeriodRule::MonthIndex(today.month())),
        PeriodSelector::MonthOfAnyYear(month) => Some(PeriodRule::MonthIndex(month)),
    };

    rule.unwrap_or_else(|| {
        tracing::debug!("Could not resolve {selector:?}, falling back to all records");
        PeriodRule::Unrestricted
    })
}

fn iso_week_range(year: i32, week: u8) -> Option<DateRange> {
    let start = Date::from_iso_week_date(year, week, Weekday::Monday).ok()?;
    let end = start.checked_add(Duration::days(6))?;

    Some(DateRange { start, end })
}

const MAX_WEEK_OF_MONTH: u8 = 5;

fn month_week_range(year: i32, month: Month, week: u8) -> Option<DateRange> {
    if !(1..=MAX_WEEK_OF_MONTH).contains(&week) {
        return None;
    }

    let first_day = Date::from_calendar_date(year, month, 1).ok()?;
    let last_day = last_day_of_month(year, month)?;

    let start = first_day
        .checked_add(Duration::weeks(i64::from(week) - 1))?
        .min(last_day);
    let end = start.checked_add(Duration::days(6))?.min(last_day);

    Some(DateRange { start, end })
}

fn last_day_of_month(year: i32, month: Month) -> Option<Date> {
    let first_day_of_next_month = match month {
        Month::December => Date::from_calendar_date(year.checked_add(1)?, Month::January, 1),
        month => Date::from_calendar_date(year, month.next(), 1),
    };

    first_day_of_next_month.ok()?.previous_day()
}

/// Shifts larger than this fall outside the representable dates anyway.
const MAX_SHIFT_DAYS: i64 = 10_000_000;

fn rolling_week_range(today: Date, offset: i64) -> Option<DateRange> {
    let days_since_sunday = i64::from(today.weekday().number_days_from_sunday());
    let most_recent_sunday = today.checked_sub(Duration::days(days_since_sunday))?;
    let shift = offset
        .checked_mul(7)
        .filter(|days| days.abs() <= MAX_SHIFT_DAYS)?;
    let start = most_recent_sunday.checked_add(Duration::days(shift))?;
    let end = start.checked_add(Duration::days(6))?;

    Some(DateRange { start, end })
}

/// The kind of period chosen in the period form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodMode {
    All,
    Date,
    Week,
    Month,
    MonthWeek,
    RollingWeek,
    RollingMonth,
    MonthOfYear,
}

impl PeriodMode {
    /// Every mode, in the order shown in the period form.
    pub const ALL: [PeriodMode; 8] = [
        PeriodMode::All,
        PeriodMode::Date,
        PeriodMode::Week,
        PeriodMode::Month,
        PeriodMode::MonthWeek,
        PeriodMode::RollingWeek,
        PeriodMode::RollingMonth,
        PeriodMode::MonthOfYear,
    ];

    pub fn as_query_value(self) -> &'static str {
        match self {
            PeriodMode::All => "all",
            PeriodMode::Date => "date",
            PeriodMode::Week => "week",
            PeriodMode::Month => "month",
            PeriodMode::MonthWeek => "month-week",
            PeriodMode::RollingWeek => "rolling-week",
            PeriodMode::RollingMonth => "rolling-month",
            PeriodMode::MonthOfYear => "month-of-year",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PeriodMode::All => "All records",
            PeriodMode::Date => "Specific date",
            PeriodMode::Week => "ISO week",
            PeriodMode::Month => "Month",
            PeriodMode::MonthWeek => "Week of month",
            PeriodMode::RollingWeek => "Week from Sunday",
            PeriodMode::RollingMonth => "Current month",
            PeriodMode::MonthOfYear => "Month of any year",
        }
    }

    fn from_query_value(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_query_value() == value.trim())
    }
}

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The period parameters of a page's query string.
///
/// Every field is kept as text so that a malformed value falls back to
/// showing all records instead of rejecting the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodQuery {
    /// The [PeriodMode] query value, e.g. "week".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    /// A date such as "2024-03-10".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// An ISO week such as "2024-W10".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week: Option<String>,
    /// A month such as "2024-03".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    /// A week of the month between 1 and 5.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_of_month: Option<String>,
    /// A month number between 1 and 12.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_of_year: Option<String>,
    /// A number of weeks relative to the current week.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

impl PeriodQuery {
    /// The mode chosen in the query, defaulting to all records.
    pub fn mode(&self) -> PeriodMode {
        self.period
            .as_deref()
            .and_then(PeriodMode::from_query_value)
            .unwrap_or(PeriodMode::All)
    }

    /// Build the selector described by the query.
    ///
    /// Missing or malformed parameters produce [PeriodSelector::All].
    pub fn selector(&self) -> PeriodSelector {
        let selector = match self.mode() {
            PeriodMode::All => Some(PeriodSelector::All),
            PeriodMode::Date => self
                .date
                .as_deref()
                .and_then(parse_date)
                .map(PeriodSelector::SpecificDate),
            PeriodMode::Week => self
                .week
                .as_deref()
                .and_then(parse_iso_week)
                .map(|(year, week)| PeriodSelector::IsoWeek { year, week }),
            PeriodMode::Month => self
                .month
                .as_deref()
                .and_then(parse_year_month)
                .map(|(year, month)| PeriodSelector::CalendarMonth { year, month }),
            PeriodMode::MonthWeek => {
                let year_month = self.month.as_deref().and_then(parse_year_month);
                let week = self
                    .week_of_month
                    .as_deref()
                    .and_then(|week| week.trim().parse::<u8>().ok());

                year_month
                    .zip(week)
                    .map(|((year, month), week)| PeriodSelector::MonthWeek { year, month, week })
            }
            PeriodMode::RollingWeek => {
                let offset = match self.offset.as_deref().map(str::trim) {
                    None | Some("") => Some(0),
                    Some(offset) => offset.parse::<i64>().ok(),
                };

                offset.map(|offset| PeriodSelector::RollingWeek { offset })
            }
            PeriodMode::RollingMonth => Some(PeriodSelector::RollingMonth),
            PeriodMode::MonthOfYear => self
                .month_of_year
                .as_deref()
                .and_then(|month| month.trim().parse::<u8>().ok())
                .and_then(|month| Month::try_from(month).ok())
                .map(PeriodSelector::MonthOfAnyYear),
        };

        selector.unwrap_or(PeriodSelector::All)
    }

    /// Encode the query for use in a link, e.g. "period=week&week=2024-W10".
    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(self)
            .inspect_err(|error| tracing::error!("Could not encode period query {self:?}: {error}"))
            .unwrap_or_default()
    }
}

/// Parse a date such as "2024-03-10".
pub fn parse_date(text: &str) -> Option<Date> {
    Date::parse(text.trim(), DATE_FORMAT).ok()
}

/// Parse an ISO week such as "2024-W10" into a year and week number.
///
/// The week number is not checked against the year, see [resolve].
pub fn parse_iso_week(text: &str) -> Option<(i32, u8)> {
    let (year, week) = text.trim().split_once("-W")?;

    if year.len() != 4 || week.is_empty() || week.len() > 2 {
        return None;
    }

    let year = year.parse::<i32>().ok()?;
    let week = week.parse::<u8>().ok()?;

    Some((year, week))
}

/// Parse a month such as "2024-03" into a year and month.
pub fn parse_year_month(text: &str) -> Option<(i32, Month)> {
    let (year, month) = text.trim().split_once('-')?;

    if year.len() != 4 || month.len() != 2 {
        return None;
    }

    let year = year.parse::<i32>().ok()?;
    let month = Month::try_from(month.parse::<u8>().ok()?).ok()?;

    Some((year, month))
}

impl Display for PeriodSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodSelector::All => write!(f, "All records"),
            PeriodSelector::SpecificDate(date) => write!(f, "{date}"),
            PeriodSelector::IsoWeek { year, week } => write!(f, "Week {week} of {year}"),
            PeriodSelector::CalendarMonth { year, month } => write!(f, "{month} {year}"),
            PeriodSelector::MonthWeek { year, month, week } => {
                write!(f, "Week {week} of {month} {year}")
            }
            PeriodSelector::RollingWeek { offset: 0 } => write!(f, "This week"),
            PeriodSelector::RollingWeek { offset } if *offset < 0 => {
                write!(f, "{} week(s) ago", offset.unsigned_abs())
            }
            PeriodSelector::RollingWeek { offset } => write!(f, "In {offset} week(s)"),
            PeriodSelector::RollingMonth => write!(f, "This month"),
            PeriodSelector::MonthOfAnyYear(month) => write!(f, "{month} of any year"),
        }
    }
}
