//! Month arithmetic and validation of the month a user asks to see.

use std::fmt::Display;

use chrono::DateTime;
use chrono::Datelike;
use chrono::Months;
use chrono::NaiveDate;
use chrono::Utc;

use crate::error::UserError;

/// A calendar month in UTC.
/// Always holds the first day of the month, so every value is a real month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    /// Construct from a year and a 1-indexed month.
    pub fn new(year: i32, month: u32) -> Result<Self, UserError> {
        if !(1..=12).contains(&month) {
            return Err(UserError::InvalidMonth { month });
        }
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or(UserError::MalformedDate {
                input: format!("{month:02}/{year}"),
            })
    }

    /// Construct from a year and a 0-indexed month.
    pub fn from_month0(year: i32, month0: u32) -> Result<Self, UserError> {
        let month = month0
            .checked_add(1)
            .ok_or(UserError::InvalidMonth { month: month0 })?;
        Self::new(year, month)
    }

    /// The month a UTC timestamp falls in.
    pub fn of(datetime: &DateTime<Utc>) -> Self {
        Self(datetime.date_naive().with_day0(0).unwrap_or(datetime.date_naive()))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// 0-indexed month (January is 0).
    pub fn month0(&self) -> u32 {
        self.0.month0()
    }

    /// First day of the month.
    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// Last day of the month.
    pub fn last_day(&self) -> NaiveDate {
        // Day 0 of the following month.
        match self.0.checked_add_months(Months::new(1)) {
            Some(next) => next.pred_opt().unwrap_or(self.0),
            // Only December of chrono's last year gets here.
            None => self.0.with_day(31).unwrap_or(self.0),
        }
    }

    /// Number of days in the month.
    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    /// The month `n` months before this one, if chrono can represent it.
    pub fn months_back(&self, n: u32) -> Option<Self> {
        self.0.checked_sub_months(Months::new(n)).map(Self)
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%B %Y"))
    }
}

/// Number of days in a month, `month0` being 0-indexed.
/// Invalid months have 0 days.
pub fn days_in_month(year: i32, month0: u32) -> u32 {
    YearMonth::from_month0(year, month0).map_or(0, |m| m.days_in_month())
}

/// Preset months offered by the `month` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum MonthChoice {
    #[name = "This month"]
    Current,
    #[name = "Last month"]
    OneMonthAgo,
    #[name = "Two months ago"]
    TwoMonthsAgo,
    #[name = "Three months ago"]
    ThreeMonthsAgo,
}

impl MonthChoice {
    /// How many months before the current one this choice points to.
    pub fn months_back(self) -> u32 {
        match self {
            MonthChoice::Current => 0,
            MonthChoice::OneMonthAgo => 1,
            MonthChoice::TwoMonthsAgo => 2,
            MonthChoice::ThreeMonthsAgo => 3,
        }
    }
}

/// Format used when telling users when tracking began.
pub fn format_tracking_start(tracking_start: &DateTime<Utc>) -> String {
    tracking_start.format("%B %-d, %Y").to_string()
}

/// Parse a `MM/YYYY` string into a month that can be shown.
///
/// Rejects malformed input, months outside 1..=12, months before the month
/// tracking started in and months after the current one.
pub fn parse_custom_date(
    input: &str,
    tracking_start: &DateTime<Utc>,
    now: &DateTime<Utc>,
) -> Result<YearMonth, UserError> {
    let malformed = || UserError::MalformedDate {
        input: input.to_string(),
    };

    let (month, year) = input.trim().split_once('/').ok_or_else(malformed)?;

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(month) || month.len() > 2 || !all_digits(year) || year.len() != 4 {
        return Err(malformed());
    }

    let month: u32 = month.parse().map_err(|_| malformed())?;
    let year: i32 = year.parse().map_err(|_| malformed())?;

    let requested = YearMonth::new(year, month)?;

    if requested < YearMonth::of(tracking_start) {
        return Err(UserError::BeforeTracking {
            tracking_start: format_tracking_start(tracking_start),
        });
    }
    if requested > YearMonth::of(now) {
        return Err(UserError::FutureDate);
    }

    Ok(requested)
}

/// Decide which month to show from the command's options.
/// A custom date takes priority over a preset; no options means the current month.
pub fn resolve_month(
    choice: Option<MonthChoice>,
    custom_date: Option<&str>,
    tracking_start: &DateTime<Utc>,
    now: &DateTime<Utc>,
) -> Result<YearMonth, UserError> {
    if let Some(input) = custom_date {
        return parse_custom_date(input, tracking_start, now);
    }

    let back = choice.map_or(0, MonthChoice::months_back);
    YearMonth::of(now)
        .months_back(back)
        .ok_or(UserError::BeforeTracking {
            tracking_start: format_tracking_start(tracking_start),
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn days_in_every_month() {
        let expected_2023 = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        let expected_2024 = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        for month0 in 0..12 {
            assert_eq!(days_in_month(2023, month0), expected_2023[month0 as usize]);
            assert_eq!(days_in_month(2024, month0), expected_2024[month0 as usize]);
        }
    }

    #[test]
    fn february_follows_leap_rules() {
        assert_eq!(days_in_month(1900, 1), 28);
        assert_eq!(days_in_month(2000, 1), 29);
        assert_eq!(days_in_month(2100, 1), 28);
        assert_eq!(days_in_month(2028, 1), 29);
    }

    #[test]
    fn invalid_month_has_no_days() {
        assert_eq!(days_in_month(2024, 12), 0);
        assert_eq!(days_in_month(2024, u32::MAX), 0);
    }

    #[test]
    fn month_thirteen_is_rejected() {
        assert!(matches!(
            YearMonth::new(2024, 13),
            Err(UserError::InvalidMonth { month: 13 })
        ));
        assert!(matches!(
            YearMonth::new(2024, 0),
            Err(UserError::InvalidMonth { month: 0 })
        ));
    }

    #[test]
    fn months_back_crosses_years() {
        let jan = YearMonth::new(2024, 1).unwrap();
        assert_eq!(jan.months_back(1), Some(YearMonth::new(2023, 12).unwrap()));
        assert_eq!(jan.months_back(3), Some(YearMonth::new(2023, 10).unwrap()));
        assert_eq!(jan.months_back(0), Some(jan));
    }

    #[test]
    fn of_uses_utc_fields() {
        let late = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        let month = YearMonth::of(&late);
        assert_eq!(month.year(), 2024);
        assert_eq!(month.month0(), 0);
        assert_eq!(month.to_string(), "January 2024");
    }

    #[test]
    fn custom_date_accepts_valid_months() {
        let start = utc(2023, 6, 1);
        let now = utc(2024, 3, 15);
        assert_eq!(
            parse_custom_date("01/2024", &start, &now).unwrap(),
            YearMonth::new(2024, 1).unwrap()
        );
        assert_eq!(
            parse_custom_date(" 3/2024 ", &start, &now).unwrap(),
            YearMonth::new(2024, 3).unwrap()
        );
        assert_eq!(
            parse_custom_date("06/2023", &start, &now).unwrap(),
            YearMonth::new(2023, 6).unwrap()
        );
    }

    #[test]
    fn custom_date_rejects_malformed_input() {
        let start = utc(2023, 6, 1);
        let now = utc(2024, 3, 15);
        for input in ["", "2024", "1-2024", "01/24", "001/2024", "ab/2024", "01/2024/1", "-1/2024"] {
            assert!(
                matches!(
                    parse_custom_date(input, &start, &now),
                    Err(UserError::MalformedDate { .. })
                ),
                "{input} should be malformed"
            );
        }
    }

    #[test]
    fn custom_date_rejects_month_thirteen() {
        let start = utc(2023, 6, 1);
        let now = utc(2024, 3, 15);
        assert!(matches!(
            parse_custom_date("13/2024", &start, &now),
            Err(UserError::InvalidMonth { month: 13 })
        ));
    }

    #[test]
    fn custom_date_rejects_before_tracking_and_future() {
        let start = utc(2023, 6, 1);
        let now = utc(2024, 3, 15);
        assert!(matches!(
            parse_custom_date("05/2023", &start, &now),
            Err(UserError::BeforeTracking { .. })
        ));
        assert!(matches!(
            parse_custom_date("04/2024", &start, &now),
            Err(UserError::FutureDate)
        ));
    }

    #[test]
    fn custom_date_wins_over_choice() {
        let start = utc(2023, 6, 1);
        let now = utc(2024, 3, 15);
        let month =
            resolve_month(Some(MonthChoice::Current), Some("12/2023"), &start, &now).unwrap();
        assert_eq!(month, YearMonth::new(2023, 12).unwrap());
    }

    #[test]
    fn choices_count_back_from_now() {
        let start = utc(2023, 6, 1);
        let now = utc(2024, 2, 10);
        let resolve = |choice| resolve_month(choice, None, &start, &now).unwrap();
        assert_eq!(resolve(None), YearMonth::new(2024, 2).unwrap());
        assert_eq!(resolve(Some(MonthChoice::Current)), YearMonth::new(2024, 2).unwrap());
        assert_eq!(resolve(Some(MonthChoice::OneMonthAgo)), YearMonth::new(2024, 1).unwrap());
        assert_eq!(resolve(Some(MonthChoice::ThreeMonthsAgo)), YearMonth::new(2023, 11).unwrap());
    }
}
