//! Renders a member's raid attendance for one month.
//!
//! Raids happen on Wednesdays and Saturdays. A raid day counts towards the
//! attendance rate only if it is on or after [CalendarSettings::tracking_start]
//! and not after the cutoff: "now" when looking at the current month,
//! otherwise the last day of the month.

pub mod month;

use std::fmt::Display;
use std::fmt::Write;

use chrono::DateTime;
use chrono::Datelike;
use chrono::Duration;
use chrono::NaiveTime;
use chrono::Utc;
use chrono::Weekday;
use itertools::Itertools;

use crate::attendance::AttendanceRecord;
pub use month::MonthChoice;
pub use month::YearMonth;

/// Width of a single day in the grid.
const CELL_WIDTH: usize = 4;

/// ANSI codes understood by Discord's `ansi` code blocks.
const ANSI_GREEN: &str = "\u{1b}[2;32m";
const ANSI_RED: &str = "\u{1b}[2;31m";
const ANSI_RESET: &str = "\u{1b}[0m";

/// Settings the renderer needs from the config.
#[derive(Debug, Clone)]
pub struct CalendarSettings {
    /// Raid days starting before this are never counted.
    /// Expected to be a UTC midnight: a raid day is only counted when its
    /// 00:00 UTC is at or after this instant.
    pub tracking_start: DateTime<Utc>,
}

/// What a single day of the month looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarCell {
    /// Counted raid day with at least one attendance record.
    Attended,
    /// Counted raid day without any attendance record.
    Absent,
    /// Raid day before tracking started or after the cutoff.
    Untracked,
    /// Not a raid day.
    Off,
}

/// Is this weekday a raid day?
pub fn is_raid_day(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Wed | Weekday::Sat)
}

/// A rendered month. [Display] produces the grid and the summary line.
#[derive(Debug, Clone)]
pub struct CalendarView {
    name: String,
    month: YearMonth,
    tracking_start: DateTime<Utc>,
    /// One cell per day, index 0 being the 1st.
    cells: Vec<CalendarCell>,
    attended: u32,
    counted: u32,
}

impl CalendarView {
    /// The cell for a day of the month (1-indexed).
    pub fn cell(&self, day: u32) -> Option<CalendarCell> {
        let idx = usize::try_from(day).ok()?.checked_sub(1)?;
        self.cells.get(idx).copied()
    }

    /// Counted raid days with attendance.
    pub fn attended(&self) -> u32 {
        self.attended
    }

    /// Raid days counted towards the rate.
    pub fn counted(&self) -> u32 {
        self.counted
    }

    /// Attendance rate in percent, rounded. `None` when no raid day was counted.
    pub fn rate(&self) -> Option<u32> {
        if self.counted() == 0 {
            return None;
        }
        let rate = f64::from(self.attended()) / f64::from(self.counted()) * 100.0;
        Some(rate.round() as u32)
    }

    /// Days laid out in Sunday-first weeks.
    /// Slots before the 1st and after the last day are `None`.
    pub fn weeks(&self) -> Vec<Vec<Option<(u32, CalendarCell)>>> {
        let leading = self.month.first_day().weekday().num_days_from_sunday() as usize;

        let days = self.cells.len() as u32;

        let mut slots: Vec<Option<(u32, CalendarCell)>> = vec![None; leading];
        slots.extend((1..=days).map(|day| self.cell(day).map(|cell| (day, cell))));
        let trailing = (7 - slots.len() % 7) % 7;
        slots.extend(std::iter::repeat(None).take(trailing));

        slots.chunks(7).map(<[_]>::to_vec).collect()
    }

    /// The line under the grid.
    pub fn summary(&self) -> String {
        match self.rate() {
            Some(rate) => format!(
                "Attendance rate: {rate}% ({} of {} raids)",
                self.attended(),
                self.counted()
            ),
            None => format!(
                "No attendance data yet, tracking begins on {}.",
                month::format_tracking_start(&self.tracking_start)
            ),
        }
    }
}

/// Render a single grid slot.
fn render_slot(slot: Option<(u32, CalendarCell)>) -> String {
    match slot {
        None => " ".repeat(CELL_WIDTH),
        Some((day, CalendarCell::Attended)) => format!("{ANSI_GREEN} {day:>2} {ANSI_RESET}"),
        Some((day, CalendarCell::Absent)) => format!("{ANSI_RED} {day:>2} {ANSI_RESET}"),
        Some((day, CalendarCell::Untracked | CalendarCell::Off)) => format!(" {day:>2} "),
    }
}

impl Display for CalendarView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = CELL_WIDTH * 7;

        writeln!(f, "{}", self.name)?;
        writeln!(f, "{:^width$}", self.month.to_string())?;

        let labels = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"]
            .iter()
            .map(|label| format!("{label:^w$}", w = CELL_WIDTH))
            .join("");
        writeln!(f, "{labels}")?;

        for week in self.weeks() {
            let row = week.into_iter().map(render_slot).join("");
            writeln!(f, "{row}")?;
        }

        write!(f, "{}", self.summary())
    }
}

/// Map attendance records onto the month grid of `month`.
///
/// `now` decides the cutoff when `month` is the current month.
/// Several records on the same day count once.
pub fn render_calendar(
    name: &str,
    records: &[AttendanceRecord],
    month: YearMonth,
    now: DateTime<Utc>,
    settings: &CalendarSettings,
) -> CalendarView {
    let in_month = records
        .iter()
        .map(|record| record.date)
        .filter(|date| YearMonth::of(date) == month)
        .collect_vec();

    let cutoff = if YearMonth::of(&now) == month {
        now
    } else {
        month.last_day().and_time(NaiveTime::MIN).and_utc()
    };

    let mut cells = Vec::with_capacity(31);
    let mut attended = 0;
    let mut counted = 0;

    let days = month::days_in_month(month.year(), month.month0());
    for date in month.first_day().iter_days().take(days as usize) {
        let start = date.and_time(NaiveTime::MIN).and_utc();

        let cell = if !is_raid_day(date.weekday()) {
            CalendarCell::Off
        } else if start < settings.tracking_start || start > cutoff {
            CalendarCell::Untracked
        } else {
            counted += 1;
            let end = start + Duration::days(1) - Duration::milliseconds(1);
            if in_month.iter().any(|d| *d >= start && *d <= end) {
                attended += 1;
                CalendarCell::Attended
            } else {
                CalendarCell::Absent
            }
        };
        cells.push(cell);
    }

    tracing::debug!("{name}: {attended} of {counted} raids attended in {month}");

    CalendarView {
        name: name.to_string(),
        month,
        tracking_start: settings.tracking_start,
        cells,
        attended,
        counted,
    }
}

/// Wrap a rendered calendar in a Discord `ansi` code block.
pub fn to_code_block(view: &CalendarView) -> String {
    let mut block = String::from("```ansi\n");
    writeln!(block, "{view}").expect("write to string buffer can't fail");
    block.push_str("```");
    block
}
