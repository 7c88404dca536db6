use anyhow::{anyhow, bail};
use chrono::{Datelike, Months, NaiveDate};

use crate::datetime::{format_long_date, normalize_clock_time};
use crate::event::Event;
use crate::reminder::{Priority, Reminder};

/// The grid is always 6 weeks of 7 days, whatever the month looks like, so
/// the layout never reflows.
pub const GRID_CELLS: usize = 42;

pub const PAST_DATE_ERROR: &str = "Cannot select a date in the past.";

pub const WEEKDAY_HEADERS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Which month the calendar is looking at. Internally pinned to the first of
/// the month so day arithmetic cannot go wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    first: NaiveDate,
}

impl MonthCursor {
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn from_ym(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    /// Accepts "YYYY-MM" or a signed month offset like "+1" / "-2" relative
    /// to the month containing `today`.
    pub fn parse(token: &str, today: NaiveDate) -> anyhow::Result<Self> {
        let trimmed = token.trim();

        if let Some(rest) = trimmed.strip_prefix('+') {
            let n: u32 = rest.parse().map_err(|_| anyhow!("invalid month offset: {token}"))?;
            let mut cursor = Self::containing(today);
            for _ in 0..n {
                cursor = cursor.next_month();
            }
            return Ok(cursor);
        }
        if let Some(rest) = trimmed.strip_prefix('-') {
            let n: u32 = rest.parse().map_err(|_| anyhow!("invalid month offset: {token}"))?;
            let mut cursor = Self::containing(today);
            for _ in 0..n {
                cursor = cursor.prev_month();
            }
            return Ok(cursor);
        }

        if let Some((year, month)) = trimmed.split_once('-')
            && let (Ok(year), Ok(month)) = (year.parse::<i32>(), month.parse::<u32>())
            && let Some(cursor) = Self::from_ym(year, month)
        {
            return Ok(cursor);
        }

        bail!("invalid month: {token} (expected YYYY-MM, +N, or -N)")
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn next_month(self) -> Self {
        Self {
            first: self
                .first
                .checked_add_months(Months::new(1))
                .unwrap_or(self.first),
        }
    }

    pub fn prev_month(self) -> Self {
        Self {
            first: self
                .first
                .checked_sub_months(Months::new(1))
                .unwrap_or(self.first),
        }
    }

    pub fn days_in_month(&self) -> u32 {
        self.next_month()
            .first
            .signed_duration_since(self.first)
            .num_days() as u32
    }

    /// Weekday of the 1st, 0 = Sunday.
    pub fn first_weekday_index(&self) -> u32 {
        self.first.weekday().num_days_from_sunday()
    }

    pub fn date_for(&self, day: u32) -> NaiveDate {
        self.first.with_day(day).unwrap_or(self.first)
    }

    /// "March 2025"
    pub fn label(&self) -> String {
        self.first.format("%B %Y").to_string()
    }
}

/// One square of the 6x7 grid. Cells of the adjacent months carry no
/// event/reminder annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay {
    pub day_number: u32,
    pub in_current_month: bool,
    pub is_today: bool,
    pub events: Vec<Event>,
    pub reminders: Vec<Reminder>,
}

impl CalendarDay {
    fn out_of_month(day_number: u32) -> Self {
        Self {
            day_number,
            in_current_month: false,
            is_today: false,
            events: Vec::new(),
            reminders: Vec::new(),
        }
    }
}

/// Builds the 42-cell grid for the cursor's month: the tail of the previous
/// month up to the 1st's weekday, every day of the month annotated with its
/// events and reminders, then the head of the next month as filler.
pub fn build_month_grid(
    cursor: MonthCursor,
    events: &[Event],
    reminders: &[Reminder],
    today: NaiveDate,
) -> Vec<CalendarDay> {
    let days_in_month = cursor.days_in_month();
    let lead = cursor.first_weekday_index();
    let prev_month_days = cursor.prev_month().days_in_month();

    let mut cells = Vec::with_capacity(GRID_CELLS);

    for offset in (0..lead).rev() {
        cells.push(CalendarDay::out_of_month(prev_month_days - offset));
    }

    for day in 1..=days_in_month {
        let date = cursor.date_for(day);
        cells.push(CalendarDay {
            day_number: day,
            in_current_month: true,
            is_today: date == today,
            events: events
                .iter()
                .filter(|event| event.start_date == date)
                .cloned()
                .collect(),
            reminders: reminders
                .iter()
                .filter(|reminder| reminder.date == date)
                .cloned()
                .collect(),
        });
    }

    let mut next_day = 1;
    while cells.len() < GRID_CELLS {
        cells.push(CalendarDay::out_of_month(next_day));
        next_day += 1;
    }

    cells
}

/// The reminder-creation form's fields, as the user is filling them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderForm {
    pub title: String,
    pub time: String,
    pub priority: Priority,
}

/// The dashboard's reminder-placement state: which date is picked, whether
/// the creation form is open, and the one user-visible validation banner.
#[derive(Debug, Clone, Default)]
pub struct ReminderScheduler {
    selected_date: Option<NaiveDate>,
    date_error: Option<String>,
    form_open: bool,
    form: ReminderForm,
}

impl ReminderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected_date
    }

    pub fn formatted_selected_date(&self) -> Option<String> {
        self.selected_date.map(format_long_date)
    }

    pub fn date_error(&self) -> Option<&str> {
        self.date_error.as_deref()
    }

    pub fn form_open(&self) -> bool {
        self.form_open
    }

    pub fn form(&self) -> &ReminderForm {
        &self.form
    }

    pub fn set_title(&mut self, title: &str) {
        self.form.title = title.to_string();
    }

    pub fn set_time(&mut self, time: &str) {
        self.form.time = time.to_string();
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.form.priority = priority;
    }

    /// Grid-click entry point: out-of-month cells do nothing.
    pub fn select_day(&mut self, day: &CalendarDay, cursor: MonthCursor, today: NaiveDate) -> bool {
        if !day.in_current_month {
            return false;
        }
        self.select_date(cursor.date_for(day.day_number), today)
    }

    /// Picks a date for a new reminder. Dates before today (time of day
    /// ignored on both sides) set the past-date banner and leave the form
    /// closed; anything else clears the banner and opens the form. Returns
    /// whether the form opened.
    pub fn select_date(&mut self, date: NaiveDate, today: NaiveDate) -> bool {
        if date < today {
            self.date_error = Some(PAST_DATE_ERROR.to_string());
            return false;
        }

        self.date_error = None;
        self.selected_date = Some(date);
        self.form_open = true;
        true
    }

    /// Creates the reminder from the form. Requires a selected date, a
    /// non-empty title, and a well-formed time; on success the form resets
    /// to its defaults and closes.
    pub fn create_reminder(&mut self, id: u64) -> anyhow::Result<Reminder> {
        let date = self
            .selected_date
            .ok_or_else(|| anyhow!("no date selected; pick a calendar day first"))?;
        let title = self.form.title.trim();
        if title.is_empty() {
            bail!("reminder title is required");
        }
        if self.form.time.trim().is_empty() {
            bail!("reminder time is required");
        }
        let time = normalize_clock_time(&self.form.time)?;

        let reminder = Reminder {
            id,
            title: title.to_string(),
            date,
            time,
            priority: self.form.priority,
        };

        self.form = ReminderForm::default();
        self.form_open = false;

        Ok(reminder)
    }
}
