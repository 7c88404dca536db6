use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;

use unicode_width::UnicodeWidthStr;

use crate::calendar::{CalendarDay, GRID_CELLS, MonthCursor, WEEKDAY_HEADERS};
use crate::catalog::DashboardStats;
use crate::config::Config;
use crate::datetime::format_long_date;
use crate::event::Event;
use crate::reminder::{Priority, Reminder};
use crate::wizard::{LAST_STEP, Wizard};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, events))]
    pub fn print_event_table(&mut self, events: &[Event]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "Title".to_string(),
            "Date".to_string(),
            "Time".to_string(),
            "Location".to_string(),
            "Type".to_string(),
            "Privacy".to_string(),
            "Attending".to_string(),
        ];

        let mut rows = Vec::with_capacity(events.len());
        for event in events {
            let privacy = match event.privacy {
                crate::event::Privacy::Public => event.privacy.label().to_string(),
                other => self.paint(other.label(), "33"),
            };
            rows.push(vec![
                event.title.clone(),
                event.start_date.format("%Y-%m-%d").to_string(),
                event.start_time.format("%H:%M").to_string(),
                event.location.clone(),
                event.event_type.label().to_string(),
                privacy,
                format!("{}/{}", event.attendees, event.max_attendance),
            ]);
        }

        write_table(&mut out, headers, rows)?;
        writeln!(
            out,
            "Showing {} {}",
            events.len(),
            if events.len() == 1 { "event" } else { "events" }
        )?;
        Ok(())
    }

    #[tracing::instrument(skip(self, reminders))]
    pub fn print_reminder_list(&mut self, reminders: &[Reminder]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        if reminders.is_empty() {
            writeln!(out, "No reminders yet. Pick a date to add one.")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "Date".to_string(),
            "Time".to_string(),
            "Priority".to_string(),
            "Title".to_string(),
        ];

        let mut rows = Vec::with_capacity(reminders.len());
        for reminder in reminders {
            rows.push(vec![
                self.paint(&reminder.id.to_string(), "33"),
                format_long_date(reminder.date),
                reminder.time.clone(),
                self.paint_priority(reminder.priority),
                reminder.title.clone(),
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    /// The 6x7 month view. Each cell shows the day number plus markers:
    /// `*` for events, `!` for reminders. Today is highlighted, adjacent
    /// months dimmed.
    #[tracing::instrument(skip(self, grid))]
    pub fn print_calendar(
        &mut self,
        cursor: MonthCursor,
        grid: &[CalendarDay],
    ) -> anyhow::Result<()> {
        if grid.len() != GRID_CELLS {
            return Err(anyhow!("calendar grid must have {GRID_CELLS} cells"));
        }

        let mut out = io::stdout().lock();

        writeln!(out, "{:^42}", cursor.label())?;
        for header in WEEKDAY_HEADERS {
            write!(out, "{header:>5} ")?;
        }
        writeln!(out)?;

        for week in grid.chunks(WEEKDAY_HEADERS.len()) {
            for cell in week {
                let event_mark = if cell.events.is_empty() { ' ' } else { '*' };
                let reminder_mark = if cell.reminders.is_empty() { ' ' } else { '!' };
                let text = format!("{:>2}{event_mark}{reminder_mark}", cell.day_number);

                let painted = if !cell.in_current_month {
                    self.paint(&text, "90")
                } else if cell.is_today {
                    self.paint(&text, "7")
                } else {
                    text
                };
                write!(out, " {painted} ")?;
            }
            writeln!(out)?;
        }

        writeln!(out, "  * events   ! reminders")?;
        Ok(())
    }

    /// The wizard's current step with its fields, the progress trail, and
    /// the live preview card.
    #[tracing::instrument(skip(self, wizard))]
    pub fn print_wizard(&mut self, wizard: &Wizard) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let step = wizard.current_step();
        let draft = wizard.draft();

        let trail: Vec<String> = (1..=LAST_STEP)
            .map(|s| {
                let title = Wizard::step_title(s);
                if s == step {
                    self.paint(&format!("[{s}. {title}]"), "1")
                } else {
                    format!(" {s}. {title} ")
                }
            })
            .collect();
        writeln!(out, "{}", trail.join(" > "))?;
        writeln!(out)?;

        let unset = "-".to_string();
        let or_unset = |value: &str| {
            if value.trim().is_empty() {
                unset.clone()
            } else {
                value.to_string()
            }
        };

        match step {
            1 => {
                writeln!(out, "title           {}", or_unset(&draft.title))?;
                writeln!(out, "description     {}", or_unset(&draft.description))?;
                writeln!(out, "event_type      {}", draft.event_type.label())?;
                writeln!(out, "max_attendance  {}", or_unset(&draft.max_attendance))?;
            }
            2 => {
                let date = |d: Option<chrono::NaiveDate>| {
                    d.map_or_else(|| unset.clone(), |d| d.format("%Y-%m-%d").to_string())
                };
                let time = |t: Option<chrono::NaiveTime>| {
                    t.map_or_else(|| unset.clone(), |t| t.format("%H:%M").to_string())
                };
                writeln!(out, "start_date      {}", date(draft.start_date))?;
                writeln!(out, "start_time      {}", time(draft.start_time))?;
                writeln!(out, "end_date        {}", date(draft.end_date))?;
                writeln!(out, "end_time        {}", time(draft.end_time))?;
                writeln!(out, "recurring       {}", draft.recurring)?;
                if draft.recurring {
                    writeln!(out, "recurring_type  {}", draft.recurring_type.label())?;
                }
            }
            3 => {
                writeln!(out, "location        {}", or_unset(&draft.location))?;
                writeln!(out, "address         {}", or_unset(&draft.address))?;
            }
            _ => {
                writeln!(out, "privacy         {}", draft.privacy.label())?;
                let image = draft
                    .image
                    .as_ref()
                    .map_or_else(|| unset.clone(), |att| att.stored_name.clone());
                writeln!(out, "image           {image}")?;
            }
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, wizard))]
    pub fn print_preview(&mut self, wizard: &Wizard) -> anyhow::Result<()> {
        let preview = wizard.preview();
        let mut out = io::stdout().lock();

        writeln!(out, "{}", self.paint(&preview.title, "1"))?;
        writeln!(out, "  date      {}", preview.start_date)?;
        writeln!(out, "  time      {}", preview.start_time)?;
        writeln!(out, "  location  {}", preview.location)?;
        writeln!(out, "  {}", preview.description)?;

        let mut badges = format!("  [{}]", preview.type_label);
        if let Some(privacy) = preview.privacy_badge {
            badges.push_str(&format!("  {}", self.paint(&format!("({privacy})"), "33")));
        }
        if preview.has_image {
            badges.push_str("  (image attached)");
        }
        writeln!(out, "{badges}")?;

        Ok(())
    }

    #[tracing::instrument(skip(self, stats))]
    pub fn print_stats(&mut self, stats: &DashboardStats) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(
            out,
            "Upcoming: {}   Past: {}   Participants: {}",
            self.paint(&stats.upcoming.to_string(), "35"),
            self.paint(&stats.past.to_string(), "32"),
            self.paint(&stats.participants.to_string(), "34"),
        )?;
        Ok(())
    }

    fn paint_priority(&self, priority: Priority) -> String {
        let code = match priority {
            Priority::High => "31",
            Priority::Medium => "33",
            Priority::Low => "32",
        };
        self.paint(priority.label(), code)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
