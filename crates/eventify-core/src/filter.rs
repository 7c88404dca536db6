use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::trace;

use crate::event::{Event, EventType, Privacy};
use crate::reminder::{Priority, Reminder};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateWindow {
    #[default]
    All,
    Upcoming,
    Past,
}

impl DateWindow {
    fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "all" => Some(DateWindow::All),
            "upcoming" => Some(DateWindow::Upcoming),
            "past" => Some(DateWindow::Past),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// Catalog listing filter, parsed from CLI terms: `type:…`, `privacy:…`,
/// `date:all|upcoming|past`, `sort:asc|desc`, and bare words as a search
/// over title, description, and location. Repeated `type:`/`privacy:` terms
/// widen the selection (any-of).
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    types: Vec<EventType>,
    privacy: Vec<Privacy>,
    window: DateWindow,
    search: Vec<String>,
    pub sort: SortDirection,
}

impl EventFilter {
    pub fn parse(terms: &[String]) -> anyhow::Result<Self> {
        let mut filter = EventFilter::default();

        for term in terms {
            if let Some(value) = term.strip_prefix("type:") {
                let kind = EventType::parse(value)
                    .ok_or_else(|| anyhow!("unknown event type: {value}"))?;
                filter.types.push(kind);
            } else if let Some(value) = term.strip_prefix("privacy:") {
                let tier = Privacy::parse(value)
                    .ok_or_else(|| anyhow!("unknown privacy tier: {value}"))?;
                filter.privacy.push(tier);
            } else if let Some(value) = term.strip_prefix("date:") {
                filter.window = DateWindow::parse(value)
                    .ok_or_else(|| anyhow!("unknown date window: {value} (all, upcoming, past)"))?;
            } else if let Some(value) = term.strip_prefix("sort:") {
                filter.sort = SortDirection::parse(value)
                    .ok_or_else(|| anyhow!("unknown sort direction: {value} (asc, desc)"))?;
            } else if let Some((key, _)) = term.split_once(':') {
                return Err(anyhow!("unknown filter key: {key}"));
            } else {
                filter.search.push(term.to_lowercase());
            }
        }

        Ok(filter)
    }

    /// Pins the listing to public events, the public browse view's rule.
    pub fn public_only(mut self) -> Self {
        self.privacy = vec![Privacy::Public];
        self
    }

    pub fn matches(&self, event: &Event, today: NaiveDate) -> bool {
        for word in &self.search {
            let hit = event.title.to_lowercase().contains(word)
                || event.description.to_lowercase().contains(word)
                || event.location.to_lowercase().contains(word);
            if !hit {
                return false;
            }
        }

        if !self.types.is_empty() && !self.types.contains(&event.event_type) {
            return false;
        }

        if !self.privacy.is_empty() && !self.privacy.contains(&event.privacy) {
            return false;
        }

        match self.window {
            DateWindow::All => true,
            DateWindow::Upcoming => event.start_date > today,
            DateWindow::Past => event.start_date <= today,
        }
    }

    /// Filters and orders a catalog listing by start date and time.
    pub fn apply(&self, events: Vec<Event>, today: NaiveDate) -> Vec<Event> {
        let mut kept: Vec<Event> = events
            .into_iter()
            .filter(|event| self.matches(event, today))
            .collect();

        kept.sort_by_key(Event::starts_at);
        if self.sort == SortDirection::Desc {
            kept.reverse();
        }

        trace!(kept = kept.len(), "applied event filter");
        kept
    }
}

/// Reminder listing filter: `priority:low|medium|high` plus bare words
/// searched in the title.
#[derive(Debug, Clone, Default)]
pub struct ReminderFilter {
    priority: Option<Priority>,
    search: Vec<String>,
}

impl ReminderFilter {
    pub fn parse(terms: &[String]) -> anyhow::Result<Self> {
        let mut filter = ReminderFilter::default();

        for term in terms {
            if let Some(value) = term.strip_prefix("priority:") {
                if value.trim().eq_ignore_ascii_case("all") {
                    filter.priority = None;
                } else {
                    filter.priority = Some(
                        Priority::parse(value)
                            .ok_or_else(|| anyhow!("unknown priority: {value}"))?,
                    );
                }
            } else if let Some((key, _)) = term.split_once(':') {
                return Err(anyhow!("unknown filter key: {key}"));
            } else {
                filter.search.push(term.to_lowercase());
            }
        }

        Ok(filter)
    }

    pub fn matches(&self, reminder: &Reminder) -> bool {
        if let Some(priority) = self.priority
            && reminder.priority != priority
        {
            return false;
        }

        let title = reminder.title.to_lowercase();
        self.search.iter().all(|word| title.contains(word))
    }
}
