use chrono::{NaiveDate, NaiveTime};

use crate::event::{Event, EventType, Privacy, RecurrenceKind};

/// The event catalog collaborator: a replaceable source of catalog records,
/// plus the seam completed wizard drafts are handed to.
pub trait EventSource {
    fn events(&self) -> anyhow::Result<Vec<Event>>;
    fn submit(&mut self, event: Event) -> anyhow::Result<()>;
}

/// In-memory catalog serving fixed records, standing in for a real backend.
#[derive(Debug, Default)]
pub struct MockEventSource {
    events: Vec<Event>,
}

impl MockEventSource {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn seeded() -> Self {
        Self {
            events: seed_events(),
        }
    }
}

impl EventSource for MockEventSource {
    fn events(&self) -> anyhow::Result<Vec<Event>> {
        Ok(self.events.clone())
    }

    fn submit(&mut self, event: Event) -> anyhow::Result<()> {
        tracing::info!(id = %event.id, title = %event.title, "event accepted by catalog");
        self.events.push(event);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub upcoming: usize,
    pub past: usize,
    pub participants: u64,
}

pub fn dashboard_stats(events: &[Event], today: NaiveDate) -> DashboardStats {
    let upcoming = events.iter().filter(|e| e.is_upcoming(today)).count();
    DashboardStats {
        upcoming,
        past: events.len() - upcoming,
        participants: events.iter().map(|e| u64::from(e.attendees)).sum(),
    }
}

fn d(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn t(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn seed(
    id: &str,
    title: &str,
    description: &str,
    event_type: EventType,
    start: (NaiveDate, NaiveTime),
    end: (NaiveDate, NaiveTime),
    location: &str,
    address: &str,
    privacy: Privacy,
    attendees: u32,
    max_attendance: u32,
) -> Event {
    Event {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        event_type,
        start_date: start.0,
        start_time: start.1,
        end_date: end.0,
        end_time: end.1,
        location: location.to_string(),
        address: address.to_string(),
        privacy,
        image_url: None,
        attendees,
        max_attendance,
        recurring: false,
        recurring_type: RecurrenceKind::None,
    }
}

fn seed_events() -> Vec<Event> {
    vec![
        seed(
            "1",
            "Tech Conference 2025",
            "Annual technology conference featuring the latest innovations and trends.",
            EventType::Conference,
            (d(2025, 4, 15), t(9, 0)),
            (d(2025, 4, 17), t(18, 0)),
            "Convention Center",
            "123 Tech Blvd, San Francisco, CA",
            Privacy::Public,
            154,
            200,
        ),
        seed(
            "2",
            "Leadership Workshop",
            "Interactive workshop on developing leadership skills in the modern workplace.",
            EventType::Workshop,
            (d(2025, 5, 10), t(13, 0)),
            (d(2025, 5, 10), t(17, 0)),
            "Business Center",
            "456 Corporate Pkwy, Chicago, IL",
            Privacy::Private,
            28,
            30,
        ),
        seed(
            "3",
            "Product Launch: XYZ",
            "Exclusive product launch event for our new line of innovative solutions.",
            EventType::Exhibition,
            (d(2025, 6, 1), t(18, 30)),
            (d(2025, 6, 1), t(21, 30)),
            "Grand Hotel Ballroom",
            "789 Luxury Ave, New York, NY",
            Privacy::Unlisted,
            85,
            120,
        ),
        seed(
            "4",
            "Annual Developer Meetup",
            "Networking event for developers to share ideas and collaborate on projects.",
            EventType::Meetup,
            (d(2025, 7, 22), t(16, 0)),
            (d(2025, 7, 22), t(20, 0)),
            "Tech Hub",
            "101 Coder Lane, Austin, TX",
            Privacy::Public,
            67,
            100,
        ),
        seed(
            "5",
            "Educational Seminar: AI Ethics",
            "Deep dive into the ethical considerations of artificial intelligence.",
            EventType::Seminar,
            (d(2025, 8, 5), t(10, 0)),
            (d(2025, 8, 5), t(16, 0)),
            "University Auditorium",
            "202 Academic Dr, Boston, MA",
            Privacy::Public,
            112,
            150,
        ),
        seed(
            "6",
            "Charity Fundraiser Gala",
            "Annual fundraising event supporting local community initiatives.",
            EventType::Other,
            (d(2025, 9, 18), t(19, 0)),
            (d(2025, 9, 18), t(23, 0)),
            "Riverside Gardens",
            "303 Charity Way, Seattle, WA",
            Privacy::Unlisted,
            93,
            120,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_catalog_serves_six_events() {
        let catalog = MockEventSource::seeded();
        let events = catalog.events().expect("events");
        assert_eq!(events.len(), 6);
        assert!(events.iter().any(|e| e.title == "Tech Conference 2025"));
    }

    #[test]
    fn submit_appends_to_the_catalog() {
        let mut catalog = MockEventSource::empty();
        let event = seed(
            "ev-1",
            "Launch Party",
            "A party.",
            EventType::Other,
            (d(2025, 10, 1), t(19, 0)),
            (d(2025, 10, 1), t(23, 0)),
            "Rooftop",
            "1 Main St",
            Privacy::Public,
            0,
            50,
        );
        catalog.submit(event.clone()).expect("submit");
        assert_eq!(catalog.events().expect("events"), vec![event]);
    }

    #[test]
    fn stats_split_on_today_and_sum_attendees() {
        let events = seed_events();
        let stats = dashboard_stats(&events, d(2025, 6, 1));
        // June 1 itself counts as past: upcoming means strictly after today.
        assert_eq!(stats.upcoming, 3);
        assert_eq!(stats.past, 3);
        assert_eq!(stats.participants, 154 + 28 + 85 + 67 + 112 + 93);
    }
}
