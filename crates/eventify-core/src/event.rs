use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    #[default]
    Conference,
    Workshop,
    Meetup,
    Exhibition,
    Seminar,
    Other,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::Conference,
        EventType::Workshop,
        EventType::Meetup,
        EventType::Exhibition,
        EventType::Seminar,
        EventType::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EventType::Conference => "Conference",
            EventType::Workshop => "Workshop",
            EventType::Meetup => "Meetup",
            EventType::Exhibition => "Exhibition",
            EventType::Seminar => "Seminar",
            EventType::Other => "Other",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "conference" => Some(EventType::Conference),
            "workshop" => Some(EventType::Workshop),
            "meetup" => Some(EventType::Meetup),
            "exhibition" => Some(EventType::Exhibition),
            "seminar" => Some(EventType::Seminar),
            "other" => Some(EventType::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    #[default]
    Public,
    Private,
    Unlisted,
}

impl Privacy {
    pub fn label(self) -> &'static str {
        match self {
            Privacy::Public => "Public",
            Privacy::Private => "Private",
            Privacy::Unlisted => "Unlisted",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "public" => Some(Privacy::Public),
            "private" => Some(Privacy::Private),
            "unlisted" => Some(Privacy::Unlisted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl RecurrenceKind {
    pub fn label(self) -> &'static str {
        match self {
            RecurrenceKind::None => "None",
            RecurrenceKind::Daily => "Daily",
            RecurrenceKind::Weekly => "Weekly",
            RecurrenceKind::Monthly => "Monthly",
            RecurrenceKind::Custom => "Custom",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "none" => Some(RecurrenceKind::None),
            "daily" => Some(RecurrenceKind::Daily),
            "weekly" => Some(RecurrenceKind::Weekly),
            "monthly" => Some(RecurrenceKind::Monthly),
            "custom" => Some(RecurrenceKind::Custom),
            _ => None,
        }
    }
}

/// A catalog record. Read-only from this crate's point of view except for
/// the submission seam in [`crate::catalog::EventSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub event_type: EventType,
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_date: NaiveDate,
    pub end_time: NaiveTime,
    pub location: String,
    pub address: String,
    pub privacy: Privacy,
    #[serde(default)]
    pub image_url: Option<String>,
    pub attendees: u32,
    pub max_attendance: u32,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default)]
    pub recurring_type: RecurrenceKind,
}

impl Event {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.start_date.and_time(self.start_time)
    }

    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.start_date > today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_parse_roundtrips_labels() {
        for kind in EventType::ALL {
            assert_eq!(EventType::parse(kind.label()), Some(kind));
        }
        assert_eq!(EventType::parse("gala"), None);
    }

    #[test]
    fn privacy_parse_is_case_insensitive() {
        assert_eq!(Privacy::parse("UNLISTED"), Some(Privacy::Unlisted));
        assert_eq!(Privacy::parse(" public "), Some(Privacy::Public));
        assert_eq!(Privacy::parse("secret"), None);
    }
}
