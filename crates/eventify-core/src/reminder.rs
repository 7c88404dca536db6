use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// A user-created, date/time-tagged personal note, unrelated to the event
/// catalog. The date is persisted in its display form ("March 24, 2025").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: u64,
    pub title: String,
    #[serde(with = "long_date_serde")]
    pub date: NaiveDate,
    pub time: String,
    pub priority: Priority,
}

/// Listing order: high priority first, then soonest date.
pub fn sort_for_listing(reminders: &mut [Reminder]) {
    reminders.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.date.cmp(&b.date)));
}

pub mod long_date_serde {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::datetime::{format_long_date, parse_long_date};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_long_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_long_date(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn priority_orders_low_to_high() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
    }

    #[test]
    fn reminder_serializes_date_in_display_form() {
        let reminder = Reminder {
            id: 1,
            title: "Prepare presentation slides".to_string(),
            date: date(2025, 3, 24),
            time: "09:00".to_string(),
            priority: Priority::High,
        };

        let json = serde_json::to_string(&reminder).expect("serialize reminder");
        assert!(json.contains("\"March 24, 2025\""));

        let back: Reminder = serde_json::from_str(&json).expect("parse reminder");
        assert_eq!(back, reminder);
    }

    #[test]
    fn listing_sorts_by_priority_then_date() {
        let mut reminders = vec![
            Reminder {
                id: 1,
                title: "Review project documents".to_string(),
                date: date(2025, 4, 2),
                time: "10:30".to_string(),
                priority: Priority::Low,
            },
            Reminder {
                id: 2,
                title: "Team strategy meeting".to_string(),
                date: date(2025, 4, 15),
                time: "11:00".to_string(),
                priority: Priority::High,
            },
            Reminder {
                id: 3,
                title: "Prepare presentation slides".to_string(),
                date: date(2025, 3, 24),
                time: "09:00".to_string(),
                priority: Priority::High,
            },
        ];

        sort_for_listing(&mut reminders);
        let ids: Vec<u64> = reminders.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}
