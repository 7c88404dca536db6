use std::path::Path;

use anyhow::{Context, anyhow, bail};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::event::{Event, EventType, Privacy, RecurrenceKind};

/// An image blob held by the draft. The bytes live as a stored copy under the
/// datastore's image directory; the draft owns that copy exclusively and it
/// is removed when the attachment is replaced or the draft ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub stored_name: String,
    pub mime: String,
}

/// Image MIME type by file extension; `None` marks a non-image input, which
/// callers reject outright.
pub fn image_mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// The in-progress, unsaved event record being edited in the wizard.
///
/// Date and time fields stay unset until the user fills them in; nothing is
/// validated while editing. [`EventDraft::validate_for_submission`] is the
/// single gate applied when the draft leaves the wizard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub event_type: EventType,
    pub start_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
    pub recurring: bool,
    pub recurring_type: RecurrenceKind,
    pub location: String,
    pub address: String,
    pub privacy: Privacy,
    pub image: Option<ImageAttachment>,
    pub max_attendance: String,
}

/// A single form input, tagged by input kind. Text carries the raw value,
/// Check the checked state, Numeric a digits-only string (sanitized at
/// construction, mirroring the form's on-input stripping).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    Text { name: String, value: String },
    Check { name: String, checked: bool },
    Numeric { name: String, digits_only: String },
}

impl FieldChange {
    pub fn text(name: &str, value: &str) -> Self {
        FieldChange::Text {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn check(name: &str, checked: bool) -> Self {
        FieldChange::Check {
            name: name.to_string(),
            checked,
        }
    }

    pub fn numeric(name: &str, raw: &str) -> Self {
        FieldChange::Numeric {
            name: name.to_string(),
            digits_only: sanitize_digits(raw),
        }
    }
}

/// Strips everything but ASCII digits. Idempotent.
#[must_use]
pub fn sanitize_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// One failed submission rule, addressed to the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl EventDraft {
    /// Applies a single field change. Exactly the named field is replaced;
    /// every other field is left untouched. Malformed values for typed
    /// fields (dates, times, enums) are rejected at this boundary; an empty
    /// text value clears an optional field.
    pub fn apply(&mut self, change: FieldChange) -> anyhow::Result<()> {
        match change {
            FieldChange::Text { name, value } => self.apply_text(&name, &value),
            FieldChange::Check { name, checked } => match name.as_str() {
                "recurring" => {
                    self.recurring = checked;
                    Ok(())
                }
                other => Err(anyhow!("not a checkbox field: {other}")),
            },
            FieldChange::Numeric { name, digits_only } => match name.as_str() {
                "max_attendance" => {
                    self.max_attendance = digits_only;
                    Ok(())
                }
                other => Err(anyhow!("not a numeric field: {other}")),
            },
        }
    }

    fn apply_text(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        match name {
            "title" => self.title = value.to_string(),
            "description" => self.description = value.to_string(),
            "location" => self.location = value.to_string(),
            "address" => self.address = value.to_string(),
            "event_type" => {
                self.event_type = EventType::parse(value)
                    .ok_or_else(|| anyhow!("unknown event type: {value}"))?;
            }
            "privacy" => {
                self.privacy = Privacy::parse(value)
                    .ok_or_else(|| anyhow!("unknown privacy tier: {value}"))?;
            }
            "recurring_type" => {
                self.recurring_type = RecurrenceKind::parse(value)
                    .ok_or_else(|| anyhow!("unknown recurrence pattern: {value}"))?;
            }
            "start_date" => self.start_date = parse_optional_date(value)?,
            "end_date" => self.end_date = parse_optional_date(value)?,
            "start_time" => self.start_time = parse_optional_time(value)?,
            "end_time" => self.end_time = parse_optional_time(value)?,
            other => bail!("unknown draft field: {other}"),
        }
        Ok(())
    }

    /// Submission rules: the fields every step marks required, plus the
    /// start/end ordering rule. Editing never runs these.
    pub fn validate_for_submission(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();

        let require = |issues: &mut Vec<FieldIssue>, field: &'static str, value: &str| {
            if value.trim().is_empty() {
                issues.push(FieldIssue {
                    field,
                    message: "is required".to_string(),
                });
            }
        };

        require(&mut issues, "title", &self.title);
        require(&mut issues, "description", &self.description);
        require(&mut issues, "max_attendance", &self.max_attendance);
        require(&mut issues, "location", &self.location);
        require(&mut issues, "address", &self.address);

        let require_set =
            |issues: &mut Vec<FieldIssue>, field: &'static str, present: bool| {
                if !present {
                    issues.push(FieldIssue {
                        field,
                        message: "is required".to_string(),
                    });
                }
            };

        require_set(&mut issues, "start_date", self.start_date.is_some());
        require_set(&mut issues, "start_time", self.start_time.is_some());
        require_set(&mut issues, "end_date", self.end_date.is_some());
        require_set(&mut issues, "end_time", self.end_time.is_some());

        if let (Some(start_date), Some(end_date)) = (self.start_date, self.end_date) {
            let start = self
                .start_time
                .map_or(start_date.and_hms_opt(0, 0, 0), |t| Some(start_date.and_time(t)));
            let end = self
                .end_time
                .map_or(end_date.and_hms_opt(0, 0, 0), |t| Some(end_date.and_time(t)));
            if let (Some(start), Some(end)) = (start, end)
                && start > end
            {
                issues.push(FieldIssue {
                    field: "end_date",
                    message: "event must not end before it starts".to_string(),
                });
            }
        }

        issues
    }

    /// Builds the catalog record handed to the event-creation collaborator.
    /// Only valid after `validate_for_submission` returned no issues.
    pub fn into_event(self, id: String) -> anyhow::Result<Event> {
        let start_date = self.start_date.ok_or_else(|| anyhow!("missing start date"))?;
        let start_time = self.start_time.ok_or_else(|| anyhow!("missing start time"))?;
        let end_date = self.end_date.ok_or_else(|| anyhow!("missing end date"))?;
        let end_time = self.end_time.ok_or_else(|| anyhow!("missing end time"))?;
        let max_attendance = self
            .max_attendance
            .parse::<u32>()
            .with_context(|| format!("invalid max attendance: {}", self.max_attendance))?;

        Ok(Event {
            id,
            title: self.title,
            description: self.description,
            event_type: self.event_type,
            start_date,
            start_time,
            end_date,
            end_time,
            location: self.location,
            address: self.address,
            privacy: self.privacy,
            image_url: self.image.map(|att| att.stored_name),
            attendees: 0,
            max_attendance,
            recurring: self.recurring,
            recurring_type: self.recurring_type,
        })
    }
}

fn parse_optional_date(value: &str) -> anyhow::Result<Option<NaiveDate>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .with_context(|| format!("invalid date (expected YYYY-MM-DD): {value}"))
}

fn parse_optional_time(value: &str) -> anyhow::Result<Option<NaiveTime>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let (hour, minute) = crate::datetime::parse_clock_time(trimmed)
        .ok_or_else(|| anyhow!("invalid time (expected HH:MM): {value}"))?;
    NaiveTime::from_hms_opt(hour, minute, 0)
        .map(Some)
        .ok_or_else(|| anyhow!("invalid time (expected HH:MM): {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_digits_is_idempotent() {
        let once = sanitize_digits("12a3b");
        assert_eq!(once, "123");
        assert_eq!(sanitize_digits(&once), "123");
        assert_eq!(sanitize_digits(""), "");
        assert_eq!(sanitize_digits("no digits"), "");
    }

    #[test]
    fn apply_updates_only_the_named_field() {
        let mut draft = EventDraft::default();
        let before = draft.clone();

        draft
            .apply(FieldChange::text("title", "Launch Party"))
            .expect("apply title");

        assert_eq!(draft.title, "Launch Party");
        assert_eq!(draft.description, before.description);
        assert_eq!(draft.event_type, before.event_type);
        assert_eq!(draft.start_date, before.start_date);
        assert_eq!(draft.start_time, before.start_time);
        assert_eq!(draft.end_date, before.end_date);
        assert_eq!(draft.end_time, before.end_time);
        assert_eq!(draft.recurring, before.recurring);
        assert_eq!(draft.recurring_type, before.recurring_type);
        assert_eq!(draft.location, before.location);
        assert_eq!(draft.address, before.address);
        assert_eq!(draft.privacy, before.privacy);
        assert_eq!(draft.image, before.image);
        assert_eq!(draft.max_attendance, before.max_attendance);
    }

    #[test]
    fn apply_rejects_unknown_fields() {
        let mut draft = EventDraft::default();
        assert!(draft.apply(FieldChange::text("color", "pink")).is_err());
        assert!(draft.apply(FieldChange::check("title", true)).is_err());
        assert!(draft.apply(FieldChange::numeric("title", "12")).is_err());
    }

    #[test]
    fn numeric_change_strips_non_digits_at_construction() {
        let mut draft = EventDraft::default();
        draft
            .apply(FieldChange::numeric("max_attendance", "1a2b3"))
            .expect("apply numeric");
        assert_eq!(draft.max_attendance, "123");
    }

    #[test]
    fn checkbox_change_carries_checked_state() {
        let mut draft = EventDraft::default();
        draft
            .apply(FieldChange::check("recurring", true))
            .expect("apply checkbox");
        assert!(draft.recurring);
        draft
            .apply(FieldChange::text("recurring_type", "weekly"))
            .expect("apply recurrence");
        assert_eq!(draft.recurring_type, RecurrenceKind::Weekly);
    }

    #[test]
    fn empty_text_clears_optional_date_fields() {
        let mut draft = EventDraft::default();
        draft
            .apply(FieldChange::text("start_date", "2025-04-15"))
            .expect("set start date");
        assert!(draft.start_date.is_some());
        draft
            .apply(FieldChange::text("start_date", ""))
            .expect("clear start date");
        assert!(draft.start_date.is_none());
    }

    fn filled_draft() -> EventDraft {
        let mut draft = EventDraft::default();
        for (name, value) in [
            ("title", "Launch Party"),
            ("description", "Celebrating the launch."),
            ("location", "Tech Center"),
            ("address", "123 Innovation St"),
            ("start_date", "2025-04-15"),
            ("start_time", "09:00"),
            ("end_date", "2025-04-15"),
            ("end_time", "17:00"),
        ] {
            draft
                .apply(FieldChange::text(name, value))
                .expect("apply field");
        }
        draft
            .apply(FieldChange::numeric("max_attendance", "100"))
            .expect("apply max attendance");
        draft
    }

    #[test]
    fn submission_accepts_a_complete_draft() {
        assert!(filled_draft().validate_for_submission().is_empty());
    }

    #[test]
    fn submission_rejects_end_before_start() {
        let mut draft = filled_draft();
        draft
            .apply(FieldChange::text("end_time", "08:00"))
            .expect("apply end time");
        let issues = draft.validate_for_submission();
        assert!(issues.iter().any(|issue| issue.field == "end_date"));
    }

    #[test]
    fn submission_lists_every_missing_required_field() {
        let issues = EventDraft::default().validate_for_submission();
        let fields: Vec<&str> = issues.iter().map(|issue| issue.field).collect();
        for field in [
            "title",
            "description",
            "max_attendance",
            "location",
            "address",
            "start_date",
            "start_time",
            "end_date",
            "end_time",
        ] {
            assert!(fields.contains(&field), "missing issue for {field}");
        }
    }

    #[test]
    fn into_event_carries_the_draft_fields() {
        let mut draft = filled_draft();
        draft
            .apply(FieldChange::text("privacy", "unlisted"))
            .expect("apply privacy");
        let event = draft.into_event("ev-1".to_string()).expect("into event");
        assert_eq!(event.id, "ev-1");
        assert_eq!(event.title, "Launch Party");
        assert_eq!(event.privacy, Privacy::Unlisted);
        assert_eq!(event.max_attendance, 100);
        assert_eq!(event.attendees, 0);
    }

    #[test]
    fn image_mime_rejects_non_images() {
        assert_eq!(
            image_mime_for(Path::new("poster.png")),
            Some("image/png")
        );
        assert_eq!(
            image_mime_for(Path::new("photo.JPEG")),
            Some("image/jpeg")
        );
        assert_eq!(image_mime_for(Path::new("notes.pdf")), None);
        assert_eq!(image_mime_for(Path::new("noext")), None);
    }
}
