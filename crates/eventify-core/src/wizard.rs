use serde::{Deserialize, Serialize};

use crate::datetime::format_long_date;
use crate::draft::{EventDraft, FieldChange, ImageAttachment};

pub const FIRST_STEP: u8 = 1;
pub const LAST_STEP: u8 = 4;

/// How much description the preview card shows before eliding.
const PREVIEW_DESCRIPTION_CHARS: usize = 140;

/// The four-step creation wizard: the accumulating draft plus the step the
/// user is on. Persisted between invocations so an edit session survives
/// process exits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wizard {
    current_step: u8,
    draft: EventDraft,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            current_step: FIRST_STEP,
            draft: EventDraft::default(),
        }
    }

    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    pub fn draft(&self) -> &EventDraft {
        &self.draft
    }

    pub fn into_draft(self) -> EventDraft {
        self.draft
    }

    pub fn apply(&mut self, change: FieldChange) -> anyhow::Result<()> {
        self.draft.apply(change)
    }

    /// Advances one step; clamped at the last step. Returns whether the step
    /// changed. Forward progress is never gated on field completion.
    pub fn go_next(&mut self) -> bool {
        if self.current_step < LAST_STEP {
            self.current_step += 1;
            true
        } else {
            false
        }
    }

    /// Retreats one step; clamped at the first step.
    pub fn go_previous(&mut self) -> bool {
        if self.current_step > FIRST_STEP {
            self.current_step -= 1;
            true
        } else {
            false
        }
    }

    /// Swaps the draft image, handing back the replaced attachment so the
    /// caller can release its stored copy.
    pub fn set_image(&mut self, image: Option<ImageAttachment>) -> Option<ImageAttachment> {
        std::mem::replace(&mut self.draft.image, image)
    }

    /// The live preview card, derived purely from the draft. Valid at every
    /// step; unset fields fall back to placeholders.
    pub fn preview(&self) -> EventPreview {
        let draft = &self.draft;

        let description = draft.description.trim();
        let description = if description.is_empty() {
            "Event description will appear here...".to_string()
        } else {
            truncate_chars(description, PREVIEW_DESCRIPTION_CHARS)
        };

        EventPreview {
            title: placeholder_or(&draft.title, "Event Title"),
            start_date: draft
                .start_date
                .map_or_else(|| "Date".to_string(), format_long_date),
            start_time: draft
                .start_time
                .map_or_else(|| "Time".to_string(), |t| t.format("%H:%M").to_string()),
            location: placeholder_or(&draft.location, "Location"),
            description,
            type_label: draft.event_type.label(),
            privacy_badge: match draft.privacy {
                crate::event::Privacy::Public => None,
                other => Some(other.label()),
            },
            has_image: draft.image.is_some(),
        }
    }

    pub fn step_title(step: u8) -> &'static str {
        match step {
            1 => "Basic Info",
            2 => "Date & Time",
            3 => "Location",
            _ => "Settings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPreview {
    pub title: String,
    pub start_date: String,
    pub start_time: String,
    pub location: String,
    pub description: String,
    pub type_label: &'static str,
    pub privacy_badge: Option<&'static str>,
    pub has_image: bool,
}

fn placeholder_or(value: &str, placeholder: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        placeholder.to_string()
    } else {
        trimmed.to_string()
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Privacy;

    #[test]
    fn step_stays_within_bounds() {
        let mut wizard = Wizard::new();
        assert_eq!(wizard.current_step(), 1);

        assert!(!wizard.go_previous());
        assert_eq!(wizard.current_step(), 1);

        assert!(wizard.go_next());
        assert!(wizard.go_next());
        assert!(wizard.go_next());
        assert_eq!(wizard.current_step(), 4);

        assert!(!wizard.go_next());
        assert_eq!(wizard.current_step(), 4);

        assert!(wizard.go_previous());
        assert_eq!(wizard.current_step(), 3);
    }

    #[test]
    fn advancing_never_requires_completed_fields() {
        let mut wizard = Wizard::new();
        wizard
            .apply(FieldChange::text("title", "Launch Party"))
            .expect("apply title");

        wizard.go_next();
        wizard.go_next();
        wizard.go_next();

        assert_eq!(wizard.current_step(), 4);
        assert_eq!(wizard.draft().title, "Launch Party");
        assert_eq!(wizard.draft().description, "");
    }

    #[test]
    fn preview_of_an_empty_draft_is_all_placeholders() {
        let preview = Wizard::new().preview();
        assert_eq!(preview.title, "Event Title");
        assert_eq!(preview.start_date, "Date");
        assert_eq!(preview.start_time, "Time");
        assert_eq!(preview.location, "Location");
        assert_eq!(preview.description, "Event description will appear here...");
        assert_eq!(preview.type_label, "Conference");
        assert_eq!(preview.privacy_badge, None);
        assert!(!preview.has_image);
    }

    #[test]
    fn preview_reflects_draft_fields_at_any_step() {
        let mut wizard = Wizard::new();
        for (name, value) in [
            ("title", "Launch Party"),
            ("start_date", "2025-04-15"),
            ("start_time", "18:30"),
            ("location", "Grand Hotel Ballroom"),
            ("privacy", "private"),
        ] {
            wizard
                .apply(FieldChange::text(name, value))
                .expect("apply field");
        }

        let preview = wizard.preview();
        assert_eq!(preview.title, "Launch Party");
        assert_eq!(preview.start_date, "April 15, 2025");
        assert_eq!(preview.start_time, "18:30");
        assert_eq!(preview.location, "Grand Hotel Ballroom");
        assert_eq!(preview.privacy_badge, Some(Privacy::Private.label()));
    }

    #[test]
    fn preview_truncates_long_descriptions() {
        let mut wizard = Wizard::new();
        let long = "x".repeat(500);
        wizard
            .apply(FieldChange::text("description", &long))
            .expect("apply description");

        let preview = wizard.preview();
        assert_eq!(preview.description.chars().count(), 141);
        assert!(preview.description.ends_with('…'));
    }

    #[test]
    fn set_image_hands_back_the_replaced_attachment() {
        let mut wizard = Wizard::new();
        let first = ImageAttachment {
            stored_name: "a.png".to_string(),
            mime: "image/png".to_string(),
        };
        let second = ImageAttachment {
            stored_name: "b.jpg".to_string(),
            mime: "image/jpeg".to_string(),
        };

        assert_eq!(wizard.set_image(Some(first.clone())), None);
        assert_eq!(wizard.set_image(Some(second.clone())), Some(first));
        assert_eq!(wizard.set_image(None), Some(second));
        assert!(wizard.draft().image.is_none());
    }
}
