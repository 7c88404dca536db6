use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use crate::draft::ImageAttachment;
use crate::reminder::Reminder;
use crate::wizard::Wizard;

/// The local persistence layer: reminders as JSON lines, the wizard's
/// in-progress state as a single JSON record, and the draft's image blob as
/// a stored copy under `draft-images/`.
#[derive(Debug)]
pub struct DataStore {
    pub data_dir: PathBuf,
    pub reminders_path: PathBuf,
    pub draft_path: PathBuf,
    pub images_dir: PathBuf,
}

impl DataStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let reminders_path = data_dir.join("reminders.data");
        let draft_path = data_dir.join("draft.data");
        let images_dir = data_dir.join("draft-images");

        if !reminders_path.exists() {
            fs::write(&reminders_path, "")?;
        }
        fs::create_dir_all(&images_dir)
            .with_context(|| format!("failed to create {}", images_dir.display()))?;

        info!(
            data_dir = %data_dir.display(),
            reminders = %reminders_path.display(),
            draft = %draft_path.display(),
            "opened datastore"
        );

        Ok(Self {
            data_dir,
            reminders_path,
            draft_path,
            images_dir,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load_reminders(&self) -> anyhow::Result<Vec<Reminder>> {
        debug!(file = %self.reminders_path.display(), "loading reminders");
        let file = fs::File::open(&self.reminders_path)?;
        let reader = BufReader::new(file);

        let mut out = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let reminder: Reminder = serde_json::from_str(trimmed).with_context(|| {
                format!(
                    "failed parsing {} line {}",
                    self.reminders_path.display(),
                    idx + 1
                )
            })?;
            out.push(reminder);
        }

        debug!(count = out.len(), "loaded reminders");
        Ok(out)
    }

    #[tracing::instrument(skip(self, reminders))]
    pub fn save_reminders(&self, reminders: &[Reminder]) -> anyhow::Result<()> {
        debug!(
            file = %self.reminders_path.display(),
            count = reminders.len(),
            "saving reminders atomically"
        );

        let dir = self.reminders_path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        for reminder in reminders {
            let serialized = serde_json::to_string(reminder)?;
            writeln!(temp, "{serialized}")?;
        }
        temp.flush()?;
        temp.persist(&self.reminders_path).map_err(|err| {
            anyhow!(
                "failed to persist {}: {}",
                self.reminders_path.display(),
                err
            )
        })?;

        Ok(())
    }

    /// One greater than the highest id ever stored, so deleting and
    /// re-adding can never hand out a duplicate.
    pub fn next_reminder_id(&self, reminders: &[Reminder]) -> u64 {
        reminders.iter().map(|r| r.id).max().unwrap_or(0) + 1
    }

    #[tracing::instrument(skip(self))]
    pub fn load_wizard(&self) -> anyhow::Result<Option<Wizard>> {
        if !self.draft_path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.draft_path)
            .with_context(|| format!("failed reading {}", self.draft_path.display()))?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let wizard = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {}", self.draft_path.display()))?;
        Ok(Some(wizard))
    }

    #[tracing::instrument(skip(self, wizard), fields(step = wizard.current_step()))]
    pub fn save_wizard(&self, wizard: &Wizard) -> anyhow::Result<()> {
        let dir = self.draft_path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        let serialized = serde_json::to_string(wizard)?;
        writeln!(temp, "{serialized}")?;
        temp.flush()?;
        temp.persist(&self.draft_path)
            .map_err(|err| anyhow!("failed to persist {}: {}", self.draft_path.display(), err))?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn clear_wizard(&self) -> anyhow::Result<()> {
        match fs::remove_file(&self.draft_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("failed removing {}", self.draft_path.display()))
            }
        }
    }

    /// Copies an image into the store and hands out the attachment owning
    /// that copy.
    #[tracing::instrument(skip(self, source))]
    pub fn store_draft_image(&self, source: &Path, mime: &str) -> anyhow::Result<ImageAttachment> {
        let extension = source
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "img".to_string());
        let stored_name = format!("{}.{extension}", Uuid::new_v4());
        let target = self.images_dir.join(&stored_name);

        fs::copy(source, &target).with_context(|| {
            format!(
                "failed copying {} to {}",
                source.display(),
                target.display()
            )
        })?;

        info!(stored = %target.display(), mime, "stored draft image");
        Ok(ImageAttachment {
            stored_name,
            mime: mime.to_string(),
        })
    }

    /// Deletes an attachment's stored copy; already-gone copies are fine.
    #[tracing::instrument(skip(self, attachment), fields(stored = %attachment.stored_name))]
    pub fn release_draft_image(&self, attachment: &ImageAttachment) -> anyhow::Result<()> {
        let target = self.images_dir.join(&attachment.stored_name);
        match fs::remove_file(&target) {
            Ok(()) => {
                debug!("released draft image");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("failed removing {}", target.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::tempdir;

    use super::*;
    use crate::draft::FieldChange;
    use crate::reminder::Priority;

    fn reminder(id: u64, title: &str) -> Reminder {
        Reminder {
            id,
            title: title.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 24).expect("valid date"),
            time: "09:00".to_string(),
            priority: Priority::Medium,
        }
    }

    #[test]
    fn reminders_roundtrip() {
        let temp = tempdir().expect("tempdir");
        let store = DataStore::open(temp.path()).expect("open datastore");

        assert!(store.load_reminders().expect("load empty").is_empty());

        let reminders = vec![reminder(1, "Prepare slides"), reminder(2, "Call venue")];
        store.save_reminders(&reminders).expect("save");
        assert_eq!(store.load_reminders().expect("reload"), reminders);
    }

    #[test]
    fn next_id_survives_deletions() {
        let temp = tempdir().expect("tempdir");
        let store = DataStore::open(temp.path()).expect("open datastore");

        assert_eq!(store.next_reminder_id(&[]), 1);

        // id 2 deleted, id 3 still present: the next id must not collide
        let remaining = vec![reminder(1, "a"), reminder(3, "c")];
        assert_eq!(store.next_reminder_id(&remaining), 4);
    }

    #[test]
    fn wizard_state_roundtrips_and_clears() {
        let temp = tempdir().expect("tempdir");
        let store = DataStore::open(temp.path()).expect("open datastore");

        assert!(store.load_wizard().expect("no wizard yet").is_none());

        let mut wizard = Wizard::new();
        wizard
            .apply(FieldChange::text("title", "Launch Party"))
            .expect("apply title");
        wizard.go_next();
        store.save_wizard(&wizard).expect("save wizard");

        let loaded = store.load_wizard().expect("load").expect("wizard present");
        assert_eq!(loaded, wizard);

        store.clear_wizard().expect("clear");
        assert!(store.load_wizard().expect("after clear").is_none());
        store.clear_wizard().expect("clear twice is fine");
    }

    #[test]
    fn draft_images_are_stored_and_released() {
        let temp = tempdir().expect("tempdir");
        let store = DataStore::open(temp.path()).expect("open datastore");

        let source = temp.path().join("poster.png");
        fs::write(&source, b"not really a png").expect("write source");

        let attachment = store
            .store_draft_image(&source, "image/png")
            .expect("store image");
        assert!(attachment.stored_name.ends_with(".png"));
        assert!(store.images_dir.join(&attachment.stored_name).exists());

        store
            .release_draft_image(&attachment)
            .expect("release image");
        assert!(!store.images_dir.join(&attachment.stored_name).exists());
        store
            .release_draft_image(&attachment)
            .expect("double release is fine");
    }
}
