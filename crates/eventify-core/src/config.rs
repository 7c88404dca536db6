use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tracing::{debug, info, warn};

const RC_ENV_VAR: &str = "EVENTIFY_RC";
const RC_FILE_NAME: &str = ".eventifyrc";
const DEFAULT_DATA_LOCATION: &str = "~/.eventify";

/// Flat key=value configuration, defaults first, then the rc file, then any
/// command-line overrides.
#[derive(Debug, Clone)]
pub struct Config {
    map: HashMap<String, String>,
    pub loaded_files: Vec<PathBuf>,
}

impl Config {
    #[tracing::instrument(skip(rc_override))]
    pub fn load(rc_override: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = Config {
            map: HashMap::new(),
            loaded_files: vec![],
        };

        cfg.map.insert(
            "data.location".to_string(),
            DEFAULT_DATA_LOCATION.to_string(),
        );
        cfg.map
            .insert("default.command".to_string(), "dashboard".to_string());
        cfg.map.insert("color".to_string(), "on".to_string());

        let rc_path = resolve_rc_path(rc_override)?;
        if let Some(path) = rc_path {
            info!(rc = %path.display(), "loading rc file");
            cfg.load_file(&path)?;
        } else {
            debug!("no rc file found; using defaults");
        }

        Ok(cfg)
    }

    #[tracing::instrument(skip(self, overrides))]
    pub fn apply_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (k, v) in overrides {
            let key = k.strip_prefix("rc.").unwrap_or(&k).to_string();
            debug!(key = %key, value = %v, "applying override");
            self.map.insert(key, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    #[tracing::instrument(skip(self))]
    fn load_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let path = expand_tilde(path);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed reading rc file {}", path.display()))?;

        for (idx, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                warn!(
                    file = %path.display(),
                    line = idx + 1,
                    "skipping malformed rc line (expected key=value)"
                );
                continue;
            };

            self.map
                .insert(key.trim().to_string(), value.trim().to_string());
        }

        self.loaded_files.push(path);
        Ok(())
    }
}

fn resolve_rc_path(rc_override: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = rc_override {
        let path = expand_tilde(path);
        if !path.exists() {
            return Err(anyhow!("rc file not found: {}", path.display()));
        }
        return Ok(Some(path));
    }

    if let Ok(raw) = std::env::var(RC_ENV_VAR) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let path = expand_tilde(Path::new(trimmed));
            if path.exists() {
                return Ok(Some(path));
            }
            warn!(rc = %path.display(), "rc file from {RC_ENV_VAR} does not exist");
        }
    }

    if let Some(home) = dirs::home_dir() {
        let candidate = home.join(RC_FILE_NAME);
        if candidate.exists() {
            return Ok(Some(candidate));
        }
    }

    Ok(None)
}

#[tracing::instrument(skip(cfg, cli_override))]
pub fn resolve_data_dir(cfg: &Config, cli_override: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli_override {
        return Ok(expand_tilde(path));
    }

    let location = cfg
        .get("data.location")
        .unwrap_or_else(|| DEFAULT_DATA_LOCATION.to_string());
    Ok(expand_tilde(Path::new(&location)))
}

fn expand_tilde(path: &Path) -> PathBuf {
    let Some(raw) = path.to_str() else {
        return path.to_path_buf();
    };

    if raw == "~" {
        return dirs::home_dir().unwrap_or_else(|| path.to_path_buf());
    }

    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn defaults_are_present() {
        let cfg = Config::load(None).expect("load config");
        assert!(cfg.get("data.location").is_some());
        assert_eq!(cfg.get("default.command").as_deref(), Some("dashboard"));
        assert_eq!(cfg.get("color").as_deref(), Some("on"));
    }

    #[test]
    fn rc_file_and_overrides_layer_in_order() {
        let mut rc = NamedTempFile::new().expect("temp rc");
        writeln!(rc, "# comment").expect("write rc");
        writeln!(rc, "color = off").expect("write rc");
        writeln!(rc, "default.command = events").expect("write rc");
        writeln!(rc, "malformed line").expect("write rc");
        rc.flush().expect("flush rc");

        let mut cfg = Config::load(Some(rc.path())).expect("load config");
        assert_eq!(cfg.get("color").as_deref(), Some("off"));
        assert_eq!(cfg.get("default.command").as_deref(), Some("events"));

        cfg.apply_overrides(vec![("rc.color".to_string(), "on".to_string())]);
        assert_eq!(cfg.get("color").as_deref(), Some("on"));
    }

    #[test]
    fn missing_rc_override_is_an_error() {
        assert!(Config::load(Some(Path::new("/definitely/not/here"))).is_err());
    }

    #[test]
    fn data_dir_prefers_the_cli_override() {
        let cfg = Config::load(None).expect("load config");
        let dir = resolve_data_dir(&cfg, Some(Path::new("/tmp/eventify-test")))
            .expect("resolve data dir");
        assert_eq!(dir, PathBuf::from("/tmp/eventify-test"));
    }
}
