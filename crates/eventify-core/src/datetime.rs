use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;

const TIMEZONE_CONFIG_FILE: &str = "eventify-time.toml";
const TIMEZONE_ENV_VAR: &str = "EVENTIFY_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str = "EVENTIFY_TIME_CONFIG";
const DEFAULT_PROJECT_TIMEZONE: &str = "Africa/Cairo";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
    timezone: Option<String>,
    time: Option<TimezoneSection>,
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
    timezone: Option<String>,
}

/// The timezone "today" is evaluated in. Resolved once per process from the
/// environment, then a config file, then the built-in default.
pub fn project_timezone() -> &'static Tz {
    static PROJECT_TZ: OnceLock<Tz> = OnceLock::new();
    PROJECT_TZ.get_or_init(resolve_project_timezone)
}

#[must_use]
pub fn today_local(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(project_timezone()).date_naive()
}

/// "March 24, 2025" — the display form carried by reminders and the
/// calendar's selected-date state.
#[must_use]
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

pub fn parse_long_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%B %d, %Y")
        .with_context(|| format!("invalid long date: {raw}"))
}

/// Accepts the date spellings the CLI takes for reminder placement.
pub fn parse_date_arg(token: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let trimmed = token.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "today" => return Ok(today),
        "tomorrow" => {
            return today
                .checked_add_signed(Duration::days(1))
                .ok_or_else(|| anyhow!("date out of range: {token}"));
        }
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(date) = parse_long_date(trimmed) {
        return Ok(date);
    }

    Err(anyhow!(
        "unrecognized date: {token} (expected today, tomorrow, YYYY-MM-DD, or e.g. \"March 24, 2025\")"
    ))
}

/// Parses "15:23", "3:23pm", "09:00 AM" into (hour, minute).
pub fn parse_clock_time(token: &str) -> Option<(u32, u32)> {
    let clock_re = Regex::new(
        r"(?i)^(?P<hour>\d{1,2}):(?P<minute>\d{2})\s*(?P<ampm>[ap]m)?$",
    )
    .ok()?;
    let captures = clock_re.captures(token.trim())?;

    let raw_hour = captures.name("hour")?.as_str().parse::<u32>().ok()?;
    let minute = captures.name("minute")?.as_str().parse::<u32>().ok()?;
    if minute > 59 {
        return None;
    }

    let hour = if let Some(ampm_match) = captures.name("ampm") {
        let ampm = ampm_match.as_str().to_ascii_lowercase();
        if raw_hour == 0 || raw_hour > 12 {
            return None;
        }
        match ampm.as_str() {
            "am" => {
                if raw_hour == 12 {
                    0
                } else {
                    raw_hour
                }
            }
            "pm" => {
                if raw_hour == 12 {
                    12
                } else {
                    raw_hour + 12
                }
            }
            _ => return None,
        }
    } else {
        if raw_hour > 23 {
            return None;
        }
        raw_hour
    };

    Some((hour, minute))
}

/// Normalizes any accepted clock spelling to 24h "HH:MM".
pub fn normalize_clock_time(token: &str) -> anyhow::Result<String> {
    let (hour, minute) =
        parse_clock_time(token).ok_or_else(|| anyhow!("invalid time: {token}"))?;
    Ok(format!("{hour:02}:{minute:02}"))
}

fn resolve_project_timezone() -> Tz {
    if let Ok(raw) = std::env::var(TIMEZONE_ENV_VAR)
        && let Some(tz) = parse_timezone(&raw, TIMEZONE_ENV_VAR)
    {
        return tz;
    }

    if let Some(path) = timezone_config_path()
        && let Some(tz) = load_timezone_from_file(&path)
    {
        return tz;
    }

    parse_timezone(DEFAULT_PROJECT_TIMEZONE, "DEFAULT_PROJECT_TIMEZONE").unwrap_or_else(|| {
        tracing::error!("failed to parse fallback timezone; using UTC");
        chrono_tz::UTC
    })
}

fn timezone_config_path() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var(TIMEZONE_CONFIG_ENV_VAR) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    std::env::current_dir()
        .ok()
        .map(|dir| dir.join(TIMEZONE_CONFIG_FILE))
}

fn load_timezone_from_file(path: &PathBuf) -> Option<Tz> {
    if !path.exists() {
        return None;
    }

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::error!(
                file = %path.display(),
                error = %err,
                "failed reading timezone config file"
            );
            return None;
        }
    };

    let parsed = match toml::from_str::<TimezoneConfig>(&raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::error!(
                file = %path.display(),
                error = %err,
                "failed parsing timezone config file"
            );
            return None;
        }
    };

    let timezone = parsed
        .timezone
        .or_else(|| parsed.time.and_then(|section| section.timezone));
    let Some(timezone) = timezone else {
        tracing::warn!(
            file = %path.display(),
            "timezone config had no timezone field"
        );
        return None;
    };

    parse_timezone(timezone.as_str(), &format!("file:{}", path.display()))
}

fn parse_timezone(raw: &str, source: &str) -> Option<Tz> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed.parse::<Tz>() {
        Ok(tz) => {
            tracing::info!(source, timezone = %trimmed, "configured project timezone");
            Some(tz)
        }
        Err(err) => {
            tracing::error!(
                source,
                timezone = %trimmed,
                error = %err,
                "failed to parse timezone id"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn long_date_roundtrips() {
        let d = date(2025, 3, 24);
        let formatted = format_long_date(d);
        assert_eq!(formatted, "March 24, 2025");
        assert_eq!(parse_long_date(&formatted).expect("parse"), d);
    }

    #[test]
    fn long_date_formats_single_digit_days_without_padding() {
        assert_eq!(format_long_date(date(2025, 4, 2)), "April 2, 2025");
    }

    #[test]
    fn parses_relative_date_args() {
        let today = date(2025, 6, 15);
        assert_eq!(parse_date_arg("today", today).expect("today"), today);
        assert_eq!(
            parse_date_arg("tomorrow", today).expect("tomorrow"),
            date(2025, 6, 16)
        );
        assert_eq!(
            parse_date_arg("2025-06-20", today).expect("iso"),
            date(2025, 6, 20)
        );
        assert_eq!(
            parse_date_arg("March 24, 2025", today).expect("long"),
            date(2025, 3, 24)
        );
        assert!(parse_date_arg("someday", today).is_err());
    }

    #[test]
    fn parses_clock_times() {
        assert_eq!(parse_clock_time("14:00"), Some((14, 0)));
        assert_eq!(parse_clock_time("3:23pm"), Some((15, 23)));
        assert_eq!(parse_clock_time("09:00 AM"), Some((9, 0)));
        assert_eq!(parse_clock_time("12:15am"), Some((0, 15)));
        assert_eq!(parse_clock_time("12:15pm"), Some((12, 15)));
        assert_eq!(parse_clock_time("24:00"), None);
        assert_eq!(parse_clock_time("13:00pm"), None);
        assert_eq!(parse_clock_time("now"), None);
    }

    #[test]
    fn normalizes_clock_times_to_24h() {
        assert_eq!(normalize_clock_time("02:00 PM").expect("pm"), "14:00");
        assert_eq!(normalize_clock_time("9:05").expect("24h"), "09:05");
        assert!(normalize_clock_time("noon").is_err());
    }
}
