use anyhow::{Context, anyhow, bail};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::auth::AuthService;
use crate::calendar::{MonthCursor, ReminderScheduler, build_month_grid};
use crate::catalog::{EventSource, dashboard_stats};
use crate::cli::Invocation;
use crate::config::Config;
use crate::datastore::DataStore;
use crate::datetime::{format_long_date, parse_date_arg, today_local};
use crate::draft::{FieldChange, image_mime_for};
use crate::event::Event;
use crate::filter::{EventFilter, ReminderFilter};
use crate::reminder::{Priority, sort_for_listing};
use crate::render::Renderer;
use crate::session::{Session, SessionStore};
use crate::wizard::Wizard;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "login",
        "register",
        "logout",
        "whoami",
        "browse",
        "events",
        "calendar",
        "remind",
        "reminders",
        "done",
        "forget",
        "draft",
        "dashboard",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(store, sessions, catalog, auth, _cfg, renderer, inv))]
pub fn dispatch(
    store: &DataStore,
    sessions: &SessionStore,
    catalog: &mut dyn EventSource,
    auth: &dyn AuthService,
    _cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let today = today_local(now);
    let command = inv.command.as_str();

    debug!(command, args = ?inv.args, %today, "dispatching command");

    match command {
        "login" => cmd_login(auth, sessions, &inv.args),
        "register" => cmd_register(auth, sessions, &inv.args),
        "logout" => cmd_logout(auth, sessions),
        "whoami" => cmd_whoami(sessions),
        "browse" => cmd_browse(catalog, renderer, &inv.args, today),
        "events" => cmd_events(catalog, renderer, &inv.args, today),
        "calendar" => cmd_calendar(store, catalog, renderer, &inv.args, today),
        "remind" => cmd_remind(store, &inv.args, today),
        "reminders" => cmd_reminders(store, renderer, &inv.args),
        "done" => cmd_done(store, &inv.args),
        "forget" => cmd_forget(store, &inv.args),
        "draft" => cmd_draft(store, catalog, renderer, &inv.args),
        "dashboard" => cmd_dashboard(store, sessions, catalog, renderer, today),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip(auth, sessions, args))]
fn cmd_login(
    auth: &dyn AuthService,
    sessions: &SessionStore,
    args: &[String],
) -> anyhow::Result<()> {
    let [email, password] = args else {
        bail!("usage: eventify login <email> <password>");
    };

    let response = auth.login(email, password)?;
    sessions.set_session(&Session {
        token: response.token,
        user: response.user.clone(),
    })?;

    info!(email = %response.user.email, "logged in");
    println!("Login successful! Welcome, {}.", response.user.name);
    Ok(())
}

#[instrument(skip(auth, sessions, args))]
fn cmd_register(
    auth: &dyn AuthService,
    sessions: &SessionStore,
    args: &[String],
) -> anyhow::Result<()> {
    let [name, email, password] = args else {
        bail!("usage: eventify register <name> <email> <password>");
    };

    if !email_looks_valid(email) {
        bail!("email is invalid: {email}");
    }

    let response = auth.register(name, email, password)?;
    sessions.set_session(&Session {
        token: response.token,
        user: response.user.clone(),
    })?;

    info!(email = %response.user.email, "registered");
    println!("Registration successful! Welcome, {}.", response.user.name);
    Ok(())
}

/// The shape check applied before the register call goes out; the mock
/// backend itself only insists on a non-empty email.
fn email_looks_valid(email: &str) -> bool {
    regex::Regex::new(r"^\S+@\S+\.\S+$")
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

#[instrument(skip(auth, sessions))]
fn cmd_logout(auth: &dyn AuthService, sessions: &SessionStore) -> anyhow::Result<()> {
    let confirmation = auth.logout()?;
    sessions.clear_session()?;
    println!("{confirmation}");
    Ok(())
}

#[instrument(skip(sessions))]
fn cmd_whoami(sessions: &SessionStore) -> anyhow::Result<()> {
    match sessions.get_session()? {
        Some(session) => println!("{} <{}>", session.user.name, session.user.email),
        None => println!("Not logged in."),
    }
    Ok(())
}

#[instrument(skip(catalog, renderer, args, today))]
fn cmd_browse(
    catalog: &mut dyn EventSource,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    let filter = EventFilter::parse(args)?.public_only();
    let events = filter.apply(catalog.events()?, today);
    renderer.print_event_table(&events)
}

#[instrument(skip(catalog, renderer, args, today))]
fn cmd_events(
    catalog: &mut dyn EventSource,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    let filter = EventFilter::parse(args)?;
    let events = filter.apply(catalog.events()?, today);
    renderer.print_event_table(&events)
}

#[instrument(skip(store, catalog, renderer, args, today))]
fn cmd_calendar(
    store: &DataStore,
    catalog: &mut dyn EventSource,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    let cursor = match args.first() {
        Some(token) => MonthCursor::parse(token, today)?,
        None => MonthCursor::containing(today),
    };

    let events = catalog.events()?;
    let reminders = store.load_reminders()?;
    let grid = build_month_grid(cursor, &events, &reminders, today);
    renderer.print_calendar(cursor, &grid)
}

#[instrument(skip(store, args, today))]
fn cmd_remind(store: &DataStore, args: &[String], today: NaiveDate) -> anyhow::Result<()> {
    if !(3..=4).contains(&args.len()) {
        bail!("usage: eventify remind <date> <title> <time> [low|medium|high]");
    }

    let date = parse_date_arg(&args[0], today)?;
    let priority = match args.get(3) {
        Some(token) => {
            Priority::parse(token).ok_or_else(|| anyhow!("unknown priority: {token}"))?
        }
        None => Priority::default(),
    };

    let mut scheduler = ReminderScheduler::new();
    if !scheduler.select_date(date, today) {
        let message = scheduler
            .date_error()
            .unwrap_or(crate::calendar::PAST_DATE_ERROR)
            .to_string();
        bail!("{message}");
    }

    scheduler.set_title(&args[1]);
    scheduler.set_time(&args[2]);
    scheduler.set_priority(priority);

    let mut reminders = store.load_reminders()?;
    let id = store.next_reminder_id(&reminders);
    let reminder = scheduler.create_reminder(id)?;

    println!(
        "Created reminder {} for {}: {}",
        reminder.id,
        format_long_date(reminder.date),
        reminder.title
    );

    reminders.push(reminder);
    store.save_reminders(&reminders)?;
    Ok(())
}

#[instrument(skip(store, renderer, args))]
fn cmd_reminders(
    store: &DataStore,
    renderer: &mut Renderer,
    args: &[String],
) -> anyhow::Result<()> {
    let filter = ReminderFilter::parse(args)?;
    let mut reminders = store.load_reminders()?;
    reminders.retain(|reminder| filter.matches(reminder));
    sort_for_listing(&mut reminders);
    renderer.print_reminder_list(&reminders)
}

#[instrument(skip(store, args))]
fn cmd_done(store: &DataStore, args: &[String]) -> anyhow::Result<()> {
    let removed = remove_reminder(store, args, "done")?;
    println!("Completed reminder {}: {}", removed.id, removed.title);
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_forget(store: &DataStore, args: &[String]) -> anyhow::Result<()> {
    let removed = remove_reminder(store, args, "forget")?;
    println!("Deleted reminder {}: {}", removed.id, removed.title);
    Ok(())
}

fn remove_reminder(
    store: &DataStore,
    args: &[String],
    verb: &str,
) -> anyhow::Result<crate::reminder::Reminder> {
    let [raw_id] = args else {
        bail!("usage: eventify {verb} <id>");
    };
    let id: u64 = raw_id
        .parse()
        .with_context(|| format!("invalid reminder id: {raw_id}"))?;

    let mut reminders = store.load_reminders()?;
    let idx = reminders
        .iter()
        .position(|reminder| reminder.id == id)
        .ok_or_else(|| anyhow!("no reminder with id {id}"))?;

    let removed = reminders.remove(idx);
    store.save_reminders(&reminders)?;
    Ok(removed)
}

#[instrument(skip(store, catalog, renderer, args))]
fn cmd_draft(
    store: &DataStore,
    catalog: &mut dyn EventSource,
    renderer: &mut Renderer,
    args: &[String],
) -> anyhow::Result<()> {
    let Some(sub) = args.first() else {
        bail!(
            "usage: eventify draft <new|show|preview|set|image|next|back|cancel|submit>"
        );
    };

    match sub.as_str() {
        "new" => {
            if let Some(old) = store.load_wizard()?
                && let Some(att) = &old.draft().image
            {
                store.release_draft_image(att)?;
            }
            let wizard = Wizard::new();
            store.save_wizard(&wizard)?;
            println!("Started a new event draft (step 1: Basic Info).");
            Ok(())
        }
        "show" => {
            let wizard = require_wizard(store)?;
            renderer.print_wizard(&wizard)
        }
        "preview" => {
            let wizard = require_wizard(store)?;
            renderer.print_preview(&wizard)
        }
        "set" => {
            let Some(field) = args.get(1) else {
                bail!("usage: eventify draft set <field> <value...>");
            };
            let value = args[2..].join(" ");

            let change = match field.as_str() {
                "recurring" => FieldChange::check(field, parse_bool_arg(&value)?),
                "max_attendance" => FieldChange::numeric(field, &value),
                _ => FieldChange::text(field, &value),
            };

            let mut wizard = require_wizard(store)?;
            wizard.apply(change)?;
            store.save_wizard(&wizard)?;
            println!("Updated {field}.");
            Ok(())
        }
        "image" => {
            let Some(target) = args.get(1) else {
                bail!("usage: eventify draft image <path|none>");
            };
            let mut wizard = require_wizard(store)?;

            let replaced = if target == "none" {
                wizard.set_image(None)
            } else {
                let path = std::path::Path::new(target);
                let mime = image_mime_for(path)
                    .ok_or_else(|| anyhow!("not an image file: {target}"))?;
                let attachment = store.store_draft_image(path, mime)?;
                println!("Attached {} ({mime}).", attachment.stored_name);
                wizard.set_image(Some(attachment))
            };

            if let Some(old) = replaced {
                store.release_draft_image(&old)?;
            }
            store.save_wizard(&wizard)?;
            Ok(())
        }
        "next" => {
            let mut wizard = require_wizard(store)?;
            if wizard.go_next() {
                println!(
                    "Step {}: {}",
                    wizard.current_step(),
                    Wizard::step_title(wizard.current_step())
                );
            } else {
                println!("Already at the final step.");
            }
            store.save_wizard(&wizard)?;
            Ok(())
        }
        "back" => {
            let mut wizard = require_wizard(store)?;
            if wizard.go_previous() {
                println!(
                    "Step {}: {}",
                    wizard.current_step(),
                    Wizard::step_title(wizard.current_step())
                );
            } else {
                println!("Already at the first step.");
            }
            store.save_wizard(&wizard)?;
            Ok(())
        }
        "cancel" => {
            match store.load_wizard()? {
                Some(wizard) => {
                    if let Some(att) = &wizard.draft().image {
                        store.release_draft_image(att)?;
                    }
                    store.clear_wizard()?;
                    println!("Draft discarded.");
                }
                None => println!("No draft in progress."),
            }
            Ok(())
        }
        "submit" => {
            let wizard = require_wizard(store)?;
            let issues = wizard.draft().validate_for_submission();
            if !issues.is_empty() {
                let listing: Vec<String> =
                    issues.iter().map(|issue| format!("  {issue}")).collect();
                bail!("draft is not ready to submit:\n{}", listing.join("\n"));
            }

            let draft = wizard.into_draft();
            let image = draft.image.clone();
            let title = draft.title.clone();
            let event = draft.into_event(Uuid::new_v4().to_string())?;
            catalog.submit(event)?;

            if let Some(att) = image {
                store.release_draft_image(&att)?;
            }
            store.clear_wizard()?;

            println!("Event \"{title}\" submitted.");
            Ok(())
        }
        other => Err(anyhow!("unknown draft subcommand: {other}")),
    }
}

fn require_wizard(store: &DataStore) -> anyhow::Result<Wizard> {
    store
        .load_wizard()?
        .ok_or_else(|| anyhow!("no draft in progress (run: eventify draft new)"))
}

fn parse_bool_arg(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(anyhow!("expected true or false, got: {other}")),
    }
}

#[instrument(skip(store, sessions, catalog, renderer, today))]
fn cmd_dashboard(
    store: &DataStore,
    sessions: &SessionStore,
    catalog: &mut dyn EventSource,
    renderer: &mut Renderer,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let name = sessions
        .get_session()?
        .map_or_else(|| "User".to_string(), |session| session.user.name);
    println!("Welcome, {name}. Have a great day!");

    let events = catalog.events()?;
    renderer.print_stats(&dashboard_stats(&events, today))?;
    println!();

    let reminders = store.load_reminders()?;
    let cursor = MonthCursor::containing(today);
    let grid = build_month_grid(cursor, &events, &reminders, today);
    renderer.print_calendar(cursor, &grid)?;
    println!();

    println!("My Reminders");
    let mut sorted = reminders;
    sort_for_listing(&mut sorted);
    renderer.print_reminder_list(&sorted)?;
    println!();

    println!("Upcoming Events");
    let mut upcoming: Vec<Event> = events
        .into_iter()
        .filter(|event| event.is_upcoming(today))
        .collect();
    upcoming.sort_by_key(Event::starts_at);
    upcoming.truncate(4);
    renderer.print_event_table(&upcoming)
}

fn cmd_help() -> anyhow::Result<()> {
    println!("eventify <command> [args]");
    println!();
    println!("  login <email> <password>            sign in (mock backend)");
    println!("  register <name> <email> <password>  create an account");
    println!("  logout                              sign out");
    println!("  whoami                              show the active session");
    println!("  browse [filters...]                 public event catalog");
    println!("  events [filters...]                 all events; type:, privacy:, date:, sort:");
    println!("  calendar [YYYY-MM|+N|-N]            month grid with event/reminder markers");
    println!("  remind <date> <title> <time> [prio] create a reminder");
    println!("  reminders [priority:...|words]      list reminders");
    println!("  done <id> / forget <id>             complete or delete a reminder");
    println!("  draft new|show|preview|set|image|next|back|cancel|submit");
    println!("  dashboard                           stats, calendar, reminders, upcoming");
    println!("  version                             print the version");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names_are_unique() {
        let mut names = known_command_names();
        names.sort_unstable();
        let len = names.len();
        names.dedup();
        assert_eq!(names.len(), len);
    }

    #[test]
    fn abbreviations_expand_only_when_unambiguous() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("cal", &known), Some("calendar"));
        assert_eq!(expand_command_abbrev("remind", &known), Some("remind"));
        assert_eq!(expand_command_abbrev("rem", &known), None);
        assert_eq!(expand_command_abbrev("l", &known), None);
        assert_eq!(expand_command_abbrev("xyz", &known), None);
    }

    #[test]
    fn email_shape_check() {
        assert!(email_looks_valid("user@example.com"));
        assert!(!email_looks_valid("userexample.com"));
        assert!(!email_looks_valid("user@example"));
        assert!(!email_looks_valid("user@.com"));
        assert!(!email_looks_valid("@example.com"));
        assert!(!email_looks_valid("user name@example.com"));
    }
}
