use chrono::NaiveDate;
use eventify_core::auth::{AuthService, MockAuth};
use eventify_core::calendar::{MonthCursor, ReminderScheduler, build_month_grid};
use eventify_core::datastore::DataStore;
use eventify_core::draft::FieldChange;
use eventify_core::filter::ReminderFilter;
use eventify_core::reminder::Priority;
use eventify_core::session::{Session, SessionStore};
use eventify_core::wizard::Wizard;
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn reminder_flow_from_selection_to_store() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");
    let today = date(2025, 6, 15);

    let mut scheduler = ReminderScheduler::new();
    assert!(!scheduler.select_date(date(2025, 6, 14), today));
    assert!(scheduler.date_error().is_some());

    assert!(scheduler.select_date(date(2025, 6, 20), today));
    scheduler.set_title("Call client");
    scheduler.set_time("14:00");
    scheduler.set_priority(Priority::High);

    let mut reminders = store.load_reminders().expect("load reminders");
    let id = store.next_reminder_id(&reminders);
    let reminder = scheduler.create_reminder(id).expect("create reminder");
    reminders.push(reminder);
    store.save_reminders(&reminders).expect("save reminders");

    let reloaded = store.load_reminders().expect("reload reminders");
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].id, 1);
    assert_eq!(reloaded[0].title, "Call client");
    assert_eq!(reloaded[0].time, "14:00");
    assert_eq!(reloaded[0].priority, Priority::High);

    let filter = ReminderFilter::parse(&["priority:high".to_string()]).expect("parse filter");
    assert!(filter.matches(&reloaded[0]));

    let grid = build_month_grid(
        MonthCursor::containing(today),
        &[],
        &reloaded,
        today,
    );
    assert_eq!(grid.len(), 42);
    let twentieth = grid
        .iter()
        .find(|cell| cell.in_current_month && cell.day_number == 20)
        .expect("day 20 present");
    assert_eq!(twentieth.reminders.len(), 1);
}

#[test]
fn wizard_state_survives_reopening_the_store() {
    let temp = tempdir().expect("tempdir");
    let today_dir = temp.path();

    {
        let store = DataStore::open(today_dir).expect("open datastore");
        let mut wizard = Wizard::new();
        wizard
            .apply(FieldChange::text("title", "Launch Party"))
            .expect("apply title");
        wizard.go_next();
        wizard.go_next();
        wizard.go_next();
        assert_eq!(wizard.current_step(), 4);
        store.save_wizard(&wizard).expect("save wizard");
    }

    let store = DataStore::open(today_dir).expect("reopen datastore");
    let wizard = store
        .load_wizard()
        .expect("load wizard")
        .expect("wizard present");
    assert_eq!(wizard.current_step(), 4);
    assert_eq!(wizard.draft().title, "Launch Party");
    assert_eq!(wizard.draft().description, "");
}

#[test]
fn login_stores_a_session_and_logout_clears_it() {
    let temp = tempdir().expect("tempdir");
    let sessions = SessionStore::open(temp.path());
    let auth = MockAuth::instant();

    assert!(auth.login("user@example.com", "wrong").is_err());
    assert_eq!(sessions.get_session().expect("no session"), None);

    let response = auth.login("user@example.com", "123456").expect("login");
    sessions
        .set_session(&Session {
            token: response.token.clone(),
            user: response.user.clone(),
        })
        .expect("store session");

    let active = sessions
        .get_session()
        .expect("read session")
        .expect("session present");
    assert_eq!(active.token, "mock-token-123");
    assert_eq!(active.user.name, "Test User");

    auth.logout().expect("logout");
    sessions.clear_session().expect("clear session");
    assert_eq!(sessions.get_session().expect("after clear"), None);
}
