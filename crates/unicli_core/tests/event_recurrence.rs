use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use std::collections::HashSet;
use std::sync::Arc;
use unicli_core::{
    Category, CategoryRepository, Database, ErrorKind, Event, EventRepository, FixedClock,
    ProjectionWindow, RecurrenceRule, RepoError, ValidationError,
};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, 0))
        .unwrap()
}

fn setup(now: NaiveDateTime) -> Database {
    Database::open_in_memory()
        .unwrap()
        .with_clock(Arc::new(FixedClock::new(now)))
}

#[test]
fn create_and_find_roundtrip_keeps_nullable_fields() {
    let now = at(2025, 1, 1, 8, 0);
    let db = setup(now);
    let category = Category::new("Study", "#3366FF");
    db.categories().create(&category).unwrap();
    let repo = db.events();

    let mut event = Event::new("Seminar", at(2025, 1, 6, 9, 0), now);
    event.description = "Room B".to_string();
    event.end = Some(at(2025, 1, 6, 10, 0));
    event.kind = "meeting".to_string();
    event.category_id = Some(category.id.clone());
    event.recurrence_rule = Some(RecurrenceRule::Weekly);
    event.recurrence_end = Some(at(2025, 3, 31, 0, 0));
    repo.create(&event).unwrap();

    assert_eq!(repo.find_by_id(&event.id).unwrap(), event);

    let bare = Event::new("Bare", at(2025, 1, 2, 0, 0), now);
    repo.create(&bare).unwrap();
    let loaded = repo.find_by_id(&bare.id).unwrap();
    assert_eq!(loaded.end, None);
    assert_eq!(loaded.category_id, None);
    assert_eq!(loaded.recurrence_rule, None);
    assert!(loaded.is_all_day());

    let all: Vec<String> = repo.find_all().unwrap().into_iter().map(|e| e.title).collect();
    assert_eq!(all, vec!["Bare", "Seminar"]);
}

#[test]
fn update_and_delete_report_missing_rows() {
    let now = at(2025, 1, 1, 8, 0);
    let db = setup(now);
    let repo = db.events();

    let mut event = Event::new("Lab", at(2025, 1, 7, 14, 0), now);
    repo.create(&event).unwrap();
    event.title = "Lab (moved)".to_string();
    event.start = at(2025, 1, 8, 14, 0);
    repo.update(&event).unwrap();
    assert_eq!(repo.find_by_id(&event.id).unwrap().title, "Lab (moved)");

    repo.delete(&event.id).unwrap();
    assert_eq!(repo.find_by_id(&event.id).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(repo.update(&event).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(repo.delete(&event.id).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn weekly_recurrence_fills_january_mondays() {
    let db = setup(at(2025, 1, 1, 8, 0));
    let repo = db.events();

    let mut event = Event::new("Standup", at(2025, 1, 6, 9, 0), at(2025, 1, 1, 8, 0));
    event.end = Some(at(2025, 1, 6, 10, 0));
    event.recurrence_rule = Some(RecurrenceRule::Weekly);
    repo.create(&event).unwrap();

    let occurrences = repo.get_events_by_month(2025, 1).unwrap();
    let days: Vec<u32> = occurrences.iter().map(|e| e.start.day()).collect();
    assert_eq!(days, vec![6, 13, 20, 27]);

    let ids: HashSet<&str> = occurrences.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids.len(), 4);
    for occurrence in &occurrences {
        assert_eq!(occurrence.start.weekday(), Weekday::Mon);
        assert_eq!(occurrence.duration(), Some(Duration::hours(1)));
        assert_eq!(occurrence.title, "Standup");
    }
}

#[test]
fn monthly_recurrence_from_january_31_lands_on_march_3() {
    let db = setup(at(2025, 1, 1, 8, 0));
    let repo = db.events();

    let mut event = Event::new("Rent", at(2025, 1, 31, 12, 0), at(2025, 1, 1, 8, 0));
    event.recurrence_rule = Some(RecurrenceRule::Monthly);
    repo.create(&event).unwrap();

    let march = repo.get_events_by_month(2025, 3).unwrap();
    let starts: Vec<NaiveDateTime> = march.iter().map(|e| e.start).collect();
    assert_eq!(starts, vec![at(2025, 3, 3, 12, 0)]);

    // The walk continues from the stepped instant, not the original day.
    let april = repo.get_events_by_month(2025, 4).unwrap();
    assert_eq!(april.len(), 1);
    assert_eq!(april[0].start, at(2025, 4, 3, 12, 0));
}

#[test]
fn recurrence_end_is_inclusive_and_stops_the_walk() {
    let db = setup(at(2025, 1, 1, 8, 0));
    let repo = db.events();

    let mut event = Event::new("Review", at(2025, 1, 1, 18, 0), at(2025, 1, 1, 8, 0));
    event.recurrence_rule = Some(RecurrenceRule::Daily);
    event.recurrence_end = Some(at(2025, 1, 5, 18, 0));
    repo.create(&event).unwrap();

    let days: Vec<u32> = repo
        .get_events_by_month(2025, 1)
        .unwrap()
        .iter()
        .map(|e| e.start.day())
        .collect();
    assert_eq!(days, vec![1, 2, 3, 4, 5]);
}

#[test]
fn open_ended_recurrence_is_capped_two_years_after_now() {
    let db = setup(at(2025, 1, 1, 8, 0));
    let repo = db.events();

    let mut event = Event::new("Gym", at(2025, 1, 1, 7, 0), at(2025, 1, 1, 8, 0));
    event.recurrence_rule = Some(RecurrenceRule::Daily);
    repo.create(&event).unwrap();

    assert_eq!(repo.get_events_by_month(2026, 12).unwrap().len(), 31);
    // Horizon is 2027-01-01 08:00: only the 07:00 occurrence of Jan 1 fits.
    assert_eq!(repo.get_events_by_month(2027, 1).unwrap().len(), 1);
    assert!(repo.get_events_by_month(2027, 2).unwrap().is_empty());
    assert!(repo.get_events_by_month(2040, 6).unwrap().is_empty());
}

#[test]
fn recurrence_starting_past_the_horizon_still_shows_its_first_instance() {
    let db = setup(at(2025, 1, 1, 8, 0));
    let repo = db.events();

    let mut event = Event::new("Sabbatical seminar", at(2028, 1, 3, 10, 0), at(2025, 1, 1, 8, 0));
    event.recurrence_rule = Some(RecurrenceRule::Weekly);
    repo.create(&event).unwrap();

    let january = repo.get_events_by_month(2028, 1).unwrap();
    assert_eq!(january.len(), 1);
    assert_eq!(january[0].start, at(2028, 1, 3, 10, 0));
    assert!(repo.get_events_by_month(2028, 2).unwrap().is_empty());
}

#[test]
fn unknown_persisted_rule_reads_as_one_off_event() {
    let db = setup(at(2025, 1, 1, 8, 0));
    db.conn()
        .execute(
            "INSERT INTO events (id, title, start_datetime, type, recurrence_rule, created_at)
             VALUES ('odd', 'Odd rule', '2025-01-06 09:00:00', 'event', 'fortnightly', '2025-01-01 08:00:00');",
            [],
        )
        .unwrap();
    db.conn()
        .execute(
            "INSERT INTO events (id, title, start_datetime, type, recurrence_rule, created_at)
             VALUES ('none', 'None rule', '2025-01-07 09:00:00', 'event', 'none', '2025-01-01 08:00:00');",
            [],
        )
        .unwrap();
    let repo = db.events();

    assert_eq!(repo.find_by_id("odd").unwrap().recurrence_rule, None);
    let january = repo.get_events_by_month(2025, 1).unwrap();
    let ids: Vec<&str> = january.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["odd", "none"]);
}

#[test]
fn projection_stays_inside_the_requested_window() {
    let db = setup(at(2025, 1, 1, 8, 0));
    let repo = db.events();

    let mut daily = Event::new("Daily", at(2024, 12, 30, 23, 30), at(2025, 1, 1, 8, 0));
    daily.recurrence_rule = Some(RecurrenceRule::Daily);
    repo.create(&daily).unwrap();
    repo.create(&Event::new("Boundary", at(2025, 2, 1, 0, 0), at(2025, 1, 1, 8, 0)))
        .unwrap();
    repo.create(&Event::new("Inside", at(2025, 1, 31, 23, 59), at(2025, 1, 1, 8, 0)))
        .unwrap();

    let window = ProjectionWindow::month(2025, 1).unwrap();
    let january = repo.get_events_by_month(2025, 1).unwrap();
    assert_eq!(january.len(), 32);
    assert!(january.iter().all(|event| window.contains(event.start)));
    assert!(january.iter().all(|event| event.title != "Boundary"));

    assert!(matches!(
        repo.get_events_by_month(2025, 13),
        Err(RepoError::Validation(ValidationError::InvalidMonth(13)))
    ));
}

#[test]
fn synthetic_class_events_are_rejected_on_write() {
    let db = setup(at(2025, 1, 1, 8, 0));
    let repo = db.events();

    let mut class = Event::new("Calculus I", at(2025, 1, 6, 9, 0), at(2025, 1, 1, 8, 0));
    class.kind = "class".to_string();
    class.category_id = Some("course_abc".to_string());

    let err = repo.create(&class).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::SyntheticEvent(_))
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(repo.find_all().unwrap().is_empty());
}

#[test]
fn deleting_a_category_nulls_event_references() {
    let now = at(2025, 1, 1, 8, 0);
    let db = setup(now);
    let category = Category::new("Sports", "#00AA00");
    db.categories().create(&category).unwrap();

    let mut event = Event::new("Match", at(2025, 1, 11, 15, 0), now);
    event.category_id = Some(category.id.clone());
    db.events().create(&event).unwrap();

    db.categories().delete(&category.id).unwrap();
    assert_eq!(db.events().find_by_id(&event.id).unwrap().category_id, None);

    let mut dangling = Event::new("Dangling", at(2025, 1, 12, 15, 0), now);
    dangling.category_id = Some("no-such-category".to_string());
    assert_eq!(db.events().create(&dangling).unwrap_err().kind(), ErrorKind::Io);
}
