use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::sync::Arc;
use unicli_core::{
    Category, CategoryRepository, Database, ErrorKind, FixedClock, Note, NoteRepository,
    RepoError, ValidationError,
};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, 0))
        .unwrap()
}

#[test]
fn duplicate_category_name_is_a_conflict_and_changes_nothing() {
    let db = Database::open_in_memory().unwrap();
    let repo = db.categories();

    let study = Category::new("Study", "#3366FF");
    repo.create(&study).unwrap();

    let err = repo.create(&Category::new("Study", "#000000")).unwrap_err();
    assert!(matches!(err, RepoError::Conflict { entity: "category", .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let all = repo.find_all().unwrap();
    assert_eq!(all, vec![study]);
}

#[test]
fn renaming_onto_an_existing_name_is_a_conflict() {
    let db = Database::open_in_memory().unwrap();
    let repo = db.categories();

    let work = Category::new("Work", "#AA0000");
    let mut gym = Category::new("Gym", "#00AA00");
    repo.create(&work).unwrap();
    repo.create(&gym).unwrap();

    gym.name = "Work".to_string();
    assert_eq!(repo.update(&gym).unwrap_err().kind(), ErrorKind::Conflict);
    assert_eq!(repo.find_by_id(&gym.id).unwrap().name, "Gym");
}

#[test]
fn categories_list_by_name_and_report_missing_rows() {
    let db = Database::open_in_memory().unwrap();
    let repo = db.categories();

    let mut zeta = Category::new("Zeta", "#111111");
    repo.create(&zeta).unwrap();
    repo.create(&Category::new("Alpha", "#222222")).unwrap();

    zeta.color = "#abcdef".to_string();
    repo.update(&zeta).unwrap();
    assert_eq!(repo.find_by_id(&zeta.id).unwrap().color, "#abcdef");

    let names: Vec<String> = repo.find_all().unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["Alpha", "Zeta"]);

    repo.delete(&zeta.id).unwrap();
    assert_eq!(repo.find_by_id(&zeta.id).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(repo.delete(&zeta.id).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn malformed_category_color_is_rejected() {
    let db = Database::open_in_memory().unwrap();
    let err = db
        .categories()
        .create(&Category::new("Bad", "blue"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::InvalidColor(_))
    ));
}

#[test]
fn notes_crud_orders_by_last_update() {
    let now = at(2025, 1, 1, 8, 0);
    let clock = Arc::new(FixedClock::new(now));
    let db = Database::open_in_memory().unwrap().with_clock(clock.clone());
    let repo = db.notes();

    let mut first = Note::new("Reading list", "- SICP", now);
    repo.create(&first).unwrap();
    let second = Note::new("Ideas", "thesis topics", now + Duration::minutes(1));
    repo.create(&second).unwrap();

    let titles = |notes: Vec<Note>| -> Vec<String> { notes.into_iter().map(|n| n.title).collect() };
    assert_eq!(titles(repo.find_all().unwrap()), vec!["Ideas", "Reading list"]);

    clock.advance(Duration::hours(1));
    first.content = "- SICP\n- TAOCP".to_string();
    repo.update(&mut first).unwrap();
    assert_eq!(first.updated_at, now + Duration::hours(1));
    assert_eq!(repo.find_by_id(&first.id).unwrap(), first);
    assert_eq!(titles(repo.find_all().unwrap()), vec!["Reading list", "Ideas"]);

    repo.delete(&second.id).unwrap();
    assert_eq!(repo.find_by_id(&second.id).unwrap_err().kind(), ErrorKind::NotFound);

    let mut ghost = Note::new("Ghost", "", now);
    assert_eq!(repo.update(&mut ghost).unwrap_err().kind(), ErrorKind::NotFound);
}
