use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rusqlite::Connection;
use std::sync::Arc;
use unicli_core::{
    weighted_average, AttendanceStatus, Course, CourseAttendance, CourseNote, CourseRepository,
    CourseSchedule, Database, ErrorKind, FixedClock, Grade, RepoError, ValidationError,
};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, 0))
        .unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn setup(now: NaiveDateTime) -> (Database, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(now));
    let db = Database::open_in_memory().unwrap().with_clock(clock.clone());
    (db, clock)
}

fn calculus(now: NaiveDateTime) -> Course {
    let mut course = Course::new("Calculus I", now);
    course.code = "MATH 101".to_string();
    course.professor = "Dr. Smith".to_string();
    course.location = "Room 301".to_string();
    course.semester = "Spring 2025".to_string();
    course.credits = 4;
    course.color = "#FF8800".to_string();
    course.add_schedule(1, "09:00", "10:30", now);
    course.add_schedule(3, "09:00", "10:30", now);
    course
}

fn rows(conn: &Connection, table: &str, course_id: &str) -> i64 {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE course_id = ?1;"),
        [course_id],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn create_and_get_roundtrip_loads_ordered_schedules() {
    let now = at(2025, 1, 1, 8, 0);
    let (db, _clock) = setup(now);
    let repo = db.courses();

    let mut course = calculus(now);
    course.add_schedule(1, "08:00", "08:50", now);
    repo.create(&mut course).unwrap();

    let loaded = repo.get_by_id(&course.id).unwrap();
    assert_eq!(loaded.name, "Calculus I");
    assert_eq!(loaded.credits, 4);
    let slots: Vec<(i64, &str)> = loaded
        .schedule
        .iter()
        .map(|slot| (slot.day_of_week, slot.start_time.as_str()))
        .collect();
    assert_eq!(slots, vec![(1, "08:00"), (1, "09:00"), (3, "09:00")]);
    assert!(loaded.schedule.iter().all(|slot| slot.course_id == course.id));
    assert_eq!(loaded.schedule[0].day_name(), "Monday");
    assert_eq!(loaded.schedule[2].day_short(), "Wed");

    assert_eq!(repo.get_by_id("missing").unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn create_and_update_point_in_memory_slots_at_the_course() {
    let now = at(2025, 1, 1, 8, 0);
    let (db, _clock) = setup(now);
    let repo = db.courses();

    let mut course = calculus(now);
    course
        .schedule
        .push(CourseSchedule::new("draft", 5, "13:00", "14:00", now));
    repo.create(&mut course).unwrap();
    assert!(course.schedule.iter().all(|slot| slot.course_id == course.id));
    assert_eq!(rows(db.conn(), "course_schedules", &course.id), 3);

    course
        .schedule
        .push(CourseSchedule::new("draft", 2, "15:00", "16:00", now));
    repo.update(&mut course).unwrap();
    assert!(course.schedule.iter().all(|slot| slot.course_id == course.id));
    assert_eq!(repo.get_by_id(&course.id).unwrap().schedule, {
        let mut expected = course.schedule.clone();
        expected.sort_by_key(|slot| (slot.day_of_week, slot.start_time.clone()));
        expected
    });
}

#[test]
fn invalid_schedule_is_rejected_before_any_write() {
    let now = at(2025, 1, 1, 8, 0);
    let (db, _clock) = setup(now);
    let repo = db.courses();

    let mut course = calculus(now);
    course.add_schedule(8, "09:00", "10:00", now);
    assert!(matches!(
        repo.create(&mut course),
        Err(RepoError::Validation(ValidationError::DayOfWeekOutOfRange(8)))
    ));

    let mut course = calculus(now);
    course.add_schedule(2, "9:00", "10:00", now);
    assert!(matches!(
        repo.create(&mut course),
        Err(RepoError::Validation(ValidationError::MalformedTime(_)))
    ));

    let mut course = calculus(now);
    course.add_schedule(2, "11:00", "10:00", now);
    assert!(matches!(
        repo.create(&mut course),
        Err(RepoError::Validation(ValidationError::ScheduleTimeOrder { .. }))
    ));

    assert!(repo.get_all().unwrap().is_empty());
}

#[test]
fn update_replaces_the_whole_schedule() {
    let now = at(2025, 1, 1, 8, 0);
    let (db, clock) = setup(now);
    let repo = db.courses();

    let mut course = calculus(now);
    repo.create(&mut course).unwrap();

    clock.advance(Duration::hours(1));
    course.location = "Hall A".to_string();
    course.schedule.clear();
    course.add_schedule(5, "13:00", "14:00", now);
    repo.update(&mut course).unwrap();

    let loaded = repo.get_by_id(&course.id).unwrap();
    assert_eq!(loaded.location, "Hall A");
    assert_eq!(loaded.updated_at, now + Duration::hours(1));
    assert_eq!(loaded.schedule.len(), 1);
    assert_eq!(loaded.schedule[0].day_of_week, 5);
    assert_eq!(rows(db.conn(), "course_schedules", &course.id), 1);

    let mut ghost = Course::new("Ghost", now);
    assert_eq!(repo.update(&mut ghost).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn listing_orders_by_name_and_filters_by_semester() {
    let now = at(2025, 1, 1, 8, 0);
    let (db, _clock) = setup(now);
    let repo = db.courses();

    for (name, semester) in [
        ("Physics", "Spring 2025"),
        ("Algorithms", "Fall 2024"),
        ("Biology", "Spring 2025"),
    ] {
        let mut course = Course::new(name, now);
        course.semester = semester.to_string();
        repo.create(&mut course).unwrap();
    }

    let all: Vec<String> = repo.get_all().unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(all, vec!["Algorithms", "Biology", "Physics"]);

    let spring: Vec<String> = repo
        .get_by_semester("Spring 2025")
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(spring, vec!["Biology", "Physics"]);
}

#[test]
fn delete_cascades_to_every_dependent_row() {
    let now = at(2025, 1, 1, 8, 0);
    let (db, _clock) = setup(now);
    let repo = db.courses();

    let mut course = calculus(now);
    course.add_schedule(5, "14:00", "15:00", now);
    repo.create(&mut course).unwrap();
    repo.create_attendance(&CourseAttendance::new(
        &course.id,
        at(2025, 1, 6, 9, 0),
        AttendanceStatus::Present,
        now,
    ))
    .unwrap();
    repo.create_attendance(&CourseAttendance::new(
        &course.id,
        at(2025, 1, 8, 9, 0),
        AttendanceStatus::Late,
        now,
    ))
    .unwrap();
    repo.create_note(&CourseNote::new(&course.id, "Limits", "epsilon-delta", now))
        .unwrap();
    repo.create_grade(&Grade::new(&course.id, "Quiz 1", 8.0, 10.0, now))
        .unwrap();

    assert_eq!(rows(db.conn(), "course_schedules", &course.id), 3);
    assert_eq!(rows(db.conn(), "course_attendance", &course.id), 2);

    repo.delete(&course.id).unwrap();

    for table in ["course_schedules", "course_attendance", "course_notes", "grades"] {
        assert_eq!(rows(db.conn(), table, &course.id), 0, "{table}");
    }
    assert_eq!(repo.delete(&course.id).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn notes_keep_json_tags_and_sort_newest_first() {
    let now = at(2025, 1, 1, 8, 0);
    let (db, _clock) = setup(now);
    let repo = db.courses();
    let mut course = calculus(now);
    repo.create(&mut course).unwrap();

    let mut older = CourseNote::new(&course.id, "Limits", "# Limits", now);
    older.date = at(2025, 1, 6, 9, 0);
    older.tags = vec!["exam".to_string(), "week 1".to_string()];
    repo.create_note(&older).unwrap();

    let mut newer = CourseNote::new(&course.id, "Derivatives", "# Derivatives", now);
    newer.date = at(2025, 1, 13, 9, 0);
    repo.create_note(&newer).unwrap();

    let notes = repo.get_notes(&course.id).unwrap();
    assert_eq!(notes, vec![newer, older.clone()]);

    let raw: String = db
        .conn()
        .query_row(
            "SELECT tags FROM course_notes WHERE id = ?1;",
            [older.id.as_str()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(raw, r#"["exam","week 1"]"#);
}

#[test]
fn attendance_reads_back_newest_first() {
    let now = at(2025, 1, 1, 8, 0);
    let (db, _clock) = setup(now);
    let repo = db.courses();
    let mut course = calculus(now);
    repo.create(&mut course).unwrap();

    let mut absent = CourseAttendance::new(
        &course.id,
        at(2025, 1, 8, 9, 0),
        AttendanceStatus::Absent,
        now,
    );
    absent.notes = "sick".to_string();
    repo.create_attendance(&absent).unwrap();
    repo.create_attendance(&CourseAttendance::new(
        &course.id,
        at(2025, 1, 6, 9, 0),
        AttendanceStatus::Present,
        now,
    ))
    .unwrap();

    let records = repo.get_attendance(&course.id).unwrap();
    let statuses: Vec<AttendanceStatus> = records.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![AttendanceStatus::Absent, AttendanceStatus::Present]);
    assert_eq!(records[0].notes, "sick");
}

#[test]
fn grades_sort_dated_first_and_average_by_weight() {
    let now = at(2025, 1, 1, 8, 0);
    let (db, _clock) = setup(now);
    let repo = db.courses();
    let mut course = calculus(now);
    repo.create(&mut course).unwrap();

    let mut midterm = Grade::new(&course.id, "Midterm", 80.0, 100.0, now);
    midterm.weight = 2.0;
    midterm.date = Some(date(2025, 3, 1));
    midterm.kind = Some("exam".to_string());
    let mut quiz = Grade::new(&course.id, "Quiz", 5.0, 10.0, now);
    quiz.date = Some(date(2025, 2, 1));
    let homework = Grade::new(&course.id, "Homework", 9.0, 10.0, now);
    for grade in [&homework, &quiz, &midterm] {
        repo.create_grade(grade).unwrap();
    }

    let grades = repo.get_grades(&course.id).unwrap();
    let names: Vec<&str> = grades.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Midterm", "Quiz", "Homework"]);
    assert_eq!(grades[0].kind.as_deref(), Some("exam"));
    assert_eq!(grades[0].percentage(), Some(80.0));

    // (80 * 2 + 50 + 90) / 4
    let average = weighted_average(&grades).unwrap();
    assert!((average - 75.0).abs() < 1e-9);
}

#[test]
fn week_materialization_places_monday_and_wednesday_classes() {
    let now = at(2025, 1, 1, 8, 0);
    let course = calculus(now);

    let events = course.generate_events_for_week(date(2025, 1, 6));
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].start, at(2025, 1, 6, 9, 0));
    assert_eq!(events[0].end, Some(at(2025, 1, 6, 10, 30)));
    assert_eq!(events[1].start, at(2025, 1, 8, 9, 0));
    assert_eq!(events[1].end, Some(at(2025, 1, 8, 10, 30)));
    for event in &events {
        assert_eq!(event.title, "Calculus I");
        assert_eq!(event.kind, "class");
        assert_eq!(event.category_id.as_deref(), Some(format!("course_{}", course.id).as_str()));
        assert_eq!(event.course_id(), Some(course.id.as_str()));
        assert_eq!(event.description, "MATH 101\nRoom 301\nDr. Smith");
    }
    assert_ne!(events[0].id, events[1].id);

    // Any day of the week maps onto the same Monday.
    let from_sunday = course.generate_events_for_week(date(2025, 1, 12));
    let starts: Vec<NaiveDateTime> = from_sunday.iter().map(|e| e.start).collect();
    assert_eq!(starts, vec![at(2025, 1, 6, 9, 0), at(2025, 1, 8, 9, 0)]);
}

#[test]
fn sunday_slots_materialize_on_the_sunday_of_each_week() {
    let now = at(2025, 1, 1, 8, 0);
    let mut course = Course::new("Choir", now);
    course.add_schedule(7, "18:00", "19:00", now);

    let week = course.generate_events_for_week(date(2025, 1, 6));
    assert_eq!(week.len(), 1);
    assert_eq!(week[0].start, at(2025, 1, 12, 18, 0));
    assert_eq!(week[0].start.weekday(), Weekday::Sun);

    let range = course.generate_events_for_date_range(date(2025, 1, 1), date(2025, 1, 20));
    let days: Vec<u32> = range.iter().map(|e| e.start.day()).collect();
    assert_eq!(days, vec![5, 12, 19]);
}

#[test]
fn month_materialization_keeps_only_in_month_classes() {
    let now = at(2025, 1, 1, 8, 0);
    let course = calculus(now);

    // February 2025 has four Mondays (3, 10, 17, 24) and four Wednesdays.
    let events = course.generate_events_for_month(2025, 2);
    assert_eq!(events.len(), 8);
    assert!(events
        .iter()
        .all(|event| event.start.year() == 2025 && event.start.month() == 2));
    assert!(events
        .iter()
        .all(|event| event.start.time() == NaiveTime::from_hms_opt(9, 0, 0).unwrap()));
}

#[test]
fn unparseable_slot_times_are_skipped() {
    let now = at(2025, 1, 1, 8, 0);
    let mut course = calculus(now);
    course.schedule[1].start_time = "nine".to_string();

    let events = course.generate_events_for_week(date(2025, 1, 6));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].start, at(2025, 1, 6, 9, 0));
}
