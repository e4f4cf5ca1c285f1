//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `unicli_core` linkage end to end: config, logging, store open
//!   and migrations.
//! - Print a one-screen agenda for today.

use log::error;
use std::process::ExitCode;
use unicli_core::{
    core_version, init_from_config, CalendarEntry, CalendarService, Clock, CoreConfig, Database,
    TaskRepository,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("unicli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = CoreConfig::resolve()?;
    config.ensure_dirs()?;
    init_from_config(&config)?;

    let db = Database::open(&config.database_path)?;
    let today = db.clock().today();

    println!("unicli_core version={}", core_version());
    println!("schema version={}", db.schema_version()?);
    println!("store={}", config.database_path.display());

    let tasks = db.tasks();
    let due_today = tasks.find_due_today()?;
    let overdue = tasks.find_overdue()?;
    println!();
    println!("Due today ({}):", due_today.len());
    for task in &due_today {
        println!("  [{}] {} {}", task.priority, task.title, task.completion_ratio());
    }
    println!("Overdue: {}", overdue.len());

    let calendar = CalendarService::new(db.tasks(), db.events(), db.courses());
    let items = calendar.day_items(today)?;
    println!();
    println!("Today {} ({} items):", today.format("%a %Y-%m-%d"), items.len());
    for item in &items {
        let when = if item.is_all_day() {
            "all day".to_string()
        } else {
            item.start().format("%H:%M").to_string()
        };
        println!("  {when:>7}  {:<6} {}", item.type_tag(), item.title());
    }

    db.close()?;
    Ok(())
}
