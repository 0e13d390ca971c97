//! fieldops demo: one dispatch day for three engineers.
//!
//! Usage: `fieldops-cli [config.json]`. Log level comes from `RUST_LOG`
//! (default `info`).

use std::error::Error;

use chrono::{NaiveDate, TimeZone, Utc};
use fieldops_core::ports::{FixedClock, IdGenerator, UlidGenerator};
use fieldops_core::{DispatchConfig, DispatchDesk, EngineerSpec, Hours, PersistedTask, Priority, TaskSpec};
use tracing::info;
use tracing_subscriber::EnvFilter;

const COFFEE: &str = "CoffeeMaster3000";
const SNACK: &str = "SnackPro200";
const DRINK: &str = "DrinkCool500";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, Box<dyn Error>> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| format!("invalid date {y}-{m}-{d}").into())
}

fn print_json(label: &str, value: &impl serde::Serialize) -> Result<(), Box<dyn Error>> {
    println!("== {label} ==");
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => DispatchConfig::from_json_file(&path)?,
        None => DispatchConfig::default(),
    };
    info!(?config, "configuration loaded");

    // (A) 2024-04-15 (Monday) 08:00 UTC
    let clock = FixedClock::new(
        Utc.with_ymd_and_hms(2024, 4, 15, 8, 0, 0)
            .single()
            .ok_or("invalid demo timestamp")?,
    );
    let ids = UlidGenerator::new(clock.clone());
    let desk = DispatchDesk::builder()
        .config(config)
        .clock(clock)
        .build()?;

    let monday = date(2024, 4, 15)?;
    let tuesday = date(2024, 4, 16)?;

    // (B) roster and the already-booked task from the persistence layer
    let ivanov = ids.generate_engineer_id();
    let engineers = vec![
        EngineerSpec::new("Ivanov I.I.")
            .with_id(ivanov)
            .with_skill(COFFEE)
            .with_skill(SNACK)
            .with_skill(DRINK),
        EngineerSpec::new("Petrov P.P.").with_skill(SNACK).with_skill(DRINK),
        EngineerSpec::new("Sidorov S.S.").with_skill(COFFEE),
    ];
    let booked = TaskSpec::planned("Cooling check", DRINK, Hours::whole(2), tuesday)
        .with_machine_code("TA-128")
        .with_location("University");
    desk.load(vec![PersistedTask::assigned_to(booked, ivanov)], engineers)
        .await?;

    // (C) today's intake
    desk.submit_task(
        TaskSpec::planned("Scheduled maintenance", COFFEE, Hours::whole(3), monday)
            .with_machine_code("TA-001")
            .with_location("MEGA mall")
            .with_priority(Priority::NORMAL),
    )
    .await?;
    let breakdown = desk
        .submit_task(
            TaskSpec::emergency("Dispenser jammed", SNACK, Hours::whole(4), monday)
                .with_machine_code("TA-045")
                .with_location("Airport"),
        )
        .await?;

    // (D) emergency first, then the planned queue
    let outcome = desk.handle_emergency(breakdown).await?;
    print_json("emergency", &outcome)?;

    let report = desk.auto_assign().await;
    print_json("auto-assign", &report)?;
    print_json("started", &desk.start_scheduled(monday).await)?;

    print_json("workload", &desk.workload_stats(monday))?;
    print_json("decisions", &desk.decisions().await)?;
    Ok(())
}
