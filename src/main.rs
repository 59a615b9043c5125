use std::fs::File;
use std::io;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Local};
use sqlx::SqlitePool;
use tracing::info;

use gold_tracker::app;
use gold_tracker::cli::{self, Command};
use gold_tracker::config::AppConfig;
use gold_tracker::db::{self, price_queries};
use gold_tracker::jobs::price_update_job;
use gold_tracker::logging::{init_logging, LoggingConfig};
use gold_tracker::services::export_service;
use gold_tracker::services::job_scheduler_service::{
    execute_job_with_tracking, JobContext, JobSchedulerService,
};
use gold_tracker::services::price_service::{
    AlertStatus, PersistStatus, TrackedSeries, UpdateOutcome,
};
use gold_tracker::services::report_service;
use gold_tracker::services::verification_service;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let command = cli::parse_args(std::env::args().skip(1))?;
    if command == Command::Help {
        eprint!("{}", cli::USAGE);
        return Ok(());
    }

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let config = AppConfig::from_env()?;
    let client = app::build_client()?;

    if let Command::VerifyNotification { price } = command {
        let outcome = verification_service::verify_notification(
            &config,
            &client,
            price,
            Local::now().naive_local(),
        )
        .await?;
        print_outcome(&outcome);
        println!(
            "Notification {}",
            match &outcome.alert {
                AlertStatus::Delivered => "delivered".to_string(),
                AlertStatus::DeliveryFailed(e) => format!("FAILED: {}", e),
                AlertStatus::NotTriggered => "not triggered".to_string(),
            }
        );
        return Ok(());
    }

    let pool = db::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to open store at {}", config.database_url))?;

    let series = TrackedSeries {
        karat: config.karat.clone(),
        city: config.city.clone(),
    };

    match command {
        Command::Update => {
            let service = app::build_update_service(&config, pool.clone(), &client);
            let outcome = service.run_once().await;
            print_outcome(&outcome);
        }
        Command::Schedule => run_scheduler(&config, pool.clone(), &client).await?,
        Command::Export { out, days } => {
            let since = Local::now().naive_local() - Duration::days(days);
            let records =
                price_queries::fetch_since(&pool, since, &series.karat, &series.city).await?;
            let written = match &out {
                Some(path) => {
                    let file = File::create(path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    export_service::write_csv(&records, file)?
                }
                None => export_service::write_csv(&records, io::stdout().lock())?,
            };
            if let Some(path) = out {
                info!("📄 Exported {} records to {}", written, path.display());
            }
        }
        Command::Latest { count } => {
            let records = price_queries::latest_n(&pool, count).await?;
            if records.is_empty() {
                println!("No prices stored yet");
            }
            for r in records {
                println!(
                    "{}  ₹{:>12.2}  {} {}",
                    r.timestamp.format("%Y-%m-%d %H:%M"),
                    r.price_per_10g,
                    r.karat,
                    r.city
                );
            }
        }
        Command::Stats { days } => {
            let now = Local::now().naive_local();
            match report_service::summarize(&pool, &series, now, days).await? {
                Some(summary) => print_summary(&summary),
                None => println!("No {} {} prices stored yet", series.karat, series.city),
            }
        }
        Command::VerifyNotification { .. } | Command::Help => {}
    }

    pool.close().await;
    Ok(())
}

async fn run_scheduler(
    config: &AppConfig,
    pool: SqlitePool,
    client: &reqwest::Client,
) -> anyhow::Result<()> {
    let service = Arc::new(app::build_update_service(config, pool.clone(), client));
    let context = JobContext::new(pool, service);

    // First run right away rather than waiting for the next tick
    execute_job_with_tracking(
        price_update_job::JOB_NAME,
        context.clone(),
        Arc::new(price_update_job::run_price_update),
    )
    .await;

    let mut scheduler = JobSchedulerService::new(context).await?;
    scheduler.start(&config.update_schedule).await?;

    info!("⏰ Waiting for scheduled runs, Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    scheduler.stop().await?;
    Ok(())
}

fn print_outcome(outcome: &UpdateOutcome) {
    println!(
        "{}  ₹{:.2} per 10g ({})",
        outcome.timestamp.format("%Y-%m-%d %H:%M:%S"),
        outcome.price,
        outcome.origin
    );
    match &outcome.persisted {
        PersistStatus::Inserted(id) => println!("Stored as record #{}", id),
        PersistStatus::Duplicate => println!("Already stored for this timestamp"),
        PersistStatus::Skipped => println!("Not stored: no source produced a price"),
        PersistStatus::Failed(e) => println!("Not stored: {}", e),
    }
    match (outcome.trailing_average, outcome.drop_percent) {
        (Some(avg), Some(drop)) => {
            println!("Trailing average ₹{:.2}, change {:+.2}%", avg, -drop)
        }
        _ => println!("No trailing average yet"),
    }
    if outcome.alert_fired() {
        println!("Price drop alert fired");
    }
}

fn print_summary(summary: &report_service::PriceSummary) {
    let avg = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("₹{:.2}", v));

    println!(
        "Current   ₹{:.2} at {}",
        summary.current,
        summary.current_at.format("%Y-%m-%d %H:%M")
    );
    println!("Change    {:+.2} ({:+.2}%)", summary.change, summary.change_percent);
    println!("Today     {}", avg(summary.today_average));
    println!("7 days    {}", avg(summary.week_average));
    println!("30 days   {}", avg(summary.month_average));
    if let Some(w) = &summary.window {
        println!(
            "{} days: high ₹{:.2}, low ₹{:.2}, std-dev ₹{:.2} over {} records",
            summary.window_days, w.max, w.min, w.std_dev, w.count
        );
    }
}
