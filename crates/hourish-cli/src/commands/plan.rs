//! Plan inspection commands for CLI.

use std::path::PathBuf;

use clap::Subcommand;
use hourish_core::{CountdownScheduler, Plan, SystemClock};

use crate::format::format_secs;

#[derive(Subcommand)]
pub enum PlanAction {
    /// Show the tasks in a plan, in run order
    Show {
        /// Path to the plan TOML file
        path: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that a plan can be loaded into a session
    Validate {
        /// Path to the plan TOML file
        path: PathBuf,
    },
}

pub fn run(action: PlanAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PlanAction::Show { path, json } => {
            let plan = Plan::load(&path)?;
            let mut records = plan.task_records();
            records.sort_by_key(|r| r.order);

            if json {
                let out = serde_json::json!({
                    "name": plan.name,
                    "description": plan.description,
                    "total_duration_secs": plan.total_duration_secs(),
                    "tasks": records,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(());
            }

            println!("{}", plan.name);
            if !plan.description.is_empty() {
                println!("  {}", plan.description);
            }
            for record in &records {
                let lock = if record.locked { " [locked]" } else { "" };
                println!(
                    "{:>4}  {}  {}{}",
                    record.order,
                    format_secs(record.duration_secs),
                    record.title,
                    lock
                );
                if !record.note.is_empty() {
                    println!("            {}", record.note);
                }
            }
            println!("total {}", format_secs(plan.total_duration_secs()));
        }
        PlanAction::Validate { path } => {
            let plan = Plan::load(&path)?;
            let mut scheduler = CountdownScheduler::new(SystemClock);
            scheduler.populate(&plan.task_records())?;
            if scheduler.items().is_empty() {
                return Err(format!("plan '{}' has no tasks", plan.name).into());
            }
            println!(
                "ok: {} tasks, total {}",
                scheduler.items().len(),
                format_secs(plan.total_duration_secs())
            );
        }
    }
    Ok(())
}
