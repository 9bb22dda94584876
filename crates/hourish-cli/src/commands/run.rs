//! Live session command.
//!
//! Drives a [`SessionRunner`] on a Tokio runtime and renders it until the
//! session stops, either on its own or through Ctrl-C.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use hourish_core::{
    Config, DisplayConfig, Plan, SessionConfig, SessionEvent, SessionRunner, SessionSnapshot,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::format::format_clock;

#[derive(Args)]
pub struct RunArgs {
    /// Path to the plan TOML file
    pub plan: PathBuf,
    /// Emit events as JSON lines instead of a status display
    #[arg(long)]
    pub json: bool,
    /// Override the clock tick interval in milliseconds
    #[arg(long)]
    pub tick_ms: Option<u64>,
    /// Override the pause after the last task, in milliseconds
    #[arg(long)]
    pub grace_ms: Option<u64>,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut session = config.session.clone();
    if let Some(tick_ms) = args.tick_ms {
        if tick_ms == 0 {
            return Err("--tick-ms must be greater than zero".into());
        }
        session.tick_interval_ms = tick_ms;
    }
    if let Some(grace_ms) = args.grace_ms {
        session.grace_delay_ms = grace_ms;
    }

    let plan = Plan::load(&args.plan)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_session(plan, session, config.display, args.json))
}

async fn run_session(
    plan: Plan,
    session: SessionConfig,
    display: DisplayConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let runner = SessionRunner::new(&session)?;
    let mut events = runner.events();
    runner.populate(&plan.task_records())?;
    runner.start()?;
    debug!(plan = %plan.name, "session running");

    if !json {
        println!("{}", plan.name);
        render_active(&runner.snapshot(), &display);
    }

    let mut refresh = tokio::time::interval(Duration::from_millis(display.refresh_interval_ms.max(1)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                runner.stop();
            }
            event = events.recv() => match event {
                Ok(event) => {
                    let stopped = matches!(event, SessionEvent::SessionStopped { .. });
                    if json {
                        println!("{}", serde_json::to_string(&event)?);
                    } else {
                        render_event(&event, &runner.snapshot(), &display);
                    }
                    if stopped {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "event receiver lagged"),
                Err(RecvError::Closed) => break,
            },
            _ = refresh.tick(), if !json => render_status(&runner.snapshot()),
        }
    }

    if json {
        println!("{}", serde_json::to_string(&runner.snapshot())?);
    }
    Ok(())
}

fn render_status(snapshot: &SessionSnapshot) {
    let Some(item) = snapshot.active_item() else {
        return;
    };
    let position = snapshot.completed_count() + 1;
    print!(
        "\r  [{}/{}] {}  {}  total {}   ",
        position,
        snapshot.items.len(),
        item.title,
        format_clock(item.remaining_ms),
        format_clock(snapshot.total_remaining_ms)
    );
    let _ = std::io::stdout().flush();
}

fn render_active(snapshot: &SessionSnapshot, display: &DisplayConfig) {
    if let Some(item) = snapshot.active_item() {
        let lock = if item.locked { " [locked]" } else { "" };
        println!("\n> {} ({}){}", item.title, format_clock(item.remaining_ms), lock);
        if display.show_notes && !item.note.is_empty() {
            println!("  {}", item.note);
        }
    }
}

fn render_event(event: &SessionEvent, snapshot: &SessionSnapshot, display: &DisplayConfig) {
    match event {
        SessionEvent::ItemAdvanced { .. } => render_active(snapshot, display),
        SessionEvent::SessionDraining { .. } => println!("\nall tasks complete"),
        SessionEvent::SessionStopped { reason, .. } => println!("\nsession stopped ({reason:?})"),
        SessionEvent::SessionPopulated { .. } | SessionEvent::SessionStarted { .. } => {}
    }
}
