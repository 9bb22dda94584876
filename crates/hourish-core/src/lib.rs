//! # Hourish Core Library
//!
//! Runs a plan of timed tasks as a live countdown session: exactly one task
//! counts down at a time, and when it reaches zero the next task by order
//! takes over until the plan is done.
//!
//! ## Architecture
//!
//! - **Countdown Scheduler**: A wall-clock-delta state machine. The caller
//!   (or the runner) invokes `tick()` periodically
//! - **Session Runner**: Tokio clock driver with cancellation and
//!   snapshot/event channels for observers
//! - **Plans**: TOML task lists feeding the scheduler
//! - **Config**: TOML-based timing and display configuration
//!
//! ## Key Components
//!
//! - [`CountdownScheduler`]: Core session state machine
//! - [`SessionRunner`]: Background clock driver
//! - [`Plan`]: Plan file loading
//! - [`Config`]: Application configuration management

pub mod config;
pub mod error;
pub mod events;
pub mod plan;
pub mod session;

pub use config::{Config, DisplayConfig, SessionConfig};
pub use error::{ConfigError, CoreError, PlanError, SchedulerError};
pub use events::{SessionEvent, StopReason};
pub use plan::{Plan, PlanTask};
pub use session::{
    Clock, CountdownScheduler, ManualClock, MonotonicClock, SessionItem, SessionPhase,
    SessionRunner, SessionSnapshot, SystemClock, TaskRecord,
};
