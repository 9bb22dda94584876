mod clock;
mod item;
mod runner;
mod scheduler;

pub use clock::{Clock, ManualClock, MonotonicClock, SystemClock};
pub use item::{SessionItem, TaskRecord};
pub use runner::SessionRunner;
pub use scheduler::{CountdownScheduler, SessionPhase, SessionSnapshot};
