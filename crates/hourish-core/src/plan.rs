//! Plan files: a named, ordered list of timed tasks.
//!
//! ```toml
//! name = "Morning"
//!
//! [[tasks]]
//! title = "Stretch"
//! duration_secs = 300
//!
//! [[tasks]]
//! title = "Inbox"
//! note = "only flagged mail"
//! duration_secs = 900
//! locked = true
//! ```
//!
//! Tasks without an explicit `order` take their position in the file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::session::TaskRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTask {
    pub title: String,
    #[serde(default)]
    pub note: String,
    /// Duration in seconds.
    pub duration_secs: f64,
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tasks: Vec<PlanTask>,
}

impl Plan {
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let content = std::fs::read_to_string(path).map_err(|source| PlanError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, PlanError> {
        let plan: Plan = toml::from_str(content)?;
        if plan.name.trim().is_empty() {
            return Err(PlanError::Invalid("plan name is empty".into()));
        }
        Ok(plan)
    }

    /// Records for the scheduler, in file order.
    pub fn task_records(&self) -> Vec<TaskRecord> {
        self.tasks
            .iter()
            .enumerate()
            .map(|(position, task)| TaskRecord {
                title: task.title.clone(),
                note: task.note.clone(),
                duration_secs: task.duration_secs,
                locked: task.locked,
                order: task.order.unwrap_or(position as i64),
            })
            .collect()
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.tasks.iter().map(|t| t.duration_secs.max(0.0)).sum()
    }

    pub fn locked_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.locked).count()
    }
}
