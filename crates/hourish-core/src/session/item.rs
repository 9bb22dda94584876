use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// A task as supplied by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub title: String,
    #[serde(default)]
    pub note: String,
    /// Allotted time in seconds.
    pub duration_secs: f64,
    #[serde(default)]
    pub locked: bool,
    pub order: i64,
}

impl TaskRecord {
    pub fn new(title: impl Into<String>, duration_secs: f64, order: i64) -> Self {
        Self {
            title: title.into(),
            note: String::new(),
            duration_secs,
            locked: false,
            order,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Duration in whole milliseconds.
    ///
    /// Rejects negative, NaN and infinite values. Saturates at `u64::MAX`.
    pub fn duration_ms(&self) -> Result<u64, SchedulerError> {
        let secs = self.duration_secs;
        if !secs.is_finite() || secs < 0.0 {
            return Err(SchedulerError::InvalidDuration {
                title: self.title.clone(),
                value: secs.to_string(),
            });
        }
        // `as` saturates for floats out of range.
        Ok((secs * 1000.0).round() as u64)
    }
}

/// One task within a running session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionItem {
    pub title: String,
    pub note: String,
    /// Originally allotted time in milliseconds.
    pub total_ms: u64,
    /// Time left in milliseconds. Never negative; only decreases while active.
    pub remaining_ms: u64,
    pub locked: bool,
    pub order: i64,
    pub is_active: bool,
}

impl SessionItem {
    pub(crate) fn from_record(record: &TaskRecord) -> Result<Self, SchedulerError> {
        let total_ms = record.duration_ms()?;
        Ok(Self {
            title: record.title.clone(),
            note: record.note.clone(),
            total_ms,
            remaining_ms: total_ms,
            locked: record.locked,
            order: record.order,
            is_active: false,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.remaining_ms == 0
    }

    /// 0.0 .. 1.0 fraction of the allotted time already used.
    pub fn progress(&self) -> f64 {
        if self.total_ms == 0 {
            return 1.0;
        }
        1.0 - (self.remaining_ms as f64 / self.total_ms as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_converts_to_millis() {
        let record = TaskRecord::new("Stretch", 90.5, 0);
        assert_eq!(record.duration_ms(), Ok(90_500));
    }

    #[test]
    fn negative_and_nan_durations_rejected() {
        for secs in [-1.0, f64::NAN, f64::INFINITY] {
            let record = TaskRecord::new("Bad", secs, 0);
            assert!(matches!(
                record.duration_ms(),
                Err(SchedulerError::InvalidDuration { .. })
            ));
        }
    }

    #[test]
    fn item_starts_full_and_inactive() {
        let record = TaskRecord::new("Read", 10.0, 2).with_note("ch. 4").locked(true);
        let item = SessionItem::from_record(&record).unwrap();
        assert_eq!(item.remaining_ms, 10_000);
        assert_eq!(item.total_ms, 10_000);
        assert!(item.locked);
        assert!(!item.is_active);
        assert!(!item.is_complete());
        assert_eq!(item.progress(), 0.0);
    }

    #[test]
    fn zero_duration_item_is_already_complete() {
        let item = SessionItem::from_record(&TaskRecord::new("Blink", 0.0, 0)).unwrap();
        assert!(item.is_complete());
        assert_eq!(item.progress(), 1.0);
    }
}
