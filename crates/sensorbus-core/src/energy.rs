//! Battery charge accounting.
//!
//! Current measurements are integrated over time into an amp hour counter
//! per battery instance. A counter starts from the last stored energy value
//! for its instance, or from zero when none has been seen.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Charge counter value for one battery instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyReading {
    pub instance: String,
    pub amp_hours: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct Counter {
    amp_hours: f64,
    updated: DateTime<Utc>,
}

/// Integrates current events into amp hours, one counter per instance.
#[derive(Debug, Clone, Default)]
pub struct EnergyAccumulator {
    stored: HashMap<String, f64>,
    counters: HashMap<String, Counter>,
}

impl EnergyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a previously published counter value.
    ///
    /// Only used as the starting point of an instance that is not counting
    /// yet; running counters are not reset.
    pub fn record_energy(&mut self, instance: &str, amp_hours: f64) {
        if !self.counters.contains_key(instance) && amp_hours.is_finite() {
            self.stored.insert(instance.to_string(), amp_hours);
        }
    }

    /// Add `current` amperes flowing since the previous update of
    /// `instance` and return the new counter value.
    ///
    /// The first current for an instance starts its counter at `at`
    /// without adding charge.
    pub fn apply_current(
        &mut self,
        instance: &str,
        current: f64,
        at: DateTime<Utc>,
    ) -> EnergyReading {
        let counter = match self.counters.get_mut(instance) {
            Some(counter) => {
                let hours = (at - counter.updated).num_milliseconds() as f64 / MILLIS_PER_HOUR;
                if current.is_finite() && hours > 0.0 {
                    counter.amp_hours += current * hours;
                }
                counter.updated = counter.updated.max(at);
                *counter
            }
            None => {
                let counter = Counter {
                    amp_hours: self.stored.remove(instance).unwrap_or(0.0),
                    updated: at,
                };
                self.counters.insert(instance.to_string(), counter);
                counter
            }
        };

        EnergyReading {
            instance: instance.to_string(),
            amp_hours: counter.amp_hours,
            timestamp: counter.updated,
        }
    }

    /// Current counter value of `instance`, if it is counting.
    pub fn amp_hours(&self, instance: &str) -> Option<f64> {
        self.counters.get(instance).map(|c| c.amp_hours)
    }
}
