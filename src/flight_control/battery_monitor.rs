use super::safety_gate::GateDecision;
use crate::config::SafetyThresholds;
use crate::{telem, warn};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use strum_macros::Display;
use tokio::sync::Mutex;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BatteryEvent {
    PreFlightCheck,
    LowBatteryWarning,
    SafetyViolation,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Normal,
    Low,
    Critical,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BatteryLogEntry {
    pub timestamp: DateTime<Utc>,
    pub battery_percent: f64,
    pub event: BatteryEvent,
    pub severity: Severity,
}

/// Bounded in-memory log of battery readings taken at safety-relevant moments.
#[derive(Debug)]
pub struct BatteryMonitor {
    thresholds: SafetyThresholds,
    entries: Mutex<VecDeque<BatteryLogEntry>>,
}

impl BatteryMonitor {
    /// Oldest entries are dropped past this size.
    pub const CAPACITY: usize = 100;

    pub fn new(thresholds: SafetyThresholds) -> Self {
        Self { thresholds, entries: Mutex::new(VecDeque::with_capacity(Self::CAPACITY)) }
    }

    pub fn thresholds(&self) -> &SafetyThresholds { &self.thresholds }

    pub fn severity(&self, battery_percent: f64) -> Severity {
        if battery_percent < self.thresholds.min_battery_for_flight() {
            Severity::Critical
        } else if battery_percent < self.thresholds.low_battery_warning() {
            Severity::Low
        } else {
            Severity::Normal
        }
    }

    pub async fn record(&self, battery_percent: f64, event: BatteryEvent) -> BatteryLogEntry {
        let entry = BatteryLogEntry {
            timestamp: Utc::now(),
            battery_percent,
            event,
            severity: self.severity(battery_percent),
        };
        match entry.severity {
            Severity::Critical => {
                warn!("CRITICAL: battery at {battery_percent:.1}% - flight not permitted");
            }
            Severity::Low => telem!("Battery low at {battery_percent:.1}% ({event})"),
            Severity::Normal => telem!("Battery sufficient at {battery_percent:.1}% ({event})"),
        }
        let mut entries = self.entries.lock().await;
        if entries.len() == Self::CAPACITY {
            entries.pop_front();
        }
        entries.push_back(entry.clone());
        entry
    }

    /// Logs the outcome of a safety gate evaluation.
    pub async fn record_decision(&self, battery_percent: f64, decision: &GateDecision) {
        let event = match decision {
            GateDecision::Allow => BatteryEvent::PreFlightCheck,
            GateDecision::AllowLowBattery { .. } => BatteryEvent::LowBatteryWarning,
            GateDecision::Deny(_) => BatteryEvent::SafetyViolation,
        };
        self.record(battery_percent, event).await;
    }

    /// The newest `limit` entries, oldest first.
    pub async fn history(&self, limit: usize) -> Vec<BatteryLogEntry> {
        let entries = self.entries.lock().await;
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }
}
