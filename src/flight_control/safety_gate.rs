use super::{
    command::Command, flight_state::FlightState, snapshot::Snapshot, state_machine::StateMachine,
};
use crate::config::SafetyThresholds;
use strum_macros::Display;

/// Reason a flight-affecting command was refused before reaching the aircraft.
#[derive(Debug, Display, Clone, Copy, PartialEq)]
pub enum SafetyViolation {
    NotConnected,
    InvalidState(FlightState),
    BatteryTooLow { current: f64, required: f64 },
}

impl SafetyViolation {
    pub fn message(&self) -> String {
        match self {
            SafetyViolation::NotConnected => "Drone not connected".to_string(),
            SafetyViolation::InvalidState(state) => format!("Cannot fly from state: {state}"),
            SafetyViolation::BatteryTooLow { current, required } => {
                format!("Battery too low ({current:.1}%). Minimum: {required:.1}%")
            }
        }
    }
}

impl std::error::Error for SafetyViolation {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Allow,
    /// Allowed, but the battery is under the warning threshold.
    AllowLowBattery { current: f64, threshold: f64 },
    Deny(SafetyViolation),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool { !matches!(self, GateDecision::Deny(_)) }
}

/// Pre-command admission check. Reads a snapshot, never writes one.
#[derive(Debug, Clone, Copy)]
pub struct SafetyGate {
    thresholds: SafetyThresholds,
}

impl SafetyGate {
    pub fn new(thresholds: SafetyThresholds) -> Self { Self { thresholds } }

    pub fn thresholds(&self) -> &SafetyThresholds { &self.thresholds }

    /// First matching rule wins: link, then state, then battery.
    ///
    /// Commands that are not flight-affecting (`Land` in particular) are
    /// always allowed so they stay available as an escape action.
    pub fn evaluate(&self, snapshot: &Snapshot, command: &Command) -> GateDecision {
        if !command.is_flight_affecting() {
            return GateDecision::Allow;
        }
        if !snapshot.is_connected() {
            return GateDecision::Deny(SafetyViolation::NotConnected);
        }
        if !StateMachine::accepts(snapshot.flight_state(), command) {
            return GateDecision::Deny(SafetyViolation::InvalidState(snapshot.flight_state()));
        }
        let current = snapshot.battery_percent();
        if current < self.thresholds.min_battery_for_flight() {
            return GateDecision::Deny(SafetyViolation::BatteryTooLow {
                current,
                required: self.thresholds.min_battery_for_flight(),
            });
        }
        if current < self.thresholds.low_battery_warning() {
            return GateDecision::AllowLowBattery {
                current,
                threshold: self.thresholds.low_battery_warning(),
            };
        }
        GateDecision::Allow
    }
}
