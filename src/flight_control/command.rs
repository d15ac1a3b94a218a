use super::{
    flight_state::FlightState,
    snapshot::{Position, Snapshot},
};
use crate::config::CommandTimeouts;
use std::time::Duration;
use strum_macros::Display;

/// A primitive request the ground station can send to the aircraft.
#[derive(Debug, Display, Clone, Copy, PartialEq)]
pub enum Command {
    Connect,
    Disconnect,
    TakeOff { altitude: f64 },
    Land,
    Goto { latitude: f64, longitude: f64, altitude: f64 },
    MoveRelative { forward: f64, right: f64, up: f64, rotation_deg: f64 },
}

/// What the telemetry has to show before a command counts as acknowledged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TerminalCondition {
    /// The reported flight state equals the given one.
    Reached(FlightState),
    /// The aircraft left hovering and came back to it, optionally close to a target.
    ///
    /// Only checks for `Hovering`; the poller keeps a maneuver in `Flying`
    /// until the vehicle has reported motion.
    Settled { target: Option<Position> },
}

impl TerminalCondition {
    /// How close a goto has to end to its target, in metres.
    pub const SETTLE_TOLERANCE_M: f64 = 3.0;

    pub fn satisfied_by(&self, snap: &Snapshot) -> bool {
        match self {
            TerminalCondition::Reached(state) => snap.flight_state == *state,
            TerminalCondition::Settled { target } => {
                snap.flight_state == FlightState::Hovering
                    && target.is_none_or(|t| snap.position.distance_m(&t) <= Self::SETTLE_TOLERANCE_M)
            }
        }
    }
}

impl Command {
    pub const DEFAULT_TAKEOFF_ALTITUDE: f64 = 10.0;
    pub const DEFAULT_GOTO_ALTITUDE: f64 = 10.0;
    pub const MAX_ALTITUDE: f64 = 120.0;

    /// Commands that move the aircraft away from where it is and therefore
    /// have to pass the safety gate. `Land` is never gated.
    pub fn is_flight_affecting(&self) -> bool {
        matches!(self, Command::TakeOff { .. } | Command::Goto { .. } | Command::MoveRelative { .. })
    }

    pub fn terminal_condition(&self) -> Option<TerminalCondition> {
        match *self {
            Command::TakeOff { .. } => Some(TerminalCondition::Reached(FlightState::Hovering)),
            Command::Land => Some(TerminalCondition::Reached(FlightState::Landed)),
            Command::Goto { latitude, longitude, .. } => Some(TerminalCondition::Settled {
                target: Some(Position::new(latitude, longitude)),
            }),
            Command::MoveRelative { .. } => Some(TerminalCondition::Settled { target: None }),
            Command::Connect | Command::Disconnect => None,
        }
    }

    pub fn timeout(&self, timeouts: &CommandTimeouts) -> Duration {
        match self {
            Command::TakeOff { .. } => timeouts.takeoff,
            Command::Land => timeouts.land,
            Command::Goto { .. } => timeouts.goto,
            Command::MoveRelative { .. } => timeouts.move_relative,
            Command::Connect | Command::Disconnect => Duration::ZERO,
        }
    }

    /// Checks the numeric arguments. Nothing here looks at session state.
    pub fn validate_args(&self) -> Result<(), String> {
        match *self {
            Command::TakeOff { altitude } => check_altitude(altitude),
            Command::Goto { latitude, longitude, altitude } => {
                if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
                    return Err(format!("Latitude {latitude} outside [-90, 90]"));
                }
                if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
                    return Err(format!("Longitude {longitude} outside [-180, 180]"));
                }
                check_altitude(altitude)
            }
            Command::MoveRelative { forward, right, up, rotation_deg } => {
                if [forward, right, up, rotation_deg].iter().all(|v| v.is_finite()) {
                    Ok(())
                } else {
                    Err("Relative move components must be finite".to_string())
                }
            }
            Command::Connect | Command::Disconnect | Command::Land => Ok(()),
        }
    }
}

fn check_altitude(altitude: f64) -> Result<(), String> {
    if altitude.is_finite() && altitude > 0.0 && altitude <= Command::MAX_ALTITUDE {
        Ok(())
    } else {
        Err(format!("Altitude {altitude}m outside (0, {}]m", Command::MAX_ALTITUDE))
    }
}
