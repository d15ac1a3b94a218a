use strum_macros::Display;

/// Flight phase of the aircraft as tracked by the session.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FlightState {
    Disconnected,
    Connecting,
    Connected,
    TakingOff,
    Hovering,
    Flying,
    Landing,
    Landed,
    Emergency,
    Error,
}

impl FlightState {
    /// Translates a raw flying-state string reported by the vehicle.
    ///
    /// Returns `None` for anything unknown so that callers keep the prior
    /// state instead of storing an invalid one.
    pub fn from_telemetry(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "landed" => Some(FlightState::Landed),
            "takingoff" | "taking_off" => Some(FlightState::TakingOff),
            "hovering" => Some(FlightState::Hovering),
            "flying" => Some(FlightState::Flying),
            "landing" => Some(FlightState::Landing),
            "emergency" | "emergency_landing" => Some(FlightState::Emergency),
            _ => None,
        }
    }

    pub fn is_airborne(self) -> bool {
        matches!(
            self,
            FlightState::TakingOff | FlightState::Hovering | FlightState::Flying | FlightState::Landing
        )
    }
}

impl From<FlightState> for &'static str {
    fn from(value: FlightState) -> Self {
        match value {
            FlightState::Disconnected => "disconnected",
            FlightState::Connecting => "connecting",
            FlightState::Connected => "connected",
            FlightState::TakingOff => "takingoff",
            FlightState::Hovering => "hovering",
            FlightState::Flying => "flying",
            FlightState::Landing => "landing",
            FlightState::Landed => "landed",
            FlightState::Emergency => "emergency",
            FlightState::Error => "error",
        }
    }
}

/// State of the link itself, independent of what the aircraft is doing.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telemetry_strings_round_trip_for_vehicle_states() {
        for state in [
            FlightState::Landed,
            FlightState::TakingOff,
            FlightState::Hovering,
            FlightState::Flying,
            FlightState::Landing,
            FlightState::Emergency,
        ] {
            let raw: &'static str = state.into();
            assert_eq!(FlightState::from_telemetry(raw), Some(state));
        }
    }

    #[test]
    fn unknown_telemetry_strings_are_not_translated() {
        assert_eq!(FlightState::from_telemetry("motor_ramping"), None);
        assert_eq!(FlightState::from_telemetry(""), None);
        assert_eq!(FlightState::from_telemetry("connected"), None);
        assert_eq!(FlightState::from_telemetry(" Hovering "), Some(FlightState::Hovering));
    }
}
