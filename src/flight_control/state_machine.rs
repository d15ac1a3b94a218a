use super::{command::Command, flight_state::FlightState};
use strum_macros::Display;

/// A command was requested from a state that has no edge for it.
#[derive(Debug, Display, Clone, Copy, PartialEq)]
pub enum InvalidStateTransition {
    NoEdge { from: FlightState, command: Command },
}

impl InvalidStateTransition {
    pub fn message(&self) -> String {
        match self {
            InvalidStateTransition::NoEdge { from, command } => {
                format!("Cannot {} from state: {from}", command_verb(command))
            }
        }
    }
}

impl std::error::Error for InvalidStateTransition {}

fn command_verb(command: &Command) -> &'static str {
    match command {
        Command::Connect => "connect",
        Command::Disconnect => "disconnect",
        Command::TakeOff { .. } => "takeoff",
        Command::Land => "land",
        Command::Goto { .. } => "navigate",
        Command::MoveRelative { .. } => "move",
    }
}

/// The transition table of a session.
///
/// Commands move the aircraft into a pending state when acknowledged,
/// telemetry moves it out of that pending state. Nothing here mutates
/// anything: callers apply the returned state under the snapshot lock.
pub struct StateMachine;

impl StateMachine {
    const CONNECT_FROM: &'static [FlightState] = &[FlightState::Disconnected, FlightState::Error];
    const TAKEOFF_FROM: &'static [FlightState] = &[FlightState::Connected, FlightState::Landed];
    const LAND_FROM: &'static [FlightState] = &[FlightState::Hovering, FlightState::Flying];
    const MANEUVER_FROM: &'static [FlightState] = &[FlightState::Hovering];

    /// States from which `command` has a defined edge. `None` means any state.
    pub fn sources(command: &Command) -> Option<&'static [FlightState]> {
        match command {
            Command::Connect => Some(Self::CONNECT_FROM),
            Command::Disconnect => None,
            Command::TakeOff { .. } => Some(Self::TAKEOFF_FROM),
            Command::Land => Some(Self::LAND_FROM),
            Command::Goto { .. } | Command::MoveRelative { .. } => Some(Self::MANEUVER_FROM),
        }
    }

    pub fn accepts(from: FlightState, command: &Command) -> bool {
        Self::sources(command).is_none_or(|s| s.contains(&from))
    }

    /// State the session enters once `command` has been acknowledged.
    pub fn command_edge(
        from: FlightState,
        command: &Command,
    ) -> Result<FlightState, InvalidStateTransition> {
        if !Self::accepts(from, command) {
            return Err(InvalidStateTransition::NoEdge { from, command: *command });
        }
        Ok(match command {
            Command::Connect => FlightState::Connecting,
            Command::Disconnect => FlightState::Disconnected,
            Command::TakeOff { .. } => FlightState::TakingOff,
            Command::Land => FlightState::Landing,
            Command::Goto { .. } | Command::MoveRelative { .. } => FlightState::Flying,
        })
    }

    /// Edge driven by an observed vehicle state. `None` keeps the current state.
    ///
    /// `Emergency` can only be entered this way and is only left by disconnecting.
    pub fn observed_edge(from: FlightState, observed: FlightState) -> Option<FlightState> {
        match (from, observed) {
            (FlightState::Disconnected | FlightState::Connecting | FlightState::Emergency, _) => None,
            (_, FlightState::Emergency) => Some(FlightState::Emergency),
            (FlightState::TakingOff, FlightState::Hovering)
            | (FlightState::Flying, FlightState::Hovering) => Some(FlightState::Hovering),
            (FlightState::Landing, FlightState::Landed) => Some(FlightState::Landed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [FlightState; 10] = [
        FlightState::Disconnected,
        FlightState::Connecting,
        FlightState::Connected,
        FlightState::TakingOff,
        FlightState::Hovering,
        FlightState::Flying,
        FlightState::Landing,
        FlightState::Landed,
        FlightState::Emergency,
        FlightState::Error,
    ];

    #[test]
    fn takeoff_only_from_ground_states() {
        let cmd = Command::TakeOff { altitude: 10.0 };
        for from in ALL {
            let res = StateMachine::command_edge(from, &cmd);
            if matches!(from, FlightState::Connected | FlightState::Landed) {
                assert_eq!(res, Ok(FlightState::TakingOff));
            } else {
                assert_eq!(res, Err(InvalidStateTransition::NoEdge { from, command: cmd }));
            }
        }
    }

    #[test]
    fn maneuvers_require_hovering() {
        let goto = Command::Goto { latitude: 5.76, longitude: -0.22, altitude: 10.0 };
        assert_eq!(StateMachine::command_edge(FlightState::Hovering, &goto), Ok(FlightState::Flying));
        assert!(StateMachine::command_edge(FlightState::Flying, &goto).is_err());
        assert!(StateMachine::command_edge(FlightState::Landed, &goto).is_err());
    }

    #[test]
    fn disconnect_is_accepted_from_everywhere() {
        for from in ALL {
            assert_eq!(
                StateMachine::command_edge(from, &Command::Disconnect),
                Ok(FlightState::Disconnected)
            );
        }
    }

    #[test]
    fn land_is_rejected_on_the_ground() {
        let err = StateMachine::command_edge(FlightState::Landed, &Command::Land).unwrap_err();
        assert_eq!(err.message(), "Cannot land from state: landed");
    }

    #[test]
    fn telemetry_completes_pending_states_only() {
        use FlightState::*;
        assert_eq!(StateMachine::observed_edge(TakingOff, Hovering), Some(Hovering));
        assert_eq!(StateMachine::observed_edge(Landing, Landed), Some(Landed));
        assert_eq!(StateMachine::observed_edge(Flying, Hovering), Some(Hovering));
        assert_eq!(StateMachine::observed_edge(Connected, Landed), None);
        assert_eq!(StateMachine::observed_edge(Hovering, Landed), None);
        assert_eq!(StateMachine::observed_edge(Error, Hovering), None);
    }

    #[test]
    fn emergency_is_sticky_until_disconnect() {
        use FlightState::*;
        assert_eq!(StateMachine::observed_edge(Hovering, Emergency), Some(Emergency));
        assert_eq!(StateMachine::observed_edge(Emergency, Landed), None);
        assert_eq!(StateMachine::observed_edge(Disconnected, Emergency), None);
        for cmd in [Command::Land, Command::TakeOff { altitude: 5.0 }, Command::Connect] {
            assert!(StateMachine::command_edge(Emergency, &cmd).is_err());
        }
        assert_eq!(StateMachine::command_edge(Emergency, &Command::Disconnect), Ok(Disconnected));
    }
}
