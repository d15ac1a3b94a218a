mod battery_monitor;
mod command;
mod flight_state;
mod safety_gate;
mod session;
mod snapshot;
mod state_machine;
mod telemetry_poller;

pub use battery_monitor::{BatteryEvent, BatteryLogEntry, BatteryMonitor, Severity};
pub use command::{Command, TerminalCondition};
pub use flight_state::{ConnectionState, FlightState};
pub use safety_gate::{GateDecision, SafetyGate, SafetyViolation};
pub use session::{CommandResult, SessionController, SessionError};
pub use snapshot::{Position, Snapshot, StatusRecord};
pub use state_machine::{InvalidStateTransition, StateMachine};
pub use telemetry_poller::TelemetryPoller;
