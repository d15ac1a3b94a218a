#![allow(clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
//! Ground-station session management for a single remotely piloted aircraft.
//!
//! A [`SessionController`] owns one link ([`transport::DroneLink`]), a
//! background [`TelemetryPoller`] and the consistent [`Snapshot`] both of them
//! feed. Flight commands pass argument validation, the [`SafetyGate`] and the
//! [`StateMachine`] before anything reaches the aircraft.

mod logger;

pub mod config;
pub mod flight_control;
pub mod http_handler;
pub mod transport;

pub use config::{ConnectionMode, SafetyThresholds, SessionConfig};
pub use flight_control::{
    CommandResult, FlightState, SafetyGate, SessionController, SessionError, Snapshot, StateMachine,
    StatusRecord, TelemetryPoller,
};
