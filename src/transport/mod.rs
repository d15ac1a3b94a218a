//! The link to the aircraft: one capability set, two interchangeable variants.

mod hardware;
#[cfg(test)]
pub(crate) mod mock;
mod simulation;

pub use hardware::HardwareTransport;
pub use simulation::SimulationEngine;

use crate::config::SessionConfig;
use crate::flight_control::{Command, Position};
use crate::http_handler::common::HTTPError;
use async_trait::async_trait;
use strum_macros::{Display, EnumIter};

/// Telemetry channels the poller reads every cycle.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum TelemetryKind {
    Battery,
    Altitude,
    FlightState,
    Position,
    Speed,
}

/// One reading from the vehicle. Flight state stays a raw string here;
/// translating it is the poller's job.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryValue {
    Battery(f64),
    Altitude(f64),
    FlightState(String),
    Position(Position),
    Speed(f64),
}

/// The vehicle accepted a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Ack {
    pub command: Command,
    pub message: String,
}

#[derive(Debug, Display)]
pub enum TransportError {
    ConnectionFailed(String),
    NotConnected,
    Rejected(String),
    Http(HTTPError),
}

impl std::error::Error for TransportError {}

impl From<HTTPError> for TransportError {
    fn from(value: HTTPError) -> Self { TransportError::Http(value) }
}

impl TransportError {
    pub fn message(&self) -> String {
        match self {
            TransportError::ConnectionFailed(msg) => format!("Connection failed: {msg}"),
            TransportError::NotConnected => "Transport not connected".to_string(),
            TransportError::Rejected(msg) => format!("Command rejected: {msg}"),
            TransportError::Http(err) => format!("Link error: {}", err.message()),
        }
    }
}

/// Capability set shared by real hardware and the simulation.
///
/// `issue` returns once the vehicle has accepted the command; waiting for the
/// terminal telemetry condition is done by the session, which watches the
/// snapshot the poller keeps fresh.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short label used in status messages.
    fn label(&self) -> &'static str;
    async fn connect(&self) -> Result<(), TransportError>;
    /// Succeeds silently when already disconnected.
    async fn disconnect(&self) -> Result<(), TransportError>;
    async fn issue(&self, command: &Command) -> Result<Ack, TransportError>;
    /// `Ok(None)` means "not known yet", not a failure.
    async fn read(&self, kind: TelemetryKind) -> Result<Option<TelemetryValue>, TransportError>;
}

/// The closed set of links a session can be built with, chosen once.
pub enum DroneLink {
    Simulated(SimulationEngine),
    Hardware(HardwareTransport),
}

impl DroneLink {
    pub fn from_config(config: &SessionConfig) -> Result<Self, TransportError> {
        if config.simulated() {
            Ok(DroneLink::Simulated(SimulationEngine::new()))
        } else {
            Ok(DroneLink::Hardware(HardwareTransport::new(&config.bridge_url())?))
        }
    }
}

#[async_trait]
impl Transport for DroneLink {
    fn label(&self) -> &'static str {
        match self {
            DroneLink::Simulated(t) => t.label(),
            DroneLink::Hardware(t) => t.label(),
        }
    }

    async fn connect(&self) -> Result<(), TransportError> {
        match self {
            DroneLink::Simulated(t) => t.connect().await,
            DroneLink::Hardware(t) => t.connect().await,
        }
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        match self {
            DroneLink::Simulated(t) => t.disconnect().await,
            DroneLink::Hardware(t) => t.disconnect().await,
        }
    }

    async fn issue(&self, command: &Command) -> Result<Ack, TransportError> {
        match self {
            DroneLink::Simulated(t) => t.issue(command).await,
            DroneLink::Hardware(t) => t.issue(command).await,
        }
    }

    async fn read(&self, kind: TelemetryKind) -> Result<Option<TelemetryValue>, TransportError> {
        match self {
            DroneLink::Simulated(t) => t.read(kind).await,
            DroneLink::Hardware(t) => t.read(kind).await,
        }
    }
}
