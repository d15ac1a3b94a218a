use super::{Ack, TelemetryKind, TelemetryValue, Transport, TransportError};
use crate::flight_control::Command;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Script {
    connected: bool,
    refuse_connect: bool,
    reject_commands: bool,
    values: HashMap<TelemetryKind, TelemetryValue>,
    failing: HashSet<TelemetryKind>,
    issued: Vec<Command>,
    disconnects: usize,
    read_delay: Option<Duration>,
}

/// Scripted link for tests. Commands are acknowledged but change nothing;
/// telemetry is whatever the test has set.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    script: Mutex<Script>,
}

impl MockTransport {
    pub(crate) fn new() -> Self { Self::default() }

    pub(crate) async fn set(&self, value: TelemetryValue) {
        let kind = match &value {
            TelemetryValue::Battery(_) => TelemetryKind::Battery,
            TelemetryValue::Altitude(_) => TelemetryKind::Altitude,
            TelemetryValue::FlightState(_) => TelemetryKind::FlightState,
            TelemetryValue::Position(_) => TelemetryKind::Position,
            TelemetryValue::Speed(_) => TelemetryKind::Speed,
        };
        self.script.lock().await.values.insert(kind, value);
    }

    pub(crate) async fn set_flight_state(&self, raw: &str) {
        self.set(TelemetryValue::FlightState(raw.to_string())).await;
    }

    pub(crate) async fn fail_reads(&self, kind: TelemetryKind) {
        self.script.lock().await.failing.insert(kind);
    }

    /// Every read answers only after `delay`.
    pub(crate) async fn slow_reads(&self, delay: Duration) { self.script.lock().await.read_delay = Some(delay); }

    pub(crate) async fn refuse_connect(&self) { self.script.lock().await.refuse_connect = true; }

    pub(crate) async fn reject_commands(&self) { self.script.lock().await.reject_commands = true; }

    pub(crate) async fn issued(&self) -> Vec<Command> { self.script.lock().await.issued.clone() }

    pub(crate) async fn disconnects(&self) -> usize { self.script.lock().await.disconnects }
}

#[async_trait]
impl Transport for MockTransport {
    fn label(&self) -> &'static str { "Mock" }

    async fn connect(&self) -> Result<(), TransportError> {
        let mut script = self.script.lock().await;
        if script.refuse_connect {
            return Err(TransportError::ConnectionFailed("no route to vehicle".to_string()));
        }
        script.connected = true;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let mut script = self.script.lock().await;
        script.connected = false;
        script.disconnects += 1;
        Ok(())
    }

    async fn issue(&self, command: &Command) -> Result<Ack, TransportError> {
        let mut script = self.script.lock().await;
        if !script.connected {
            return Err(TransportError::NotConnected);
        }
        script.issued.push(*command);
        if script.reject_commands {
            return Err(TransportError::Rejected("vehicle busy".to_string()));
        }
        Ok(Ack { command: *command, message: "accepted".to_string() })
    }

    async fn read(&self, kind: TelemetryKind) -> Result<Option<TelemetryValue>, TransportError> {
        let delay = self.script.lock().await.read_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let script = self.script.lock().await;
        if !script.connected {
            return Err(TransportError::NotConnected);
        }
        if script.failing.contains(&kind) {
            return Err(TransportError::Rejected(format!("{kind} unavailable")));
        }
        Ok(script.values.get(&kind).cloned())
    }
}
