use super::{
    battery_monitor::{BatteryLogEntry, BatteryMonitor},
    command::Command,
    flight_state::{ConnectionState, FlightState},
    safety_gate::{GateDecision, SafetyGate, SafetyViolation},
    snapshot::{Snapshot, StatusRecord},
    state_machine::{InvalidStateTransition, StateMachine},
    telemetry_poller::{self, TelemetryPoller},
};
use crate::config::SessionConfig;
use crate::transport::{DroneLink, Transport, TransportError};
use crate::{error, info, warn};
use std::{sync::Arc, time::Duration};
use strum_macros::Display;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;

/// Why a session operation did not complete.
#[derive(Debug, Display)]
pub enum SessionError {
    NoRuntime,
    AlreadyConnected,
    CommandInProgress,
    InvalidArgument(String),
    Safety(SafetyViolation),
    Transition(InvalidStateTransition),
    Connection(TransportError),
    Command(TransportError),
    Emergency,
    Timeout { command: Command, after: Duration },
    Interrupted,
}

impl std::error::Error for SessionError {}

impl From<SafetyViolation> for SessionError {
    fn from(value: SafetyViolation) -> Self { SessionError::Safety(value) }
}

impl From<InvalidStateTransition> for SessionError {
    fn from(value: InvalidStateTransition) -> Self { SessionError::Transition(value) }
}

impl SessionError {
    pub fn message(&self) -> String {
        match self {
            SessionError::NoRuntime => "No async runtime to run telemetry polling on".to_string(),
            SessionError::AlreadyConnected => "Already connected".to_string(),
            SessionError::CommandInProgress => "Another command is still in progress".to_string(),
            SessionError::InvalidArgument(msg) => format!("Invalid argument: {msg}"),
            SessionError::Safety(violation) => violation.message(),
            SessionError::Transition(transition) => transition.message(),
            SessionError::Connection(err) => err.message(),
            SessionError::Command(err) => format!("Command failed: {}", err.message()),
            SessionError::Emergency => "Vehicle reported an emergency".to_string(),
            SessionError::Timeout { command, after } => {
                format!("{command} timed out after {}s", after.as_secs())
            }
            SessionError::Interrupted => "Interrupted by disconnect".to_string(),
        }
    }
}

/// Outcome of a session command, always paired with the state it left behind.
#[derive(Debug)]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    pub snapshot: Snapshot,
    pub error: Option<SessionError>,
}

impl CommandResult {
    fn succeeded(message: String, snapshot: Snapshot) -> Self {
        Self { success: true, message, snapshot, error: None }
    }

    fn failed(err: SessionError, snapshot: Snapshot) -> Self {
        Self { success: false, message: err.message(), snapshot, error: Some(err) }
    }
}

/// One managed connection to one aircraft.
///
/// Commands are serialized: a second command arriving while one is in flight
/// is refused with [`SessionError::CommandInProgress`]. `disconnect` is the
/// exception; it interrupts whatever is running and always succeeds.
pub struct SessionController {
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    snapshot: Arc<watch::Sender<Snapshot>>,
    gate: SafetyGate,
    battery: Arc<BatteryMonitor>,
    poller: Mutex<Option<TelemetryPoller>>,
    command_lock: Mutex<()>,
    /// Cancelled by `disconnect`; commands check it before every write.
    abort: Mutex<CancellationToken>,
}

impl SessionController {
    pub fn new(config: SessionConfig, transport: Arc<dyn Transport>) -> Result<Self, SessionError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(SessionError::NoRuntime);
        }
        Ok(Self {
            snapshot: Arc::new(watch::Sender::new(Snapshot::new(config.connection_mode))),
            gate: SafetyGate::new(config.thresholds),
            battery: Arc::new(BatteryMonitor::new(config.thresholds)),
            poller: Mutex::new(None),
            command_lock: Mutex::new(()),
            abort: Mutex::new(CancellationToken::new()),
            transport,
            config,
        })
    }

    /// Builds the session with the link its configuration asks for.
    pub fn from_config(config: SessionConfig) -> Result<Self, SessionError> {
        let link = DroneLink::from_config(&config).map_err(SessionError::Connection)?;
        Self::new(config, Arc::new(link))
    }

    pub fn config(&self) -> &SessionConfig { &self.config }

    /// Copy of the current snapshot. Never waits on the transport.
    pub fn get_status(&self) -> Snapshot { self.snapshot.borrow().clone() }

    pub fn status_record(&self) -> StatusRecord { self.snapshot.borrow().status_record() }

    /// Change feed of the snapshot, for callers that stream status.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> { self.snapshot.subscribe() }

    /// Last known battery level, `None` while not connected.
    pub fn get_battery_level(&self) -> Option<f64> {
        let snap = self.snapshot.borrow();
        snap.is_connected().then_some(snap.battery_percent)
    }

    pub async fn battery_history(&self, limit: usize) -> Vec<BatteryLogEntry> {
        self.battery.history(limit).await
    }

    pub async fn is_polling(&self) -> bool {
        self.poller.lock().await.as_ref().is_some_and(TelemetryPoller::is_running)
    }

    pub async fn connect(&self) -> CommandResult {
        let Ok(_guard) = self.command_lock.try_lock() else {
            return self.reject(SessionError::CommandInProgress);
        };
        let abort = self.abort.lock().await.clone();

        let mut refused = None;
        let started = self.write(&abort, |s| {
            if s.is_connected() {
                refused = Some(SessionError::AlreadyConnected);
                return;
            }
            match StateMachine::command_edge(s.flight_state, &Command::Connect) {
                Ok(next) => {
                    s.connection_state = ConnectionState::Connecting;
                    s.command_state(next, format!("Connecting to {}...", s.connection_mode.host()));
                }
                Err(e) => refused = Some(e.into()),
            }
        });
        if let Some(err) = refused {
            warn!("Connect refused: {}", err.message());
            return self.reject(err);
        }
        if !started {
            return self.reject(SessionError::Interrupted);
        }

        let label = self.transport.label();
        info!("Connecting to drone ({label}) at {}", self.config.connection_mode.host());
        if let Err(e) = self.transport.connect().await {
            error!("Connection failed: {}", e.message());
            self.write(&abort, |s| {
                s.connection_state = ConnectionState::Failed;
                s.command_state(FlightState::Error, e.message());
            });
            return self.reject(SessionError::Connection(e));
        }
        if abort.is_cancelled() {
            if let Err(e) = self.transport.disconnect().await {
                warn!("Dropping interrupted link failed: {}", e.message());
            }
            return self.reject(SessionError::Interrupted);
        }

        let message = format!("Connected ({label})");
        self.write(&abort, |s| {
            s.connection_state = ConnectionState::Connected;
            s.command_state(FlightState::Connected, message.clone());
        });
        telemetry_poller::refresh(&*self.transport, &self.snapshot, &abort).await;
        self.start_poller(&abort).await;
        if abort.is_cancelled() {
            warn!("Disconnected before the first telemetry cycle completed");
            return self.reject(SessionError::Interrupted);
        }
        info!("{message}");
        CommandResult::succeeded(message, self.get_status())
    }

    /// Stops the poller, drops the link and forces `Disconnected`.
    ///
    /// Any command still waiting for telemetry returns `Interrupted`.
    pub async fn disconnect(&self) -> CommandResult {
        let abort = self.abort.lock().await.clone();
        abort.cancel();

        if let Some(poller) = self.poller.lock().await.take() {
            poller.stop().await;
        }
        let was = self.snapshot.borrow().flight_state;
        if was.is_airborne() {
            warn!("Disconnecting while {was}, the vehicle is left to its own failsafe");
        }
        if let Err(e) = self.transport.disconnect().await {
            warn!("Transport disconnect failed: {}", e.message());
        }
        self.snapshot.send_modify(|s| {
            s.connection_state = ConnectionState::Disconnected;
            s.speed_mps = 0.0;
            s.command_state(FlightState::Disconnected, "Disconnected");
        });
        *self.abort.lock().await = CancellationToken::new();
        info!("Disconnected from drone");
        CommandResult::succeeded("Disconnected".to_string(), self.get_status())
    }

    pub async fn takeoff(&self, altitude: Option<f64>) -> CommandResult {
        let altitude = altitude.unwrap_or(Command::DEFAULT_TAKEOFF_ALTITUDE);
        self.execute(Command::TakeOff { altitude }).await
    }

    pub async fn land(&self) -> CommandResult { self.execute(Command::Land).await }

    pub async fn goto(&self, latitude: f64, longitude: f64, altitude: Option<f64>) -> CommandResult {
        let altitude = altitude.unwrap_or(Command::DEFAULT_GOTO_ALTITUDE);
        self.execute(Command::Goto { latitude, longitude, altitude }).await
    }

    pub async fn move_relative(
        &self,
        forward: f64,
        right: f64,
        up: f64,
        rotation_deg: Option<f64>,
    ) -> CommandResult {
        let rotation_deg = rotation_deg.unwrap_or(0.0);
        self.execute(Command::MoveRelative { forward, right, up, rotation_deg }).await
    }

    /// Validation, safety gate, optimistic transition, issue, then wait for
    /// the terminal telemetry condition.
    async fn execute(&self, command: Command) -> CommandResult {
        if let Err(msg) = command.validate_args() {
            return self.reject(SessionError::InvalidArgument(msg));
        }
        let Ok(_guard) = self.command_lock.try_lock() else {
            return self.reject(SessionError::CommandInProgress);
        };
        let abort = self.abort.lock().await.clone();

        let before = self.get_status();
        let decision = self.gate.evaluate(&before, &command);
        if command.is_flight_affecting() {
            self.battery.record_decision(before.battery_percent, &decision).await;
        }
        let low_battery = match decision {
            GateDecision::Deny(violation) => {
                warn!("{command} blocked: {}", violation.message());
                return self.reject(violation.into());
            }
            GateDecision::AllowLowBattery { current, .. } => Some(current),
            GateDecision::Allow => None,
        };

        let mut edge = Err(InvalidStateTransition::NoEdge { from: before.flight_state, command });
        let recorded = self.write(&abort, |s| {
            edge = StateMachine::command_edge(s.flight_state, &command);
            if let Ok(next) = edge {
                s.command_state(next, pending_message(&command));
            }
        });
        if !recorded {
            return self.reject(SessionError::Interrupted);
        }
        let pending = match edge {
            Ok(next) => next,
            Err(e) => {
                warn!("{}", e.message());
                return self.reject(e.into());
            }
        };
        info!("{command}: {} -> {pending}", before.flight_state);

        let issued = tokio::select! {
            () = abort.cancelled() => return self.reject(SessionError::Interrupted),
            res = self.transport.issue(&command) => res,
        };
        let ack = match issued {
            Ok(ack) => ack,
            Err(e) => {
                error!("{command} failed: {}", e.message());
                self.fail(&abort, format!("{command} failed: {}", e.message()));
                return self.reject(SessionError::Command(e));
            }
        };
        // Only telemetry sampled after the acknowledgement may settle the command.
        self.write(&abort, |s| {
            if s.flight_state != FlightState::Emergency {
                s.command_state(pending, ack.message.clone());
            }
        });

        let condition = command.terminal_condition();
        let limit = command.timeout(&self.config.timeouts);
        let mut rx = self.snapshot.subscribe();
        let waited = tokio::select! {
            () = abort.cancelled() => return self.reject(SessionError::Interrupted),
            res = tokio::time::timeout(limit, rx.wait_for(|s| {
                s.flight_state == FlightState::Emergency || condition.is_none_or(|c| c.satisfied_by(s))
            })) => res.map(|r| r.map(|snap| snap.flight_state)),
        };

        match waited {
            Ok(Ok(FlightState::Emergency)) => {
                error!("{command} aborted: vehicle reported an emergency");
                self.reject(SessionError::Emergency)
            }
            Ok(Ok(_)) => {
                let message = match low_battery {
                    Some(battery) => format!("{} (low battery: {battery:.1}%)", success_message(&command)),
                    None => success_message(&command),
                };
                self.write(&abort, |s| {
                    s.message.clone_from(&message);
                    s.touch(chrono::Utc::now());
                });
                info!("{message}");
                CommandResult::succeeded(message, self.get_status())
            }
            Ok(Err(_)) => self.reject(SessionError::Interrupted),
            Err(_) => {
                let err = SessionError::Timeout { command, after: limit };
                error!("{}", err.message());
                self.fail(&abort, err.message());
                self.reject(err)
            }
        }
    }

    /// Applies `update` unless the session was disconnected in the meantime.
    fn write(&self, abort: &CancellationToken, update: impl FnOnce(&mut Snapshot)) -> bool {
        self.snapshot.send_if_modified(|s| {
            if abort.is_cancelled() {
                return false;
            }
            update(s);
            true
        })
    }

    /// Moves to `Error`. An `Emergency` already reported by the vehicle wins.
    fn fail(&self, abort: &CancellationToken, message: String) {
        self.write(abort, |s| {
            if s.flight_state != FlightState::Emergency {
                s.command_state(FlightState::Error, message);
            }
        });
    }

    fn reject(&self, err: SessionError) -> CommandResult { CommandResult::failed(err, self.get_status()) }

    /// Replaces the poller. The previous one has fully stopped before the new one starts.
    async fn start_poller(&self, abort: &CancellationToken) {
        let mut slot = self.poller.lock().await;
        if let Some(old) = slot.take() {
            old.stop().await;
        }
        if abort.is_cancelled() {
            return;
        }
        *slot = Some(TelemetryPoller::start(
            Arc::clone(&self.transport),
            Arc::clone(&self.snapshot),
            Arc::clone(&self.battery),
            self.config.poll_interval,
        ));
    }
}

impl Drop for SessionController {
    fn drop(&mut self) { self.abort.get_mut().cancel(); }
}

fn pending_message(command: &Command) -> String {
    match command {
        Command::TakeOff { altitude } => format!("Taking off to {altitude:.1}m..."),
        Command::Land => "Landing...".to_string(),
        Command::Goto { latitude, longitude, .. } => {
            format!("Navigating to ({latitude:.5}, {longitude:.5})...")
        }
        Command::MoveRelative { .. } => "Moving...".to_string(),
        Command::Connect => "Connecting...".to_string(),
        Command::Disconnect => "Disconnecting...".to_string(),
    }
}

fn success_message(command: &Command) -> String {
    match command {
        Command::TakeOff { altitude } => format!("Takeoff successful - now hovering at {altitude:.1}m"),
        Command::Land => "Landed safely".to_string(),
        Command::Goto { latitude, longitude, .. } => {
            format!("Arrived at ({latitude:.5}, {longitude:.5})")
        }
        Command::MoveRelative { .. } => "Move complete".to_string(),
        Command::Connect => "Connected".to_string(),
        Command::Disconnect => "Disconnected".to_string(),
    }
}
