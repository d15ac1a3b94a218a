use super::{Ack, TelemetryKind, TelemetryValue, Transport, TransportError};
use crate::flight_control::{Command, FlightState, Position};
use crate::{event, info};
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

/// Physical state of the simulated aircraft.
#[derive(Debug, Clone)]
struct SimState {
    connected: bool,
    /// `None` until the first flight command, like a vehicle that has not reported yet.
    flying_state: Option<FlightState>,
    altitude_m: f64,
    battery_percent: f64,
    position: Position,
    heading_deg: f64,
    speed_mps: f64,
}

impl SimState {
    fn drain(&mut self, percent: f64) {
        self.battery_percent = (self.battery_percent - percent).clamp(0.0, 100.0);
    }
}

/// Where a maneuver is heading.
#[derive(Debug, Clone, Copy)]
struct ManeuverTarget {
    position: Position,
    altitude_m: f64,
}

/// Deterministic stand-in for the aircraft.
///
/// Every flight command replaces a background tick task that walks altitude,
/// position and battery in fixed steps until the target is reached.
pub struct SimulationEngine {
    state: Arc<Mutex<SimState>>,
    ticker: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl SimulationEngine {
    pub const TICK: Duration = Duration::from_millis(500);
    pub const INITIAL_BATTERY: f64 = 87.0;
    const ASCENT_STEP_M: f64 = 1.0;
    const ASCENT_DRAIN: f64 = 0.1;
    const DESCENT_STEP_M: f64 = 1.5;
    const DESCENT_DRAIN: f64 = 0.05;
    const CRUISE_STEP_M: f64 = 5.0;
    const CLIMB_STEP_M: f64 = 1.0;
    const CRUISE_DRAIN: f64 = 0.08;

    pub fn new() -> Self { Self::with_battery(Self::INITIAL_BATTERY) }

    pub fn with_battery(battery_percent: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                connected: false,
                flying_state: None,
                altitude_m: 0.0,
                battery_percent: battery_percent.clamp(0.0, 100.0),
                position: Position::HOME,
                heading_deg: 0.0,
                speed_mps: 0.0,
            })),
            ticker: Mutex::new(None),
        }
    }

    pub async fn battery_percent(&self) -> f64 { self.state.lock().await.battery_percent }

    pub async fn altitude_m(&self) -> f64 { self.state.lock().await.altitude_m }

    pub async fn set_battery(&self, battery_percent: f64) {
        self.state.lock().await.battery_percent = battery_percent.clamp(0.0, 100.0);
    }

    /// Injects an external fault: the vehicle reports `emergency` and stops maneuvering.
    pub async fn trigger_emergency(&self) {
        self.stop_ticker().await;
        let mut state = self.state.lock().await;
        state.flying_state = Some(FlightState::Emergency);
        state.speed_mps = 0.0;
    }

    /// Cancels the running tick task and waits until it has returned.
    async fn stop_ticker(&self) {
        let running = self.ticker.lock().await.take();
        if let Some((c_tok, handle)) = running {
            c_tok.cancel();
            handle.await.ok();
        }
    }

    async fn start_ticker<F>(&self, mut step: F)
    where F: FnMut(&mut SimState) -> bool + Send + 'static {
        let c_tok = CancellationToken::new();
        let c_tok_clone = c_tok.clone();
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = c_tok_clone.cancelled() => return,
                    () = tokio::time::sleep(Self::TICK) => {}
                }
                let mut locked = state.lock().await;
                if c_tok_clone.is_cancelled() || !locked.connected {
                    return;
                }
                if step(&mut locked) {
                    return;
                }
            }
        });
        *self.ticker.lock().await = Some((c_tok, handle));
    }

    async fn begin_takeoff(&self, target_m: f64) {
        {
            let mut state = self.state.lock().await;
            state.flying_state = Some(FlightState::TakingOff);
            if state.altitude_m >= target_m {
                state.flying_state = Some(FlightState::Hovering);
                return;
            }
        }
        self.start_ticker(move |s| {
            s.altitude_m = (s.altitude_m + Self::ASCENT_STEP_M).min(target_m);
            s.drain(Self::ASCENT_DRAIN);
            event!("SIM ascending: {:.1}m, battery {:.2}%", s.altitude_m, s.battery_percent);
            if s.altitude_m >= target_m {
                s.flying_state = Some(FlightState::Hovering);
                return true;
            }
            false
        })
        .await;
    }

    async fn begin_landing(&self) {
        {
            let mut state = self.state.lock().await;
            state.flying_state = Some(FlightState::Landing);
            state.speed_mps = 0.0;
            if state.altitude_m <= 0.0 {
                state.flying_state = Some(FlightState::Landed);
                return;
            }
        }
        self.start_ticker(|s| {
            s.altitude_m = (s.altitude_m - Self::DESCENT_STEP_M).max(0.0);
            s.drain(Self::DESCENT_DRAIN);
            event!("SIM descending: {:.1}m, battery {:.2}%", s.altitude_m, s.battery_percent);
            if s.altitude_m <= 0.0 {
                s.altitude_m = 0.0;
                s.flying_state = Some(FlightState::Landed);
                return true;
            }
            false
        })
        .await;
    }

    #[allow(clippy::float_cmp)]
    async fn begin_maneuver(&self, target: ManeuverTarget) {
        self.state.lock().await.flying_state = Some(FlightState::Flying);
        let cruise_speed = Self::CRUISE_STEP_M / Self::TICK.as_secs_f64();
        let mut arrived = false;
        self.start_ticker(move |s| {
            // One settling tick at the target before reporting hovering.
            if arrived {
                s.flying_state = Some(FlightState::Hovering);
                return true;
            }
            let remaining = s.position.distance_m(&target.position);
            if remaining <= Self::CRUISE_STEP_M {
                s.position = target.position;
            } else {
                let frac = Self::CRUISE_STEP_M / remaining;
                s.position = Position::new(
                    s.position.latitude + (target.position.latitude - s.position.latitude) * frac,
                    s.position.longitude + (target.position.longitude - s.position.longitude) * frac,
                );
            }
            let climb = target.altitude_m - s.altitude_m;
            if climb.abs() <= Self::CLIMB_STEP_M {
                s.altitude_m = target.altitude_m;
            } else {
                s.altitude_m += Self::CLIMB_STEP_M.copysign(climb);
            }
            s.drain(Self::CRUISE_DRAIN);
            arrived = s.position == target.position && s.altitude_m == target.altitude_m;
            s.speed_mps = if arrived { 0.0 } else { cruise_speed };
            false
        })
        .await;
    }

    /// Converts a body-frame move into an absolute target, applying the rotation.
    async fn relative_target(&self, forward: f64, right: f64, up: f64, rotation_deg: f64) -> ManeuverTarget {
        let mut state = self.state.lock().await;
        let heading = state.heading_deg.to_radians();
        let north = forward * heading.cos() - right * heading.sin();
        let east = forward * heading.sin() + right * heading.cos();
        state.heading_deg = (state.heading_deg + rotation_deg).rem_euclid(360.0);
        ManeuverTarget {
            position: state.position.offset_m(north, east),
            altitude_m: (state.altitude_m + up).max(0.0),
        }
    }
}

impl Default for SimulationEngine {
    fn default() -> Self { Self::new() }
}

impl Drop for SimulationEngine {
    fn drop(&mut self) {
        if let Some((c_tok, _)) = self.ticker.get_mut().take() {
            c_tok.cancel();
        }
    }
}

#[async_trait]
impl Transport for SimulationEngine {
    fn label(&self) -> &'static str { "Simulation Mode" }

    async fn connect(&self) -> Result<(), TransportError> {
        self.state.lock().await.connected = true;
        info!("Simulated aircraft connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.stop_ticker().await;
        let mut state = self.state.lock().await;
        state.connected = false;
        state.speed_mps = 0.0;
        Ok(())
    }

    async fn issue(&self, command: &Command) -> Result<Ack, TransportError> {
        match command {
            Command::Connect => self.connect().await?,
            Command::Disconnect => self.disconnect().await?,
            _ => {
                if !self.state.lock().await.connected {
                    return Err(TransportError::NotConnected);
                }
                self.stop_ticker().await;
            }
        }
        let message = match *command {
            Command::Connect => "Connected",
            Command::Disconnect => "Disconnected",
            Command::TakeOff { altitude } => {
                self.begin_takeoff(altitude).await;
                "Takeoff initiated"
            }
            Command::Land => {
                self.begin_landing().await;
                "Landing initiated"
            }
            Command::Goto { latitude, longitude, altitude } => {
                let target = ManeuverTarget {
                    position: Position::new(latitude, longitude),
                    altitude_m: altitude,
                };
                self.begin_maneuver(target).await;
                "Navigation initiated"
            }
            Command::MoveRelative { forward, right, up, rotation_deg } => {
                let target = self.relative_target(forward, right, up, rotation_deg).await;
                self.begin_maneuver(target).await;
                "Move initiated"
            }
        };
        Ok(Ack { command: *command, message: message.to_string() })
    }

    async fn read(&self, kind: TelemetryKind) -> Result<Option<TelemetryValue>, TransportError> {
        let state = self.state.lock().await;
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        Ok(match kind {
            TelemetryKind::Battery => Some(TelemetryValue::Battery(state.battery_percent)),
            TelemetryKind::Altitude => Some(TelemetryValue::Altitude(state.altitude_m)),
            TelemetryKind::FlightState => state
                .flying_state
                .map(|s| TelemetryValue::FlightState(<&'static str>::from(s).to_string())),
            TelemetryKind::Position => Some(TelemetryValue::Position(state.position)),
            TelemetryKind::Speed => Some(TelemetryValue::Speed(state.speed_mps)),
        })
    }
}
