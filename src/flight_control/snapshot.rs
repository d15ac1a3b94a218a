use super::flight_state::{ConnectionState, FlightState};
use crate::config::ConnectionMode;
use chrono::{DateTime, Utc};

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    /// Ashesi University campus, where the simulated aircraft starts.
    pub const HOME: Position = Position { latitude: 5.7597, longitude: -0.2199 };
    const METERS_PER_DEG_LAT: f64 = 111_320.0;

    pub fn new(latitude: f64, longitude: f64) -> Self { Self { latitude, longitude } }

    /// Flat-earth distance in metres, good enough over a few kilometres.
    pub fn distance_m(&self, other: &Position) -> f64 {
        let d_north = (other.latitude - self.latitude) * Self::METERS_PER_DEG_LAT;
        let d_east = (other.longitude - self.longitude)
            * Self::METERS_PER_DEG_LAT
            * self.latitude.to_radians().cos();
        d_north.hypot(d_east)
    }

    /// Moves the position by the given north/east offsets in metres.
    pub fn offset_m(&self, north: f64, east: f64) -> Position {
        let lat = self.latitude + north / Self::METERS_PER_DEG_LAT;
        let cos_lat = self.latitude.to_radians().cos().max(1e-6);
        let lon = self.longitude + east / (Self::METERS_PER_DEG_LAT * cos_lat);
        Position::new(lat, lon)
    }
}

/// Point-in-time view of a session. Always handed out as a copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub(crate) connection_state: ConnectionState,
    pub(crate) flight_state: FlightState,
    /// Starts at 100 and stays there until the vehicle reports a level.
    pub(crate) battery_percent: f64,
    pub(crate) altitude_m: f64,
    pub(crate) position: Position,
    pub(crate) speed_mps: f64,
    pub(crate) connection_mode: ConnectionMode,
    pub(crate) message: String,
    pub(crate) last_updated: DateTime<Utc>,
    /// Bumped on every command-driven state write. Telemetry sampled under an
    /// older epoch may not move `flight_state`.
    pub(crate) command_epoch: u64,
    /// Set once fresh telemetry reports `flying` for the current maneuver.
    pub(crate) maneuver_seen: bool,
    pub(crate) telemetry_cycles: u64,
}

impl Snapshot {
    pub fn new(connection_mode: ConnectionMode) -> Self {
        Self {
            connection_state: ConnectionState::Disconnected,
            flight_state: FlightState::Disconnected,
            battery_percent: 100.0,
            altitude_m: 0.0,
            position: Position::HOME,
            speed_mps: 0.0,
            connection_mode,
            message: "Drone not connected".to_string(),
            last_updated: Utc::now(),
            command_epoch: 0,
            maneuver_seen: false,
            telemetry_cycles: 0,
        }
    }

    pub fn connection_state(&self) -> ConnectionState { self.connection_state }
    pub fn flight_state(&self) -> FlightState { self.flight_state }
    pub fn battery_percent(&self) -> f64 { self.battery_percent }
    pub fn altitude_m(&self) -> f64 { self.altitude_m }
    pub fn position(&self) -> Position { self.position }
    pub fn speed_mps(&self) -> f64 { self.speed_mps }
    pub fn connection_mode(&self) -> ConnectionMode { self.connection_mode }
    pub fn message(&self) -> &str { &self.message }
    pub fn last_updated(&self) -> DateTime<Utc> { self.last_updated }
    pub fn telemetry_cycles(&self) -> u64 { self.telemetry_cycles }

    pub fn is_connected(&self) -> bool { self.connection_state == ConnectionState::Connected }

    /// Records a command-driven flight state change.
    pub(crate) fn command_state(&mut self, state: FlightState, message: impl Into<String>) {
        self.flight_state = state;
        self.message = message.into();
        self.command_epoch += 1;
        self.maneuver_seen = false;
        self.touch(Utc::now());
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_updated {
            self.last_updated = now;
        }
    }

    /// Flattened, serializable form handed to the HTTP and CLI layers.
    pub fn status_record(&self) -> StatusRecord {
        StatusRecord {
            connection_state: self.connection_state,
            flight_state: self.flight_state,
            battery_percent: (self.battery_percent * 10.0).round() / 10.0,
            altitude_meters: (self.altitude_m * 100.0).round() / 100.0,
            latitude: self.position.latitude,
            longitude: self.position.longitude,
            speed_mps: (self.speed_mps * 100.0).round() / 100.0,
            connection_mode: self.connection_mode,
            last_updated: self.last_updated,
            message: self.message.clone(),
        }
    }
}

/// Read-only status exposed to external collaborators.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StatusRecord {
    pub connection_state: ConnectionState,
    pub flight_state: FlightState,
    pub battery_percent: f64,
    pub altitude_meters: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_mps: f64,
    pub connection_mode: ConnectionMode,
    pub last_updated: DateTime<Utc>,
    pub message: String,
}
