#[derive(serde::Deserialize, Debug)]
pub(crate) struct BatteryStateResponse {
    percent: f64,
}

impl BatteryStateResponse {
    pub(crate) fn percent(&self) -> f64 { self.percent }
}

#[derive(serde::Deserialize, Debug)]
pub(crate) struct AltitudeResponse {
    altitude: f64,
}

impl AltitudeResponse {
    pub(crate) fn altitude(&self) -> f64 { self.altitude }
}

/// Raw flying state, e.g. `"hovering"` or `"takingoff"`.
#[derive(serde::Deserialize, Debug)]
pub(crate) struct FlyingStateResponse {
    state: String,
}

impl FlyingStateResponse {
    pub(crate) fn state(&self) -> &str { self.state.as_str() }
}

#[derive(serde::Deserialize, Debug)]
pub(crate) struct PositionResponse {
    latitude: f64,
    longitude: f64,
}

impl PositionResponse {
    pub(crate) fn latitude(&self) -> f64 { self.latitude }
    pub(crate) fn longitude(&self) -> f64 { self.longitude }
}

/// Velocity in the NED frame, m/s.
#[derive(serde::Deserialize, Debug)]
pub(crate) struct SpeedResponse {
    speed_x: f64,
    speed_y: f64,
}

impl SpeedResponse {
    pub(crate) fn ground_speed(&self) -> f64 { self.speed_x.hypot(self.speed_y) }
}
