use super::command_ack::CommandAckResponse;
use super::request_common::{HTTPRequestMethod, HTTPRequestType, JSONBodyHTTPRequestType};

/// Request type for the /piloting/move_to endpoint.
#[derive(serde::Serialize, Debug)]
pub(crate) struct MoveToRequest {
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
    /// Altitude in metres.
    pub(crate) altitude: f64,
    /// Heading behaviour while travelling; the ground station never requests one.
    pub(crate) orientation_mode: &'static str,
}

impl MoveToRequest {
    pub(crate) fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self { latitude, longitude, altitude, orientation_mode: "none" }
    }
}

impl JSONBodyHTTPRequestType for MoveToRequest {
    type Body = MoveToRequest;
    fn body(&self) -> &Self::Body { self }
}

impl HTTPRequestType for MoveToRequest {
    type Response = CommandAckResponse;
    fn endpoint(&self) -> &'static str { "/piloting/move_to" }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Post }
}
