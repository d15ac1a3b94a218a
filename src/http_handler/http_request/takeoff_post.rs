use super::command_ack::CommandAckResponse;
use super::request_common::{HTTPRequestMethod, HTTPRequestType, JSONBodyHTTPRequestType};

/// Request type for the /piloting/takeoff endpoint.
#[derive(serde::Serialize, Debug)]
pub(crate) struct TakeOffRequest {
    /// Altitude above take-off point to climb to, in metres.
    pub(crate) altitude: f64,
}

impl JSONBodyHTTPRequestType for TakeOffRequest {
    type Body = TakeOffRequest;
    fn body(&self) -> &Self::Body { self }
}

impl HTTPRequestType for TakeOffRequest {
    type Response = CommandAckResponse;
    fn endpoint(&self) -> &'static str { "/piloting/takeoff" }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Post }
}
