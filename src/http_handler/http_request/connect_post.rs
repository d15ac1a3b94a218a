use super::command_ack::CommandAckResponse;
use super::request_common::{HTTPRequestMethod, HTTPRequestType, NoBodyHTTPRequestType};

/// Asks the bridge to open its session with the vehicle.
#[derive(Debug)]
pub(crate) struct ConnectRequest {}

impl NoBodyHTTPRequestType for ConnectRequest {}

impl HTTPRequestType for ConnectRequest {
    type Response = CommandAckResponse;
    fn endpoint(&self) -> &'static str { "/connect" }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Post }
}
