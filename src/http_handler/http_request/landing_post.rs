use super::command_ack::CommandAckResponse;
use super::request_common::{HTTPRequestMethod, HTTPRequestType, NoBodyHTTPRequestType};

#[derive(Debug)]
pub(crate) struct LandingRequest {}

impl NoBodyHTTPRequestType for LandingRequest {}

impl HTTPRequestType for LandingRequest {
    type Response = CommandAckResponse;
    fn endpoint(&self) -> &'static str { "/piloting/landing" }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Post }
}
