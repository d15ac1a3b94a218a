use super::command_ack::CommandAckResponse;
use super::request_common::{HTTPRequestMethod, HTTPRequestType, NoBodyHTTPRequestType};

#[derive(Debug)]
pub(crate) struct DisconnectRequest {}

impl NoBodyHTTPRequestType for DisconnectRequest {}

impl HTTPRequestType for DisconnectRequest {
    type Response = CommandAckResponse;
    fn endpoint(&self) -> &'static str { "/disconnect" }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Post }
}
