//! Typed access to the vehicle bridge that fronts real hardware.

pub mod common;
pub mod http_client;
pub mod http_request;
pub mod http_response;
