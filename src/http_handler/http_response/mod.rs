pub mod command_ack;
pub mod response_common;
pub mod vehicle_state;
