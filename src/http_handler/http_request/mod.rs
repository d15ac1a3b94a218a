use super::http_response::{command_ack, vehicle_state};

pub mod connect_post;
pub mod disconnect_post;
pub mod landing_post;
pub mod move_by_post;
pub mod move_to_post;
pub mod request_common;
pub mod takeoff_post;
pub mod vehicle_state_get;
