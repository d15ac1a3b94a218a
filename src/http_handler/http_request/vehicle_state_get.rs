use super::request_common::{HTTPRequestMethod, HTTPRequestType, NoBodyHTTPRequestType};
use super::vehicle_state::{
    AltitudeResponse, BatteryStateResponse, FlyingStateResponse, PositionResponse, SpeedResponse,
};

macro_rules! state_request {
    ($name:ident, $response:ty, $endpoint:literal) => {
        #[derive(Debug)]
        pub(crate) struct $name {}

        impl NoBodyHTTPRequestType for $name {}

        impl HTTPRequestType for $name {
            type Response = $response;
            fn endpoint(&self) -> &'static str { $endpoint }
            fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Get }
        }
    };
}

state_request!(BatteryStateRequest, BatteryStateResponse, "/state/battery");
state_request!(AltitudeRequest, AltitudeResponse, "/state/altitude");
state_request!(FlyingStateRequest, FlyingStateResponse, "/state/flying");
state_request!(PositionRequest, PositionResponse, "/state/position");
state_request!(SpeedRequest, SpeedResponse, "/state/speed");
