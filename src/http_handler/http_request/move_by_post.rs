use super::command_ack::CommandAckResponse;
use super::request_common::{HTTPRequestMethod, HTTPRequestType, JSONBodyHTTPRequestType};

/// Request type for the /piloting/move_by endpoint.
///
/// The vehicle works in the body frame with `dz` pointing down and `dpsi`
/// in radians.
#[derive(serde::Serialize, Debug)]
pub(crate) struct MoveByRequest {
    pub(crate) dx: f64,
    pub(crate) dy: f64,
    pub(crate) dz: f64,
    pub(crate) dpsi: f64,
}

impl MoveByRequest {
    pub(crate) fn from_body_frame(forward: f64, right: f64, up: f64, rotation_deg: f64) -> Self {
        Self { dx: forward, dy: right, dz: -up, dpsi: rotation_deg.to_radians() }
    }
}

impl JSONBodyHTTPRequestType for MoveByRequest {
    type Body = MoveByRequest;
    fn body(&self) -> &Self::Body { self }
}

impl HTTPRequestType for MoveByRequest {
    type Response = CommandAckResponse;
    fn endpoint(&self) -> &'static str { "/piloting/move_by" }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Post }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_is_converted_to_down_axis() {
        let req = MoveByRequest::from_body_frame(2.0, -1.0, 3.0, 180.0);
        assert!((req.dz + 3.0).abs() < f64::EPSILON);
        assert!((req.dpsi - std::f64::consts::PI).abs() < 1e-12);
        assert!((req.dy + 1.0).abs() < f64::EPSILON);
    }
}
