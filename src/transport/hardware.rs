use super::{Ack, TelemetryKind, TelemetryValue, Transport, TransportError};
use crate::flight_control::{Command, Position};
use crate::http_handler::{
    common::HTTPError,
    http_client::HTTPClient,
    http_request::{
        connect_post::ConnectRequest,
        disconnect_post::DisconnectRequest,
        landing_post::LandingRequest,
        move_by_post::MoveByRequest,
        move_to_post::MoveToRequest,
        takeoff_post::TakeOffRequest,
        vehicle_state_get::{
            AltitudeRequest, BatteryStateRequest, FlyingStateRequest, PositionRequest, SpeedRequest,
        },
    },
    http_response::command_ack::CommandAckResponse,
};
use crate::{info, warn};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

/// Link to a real aircraft through the HTTP vehicle bridge at the mode's address.
#[derive(Debug)]
pub struct HardwareTransport {
    client: HTTPClient,
    connected: AtomicBool,
}

impl HardwareTransport {
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let client = HTTPClient::new(base_url).map_err(HTTPError::from)?;
        Ok(Self { client, connected: AtomicBool::new(false) })
    }

    fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(TransportError::NotConnected)
        }
    }

    fn into_ack(command: &Command, resp: CommandAckResponse) -> Result<Ack, TransportError> {
        if resp.is_success() {
            Ok(Ack { command: *command, message: resp.message().to_string() })
        } else {
            Err(TransportError::Rejected(resp.message().to_string()))
        }
    }
}

/// Turns a bridge 404 into "not known yet".
fn optional<T>(res: Result<T, HTTPError>) -> Result<Option<T>, TransportError> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl Transport for HardwareTransport {
    fn label(&self) -> &'static str { "ANAFI Ai" }

    async fn connect(&self) -> Result<(), TransportError> {
        info!("Connecting to vehicle bridge at {}", self.client.url());
        let resp = self
            .client
            .send_no_body(&ConnectRequest {})
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.message()))?;
        if !resp.is_success() {
            return Err(TransportError::ConnectionFailed(resp.message().to_string()));
        }
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        match self.client.send_no_body(&DisconnectRequest {}).await {
            Ok(resp) if !resp.is_success() => {
                warn!("Bridge refused disconnect: {}", resp.message());
            }
            Ok(_) => {}
            Err(e) => warn!("Disconnect request failed, link dropped locally: {}", e.message()),
        }
        Ok(())
    }

    async fn issue(&self, command: &Command) -> Result<Ack, TransportError> {
        if !matches!(command, Command::Connect | Command::Disconnect) {
            self.ensure_connected()?;
        }
        let resp = match *command {
            Command::Connect => {
                self.connect().await?;
                return Ok(Ack { command: *command, message: "Connected".to_string() });
            }
            Command::Disconnect => {
                self.disconnect().await?;
                return Ok(Ack { command: *command, message: "Disconnected".to_string() });
            }
            Command::TakeOff { altitude } => {
                self.client.send_json(&TakeOffRequest { altitude }).await?
            }
            Command::Land => self.client.send_no_body(&LandingRequest {}).await?,
            Command::Goto { latitude, longitude, altitude } => {
                self.client.send_json(&MoveToRequest::new(latitude, longitude, altitude)).await?
            }
            Command::MoveRelative { forward, right, up, rotation_deg } => {
                let req = MoveByRequest::from_body_frame(forward, right, up, rotation_deg);
                self.client.send_json(&req).await?
            }
        };
        Self::into_ack(command, resp)
    }

    async fn read(&self, kind: TelemetryKind) -> Result<Option<TelemetryValue>, TransportError> {
        self.ensure_connected()?;
        let value = match kind {
            TelemetryKind::Battery => optional(self.client.send_no_body(&BatteryStateRequest {}).await)?
                .map(|r| TelemetryValue::Battery(r.percent())),
            TelemetryKind::Altitude => optional(self.client.send_no_body(&AltitudeRequest {}).await)?
                .map(|r| TelemetryValue::Altitude(r.altitude())),
            TelemetryKind::FlightState => {
                optional(self.client.send_no_body(&FlyingStateRequest {}).await)?
                    .map(|r| TelemetryValue::FlightState(r.state().to_string()))
            }
            TelemetryKind::Position => optional(self.client.send_no_body(&PositionRequest {}).await)?
                .map(|r| TelemetryValue::Position(Position::new(r.latitude(), r.longitude()))),
            TelemetryKind::Speed => optional(self.client.send_no_body(&SpeedRequest {}).await)?
                .map(|r| TelemetryValue::Speed(r.ground_speed())),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconnected_hardware_refuses_reads_and_commands() {
        let hw = HardwareTransport::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(hw.read(TelemetryKind::Battery).await, Err(TransportError::NotConnected)));
        assert!(matches!(hw.issue(&Command::Land).await, Err(TransportError::NotConnected)));
    }

    #[tokio::test]
    async fn disconnect_without_link_is_silent() {
        let hw = HardwareTransport::new("http://127.0.0.1:9").unwrap();
        assert!(hw.disconnect().await.is_ok());
        assert!(hw.disconnect().await.is_ok());
    }
}
