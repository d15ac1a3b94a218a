use super::{
    battery_monitor::{BatteryEvent, BatteryMonitor},
    flight_state::FlightState,
    snapshot::Snapshot,
    state_machine::StateMachine,
};
use crate::transport::{TelemetryKind, TelemetryValue, Transport};
use crate::{error, event, info, warn};
use chrono::Utc;
use futures::future::join_all;
use std::{sync::Arc, time::Duration};
use strum::IntoEnumIterator;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Handle to the background task that keeps a session's snapshot fresh.
///
/// Dropping the handle cancels the task; `stop` additionally waits for it.
pub struct TelemetryPoller {
    c_tok: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TelemetryPoller {
    pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

    pub fn start(
        transport: Arc<dyn Transport>,
        snapshot: Arc<watch::Sender<Snapshot>>,
        battery: Arc<BatteryMonitor>,
        interval: Duration,
    ) -> Self {
        let c_tok = CancellationToken::new();
        let worker = PollWorker { transport, snapshot, battery, interval, c_tok: c_tok.clone() };
        let handle = tokio::spawn(worker.run());
        info!("Telemetry poller started ({} ms)", interval.as_millis());
        Self { c_tok, handle: Some(handle) }
    }

    pub fn is_running(&self) -> bool { self.handle.as_ref().is_some_and(|h| !h.is_finished()) }

    /// Cancels the task and returns only after it has fully stopped.
    pub async fn stop(mut self) {
        self.c_tok.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!("Telemetry poller ended abnormally: {e}");
            }
        }
        info!("Telemetry poller stopped");
    }
}

impl Drop for TelemetryPoller {
    fn drop(&mut self) { self.c_tok.cancel(); }
}

struct PollWorker {
    transport: Arc<dyn Transport>,
    snapshot: Arc<watch::Sender<Snapshot>>,
    battery: Arc<BatteryMonitor>,
    interval: Duration,
    c_tok: CancellationToken,
}

impl PollWorker {
    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let warning_at = self.battery.thresholds().low_battery_warning();
        let mut last_battery: Option<f64> = None;

        loop {
            tokio::select! {
                () = self.c_tok.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let epoch = self.snapshot.borrow().command_epoch;
            let readings = tokio::select! {
                () = self.c_tok.cancelled() => break,
                r = sample(&*self.transport) => r,
            };

            let merged = self.snapshot.send_if_modified(|snap| {
                if self.c_tok.is_cancelled() {
                    return false;
                }
                merge(snap, &readings, epoch);
                true
            });
            if !merged {
                break;
            }

            let battery = readings.iter().find_map(|r| match r {
                TelemetryValue::Battery(b) => Some(*b),
                _ => None,
            });
            if let Some(now) = battery {
                if last_battery.is_some_and(|prev| prev >= warning_at) && now < warning_at {
                    warn!("Battery dropped below {warning_at:.0}% ({now:.1}%)");
                    self.battery.record(now, BatteryEvent::LowBatteryWarning).await;
                }
                last_battery = Some(now);
            }
        }
    }
}

/// Reads every telemetry kind concurrently. Failed reads are logged and skipped.
async fn sample(transport: &dyn Transport) -> Vec<TelemetryValue> {
    let reads = TelemetryKind::iter().map(|kind| async move { (kind, transport.read(kind).await) });
    join_all(reads)
        .await
        .into_iter()
        .filter_map(|(kind, res)| match res {
            Ok(value) => value,
            Err(e) => {
                warn!("Telemetry read {kind} failed: {}", e.message());
                None
            }
        })
        .collect()
}

/// One read-and-merge outside the polling loop, used to seed a fresh connection.
pub(crate) async fn refresh(
    transport: &dyn Transport,
    snapshot: &watch::Sender<Snapshot>,
    c_tok: &CancellationToken,
) {
    let epoch = snapshot.borrow().command_epoch;
    let readings = sample(transport).await;
    snapshot.send_if_modified(|snap| {
        if c_tok.is_cancelled() {
            return false;
        }
        merge(snap, &readings, epoch);
        true
    });
}

/// Folds one cycle of readings into the snapshot.
///
/// Flight state only moves when no command has written it since the sample
/// was taken (`sample_epoch`). A maneuver only settles back to hovering after
/// the vehicle has reported `flying` for it.
pub(crate) fn merge(snap: &mut Snapshot, readings: &[TelemetryValue], sample_epoch: u64) {
    let mut transition = None;
    for reading in readings {
        match reading {
            TelemetryValue::Battery(b) if b.is_finite() => snap.battery_percent = b.clamp(0.0, 100.0),
            TelemetryValue::Altitude(a) if a.is_finite() => snap.altitude_m = a.max(0.0),
            TelemetryValue::Position(p) if p.latitude.is_finite() && p.longitude.is_finite() => {
                snap.position = *p;
            }
            TelemetryValue::Speed(s) if s.is_finite() => snap.speed_mps = s.max(0.0),
            TelemetryValue::FlightState(raw) => {
                let Some(observed) = FlightState::from_telemetry(raw) else {
                    warn!("Unknown flying state '{raw}', keeping {}", snap.flight_state);
                    continue;
                };
                if snap.command_epoch != sample_epoch {
                    event!("Stale {observed} sample ignored");
                    continue;
                }
                if snap.flight_state == FlightState::Flying {
                    if observed == FlightState::Flying {
                        snap.maneuver_seen = true;
                    } else if observed == FlightState::Hovering && !snap.maneuver_seen {
                        event!("Still hovering, maneuver not started yet");
                        continue;
                    }
                }
                if let Some(next) = StateMachine::observed_edge(snap.flight_state, observed) {
                    transition = Some((snap.flight_state, next));
                    snap.flight_state = next;
                }
            }
            other => warn!("Discarding non-finite reading {other:?}"),
        }
    }

    if let Some((from, to)) = transition {
        info!("Telemetry transition {from} -> {to}");
        snap.message = match to {
            FlightState::Hovering => format!("Hovering at {:.1}m", snap.altitude_m),
            FlightState::Landed => "Landed safely".to_string(),
            FlightState::Emergency => "EMERGENCY reported by vehicle".to_string(),
            other => other.to_string(),
        };
    } else {
        match snap.flight_state {
            FlightState::TakingOff => snap.message = format!("Ascending... {:.1}m", snap.altitude_m),
            FlightState::Landing => snap.message = format!("Descending... {:.1}m", snap.altitude_m),
            FlightState::Flying => snap.message = format!("Flying at {:.1}m", snap.altitude_m),
            _ => {}
        }
    }
    snap.telemetry_cycles += 1;
    snap.touch(Utc::now());
    event!(
        "Telemetry cycle {}: {} {:.1}m {:.1}%",
        snap.telemetry_cycles,
        snap.flight_state,
        snap.altitude_m,
        snap.battery_percent
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionMode, SafetyThresholds};
    use crate::flight_control::Position;
    use crate::transport::mock::MockTransport;

    fn snapshot_in(state: FlightState) -> Snapshot {
        let mut snap = Snapshot::new(ConnectionMode::Simulation);
        snap.command_state(state, "test");
        snap
    }

    #[test]
    fn stale_samples_do_not_override_commanded_state() {
        let mut snap = snapshot_in(FlightState::TakingOff);
        let stale = snap.command_epoch - 1;
        merge(&mut snap, &[TelemetryValue::FlightState("hovering".into())], stale);
        assert_eq!(snap.flight_state, FlightState::TakingOff);

        let fresh = snap.command_epoch;
        merge(
            &mut snap,
            &[TelemetryValue::Altitude(10.0), TelemetryValue::FlightState("hovering".into())],
            fresh,
        );
        assert_eq!(snap.flight_state, FlightState::Hovering);
        assert_eq!(snap.message, "Hovering at 10.0m");
    }

    #[test]
    fn unknown_flying_state_keeps_prior_value() {
        let mut snap = snapshot_in(FlightState::Landing);
        let epoch = snap.command_epoch;
        merge(&mut snap, &[TelemetryValue::FlightState("barrel_roll".into())], epoch);
        assert_eq!(snap.flight_state, FlightState::Landing);
        assert_eq!(snap.telemetry_cycles, 1);
    }

    #[test]
    fn emergency_is_entered_from_any_flight_phase() {
        let mut snap = snapshot_in(FlightState::Flying);
        let epoch = snap.command_epoch;
        merge(&mut snap, &[TelemetryValue::FlightState("emergency".into())], epoch);
        assert_eq!(snap.flight_state, FlightState::Emergency);
        merge(&mut snap, &[TelemetryValue::FlightState("hovering".into())], epoch);
        assert_eq!(snap.flight_state, FlightState::Emergency);
    }

    #[test]
    fn maneuver_settles_only_after_reported_motion() {
        let mut snap = snapshot_in(FlightState::Flying);
        let epoch = snap.command_epoch;
        merge(&mut snap, &[TelemetryValue::FlightState("hovering".into())], epoch);
        assert_eq!(snap.flight_state, FlightState::Flying);
        merge(&mut snap, &[TelemetryValue::FlightState("flying".into())], epoch);
        merge(&mut snap, &[TelemetryValue::FlightState("hovering".into())], epoch);
        assert_eq!(snap.flight_state, FlightState::Hovering);

        // A new command forgets motion seen for the previous one.
        snap.command_state(FlightState::Flying, "Moving...");
        let epoch = snap.command_epoch;
        merge(&mut snap, &[TelemetryValue::FlightState("hovering".into())], epoch);
        assert_eq!(snap.flight_state, FlightState::Flying);
    }

    #[test]
    fn readings_are_clamped() {
        let mut snap = snapshot_in(FlightState::Hovering);
        let epoch = snap.command_epoch;
        merge(
            &mut snap,
            &[TelemetryValue::Battery(130.0), TelemetryValue::Altitude(-2.0), TelemetryValue::Speed(f64::NAN)],
            epoch,
        );
        assert!((snap.battery_percent - 100.0).abs() < f64::EPSILON);
        assert!(snap.altitude_m.abs() < f64::EPSILON);
        assert!(snap.speed_mps.abs() < f64::EPSILON);
    }

    fn shared() -> (Arc<watch::Sender<Snapshot>>, Arc<BatteryMonitor>) {
        let mut snap = Snapshot::new(ConnectionMode::Simulation);
        snap.command_state(FlightState::Connected, "Connected");
        (
            Arc::new(watch::Sender::new(snap)),
            Arc::new(BatteryMonitor::new(SafetyThresholds::default())),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn failed_reads_skip_only_their_field() {
        let mock = Arc::new(MockTransport::new());
        mock.connect().await.unwrap();
        mock.set(TelemetryValue::Battery(64.0)).await;
        mock.set(TelemetryValue::Altitude(0.0)).await;
        mock.set(TelemetryValue::Position(Position::new(1.0, 1.0))).await;
        mock.fail_reads(TelemetryKind::Position).await;

        let (snapshot, battery) = shared();
        let poller = TelemetryPoller::start(
            mock,
            Arc::clone(&snapshot),
            battery,
            TelemetryPoller::POLL_INTERVAL,
        );
        tokio::time::sleep(TelemetryPoller::POLL_INTERVAL * 3).await;
        assert!(poller.is_running());
        poller.stop().await;

        let snap = snapshot.borrow().clone();
        assert!((snap.battery_percent - 64.0).abs() < f64::EPSILON);
        assert_eq!(snap.position, Position::HOME);
        assert!(snap.telemetry_cycles >= 3);
        assert_eq!(snap.flight_state, FlightState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn last_updated_is_monotonic_across_cycles() {
        let mock = Arc::new(MockTransport::new());
        mock.connect().await.unwrap();
        mock.set(TelemetryValue::Battery(80.0)).await;
        let (snapshot, battery) = shared();
        let mut rx = snapshot.subscribe();
        let poller = TelemetryPoller::start(
            mock,
            Arc::clone(&snapshot),
            battery,
            TelemetryPoller::POLL_INTERVAL,
        );

        let mut seen = Vec::new();
        while seen.len() < 5 {
            rx.changed().await.unwrap();
            let snap = rx.borrow_and_update();
            seen.push((snap.telemetry_cycles, snap.last_updated));
        }
        poller.stop().await;

        assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(seen.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_poller_never_writes_again() {
        let mock = Arc::new(MockTransport::new());
        mock.connect().await.unwrap();
        let (snapshot, battery) = shared();
        let poller = TelemetryPoller::start(
            mock,
            Arc::clone(&snapshot),
            battery,
            TelemetryPoller::POLL_INTERVAL,
        );
        tokio::time::sleep(TelemetryPoller::POLL_INTERVAL * 2).await;
        poller.stop().await;
        let cycles = snapshot.borrow().telemetry_cycles;
        tokio::time::sleep(TelemetryPoller::POLL_INTERVAL * 4).await;
        assert_eq!(snapshot.borrow().telemetry_cycles, cycles);
    }

    #[tokio::test(start_paused = true)]
    async fn crossing_the_warning_threshold_is_logged_once() {
        let mock = Arc::new(MockTransport::new());
        mock.connect().await.unwrap();
        mock.set(TelemetryValue::Battery(26.0)).await;
        let (snapshot, battery) = shared();
        let poller = TelemetryPoller::start(
            Arc::clone(&mock) as Arc<dyn Transport>,
            snapshot,
            Arc::clone(&battery),
            TelemetryPoller::POLL_INTERVAL,
        );
        tokio::time::sleep(TelemetryPoller::POLL_INTERVAL * 2).await;
        mock.set(TelemetryValue::Battery(24.0)).await;
        tokio::time::sleep(TelemetryPoller::POLL_INTERVAL * 2).await;
        mock.set(TelemetryValue::Battery(23.5)).await;
        tokio::time::sleep(TelemetryPoller::POLL_INTERVAL * 2).await;
        poller.stop().await;

        let history = battery.history(10).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event, BatteryEvent::LowBatteryWarning);
        assert!((history[0].battery_percent - 24.0).abs() < f64::EPSILON);
    }
}
