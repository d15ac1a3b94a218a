#![allow(clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
use ecodrone_gs::{CommandResult, SessionConfig, SessionController, error, fatal, info, log, telem};
use std::time::Duration;

const HOVER_TIME: Duration = Duration::from_secs(3);
const DEMO_ALTITUDE: f64 = 5.0;
const HISTORY_LEN: usize = 10;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    let config = SessionConfig::from_env().unwrap_or_else(|e| fatal!("Invalid configuration: {e}"));
    info!(
        "Starting demo flight in {} mode (min battery {:.0}%, warning {:.0}%)",
        config.connection_mode,
        config.thresholds.min_battery_for_flight(),
        config.thresholds.low_battery_warning()
    );
    let session = SessionController::from_config(config)
        .unwrap_or_else(|e| fatal!("Could not build session: {}", e.message()));

    if !report("connect", session.connect().await) {
        return;
    }
    match session.get_battery_level() {
        Some(level) => telem!("Battery before flight: {level:.1}%"),
        None => error!("Battery level unavailable"),
    }

    if report("takeoff", session.takeoff(Some(DEMO_ALTITUDE)).await) {
        tokio::time::sleep(HOVER_TIME).await;
        let status = session.status_record();
        log!("Hovering: {:.1}m, {:.1}%, {}", status.altitude_meters, status.battery_percent, status.message);
        report("land", session.land().await);
    }

    report("disconnect", session.disconnect().await);
    for entry in session.battery_history(HISTORY_LEN).await {
        log!(
            "{} {:>5.1}% {} ({})",
            entry.timestamp.format("%H:%M:%S"),
            entry.battery_percent,
            entry.event,
            entry.severity
        );
    }
}

fn report(step: &str, res: CommandResult) -> bool {
    if res.success {
        info!("{step}: {} [{}]", res.message, res.snapshot.flight_state());
    } else {
        error!("{step} failed: {} [{}]", res.message, res.snapshot.flight_state());
    }
    res.success
}
