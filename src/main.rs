use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info, Level};

use prizewheel::config::ClientConfig;
use prizewheel::net::http::WheelApiClient;
use prizewheel::session::{audio_cue, SessionEvent, SpinController};
use prizewheel::wheel::engine::SpinPhase;
use prizewheel::wheel::sectors::SectorWheel;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("Prize Wheel Client v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = ClientConfig::load_or_default();
    config.validate().map_err(anyhow::Error::msg)?;
    info!(
        "Configuration loaded: backend={}, tick_rate={} Hz",
        config.backend_url, config.tick_rate
    );

    // Fetch the sector configuration from the backend
    let api = WheelApiClient::new(config.backend_url.clone());
    let items = api
        .fetch_wheel_config()
        .await
        .map_err(|e| anyhow::anyhow!("failed to fetch wheel config: {}", e))?;
    let wheel = SectorWheel::from_config_items(&items)?;
    info!(
        "Wheel configured with {} sectors: {}",
        wheel.len(),
        wheel
            .sectors()
            .iter()
            .map(|s| s.label.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut controller = SpinController::new(wheel, config.tuning.clone(), Arc::new(api));
    controller.start_spin()?;

    // Shutdown signal handler
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received");
    };

    tokio::select! {
        result = run_spin(&mut controller, &config) => {
            match result {
                Some(winner) => info!("The wheel says: {}", winner),
                None => error!("Spin did not settle"),
            }
        }
        _ = shutdown => {
            info!("Shutting down...");
        }
    }

    Ok(())
}

/// Drive the controller until the spin settles, logging what a UI shell
/// would display each tick.
async fn run_spin<R: prizewheel::net::resolver::OutcomeResolver>(
    controller: &mut SpinController<R>,
    config: &ClientConfig,
) -> Option<String> {
    let mut ticker = interval(Duration::from_millis(1000 / config.tick_rate as u64));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let dt = config.dt();

    let mut needle_label: Option<String> = None;
    loop {
        ticker.tick().await;

        for event in controller.tick(dt) {
            match &event {
                SessionEvent::PhaseChanged { from, to } => {
                    info!("phase {:?} -> {:?}", from, to);
                }
                SessionEvent::OutcomeLocked { label, fallback } => {
                    if *fallback {
                        info!("outcome locked (fallback): {}", label);
                    } else {
                        info!("outcome locked: {}", label);
                    }
                }
                SessionEvent::Finished { label } => {
                    info!("settled on {}", label);
                }
            }
            if let Some(cue) = audio_cue(&event) {
                info!("audio cue: {:?}", cue);
            }
        }

        // Live needle readout while spinning, like the wheel's center text
        let snapshot = controller.snapshot();
        if snapshot.phase != SpinPhase::Idle && snapshot.phase != SpinPhase::Settled {
            let label = controller
                .wheel()
                .get(snapshot.pointed_sector)
                .map(|s| s.label.clone());
            if label != needle_label {
                if let Some(l) = &label {
                    info!("needle over {}", l);
                }
                needle_label = label;
            }
        }

        if snapshot.phase == SpinPhase::Settled {
            return controller.last_winner().map(str::to_string);
        }
    }
}
