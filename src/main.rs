mod reload;
mod renderer;
mod simulated;

use anyhow::Result;
use cardboard_config::{AppConfig, HeadMountedDisplay};
use cardboard_render::{StereoView, ViewSettings};
use cardboard_tracking::HeadTracker;
use reload::ConfigWatcher;
use renderer::LoggingRenderer;
use simulated::SimulatedImu;
use std::time::Duration;
use tracing::{error, info, warn};

/// Display refresh the frame loop is paced to.
const FRAME_RATE_HZ: f64 = 60.0;

/// Sample rate of the simulated IMU.
const IMU_RATE_HZ: u32 = 200;

const CONFIG_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cardboard_vr=info,cardboard_tracking=info,cardboard_render=info".into()
            }),
        )
        .init();

    info!("Cardboard VR viewer starting");

    // Load config.
    let config = cardboard_config::load_config().unwrap_or_else(|e| {
        warn!(?e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    let screen = config.screen.clone().unwrap_or_default();
    info!(
        model = %config.device.model,
        width = screen.width,
        height = screen.height,
        vr_mode = config.render.vr_mode,
        "Config loaded"
    );

    let tracker = HeadTracker::new(Box::new(SimulatedImu::new(IMU_RATE_HZ)), &config.tracking);
    let settings = ViewSettings::new(
        HeadMountedDisplay::new(screen.clone(), config.device.clone()),
        config.render.clone(),
    );
    let (mut view, controller) = StereoView::new(tracker, settings)?;

    // Pick up edits to the config file while running.
    let watcher = match cardboard_config::config_path() {
        Ok(path) => Some(tokio::spawn(
            ConfigWatcher::new(path, controller.clone()).run(CONFIG_POLL_INTERVAL),
        )),
        Err(e) => {
            warn!(?e, "Config directory unavailable, live reload disabled");
            None
        }
    };

    let mut renderer = LoggingRenderer::default();
    view.resume()?;
    view.surface_changed(&mut renderer, screen.width, screen.height);

    let mut frames = tokio::time::interval(Duration::from_secs_f64(1.0 / FRAME_RATE_HZ));
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = frames.tick() => view.draw_frame(&mut renderer),
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    if let Some(watcher) = watcher {
        watcher.abort();
    }
    view.shutdown(&mut renderer);
    let stats = view.tracker().stats();
    info!(
        frames = renderer.frame_count(),
        samples = stats.processed,
        dropped = stats.dropped,
        "Viewer stopped"
    );

    // Persist what the session ran with.
    let settings = controller.settings();
    let config = AppConfig {
        device: settings.hmd.device,
        screen: Some(settings.hmd.screen),
        render: settings.render,
        tracking: config.tracking,
    };
    if let Err(e) = cardboard_config::save_config(&config) {
        error!(?e, "Failed to save config");
    }

    Ok(())
}
