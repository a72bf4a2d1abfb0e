use crate::error::TrackingError;
use crate::fusion::{FilterConfig, OrientationFilter};
use crate::head_transform::HeadTransform;
use crate::math::frame_correction;
use crate::source::SensorSource;
use crate::types::{SensorEvent, SensorKind};
use cardboard_config::TrackingConfig;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Longest the sensor thread waits for a reading before checking for stop.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// `last_gyro_arrival_ns` before any gyro reading has arrived.
const NO_GYRO: u64 = u64::MAX;

/// Counters kept by the sensor thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub processed: u64,
    pub dropped: u64,
}

/// State shared between the sensor thread and pose queries.
struct Shared {
    filter: OrientationFilter,
    epoch: Instant,
    /// Wall-clock arrival of the newest gyro reading, ns since `epoch`.
    last_gyro_arrival_ns: AtomicU64,
    processed: AtomicU64,
    dropped: AtomicU64,
}

impl Shared {
    fn reset(&self) {
        self.filter.reset();
        self.last_gyro_arrival_ns.store(NO_GYRO, Ordering::Release);
    }

    fn ingest(&self, event: &SensorEvent) {
        if event.is_degenerate() {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::trace!(kind = ?event.kind, dropped, "Dropping degenerate sensor reading");
            return;
        }

        let sample = event.to_inertial_sample();
        match event.kind {
            SensorKind::Accelerometer => self.filter.process_acc(sample.vector, sample.timestamp_ns),
            SensorKind::Gyroscope => {
                let arrival = self.epoch.elapsed().as_nanos() as u64;
                self.last_gyro_arrival_ns.store(arrival, Ordering::Release);
                self.filter.process_gyro(sample.vector, sample.timestamp_ns);
            }
        }

        let processed = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if processed % 1000 == 0 {
            tracing::debug!(processed, "Sensor samples processed");
        }
    }

    fn seconds_since_gyro(&self) -> f64 {
        match self.last_gyro_arrival_ns.load(Ordering::Acquire) {
            NO_GYRO => 0.0,
            arrival => {
                let now = self.epoch.elapsed().as_nanos() as u64;
                now.saturating_sub(arrival) as f64 * 1.0e-9
            }
        }
    }
}

struct Worker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<Box<dyn SensorSource>>,
}

/// Runs the orientation filter on a dedicated sensor thread and answers
/// head pose queries from any other thread.
pub struct HeadTracker {
    shared: Arc<Shared>,
    /// Present whenever the sensor thread is not running.
    source: Option<Box<dyn SensorSource>>,
    worker: Option<Worker>,
    prediction_horizon: f64,
    max_prediction: f64,
}

impl HeadTracker {
    pub fn new(source: Box<dyn SensorSource>, config: &TrackingConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                filter: OrientationFilter::new(FilterConfig::from(config)),
                epoch: Instant::now(),
                last_gyro_arrival_ns: AtomicU64::new(NO_GYRO),
                processed: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
            source: Some(source),
            worker: None,
            prediction_horizon: config.prediction_horizon_ms as f64 / 1000.0,
            max_prediction: config.max_prediction_ms as f64 / 1000.0,
        }
    }

    /// Reset the filter, subscribe to the source and spawn the sensor thread.
    ///
    /// Does nothing while tracking is already running.
    pub fn start(&mut self) -> Result<(), TrackingError> {
        self.reap_finished_worker();
        if self.worker.is_some() {
            return Ok(());
        }

        let mut source = self.source.take().ok_or(TrackingError::SourceLost)?;
        self.shared.reset();
        if let Err(e) = source.subscribe() {
            self.source = Some(source);
            return Err(e.into());
        }

        let stop = Arc::new(AtomicBool::new(false));
        let spawned = std::thread::Builder::new().name("cardboard-sensors".into()).spawn({
            let shared = Arc::clone(&self.shared);
            let stop = Arc::clone(&stop);
            move || sensor_loop(shared, source, stop)
        });

        match spawned {
            Ok(handle) => {
                tracing::info!("Head tracking started");
                self.worker = Some(Worker { stop, handle });
                Ok(())
            }
            Err(e) => {
                // The closure, and the source with it, is gone.
                tracing::error!(?e, "Failed to spawn sensor thread");
                Err(TrackingError::Spawn(e))
            }
        }
    }

    /// Signal the sensor thread and wait for it to unsubscribe and exit.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.stop.store(true, Ordering::Release);
        self.join(worker);
        tracing::info!("Head tracking stopped");
    }

    pub fn is_tracking(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    pub fn stats(&self) -> IngestStats {
        IngestStats {
            processed: self.shared.processed.load(Ordering::Relaxed),
            dropped: self.shared.dropped.load(Ordering::Relaxed),
        }
    }

    /// Feed one reading directly, bypassing the sensor thread.
    pub fn process_sensor_event(&self, event: &SensorEvent) {
        self.shared.ingest(event);
    }

    /// Head view predicted `seconds_ahead` from the filter's latest state.
    pub fn predicted_head_view(&self, seconds_ahead: f64) -> HeadTransform {
        let view = self.shared.filter.predicted_orientation(seconds_ahead);
        HeadTransform::from_head_view(view.as_mat4() * frame_correction())
    }

    /// Head view for the frame about to be drawn.
    ///
    /// Predicts over the time since the last gyro reading plus the expected
    /// display latency, capped at `max_prediction`.
    pub fn last_head_view(&self) -> HeadTransform {
        let horizon = (self.shared.seconds_since_gyro() + self.prediction_horizon)
            .clamp(0.0, self.max_prediction);
        self.predicted_head_view(horizon)
    }

    fn reap_finished_worker(&mut self) {
        if self
            .worker
            .as_ref()
            .is_some_and(|worker| worker.handle.is_finished())
        {
            if let Some(worker) = self.worker.take() {
                self.join(worker);
            }
        }
    }

    fn join(&mut self, worker: Worker) {
        match worker.handle.join() {
            Ok(source) => self.source = Some(source),
            Err(_) => tracing::error!("Sensor thread panicked; sensor source lost"),
        }
    }
}

impl Drop for HeadTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sensor_loop(
    shared: Arc<Shared>,
    mut source: Box<dyn SensorSource>,
    stop: Arc<AtomicBool>,
) -> Box<dyn SensorSource> {
    while !stop.load(Ordering::Acquire) {
        match source.next_event(POLL_INTERVAL) {
            Ok(Some(event)) => shared.ingest(&event),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(?e, "Sensor source failed; stopping ingestion");
                break;
            }
        }
    }
    source.unsubscribe();
    source
}
