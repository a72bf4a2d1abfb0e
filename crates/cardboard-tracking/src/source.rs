use crate::error::SensorError;
use crate::types::SensorEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

/// A platform stream of accelerometer and gyroscope readings.
///
/// The tracker owns the source on its sensor thread: `subscribe` once on
/// start, poll `next_event` until stopped, then `unsubscribe`.
pub trait SensorSource: Send {
    fn subscribe(&mut self) -> Result<(), SensorError>;

    /// Wait up to `timeout` for the next reading. `Ok(None)` means no data yet.
    fn next_event(&mut self, timeout: Duration) -> Result<Option<SensorEvent>, SensorError>;

    fn unsubscribe(&mut self);
}

/// In-process sensor source fed through a channel.
///
/// Readings pushed while nobody is subscribed are discarded on the next
/// `subscribe`, like a platform sensor that only reports to listeners.
pub struct ChannelSensorSource {
    rx: Receiver<SensorEvent>,
    subscribed: Arc<AtomicBool>,
}

/// Producer half of a [`ChannelSensorSource`].
#[derive(Clone)]
pub struct SensorSender {
    tx: Sender<SensorEvent>,
    subscribed: Arc<AtomicBool>,
}

pub fn channel_source() -> (SensorSender, ChannelSensorSource) {
    let (tx, rx) = mpsc::channel();
    let subscribed = Arc::new(AtomicBool::new(false));
    (
        SensorSender {
            tx,
            subscribed: Arc::clone(&subscribed),
        },
        ChannelSensorSource { rx, subscribed },
    )
}

impl SensorSender {
    /// Push one reading. Fails once the source has been dropped.
    pub fn send(&self, event: SensorEvent) -> Result<(), SensorError> {
        self.tx.send(event).map_err(|_| SensorError::Disconnected)
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::Acquire)
    }
}

impl SensorSource for ChannelSensorSource {
    fn subscribe(&mut self) -> Result<(), SensorError> {
        let stale = self.rx.try_iter().count();
        if stale > 0 {
            tracing::debug!(stale, "Discarded readings queued before subscription");
        }
        self.subscribed.store(true, Ordering::Release);
        Ok(())
    }

    fn next_event(&mut self, timeout: Duration) -> Result<Option<SensorEvent>, SensorError> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(SensorError::Disconnected),
        }
    }

    fn unsubscribe(&mut self) {
        self.subscribed.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_events_after_subscribe() {
        let (tx, mut source) = channel_source();
        tx.send(SensorEvent::gyroscope([1.0, 0.0, 0.0], 1)).unwrap();
        source.subscribe().unwrap();
        assert!(tx.is_subscribed());

        tx.send(SensorEvent::gyroscope([0.0, 1.0, 0.0], 2)).unwrap();
        let event = source.next_event(Duration::from_millis(10)).unwrap();
        assert_eq!(event.map(|e| e.timestamp_ns), Some(2));

        source.unsubscribe();
        assert!(!tx.is_subscribed());
    }

    #[test]
    fn timeout_and_disconnect() {
        let (tx, mut source) = channel_source();
        source.subscribe().unwrap();
        assert_eq!(source.next_event(Duration::from_millis(1)), Ok(None));

        drop(tx);
        assert_eq!(
            source.next_event(Duration::from_millis(1)),
            Err(SensorError::Disconnected)
        );
    }
}
