use cardboard_config::DeviceGeometry;
use std::sync::Arc;

/// Notified when a new headset geometry is submitted.
pub trait DeviceGeometryObserver: Send + Sync {
    fn on_device_geometry_changed(&self, device: &DeviceGeometry);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Observers in registration order.
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    observers: Vec<(ObserverId, Arc<dyn DeviceGeometryObserver>)>,
}

impl ObserverRegistry {
    pub fn add(&mut self, observer: Arc<dyn DeviceGeometryObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Returns whether `id` was registered.
    pub fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(registered, _)| *registered != id);
        self.observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Cloned handles, so callbacks can run without holding the registry.
    pub fn snapshot(&self) -> Vec<Arc<dyn DeviceGeometryObserver>> {
        self.observers
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect()
    }
}
