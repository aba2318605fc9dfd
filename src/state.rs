use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::DispatchPolicy;
use crate::engine::DispatchEngine;
use crate::geocode::{GeocodeProvider, NoGeocoder};
use crate::notify::BroadcastNotifier;
use crate::observability::metrics::Metrics;
use crate::store::MemoryStore;

pub struct AppState {
    pub engine: DispatchEngine,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<BroadcastNotifier>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(event_buffer_size: usize, policy: DispatchPolicy) -> Self {
        Self::with_collaborators(
            event_buffer_size,
            policy,
            Arc::new(NoGeocoder),
            Arc::new(SystemClock),
        )
    }

    pub fn with_collaborators(
        event_buffer_size: usize,
        policy: DispatchPolicy,
        geocoder: Arc<dyn GeocodeProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(BroadcastNotifier::new(event_buffer_size));
        let metrics = Metrics::new();

        let engine = DispatchEngine::new(
            store.clone(),
            notifier.clone(),
            geocoder,
            clock,
            metrics.clone(),
            policy,
        );

        Self {
            engine,
            store,
            notifier,
            metrics,
        }
    }
}
