//! Published snapshot of dock icon hit-regions.
//!
//! The cache is rebuilt wholesale on each refresh and published by replacing an
//! `Arc`, so readers on the click path always see the last fully published
//! sequence and never block on a refresh in flight.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::{DockSampler, IconRegion};

pub struct GeometryCache {
    snapshot: Mutex<Arc<Vec<IconRegion>>>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self {
            snapshot: Mutex::new(Arc::new(Vec::new())),
        }
    }

    /// The last fully published region sequence. Cheap enough for the
    /// event-tap callback path.
    pub fn snapshot(&self) -> Arc<Vec<IconRegion>> {
        Arc::clone(&self.snapshot.lock().unwrap())
    }

    /// Atomically replace the published sequence.
    pub fn publish(&self, regions: Vec<IconRegion>) {
        *self.snapshot.lock().unwrap() = Arc::new(regions);
    }

    /// Run one refresh cycle against the sampler and publish the result.
    ///
    /// A sampler error publishes the empty sequence: with no regions to match,
    /// subsequent clicks pass through unsuppressed until the next refresh.
    pub fn refresh_from(&self, sampler: &dyn DockSampler) {
        match sampler.sample() {
            Ok(regions) => {
                debug!(count = regions.len(), "dock geometry refreshed");
                self.publish(regions);
            }
            Err(err) => {
                warn!(error = %err, "dock geometry refresh failed, clearing regions");
                self.publish(Vec::new());
            }
        }
    }
}

impl Default for GeometryCache {
    fn default() -> Self {
        Self::new()
    }
}
