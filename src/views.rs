//! Tracks whether the consumer of a request is still around.
//!
//! Leaving a view does not abort its requests; they run to completion so the
//! cache still gets refreshed. Their results are simply not handed back.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

/// Held by a view for as long as it is mounted.
pub struct ViewHandle {
    name: String,
    mounted: Arc<AtomicBool>,
}

/// A cheap, clonable check handed to the code that awaits on the view's behalf.
#[derive(Clone)]
pub struct MountGuard {
    name: String,
    mounted: Arc<AtomicBool>,
}

impl ViewHandle {
    pub fn mount(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn guard(&self) -> MountGuard {
        MountGuard {
            name: self.name.clone(),
            mounted: self.mounted.clone(),
        }
    }

    pub fn unmount(self) {}
}

impl Drop for ViewHandle {
    fn drop(&mut self) {
        self.mounted.store(false, Ordering::SeqCst);
    }
}

impl MountGuard {
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Awaits `fut` to completion and returns its output only if the view is still mounted.
    pub async fn deliver<F: Future>(&self, fut: F) -> Option<F::Output> {
        let output = fut.await;
        if self.is_mounted() {
            Some(output)
        } else {
            debug!(view = %self.name, "dropping response for unmounted view");
            None
        }
    }
}
