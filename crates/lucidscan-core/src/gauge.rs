//! Live-buffer gauge for resource-leak verification.
//!
//! Every [`FeatureTensor`](crate::tensor::FeatureTensor) registers here on
//! creation and deregisters on drop. The pipeline's resource contract is
//! that no numeric buffer outlives its inference call, on success or on
//! any failure path; tests assert `live_buffers() == 0` after driving
//! those paths.

use std::sync::atomic::{AtomicI64, Ordering};

static LIVE_BUFFERS: AtomicI64 = AtomicI64::new(0);

/// Number of gauge-tracked buffers currently alive in the process.
#[inline]
pub fn live_buffers() -> i64 {
    LIVE_BUFFERS.load(Ordering::SeqCst)
}

/// RAII registration token held by a tracked buffer.
#[derive(Debug)]
pub(crate) struct GaugeGuard(());

impl GaugeGuard {
    pub(crate) fn register() -> Self {
        LIVE_BUFFERS.fetch_add(1, Ordering::SeqCst);
        Self(())
    }
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        LIVE_BUFFERS.fetch_sub(1, Ordering::SeqCst);
    }
}
