use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// First correlation id handed out by a fresh sequence.
pub const REQUEST_ID_SEED: i64 = 1443;

/// Process-wide source of receiver correlation ids. Clones share one
/// counter, so concurrent sessions never reuse an id.
#[derive(Clone, Debug)]
pub struct RequestIds(Arc<AtomicI64>);

impl RequestIds {
    pub fn starting_at(seed: i64) -> Self {
        RequestIds(Arc::new(AtomicI64::new(seed)))
    }

    pub fn next_id(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for RequestIds {
    fn default() -> Self {
        Self::starting_at(REQUEST_ID_SEED)
    }
}
