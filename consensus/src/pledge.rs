//! Monotonic per-shard high-water marks with cancellable bounded waits.
//!
//! Cross-shard pledges arrive as (shard, index) observations; a block may
//! only be processed once every pledge it incorporates has been observed.
//! Each shard gets a `tokio::sync::watch` channel carrying the highest
//! observed index: waiters re-check the mark on every change, so waking one
//! waiter never blocks another, and dropping the wait future cancels it
//! without touching unrelated blocks or shards.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant};
use weft_types::Shard;

/// Per-shard monotonically increasing index with multi-waiter notification.
#[derive(Debug, Default)]
pub struct MonotonicWatch {
    channels: Mutex<HashMap<Shard, watch::Sender<u64>>>,
}

impl MonotonicWatch {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, shard: Shard) -> watch::Sender<u64> {
        let mut channels = self.channels.lock().expect("pledge watch lock poisoned");
        channels
            .entry(shard)
            .or_insert_with(|| watch::channel(0).0)
            .clone()
    }

    /// Raise the mark for `shard` to `index` if higher; lower observations
    /// are ignored (the mark never regresses).
    pub fn advance(&self, shard: Shard, index: u64) {
        self.sender(shard).send_if_modified(|current| {
            if index > *current {
                *current = index;
                true
            } else {
                false
            }
        });
    }

    /// The highest index observed for `shard`; zero if none yet.
    pub fn current(&self, shard: Shard) -> u64 {
        *self.sender(shard).subscribe().borrow()
    }

    /// Wait until the mark for `shard` reaches `target`, up to `bound`.
    ///
    /// Returns `true` when the target was reached, `false` on timeout. The
    /// wait holds no locks and suspends only the calling task.
    pub async fn wait_for(&self, shard: Shard, target: u64, bound: Duration) -> bool {
        let mut rx = self.sender(shard).subscribe();
        if *rx.borrow() >= target {
            return true;
        }

        let deadline = Instant::now() + bound;
        loop {
            match time::timeout_at(deadline, rx.changed()).await {
                Ok(Ok(())) => {
                    if *rx.borrow() >= target {
                        return true;
                    }
                }
                // Sender dropped: no further advances can arrive.
                Ok(Err(_)) => return *rx.borrow() >= target,
                Err(_) => return false,
            }
        }
    }
}
