//! Latest-only rate limiting
//!
//! Requests wait out a short window; if a newer request arrives during the
//! window, the older one is dropped with [`MtError::Superseded`] and only the
//! newest is sent.

use crate::mt::error::{MtError, MtResult};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    generation: AtomicU64,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generation: AtomicU64::new(0),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Run `task` after the window, unless a newer call arrived meanwhile
    pub async fn run<F, T>(&self, task: F) -> MtResult<T>
    where
        F: Future<Output = MtResult<T>>,
    {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.window).await;
        if self.generation.load(Ordering::SeqCst) != ticket {
            tracing::debug!(ticket, "Rate-limited request superseded");
            return Err(MtError::Superseded);
        }
        task.await
    }
}
