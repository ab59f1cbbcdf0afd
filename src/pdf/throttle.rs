//! Bounded concurrency in front of an engine.
//!
//! Each render holds one slot for its whole duration. Callers queue for a
//! free slot up to `queue_timeout`, then fail with `RenderError::QueueTimeout`.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Semaphore;

use super::{PdfEngine, PdfOptions, RenderError};

pub struct ThrottledEngine<E> {
    inner: E,
    slots: Semaphore,
    capacity: usize,
    queue_timeout: Duration,
}

impl<E: PdfEngine> ThrottledEngine<E> {
    /// `capacity` is clamped to at least one slot.
    pub fn new(inner: E, capacity: usize, queue_timeout: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner,
            slots: Semaphore::new(capacity),
            capacity,
            queue_timeout,
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }
}

#[async_trait]
impl<E: PdfEngine> PdfEngine for ThrottledEngine<E> {
    async fn render(&self, html: &str, options: &PdfOptions) -> Result<Vec<u8>, RenderError> {
        let _slot = match tokio::time::timeout(self.queue_timeout, self.slots.acquire()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => {
                return Err(RenderError::EngineUnavailable(
                    "render slots are closed".to_string(),
                ))
            }
            Err(_) => {
                log::warn!(
                    "All {} render slots busy for {:?}, rejecting render",
                    self.capacity,
                    self.queue_timeout
                );
                return Err(RenderError::QueueTimeout(self.queue_timeout));
            }
        };

        self.inner.render(html, options).await
    }
}
