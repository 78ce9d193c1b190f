use std::sync::Arc;

use tokio::sync::Mutex;

use crate::bail;
use crate::concurrency::batch_sender::MessageStream;
use crate::error::{ErrorKind, SyncerResult};

#[derive(Debug)]
struct Inner<T> {
    batches: Vec<Vec<T>>,
    failures_left: usize,
}

/// In-memory message stream recording every batch it receives.
///
/// Clones share the same recording, so a test can keep one handle while the sender owns
/// another.
#[derive(Debug)]
pub struct MemoryStream<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> MemoryStream<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                batches: Vec::new(),
                failures_left: 0,
            })),
        }
    }

    /// Makes the next `count` sends fail with [`ErrorKind::DestinationError`].
    pub async fn fail_next(&self, count: usize) {
        self.inner.lock().await.failures_left = count;
    }

    /// Number of batches received so far.
    pub async fn batch_count(&self) -> usize {
        self.inner.lock().await.batches.len()
    }
}

impl<T: Clone> MemoryStream<T> {
    /// Returns a copy of every batch received so far.
    pub async fn batches(&self) -> Vec<Vec<T>> {
        self.inner.lock().await.batches.clone()
    }
}

impl<T> Clone for MemoryStream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for MemoryStream<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> MessageStream<T> for MemoryStream<T> {
    async fn send(&mut self, batch: Vec<T>) -> SyncerResult<()> {
        let mut inner = self.inner.lock().await;

        if inner.failures_left > 0 {
            inner.failures_left -= 1;
            bail!(
                ErrorKind::DestinationError,
                "Memory stream rejected the batch",
                format!("{} messages dropped", batch.len())
            );
        }

        inner.batches.push(batch);
        Ok(())
    }
}
