use std::future::Future;
use std::mem;

use metrics::counter;
use syncer_config::shared::BatchSenderConfig;
use tracing::debug;

use crate::error::SyncerResult;
#[cfg(feature = "failpoints")]
use crate::failpoints::{BATCH_SENDER_APPEND, BATCH_SENDER_FLUSH, syncer_fail_point};
use crate::metrics::SYNCER_BATCH_SENDER_FLUSHES_TOTAL;
use crate::types::SizeHint;

/// Upper bound on the number of entries pre-allocated for a batch.
const MAX_PREALLOC_BATCH_SIZE: usize = 4096;

/// Transport receiving the batches assembled by a [`BatchSender`].
pub trait MessageStream<T> {
    /// Sends one batch of messages, in order.
    fn send(&mut self, batch: Vec<T>) -> impl Future<Output = SyncerResult<()>> + Send;
}

/// Buffers messages and forwards them to a [`MessageStream`] in batches.
///
/// A batch is sent as soon as it holds `max_entry_count` messages or its accumulated
/// [`SizeHint`] reaches `max_size_bytes`. Callers flush explicitly to send a partial batch.
#[derive(Debug)]
pub struct BatchSender<T, S> {
    stream: S,
    buffer: Vec<T>,
    size_bytes: usize,
    max_entry_count: usize,
    max_size_bytes: usize,
}

impl<T, S> BatchSender<T, S>
where
    T: SizeHint,
    S: MessageStream<T>,
{
    pub fn new(stream: S, config: &BatchSenderConfig) -> Self {
        Self {
            stream,
            buffer: Vec::with_capacity(prealloc_capacity(config.max_entry_count)),
            size_bytes: 0,
            max_entry_count: config.max_entry_count,
            max_size_bytes: config.max_size_bytes,
        }
    }

    /// Buffers `message`, flushing the batch if a threshold is reached.
    pub async fn append(&mut self, message: T) -> SyncerResult<()> {
        #[cfg(feature = "failpoints")]
        syncer_fail_point(BATCH_SENDER_APPEND)?;

        self.size_bytes += message.size_hint();
        self.buffer.push(message);

        if self.buffer.len() >= self.max_entry_count || self.size_bytes >= self.max_size_bytes {
            return self.flush().await;
        }

        Ok(())
    }

    /// Sends the buffered messages, if any.
    ///
    /// The buffer is emptied whether or not the stream accepts the batch.
    pub async fn flush(&mut self) -> SyncerResult<()> {
        #[cfg(feature = "failpoints")]
        syncer_fail_point(BATCH_SENDER_FLUSH)?;

        if self.buffer.is_empty() {
            return Ok(());
        }

        let capacity = prealloc_capacity(self.max_entry_count);
        let batch = mem::replace(&mut self.buffer, Vec::with_capacity(capacity));
        let size_bytes = mem::take(&mut self.size_bytes);

        debug!(entries = batch.len(), size_bytes, "flushing message batch");
        counter!(SYNCER_BATCH_SENDER_FLUSHES_TOTAL).increment(1);

        self.stream.send(batch).await
    }

    /// Number of buffered messages.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Accumulated size of the buffered messages.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }
}

fn prealloc_capacity(max_entry_count: usize) -> usize {
    max_entry_count.min(MAX_PREALLOC_BATCH_SIZE)
}
