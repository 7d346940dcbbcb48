//! Splits batches into partitions, runs partitions concurrently, and reassembles results.
//!
//! Two calling conventions:
//!
//! - [`BatchDispatcher::dispatch`]: wait for all partitions, return vectors in input order,
//!   fail the whole call on the first item failure.
//! - [`BatchDispatcher::dispatch_streaming`]: deliver each item as soon as it is ready,
//!   tagged with its input index. No ordering across partitions; exactly one result
//!   (vector or error) per input.
//!
//! The dispatcher knows nothing about permits or models: the `embed` closure is the unit of
//! work and is expected to take a limiter permit around its inference call.

use futures::Stream;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error};

use crate::error::EmbedError;

/// Default partition size.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default capacity of the channel between partition workers and a streaming consumer.
pub const DEFAULT_STREAM_BUFFER: usize = 128;

/// Result for one input of a streaming dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamItem {
    /// Position of the input text in the request.
    pub index: usize,
    pub result: Result<Vec<f32>, EmbedError>,
}

/// Partitions work and schedules partitions on the runtime's worker pool.
#[derive(Clone, Debug)]
pub struct BatchDispatcher {
    batch_size: usize,
    stream_buffer: usize,
}

impl Default for BatchDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE, DEFAULT_STREAM_BUFFER)
    }
}

/// Contiguous partitions of at most `size` items, each with its starting offset.
fn partition(texts: Vec<String>, size: usize) -> Vec<(usize, Vec<String>)> {
    let mut out = Vec::with_capacity(texts.len().div_ceil(size));
    let mut iter = texts.into_iter().peekable();
    let mut offset = 0;
    while iter.peek().is_some() {
        let chunk: Vec<String> = iter.by_ref().take(size).collect();
        let len = chunk.len();
        out.push((offset, chunk));
        offset += len;
    }
    out
}

impl BatchDispatcher {
    /// `batch_size` and `stream_buffer` are clamped to at least one.
    pub fn new(batch_size: usize, stream_buffer: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            stream_buffer: stream_buffer.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embeds every text and returns the vectors in input order.
    ///
    /// Each partition runs as one task, items inside a partition run sequentially. The
    /// first failure aborts the remaining partitions and is returned. Empty input returns
    /// an empty vector immediately.
    pub async fn dispatch<F, Fut>(
        &self,
        texts: Vec<String>,
        embed: F,
    ) -> Result<Vec<Vec<f32>>, EmbedError>
    where
        F: Fn(String) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<f32>, EmbedError>> + Send + 'static,
    {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let total = texts.len();
        let partitions = partition(texts, self.batch_size);
        let count = partitions.len();
        debug!(texts = total, partitions = count, "dispatching batch");

        let mut set = JoinSet::new();
        for (slot, (_offset, chunk)) in partitions.into_iter().enumerate() {
            let embed = embed.clone();
            set.spawn(async move {
                let mut out = Vec::with_capacity(chunk.len());
                for text in chunk {
                    out.push(embed(text).await?);
                }
                Ok::<_, EmbedError>((slot, out))
            });
        }

        // Returning early drops the set, which aborts the partitions still running.
        let mut slots: Vec<Vec<Vec<f32>>> = vec![Vec::new(); count];
        while let Some(joined) = set.join_next().await {
            let (slot, vectors) = joined??;
            slots[slot] = vectors;
        }
        Ok(slots.into_iter().flatten().collect())
    }

    /// Embeds every text, delivering results as they complete.
    ///
    /// Dropping the returned stream aborts all outstanding work. A panicking partition
    /// reports [`EmbedError::TaskFailed`] for each of its undelivered items, so the
    /// stream always yields exactly one item per input.
    pub fn dispatch_streaming<F, Fut>(&self, texts: Vec<String>, embed: F) -> EmbeddingStream
    where
        F: Fn(String) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<f32>, EmbedError>> + Send + 'static,
    {
        let total = texts.len();
        let (tx, rx) = mpsc::channel(self.stream_buffer);
        let partitions = partition(texts, self.batch_size);
        debug!(texts = total, partitions = partitions.len(), "dispatching stream");

        let driver = tokio::spawn(async move {
            let mut set = JoinSet::new();
            let mut progress = HashMap::new();
            for (offset, chunk) in partitions {
                let len = chunk.len();
                let sent = Arc::new(AtomicUsize::new(0));
                let tx = tx.clone();
                let embed = embed.clone();
                let counter = sent.clone();
                let handle = set.spawn(async move {
                    for (i, text) in chunk.into_iter().enumerate() {
                        let result = embed(text).await;
                        let item = StreamItem {
                            index: offset + i,
                            result,
                        };
                        if tx.send(item).await.is_err() {
                            // Consumer is gone.
                            return;
                        }
                        counter.fetch_add(1, Ordering::Relaxed);
                    }
                });
                progress.insert(handle.id(), (offset, len, sent));
            }

            while let Some(joined) = set.join_next().await {
                let Err(e) = joined else { continue };
                let Some((offset, len, sent)) = progress.remove(&e.id()) else {
                    continue;
                };
                error!(offset, len, error = %e, "stream partition failed");
                let failure = EmbedError::from(e);
                for index in offset + sent.load(Ordering::Relaxed)..offset + len {
                    let item = StreamItem {
                        index,
                        result: Err(failure.clone()),
                    };
                    if tx.send(item).await.is_err() {
                        return;
                    }
                }
            }
        });

        EmbeddingStream {
            inner: ReceiverStream::new(rx),
            driver: Some(driver),
            total,
        }
    }
}

/// Stream of [`StreamItem`]s from [`BatchDispatcher::dispatch_streaming`].
///
/// Ends after one item per input. Dropping it aborts the outstanding partitions.
pub struct EmbeddingStream {
    inner: ReceiverStream<StreamItem>,
    driver: Option<JoinHandle<()>>,
    total: usize,
}

impl EmbeddingStream {
    /// A stream that ends immediately.
    pub fn empty() -> Self {
        let (_, rx) = mpsc::channel(1);
        Self {
            inner: ReceiverStream::new(rx),
            driver: None,
            total: 0,
        }
    }

    /// Number of items this stream yields in total.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl Stream for EmbeddingStream {
    type Item = StreamItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for EmbeddingStream {
    fn drop(&mut self) {
        // Aborting the driver drops its JoinSet, which aborts every partition task.
        if let Some(driver) = &self.driver {
            driver.abort();
        }
    }
}
