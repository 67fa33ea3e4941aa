//! The pipeline driver — pulls blocks from a source, routes their events,
//! and commits the cursor after each block.
//!
//! Ordering discipline: within a block, events apply in stream order; the
//! cursor is saved only after every event of the block has been attempted.
//! A crash between upserts and the cursor write leaves the cursor behind,
//! which is safe: on restart the block is redelivered and every handler
//! upserts, so replay converges on the same rows.

use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use courseindex_core::{Block, Cursor};
use courseindex_store::CourseStore;

use crate::config::PipelineConfig;
use crate::error::IndexError;
use crate::handlers::apply_event;
use crate::router::EventRouter;

/// Supplies blocks to the driver in ascending `order_key` order.
#[async_trait]
pub trait BlockSource: Send {
    /// Next block, or `None` when the stream is exhausted.
    async fn next_block(&mut self) -> Result<Option<Block>, IndexError>;
}

/// Adapter turning any fallible block stream into a [`BlockSource`].
pub struct StreamSource<S> {
    inner: S,
}

impl<S> StreamSource<S>
where
    S: Stream<Item = Result<Block, IndexError>> + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        Self { inner: stream }
    }
}

#[async_trait]
impl<S> BlockSource for StreamSource<S>
where
    S: Stream<Item = Result<Block, IndexError>> + Unpin + Send,
{
    async fn next_block(&mut self) -> Result<Option<Block>, IndexError> {
        self.inner.next().await.transpose()
    }
}

/// What the driver did with one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    /// Block below the starting block; nothing touched, cursor unchanged.
    Skipped,
    /// No events of interest; cursor advanced.
    Empty,
    /// Events were routed; cursor advanced.
    Applied { applied: usize, failed: usize },
}

/// Drives one contract's event stream into the reconciliation store.
pub struct Pipeline<S> {
    config: PipelineConfig,
    store: S,
    router: EventRouter,
    cursor: Option<Cursor>,
}

impl<S: CourseStore> Pipeline<S> {
    /// Validate the configuration and resume from the stored cursor, if any.
    pub async fn new(config: PipelineConfig, store: S) -> Result<Self, IndexError> {
        config.validate()?;
        let router = EventRouter::new(&config.contract_address)?;
        let cursor = store.load_cursor(&config.id).await?;
        match &cursor {
            Some(c) => info!(
                pipeline = %config.id,
                order_key = c.order_key,
                "resuming from stored cursor"
            ),
            None => info!(
                pipeline = %config.id,
                starting_block = config.starting_block,
                "no stored cursor, starting fresh"
            ),
        }
        Ok(Self {
            config,
            store,
            router,
            cursor,
        })
    }

    /// Last durably committed position, if any.
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// First block the source should deliver.
    pub fn resume_block(&self) -> u64 {
        match &self.cursor {
            Some(c) => c.next_block().max(self.config.starting_block),
            None => self.config.starting_block,
        }
    }

    /// Shared access to the underlying store (read-side queries).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process one block: route its events, apply the handlers, commit the
    /// cursor. A failing event is logged and counted, never fatal, whether
    /// it failed to decode or to persist; only a cursor save failure aborts.
    pub async fn process_block(&mut self, block: &Block) -> Result<BlockOutcome, IndexError> {
        if block.order_key < self.config.starting_block {
            debug!(
                order_key = block.order_key,
                starting_block = self.config.starting_block,
                "stale block, skipping"
            );
            return Ok(BlockOutcome::Skipped);
        }

        let mut applied = 0usize;
        let mut failed = 0usize;

        for raw in &block.events {
            let routed = match self.router.route(raw) {
                Ok(r) => r,
                Err(err) => {
                    warn!(
                        tx_hash = %raw.tx_hash,
                        event_index = raw.event_index,
                        %err,
                        "event failed to decode"
                    );
                    failed += 1;
                    self.router.settle();
                    continue;
                }
            };
            if let Some(decoded) = routed {
                match apply_event(&self.store, &decoded, block).await {
                    Ok(()) => applied += 1,
                    Err(err) => {
                        warn!(
                            tx_hash = %decoded.tx_hash,
                            event_index = decoded.event_index,
                            %err,
                            "event handler failed"
                        );
                        failed += 1;
                    }
                }
            }
            self.router.settle();
        }

        match &mut self.cursor {
            Some(c) => c.advance(block.order_key, block.unique_key.clone()),
            None => self.cursor = Some(Cursor::new(block.order_key, block.unique_key.clone())),
        }
        if let Some(cursor) = &self.cursor {
            self.store.save_cursor(&self.config.id, cursor).await?;
        }

        if applied == 0 && failed == 0 {
            Ok(BlockOutcome::Empty)
        } else {
            Ok(BlockOutcome::Applied { applied, failed })
        }
    }

    /// Run until the source is exhausted or a fatal error occurs.
    pub async fn run<B: BlockSource>(&mut self, source: &mut B) -> Result<(), IndexError> {
        while let Some(block) = source.next_block().await? {
            let outcome = self.process_block(&block).await?;
            match outcome {
                BlockOutcome::Skipped => {}
                BlockOutcome::Empty => {
                    debug!(block = block.number, "block empty");
                }
                BlockOutcome::Applied { applied, failed } => {
                    info!(
                        block = block.number,
                        finality = %block.finality,
                        applied,
                        failed,
                        "block reconciled"
                    );
                }
            }
        }
        info!(pipeline = %self.config.id, "block source exhausted, stopping");
        Ok(())
    }
}
