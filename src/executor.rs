//! Harvest run executor.
//!
//! [`HarvestExecutor`] drives one source broker into one destination broker:
//! 1. **Enumerate** references from the source
//! 2. **Load** each reference's content
//! 3. **Publish** it to the destination (single attempt, bounded by a timeout)
//! 4. **Delete** it from the source, only after a confirmed publish
//!
//! Source operations block, so each of them runs on the blocking pool via
//! `spawn_blocking`. Records of one run are processed strictly in
//! enumeration order; a failing record is reported in [`RunReport`] and the
//! run moves on. A semaphore bounds how many runs execute at once.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::ExecutorConfig;
use crate::error::{
    CleanupError, DeliveryError, DeliveryErrorKind, HarvestError, RecordReadError,
};
use crate::model::{DataReference, EntityDefinition, IteratorContext};
use crate::registry::ConnectorRegistry;
use crate::traits::{Broker, InputBroker, OutputBroker, PublishingStatus, RecordIterator};

// ============================================================================
// Run results
// ============================================================================

/// A record that did not make it through the run.
#[derive(Debug)]
pub enum RecordFailure {
    /// Enumerating or loading the record failed
    Read(RecordReadError),

    /// The destination did not accept the record; it stays in the source
    Delivery(DeliveryError),

    /// The record was delivered but could not be removed from the source
    Cleanup(CleanupError),
}

impl RecordFailure {
    /// Identifier of the record concerned.
    pub fn record(&self) -> &str {
        match self {
            RecordFailure::Read(e) => &e.record,
            RecordFailure::Delivery(e) => &e.record,
            RecordFailure::Cleanup(e) => &e.record,
        }
    }
}

/// Outcome of one harvest run.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub task_id: String,
    pub run_id: Uuid,

    /// References produced by the source, including failed ones
    pub records_seen: usize,

    /// Records the destination did not know before
    pub created: usize,

    /// Records that replaced existing ones
    pub updated: usize,

    /// Delivered records removed from the source
    pub deleted: usize,

    /// Total time of the run (milliseconds)
    pub duration_ms: u64,

    #[serde(skip)]
    pub failures: Vec<RecordFailure>,
}

impl RunReport {
    fn new(context: &IteratorContext) -> Self {
        Self {
            task_id: context.task_id.clone(),
            run_id: context.run_id,
            ..Self::default()
        }
    }

    /// Records accepted by the destination.
    pub fn published(&self) -> usize {
        self.created + self.updated
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ============================================================================
// Executor
// ============================================================================

/// Executes harvest runs with bounded concurrency.
///
/// Cheap to clone; clones share the concurrency limit.
#[derive(Debug, Clone)]
pub struct HarvestExecutor {
    semaphore: Arc<Semaphore>,
    config: ExecutorConfig,
}

impl HarvestExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_runs.max(1))),
            config,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Builds both brokers through `registry` and executes a run.
    ///
    /// # Errors
    ///
    /// Fails before any I/O if either definition is invalid or names an
    /// unregistered connector.
    pub async fn harvest(
        &self,
        registry: &ConnectorRegistry,
        source: &EntityDefinition,
        destination: &EntityDefinition,
        context: IteratorContext,
    ) -> Result<RunReport, HarvestError> {
        let source: Arc<dyn InputBroker> = Arc::from(registry.create_input_broker(source)?);
        let destination: Arc<dyn OutputBroker> =
            Arc::from(registry.create_output_broker(destination)?);
        self.execute(source, destination, context).await
    }

    /// Executes one run of `source` into `destination`.
    ///
    /// # Errors
    ///
    /// Only run-level problems are errors: an unusable source, a crashed
    /// worker, or a closed executor. Per-record failures are collected in
    /// the returned [`RunReport`].
    #[instrument(
        skip_all,
        fields(
            source = %source.broker_uri(),
            destination = %destination.broker_uri(),
            task_id = %context.task_id,
            run_id = %context.run_id,
        )
    )]
    pub async fn execute(
        &self,
        source: Arc<dyn InputBroker>,
        destination: Arc<dyn OutputBroker>,
        context: IteratorContext,
    ) -> Result<RunReport, HarvestError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| HarvestError::ExecutorClosed)?;

        let start = Instant::now();
        let mut report = RunReport::new(&context);
        info!("Starting harvest run");

        let broker = source.clone();
        let mut records: RecordIterator =
            tokio::task::spawn_blocking(move || broker.iterate(&context)).await??;

        loop {
            let (next, rest) = tokio::task::spawn_blocking(move || {
                let next = records.next();
                (next, records)
            })
            .await?;
            records = rest;

            let reference = match next {
                None => break,
                Some(Ok(reference)) => reference,
                Some(Err(err)) => {
                    report.records_seen += 1;
                    warn!(record = %err.record, error = %err, "Skipping unreadable record");
                    report.failures.push(RecordFailure::Read(err));
                    continue;
                }
            };
            report.records_seen += 1;

            self.process(&source, destination.as_ref(), reference, &mut report)
                .await?;
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            records = report.records_seen,
            created = report.created,
            updated = report.updated,
            deleted = report.deleted,
            failed = report.failures.len(),
            duration_ms = report.duration_ms,
            "Harvest run completed"
        );
        Ok(report)
    }

    /// Moves one record through load, publish and delete.
    async fn process(
        &self,
        source: &Arc<dyn InputBroker>,
        destination: &dyn OutputBroker,
        reference: DataReference,
        report: &mut RunReport,
    ) -> Result<(), HarvestError> {
        let broker = source.clone();
        let (content, reference) = tokio::task::spawn_blocking(move || {
            let content = broker.load_content(&reference);
            (content, reference)
        })
        .await?;
        let content = match content {
            Ok(content) => content,
            Err(err) => {
                warn!(record = %err.record, error = %err, "Failed to load record content");
                report.failures.push(RecordFailure::Read(err));
                return Ok(());
            }
        };

        let limit = self.config.publish_timeout();
        let published = match timeout(limit, destination.publish(&reference, &content)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError {
                broker: destination.broker_uri().clone(),
                record: reference.id.clone(),
                kind: DeliveryErrorKind::Timeout(limit.as_secs()),
            }),
        };
        match published {
            Ok(PublishingStatus::Created) => report.created += 1,
            Ok(PublishingStatus::Updated) => report.updated += 1,
            Err(err) => {
                // Not delivered: the record must stay in the source
                warn!(record = %err.record, error = %err, "Failed to publish record");
                report.failures.push(RecordFailure::Delivery(err));
                return Ok(());
            }
        }
        debug!(record = %reference.id, bytes = content.len(), "Record published");

        if !self.config.delete_on_success {
            return Ok(());
        }
        let broker = source.clone();
        let deleted = tokio::task::spawn_blocking(move || broker.delete(&reference)).await?;
        match deleted {
            Ok(()) => report.deleted += 1,
            Err(err) => {
                warn!(record = %err.record, error = %err, "Failed to remove delivered record");
                report.failures.push(RecordFailure::Cleanup(err));
            }
        }
        Ok(())
    }
}

impl Default for HarvestExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

// ============================================================================
// Tests
// ============================================================================
