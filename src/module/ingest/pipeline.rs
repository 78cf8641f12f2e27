//! Core pipeline turning upload notifications into evaluation requests

use super::codec;
use super::extractor::{UpdateExtractor, UpdateReportParser};
use super::metrics::{
    self, COMMIT_FAILURES_TOTAL, HANDLING_DURATION_SECONDS, PARTITIONS_HALTED_TOTAL,
};
use super::resolver::ArchiveResolver;
use super::sink::FailureSink;
use crate::domain::event::{EvaluationRequest, ProcessingStage};
use crate::harness::Service;
use crate::library::communication::publisher::{PublishAck, PublishError, RecordPublisher};
use crate::library::communication::record::{InboundRecord, TopicDescriptor};
use crate::library::communication::source::{RecordSource, SourceError};
use crate::library::communication::{CauseChain, CommunicationFactory};
use crate::library::retry::RetryPolicy;
use crate::library::storage::ObjectStore;
use crate::library::{BoxedError, EmptyResult};
use anyhow::anyhow;
use async_trait::async_trait;
use jatsl::{Job, JobManager};
use prometheus::HistogramTimer;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, timeout_at, Instant};
use tracing::{debug, error, instrument, warn};

/// Configuration for the [`DispatchPipeline`] service
pub struct PipelineConfig {
    /// Stream carrying inbound upload notifications
    pub inbound_topic: TopicDescriptor,
    /// Stream receiving the produced evaluation requests
    pub evaluation_topic: TopicDescriptor,
    /// Stream receiving unprocessable records
    pub dead_letter_topic: TopicDescriptor,
    /// Store holding the uploaded archives
    pub store: Arc<dyn ObjectStore>,
    /// Parser extracting package updates from unpacked archives
    pub parser: Arc<dyn UpdateReportParser>,
    /// Maximum size of a fetched archive in bytes
    pub fetched_size_limit: u64,
    /// Maximum total size of the unpacked archive content in bytes
    pub decompressed_size_limit: u64,
    /// Upper bound for a single archive fetch
    pub retrieval_timeout: Duration,
    /// Total number of attempts for fetching an archive
    pub retrieval_attempts: u32,
    /// Upper bound for a single publish acknowledgement
    pub publish_timeout: Duration,
    /// Total number of attempts for publishing an evaluation request
    pub publish_attempts: u32,
    /// Total number of attempts for publishing a dead letter record
    pub sink_attempts: u32,
    /// Base delay before the first retry, doubling with every further attempt
    pub retry_backoff: Duration,
    /// Number of records that may queue up per partition worker
    pub worker_queue_depth: usize,
    /// Time in-flight records are given to finish during shutdown
    pub shutdown_grace: Duration,
}

/// Shared innards of the pipeline handed to every partition worker
struct PipelineCore<F: CommunicationFactory> {
    source: F::RecordSource,
    publisher: F::RecordPublisher,
    sink: FailureSink<F::RecordPublisher>,
    resolver: ArchiveResolver,
    extractor: UpdateExtractor,
    evaluation_topic: TopicDescriptor,
    publish_policy: RetryPolicy,
    publish_timeout: Duration,
}

/// Handle on a spawned partition worker
struct Worker {
    tx: mpsc::Sender<InboundRecord>,
    task: JoinHandle<()>,
}

#[derive(Debug, PartialEq, Eq)]
enum DriveOutcome {
    /// Shutdown was requested while the pipeline was healthy
    Terminated,
    /// The record source stopped delivering records
    SourceClosed,
}

#[derive(Debug, PartialEq, Eq)]
enum Processed {
    /// The record was handled and the partition may advance
    Advanced,
    /// The partition must not advance past this record
    Halted,
}

/// Service consuming upload notifications and dispatching evaluation requests
///
/// Records are handed to one worker per partition, keeping partitions
/// strictly ordered internally while independent partitions proceed
/// concurrently. A record only gets committed after its outcome (evaluation
/// request or dead letter) has been published, so a crash in between causes
/// redelivery rather than data loss.
pub struct DispatchPipeline<F: CommunicationFactory> {
    core: Arc<PipelineCore<F>>,
    worker_queue_depth: usize,
    shutdown_grace: Duration,
}

impl<F> Service<F> for DispatchPipeline<F>
where
    F: CommunicationFactory + Send + Sync,
{
    const NAME: &'static str = "DispatchPipeline";
    type Instance = Self;
    type Config = PipelineConfig;

    fn instantiate(factory: F, config: &Self::Config) -> Result<Self, BoxedError> {
        let source = factory.record_source(&[config.inbound_topic.clone()])?;
        let publisher = factory.record_publisher()?;
        let sink_publisher = factory.record_publisher()?;

        let resolver = ArchiveResolver::new(
            config.store.clone(),
            RetryPolicy::new(config.retrieval_attempts, config.retry_backoff),
            config.retrieval_timeout,
            config.fetched_size_limit,
            config.decompressed_size_limit,
        );

        let sink = FailureSink::new(
            sink_publisher,
            config.dead_letter_topic.clone(),
            RetryPolicy::new(config.sink_attempts, config.retry_backoff),
        );

        let core = PipelineCore {
            source,
            publisher,
            sink,
            resolver,
            extractor: UpdateExtractor::new(config.parser.clone()),
            evaluation_topic: config.evaluation_topic.clone(),
            publish_policy: RetryPolicy::new(config.publish_attempts, config.retry_backoff),
            publish_timeout: config.publish_timeout,
        };

        Ok(Self {
            core: Arc::new(core),
            worker_queue_depth: config.worker_queue_depth,
            shutdown_grace: config.shutdown_grace,
        })
    }
}

impl<F> DispatchPipeline<F>
where
    F: CommunicationFactory + Send + Sync + 'static,
{
    /// Pulls records off the source and fans them out to partition workers
    /// until either the shutdown future resolves or the source closes
    async fn drive<T>(&self, shutdown: T) -> DriveOutcome
    where
        T: Future<Output = ()> + Send,
    {
        let mut workers: HashMap<i32, Worker> = HashMap::new();
        let mut outcome = DriveOutcome::SourceClosed;

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    outcome = DriveOutcome::Terminated;
                    break;
                }
                result = self.core.source.recv() => match result {
                    Ok(record) => self.dispatch(&mut workers, record).await,
                    Err(SourceError::Closed) => break,
                    Err(error) => {
                        warn!(?error, "Failed to receive record");
                        sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }

        self.drain(workers).await;

        if let Err(error) = self.core.source.leave().await {
            warn!(?error, "Failed to leave consumer group");
        }

        outcome
    }

    async fn dispatch(&self, workers: &mut HashMap<i32, Worker>, record: InboundRecord) {
        let partition = record.position().partition();
        let core = self.core.clone();
        let depth = self.worker_queue_depth;

        let worker = workers.entry(partition).or_insert_with(|| {
            debug!(partition, "Spawning partition worker");
            let (tx, rx) = mpsc::channel(depth);
            let task = tokio::spawn(worker_loop(core, rx));
            Worker { tx, task }
        });

        // A full queue exerts backpressure here, stopping the pipeline from
        // pulling further records until the worker catches up.
        if worker.tx.send(record).await.is_err() {
            // The worker halted its partition; buffered records that still
            // surface after the pause are dropped without being committed.
            debug!(partition, "Discarding record for halted partition");
        }
    }

    async fn drain(&self, workers: HashMap<i32, Worker>) {
        if workers.is_empty() {
            return;
        }

        debug!(count = workers.len(), "Draining partition workers");

        let deadline = Instant::now() + self.shutdown_grace;
        let mut tasks = Vec::with_capacity(workers.len());

        // Dropping the sender ends a worker loop once its queue is empty
        for (partition, worker) in workers {
            drop(worker.tx);
            tasks.push((partition, worker.task));
        }

        for (partition, mut task) in tasks {
            match timeout_at(deadline, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => warn!(?error, partition, "Partition worker panicked"),
                Err(_) => {
                    warn!(partition, "Partition worker did not drain in time, aborting it");
                    task.abort();
                }
            }
        }
    }
}

#[async_trait]
impl<F> Job for DispatchPipeline<F>
where
    F: CommunicationFactory + Send + Sync + 'static,
{
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        manager.ready().await;

        match self.drive(manager.termination_signal()).await {
            DriveOutcome::Terminated => Ok(()),
            DriveOutcome::SourceClosed => {
                Err(anyhow!("Unexpected termination of supposedly infinite dispatch loop").into())
            }
        }
    }
}

async fn worker_loop<F>(core: Arc<PipelineCore<F>>, mut rx: mpsc::Receiver<InboundRecord>)
where
    F: CommunicationFactory + Send + Sync + 'static,
{
    while let Some(record) = rx.recv().await {
        let position = record.position().clone();

        if let Processed::Halted = process_record(&core, record).await {
            if let Err(error) = core.source.pause(position.topic(), position.partition()) {
                warn!(?error, "Failed to pause partition");
            }

            return;
        }
    }
}

#[instrument(skip(core, record), fields(
    topic = record.position().topic(),
    partition = record.position().partition(),
    offset = record.position().offset()
))]
async fn process_record<F>(core: &PipelineCore<F>, record: InboundRecord) -> Processed
where
    F: CommunicationFactory + Send + Sync + 'static,
{
    let timer = HANDLING_DURATION_SECONDS.start_timer();

    let notification = match codec::decode(record.payload()) {
        Ok(notification) => notification,
        Err(error) => {
            let cause = CauseChain::capture(&error);
            return park(core, record, ProcessingStage::Decode, cause, timer).await;
        }
    };

    let archive = match core.resolver.resolve(&notification).await {
        Ok(archive) => archive,
        Err(error) => {
            let cause = CauseChain::capture(&error);
            return park(core, record, ProcessingStage::Resolve, cause, timer).await;
        }
    };

    let updates = match core.extractor.extract(&archive) {
        Ok(updates) => updates,
        Err(error) => {
            let cause = CauseChain::capture(&error);
            return park(core, record, ProcessingStage::Extract, cause, timer).await;
        }
    };

    let request = codec::encode(notification, updates, record.position());

    match publish_with_retries(core, &request).await {
        Ok(ack) => {
            debug!(
                partition = ack.partition(),
                offset = ack.offset(),
                correlation_id = %request.correlation_id,
                "Published evaluation request"
            );
        }
        Err(error) => {
            metrics::observe_failure(ProcessingStage::Publish);
            PARTITIONS_HALTED_TOTAL.inc();
            error!(
                ?error,
                correlation_id = %request.correlation_id,
                "Halting consumption from partition after publish exhaustion"
            );
            timer.observe_duration();

            return Processed::Halted;
        }
    }

    commit(core, &record).await;
    metrics::observe_success();
    timer.observe_duration();

    Processed::Advanced
}

/// Parks an unprocessable record and advances the partition past it
async fn park<F>(
    core: &PipelineCore<F>,
    record: InboundRecord,
    stage: ProcessingStage,
    cause: CauseChain,
    timer: HistogramTimer,
) -> Processed
where
    F: CommunicationFactory + Send + Sync + 'static,
{
    warn!(stage = %stage, cause = %cause, "Parking unprocessable record");

    core.sink.send(&record, stage, cause).await;
    commit(core, &record).await;
    metrics::observe_failure(stage);
    timer.observe_duration();

    Processed::Advanced
}

async fn commit<F>(core: &PipelineCore<F>, record: &InboundRecord)
where
    F: CommunicationFactory + Send + Sync + 'static,
{
    if let Err(error) = core.source.commit(record.position()).await {
        COMMIT_FAILURES_TOTAL.inc();
        error!(?error, "Failed to commit consumption progress");
    }
}

async fn publish_with_retries<F>(
    core: &PipelineCore<F>,
    request: &EvaluationRequest,
) -> Result<PublishAck, PublishError>
where
    F: CommunicationFactory + Send + Sync + 'static,
{
    core.publish_policy
        .run(
            || publish_once(core, request),
            // Serialization failures are deterministic, trying again would
            // only yield the same result
            |error| !matches!(error, PublishError::Serialization(_)),
        )
        .await
}

async fn publish_once<F>(
    core: &PipelineCore<F>,
    request: &EvaluationRequest,
) -> Result<PublishAck, PublishError>
where
    F: CommunicationFactory + Send + Sync + 'static,
{
    match timeout(
        core.publish_timeout,
        core.publisher.publish(&core.evaluation_topic, request),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(PublishError::AckTimeout),
    }
}
