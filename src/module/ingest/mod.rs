//! Ingestion pipeline turning uploaded report archives into evaluation requests
//!
//! The module consumes upload notifications, retrieves and unpacks the
//! referenced archive, extracts the contained package updates and publishes
//! an evaluation request for downstream processing. Records that can not be
//! processed are parked on a dead letter stream so a single poison message
//! never stalls its partition.

use crate::constants::RETRY_BACKOFF_BASE;
use crate::harness::{Heart, Module, ServiceRunner};
use crate::library::communication::implementation::kafka::{
    KafkaCommunicationFactory, KafkaConnection,
};
use crate::library::communication::record::TopicDescriptor;
use crate::library::communication::source::ConsumerGroupDescriptor;
use crate::library::BoxedError;
use async_trait::async_trait;
use jatsl::{schedule, JobScheduler};
use std::sync::Arc;

mod codec;
mod extractor;
mod metrics;
mod options;
mod pipeline;
mod resolver;
mod sink;

pub use options::Options;

use extractor::JsonReportParser;
use metrics::MetricsExporterJob;
use pipeline::{DispatchPipeline, PipelineConfig};

/// Module implementation
pub struct Ingest {
    options: Options,
}

impl Ingest {
    /// Creates a new instance from raw parts
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Module for Ingest {
    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        let options = &self.options;

        let connection =
            KafkaConnection::new(options.kafka.brokers.clone(), options.publish_timeout);
        let group = ConsumerGroupDescriptor::new(
            options.kafka.group.clone(),
            options.kafka.instance_id.clone(),
            options.kafka.start,
        );

        let config = PipelineConfig {
            inbound_topic: TopicDescriptor::new(options.topics.inbound.clone()),
            evaluation_topic: TopicDescriptor::new(options.topics.evaluation.clone()),
            dead_letter_topic: TopicDescriptor::new(options.topics.dead_letter.clone()),
            store: options.storage.object_store(),
            parser: Arc::new(JsonReportParser::new(options.report_path.clone())),
            fetched_size_limit: options.fetched_size_limit,
            decompressed_size_limit: options.decompressed_size_limit,
            retrieval_timeout: options.retrieval_timeout,
            retrieval_attempts: options.retrieval_attempts,
            publish_timeout: options.publish_timeout,
            publish_attempts: options.publish_attempts,
            sink_attempts: options.sink_attempts,
            retry_backoff: RETRY_BACKOFF_BASE,
            worker_queue_depth: options.worker_queue_depth,
            shutdown_grace: options.shutdown_grace,
        };

        let pipeline_runner =
            ServiceRunner::<DispatchPipeline<KafkaCommunicationFactory>>::new(
                connection, group, config,
            );
        let metrics_job = MetricsExporterJob::new(options.metrics_port);

        schedule!(scheduler, { pipeline_runner, metrics_job });

        Ok(Some(Heart::without_heart_stone()))
    }
}
