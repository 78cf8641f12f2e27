use crate::library::helpers::parse_seconds;
use crate::module::options::{KafkaOptions, StorageOptions, TopicOptions};
use std::time::Duration;
use structopt::StructOpt;

/// Options for the ingest module
#[derive(Debug, StructOpt)]
pub struct Options {
    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub kafka: KafkaOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub topics: TopicOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub storage: StorageOptions,

    /// Path of the update report within uploaded archives.
    /// Archives that nest their content below a top-level directory are
    /// handled by also accepting any file ending in this path.
    #[structopt(long, env, default_value = "update_report.json")]
    pub report_path: String,

    /// Maximum size of a fetched archive in bytes.
    /// Larger archives are rejected without being transferred.
    #[structopt(long, env, default_value = "67108864")]
    pub fetched_size_limit: u64,

    /// Maximum total size of the unpacked archive content in bytes.
    /// Protects against decompression bombs; archives exceeding the limit
    /// are treated as corrupt.
    #[structopt(long, env, default_value = "268435456")]
    pub decompressed_size_limit: u64,

    /// Number of seconds to wait for a single archive fetch
    #[structopt(long, env, default_value = "30", value_name = "seconds", parse(try_from_str = parse_seconds))]
    pub retrieval_timeout: Duration,

    /// Total number of attempts for fetching an archive
    #[structopt(long, env, default_value = "3")]
    pub retrieval_attempts: u32,

    /// Number of seconds to wait for a single publish acknowledgement
    #[structopt(long, env, default_value = "30", value_name = "seconds", parse(try_from_str = parse_seconds))]
    pub publish_timeout: Duration,

    /// Total number of attempts for publishing an evaluation request.
    /// Once exhausted, consumption from the affected partition halts
    /// until the instance is restarted.
    #[structopt(long, env, default_value = "5")]
    pub publish_attempts: u32,

    /// Total number of attempts for publishing a dead letter record
    #[structopt(long, env, default_value = "3")]
    pub sink_attempts: u32,

    /// Number of records that may queue up per partition worker before
    /// the dispatcher stops pulling further records off the stream
    #[structopt(long, env, default_value = "16")]
    pub worker_queue_depth: usize,

    /// Number of seconds in-flight records are given to finish when the
    /// module shuts down
    #[structopt(long, env, default_value = "30", value_name = "seconds", parse(try_from_str = parse_seconds))]
    pub shutdown_grace: Duration,

    /// Port on which processing metrics are exposed in Prometheus format
    #[structopt(long, env, default_value = "9090")]
    pub metrics_port: u16,
}
